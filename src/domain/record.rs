use serde::{Deserialize, Serialize};

/// Project categories offered when creating a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    /// Wind, solar, hydro
    RenewableEnergy,
    /// Avoided deforestation, reforestation
    ForestConservation,
    /// Direct air capture, sequestration
    CarbonCapture,
    /// Demand reduction, retrofits
    EnergyEfficiency,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::RenewableEnergy => "renewable_energy",
            ProjectType::ForestConservation => "forest_conservation",
            ProjectType::CarbonCapture => "carbon_capture",
            ProjectType::EnergyEfficiency => "energy_efficiency",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "renewable_energy" => Some(ProjectType::RenewableEnergy),
            "forest_conservation" => Some(ProjectType::ForestConservation),
            "carbon_capture" => Some(ProjectType::CarbonCapture),
            "energy_efficiency" => Some(ProjectType::EnergyEfficiency),
            _ => None,
        }
    }

    pub fn all() -> [ProjectType; 4] {
        [
            ProjectType::RenewableEnergy,
            ProjectType::ForestConservation,
            ProjectType::CarbonCapture,
            ProjectType::EnergyEfficiency,
        ]
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The confidential attributes of a carbon credit, as entered by the user.
/// Never persisted; only ever handed to the encryption service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaintextRecord {
    /// Tons of CO2
    pub amount: f64,
    /// USD per ton
    pub price: f64,
    pub credit_type: String,
    pub vintage: i32,
}

impl PlaintextRecord {
    pub fn new(amount: f64, price: f64, credit_type: impl Into<String>, vintage: i32) -> Self {
        Self {
            amount,
            price,
            credit_type: credit_type.into(),
            vintage,
        }
    }

    /// The value of a single field, in the shape it is encoded with.
    pub fn field_value(&self, field: RecordField) -> FieldValue {
        match field {
            RecordField::Amount => FieldValue::Number(self.amount),
            RecordField::Price => FieldValue::Number(self.price),
            RecordField::CreditType => FieldValue::Text(self.credit_type.clone()),
            RecordField::Vintage => FieldValue::Integer(i64::from(self.vintage)),
        }
    }
}

/// Names the individually encoded fields of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordField {
    Amount,
    Price,
    CreditType,
    Vintage,
}

impl RecordField {
    pub const ALL: [RecordField; 4] = [
        RecordField::Amount,
        RecordField::Price,
        RecordField::CreditType,
        RecordField::Vintage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::Amount => "amount",
            RecordField::Price => "price",
            RecordField::CreditType => "creditType",
            RecordField::Vintage => "vintage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "amount" => Some(RecordField::Amount),
            "price" => Some(RecordField::Price),
            "credittype" => Some(RecordField::CreditType),
            "vintage" => Some(RecordField::Vintage),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decoded token value. Serialized as a bare JSON scalar.
///
/// `Integer` is listed before `Number` so that whole numbers written without
/// a fractional part (vintage years) come back as integers, while `100.0`
/// stays a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Interpret free-form input: an integer if it parses as one, then a
    /// float, otherwise text.
    pub fn infer(input: &str) -> Self {
        let trimmed = input.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => FieldValue::Number(n),
            _ => FieldValue::Text(input.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Attributes that stay public on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicMetadata {
    pub project_type: ProjectType,
    pub location: String,
    /// Days
    pub duration: u32,
}

impl PublicMetadata {
    pub fn new(project_type: ProjectType, location: impl Into<String>, duration: u32) -> Self {
        Self {
            project_type,
            location: location.into(),
            duration,
        }
    }
}

/// Output of encoding one record: one token per field plus the proof.
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedFields {
    pub encrypted_amount: String,
    pub encrypted_price: String,
    pub encrypted_credit_type: String,
    pub encrypted_vintage: String,
    pub proof: String,
}

impl EncodedFields {
    pub fn token(&self, field: RecordField) -> &str {
        match field {
            RecordField::Amount => &self.encrypted_amount,
            RecordField::Price => &self.encrypted_price,
            RecordField::CreditType => &self.encrypted_credit_type,
            RecordField::Vintage => &self.encrypted_vintage,
        }
    }
}
