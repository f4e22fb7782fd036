use std::collections::BTreeMap;
use std::fmt;

use super::{PlaintextRecord, PublicMetadata};

/// Earliest accepted vintage year.
pub const MIN_VINTAGE: i32 = 2020;

/// Largest amount (tons) accepted in a single trade order.
pub const MAX_TRADE_TONS: f64 = 10_000.0;

/// Field-level form errors, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Checks applied to the credit-creation form before anything is encoded.
pub fn validate_credit(
    record: &PlaintextRecord,
    metadata: &PublicMetadata,
    current_year: i32,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if record.credit_type.trim().is_empty() {
        errors.add("projectType", "Please enter project type");
    }
    if metadata.location.trim().is_empty() {
        errors.add("location", "Please enter location");
    }
    if !is_positive(record.amount) {
        errors.add("amount", "Please enter a valid amount");
    }
    if !is_positive(record.price) {
        errors.add("price", "Please enter a valid price");
    }
    if record.vintage < MIN_VINTAGE || record.vintage > current_year {
        errors.add("vintage", "Please enter a valid vintage year");
    }
    if metadata.duration == 0 {
        errors.add("duration", "Please enter a valid duration");
    }

    errors.into_result()
}

/// Checks applied to a trade order.
pub fn validate_trade(credit_id: &str, amount: f64, price: f64) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if credit_id.trim().is_empty() {
        errors.add("creditId", "Please enter a credit id");
    }
    if !is_positive(amount) {
        errors.add("amount", "Please enter a valid amount");
    } else if amount > MAX_TRADE_TONS {
        errors.add("amount", "A single trade cannot exceed 10,000 tons");
    }
    if !is_positive(price) {
        errors.add("price", "Please enter a valid price");
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProjectType;

    fn valid_inputs() -> (PlaintextRecord, PublicMetadata) {
        (
            PlaintextRecord::new(100.0, 50.0, "renewable_energy", 2024),
            PublicMetadata::new(ProjectType::RenewableEnergy, "Texas", 365),
        )
    }

    #[test]
    fn test_valid_credit_passes() {
        let (record, metadata) = valid_inputs();
        assert!(validate_credit(&record, &metadata, 2026).is_ok());
    }

    #[test]
    fn test_credit_reports_every_bad_field() {
        let record = PlaintextRecord::new(0.0, -1.0, "", 2019);
        let metadata = PublicMetadata::new(ProjectType::RenewableEnergy, "  ", 0);

        let errors = validate_credit(&record, &metadata, 2026).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert_eq!(errors.get("amount"), Some("Please enter a valid amount"));
        assert_eq!(errors.get("vintage"), Some("Please enter a valid vintage year"));
        assert_eq!(errors.get("duration"), Some("Please enter a valid duration"));
    }

    #[test]
    fn test_vintage_bounds() {
        let (mut record, metadata) = valid_inputs();

        record.vintage = MIN_VINTAGE;
        assert!(validate_credit(&record, &metadata, 2026).is_ok());

        record.vintage = 2026;
        assert!(validate_credit(&record, &metadata, 2026).is_ok());

        record.vintage = 2027;
        assert!(validate_credit(&record, &metadata, 2026).is_err());
    }

    #[test]
    fn test_nan_amount_is_invalid() {
        let (mut record, metadata) = valid_inputs();
        record.amount = f64::NAN;
        let errors = validate_credit(&record, &metadata, 2026).unwrap_err();
        assert!(errors.get("amount").is_some());
    }

    #[test]
    fn test_trade_limits() {
        assert!(validate_trade("credit-1", 10_000.0, 45.2).is_ok());

        let errors = validate_trade("credit-1", 10_000.5, 45.2).unwrap_err();
        assert_eq!(
            errors.get("amount"),
            Some("A single trade cannot exceed 10,000 tons")
        );

        let errors = validate_trade("", 0.0, 0.0).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_display_lists_fields() {
        let errors = validate_trade("", 5.0, 1.0).unwrap_err();
        assert_eq!(errors.to_string(), "creditId: Please enter a credit id");
    }
}
