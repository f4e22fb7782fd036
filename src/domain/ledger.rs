use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EncodedFields, PublicMetadata};

pub type EntryId = Uuid;

/// Number of leading characters of a transaction id shown to the user.
pub const SHORT_ID_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Some(TradeSide::Buy),
            "sell" => Some(TradeSide::Sell),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifier returned for a (simulated) ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub transaction_id: String,
}

impl SubmissionReceipt {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
        }
    }

    /// Truncated form for display, e.g. `0x1a2b3c4d...`
    pub fn short_id(&self) -> String {
        let head: String = self.transaction_id.chars().take(SHORT_ID_LEN).collect();
        if head.len() < self.transaction_id.len() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

impl std::fmt::Display for SubmissionReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.transaction_id)
    }
}

/// Aggregate market figures, each carried as an encoded numeric token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    pub total_credits: String,
    pub total_volume: String,
    pub average_price: String,
    pub active_trades: String,
}

impl MarketStats {
    /// (label, token) pairs in display order
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("Total Credits", &self.total_credits),
            ("Total Volume", &self.total_volume),
            ("Average Price", &self.average_price),
            ("Active Trades", &self.active_trades),
        ]
    }
}

/// What a single ledger write carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryPayload {
    CreateCredit {
        encoded: EncodedFields,
        metadata: PublicMetadata,
    },
    Trade {
        credit_id: String,
        encrypted_amount: String,
        encrypted_price: String,
        proof: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Correlates log lines for one submission; not part of any transaction id
    pub id: EntryId,
    pub payload: EntryPayload,
}

impl LedgerEntry {
    pub fn new(id: EntryId, payload: EntryPayload) -> Self {
        Self { id, payload }
    }

    pub fn kind(&self) -> &'static str {
        match self.payload {
            EntryPayload::CreateCredit { .. } => "create_credit",
            EntryPayload::Trade { .. } => "trade",
        }
    }
}
