use std::sync::Arc;

use crate::domain::{LedgerEntry, wrap_hex};

use super::{Entropy, SubmissionError};

/// Length in bytes of a simulated transaction hash.
pub const TRANSACTION_HASH_BYTES: usize = 32;

/// Where ledger entries are written. Returns the transaction id.
pub trait LedgerBackend: Send + Sync {
    fn write(&self, entry: &LedgerEntry) -> Result<String, SubmissionError>;
}

/// Accepts every entry and answers with a random `0x`-prefixed hash.
///
/// The hash is not derived from the entry, so it proves nothing about what
/// was submitted.
pub struct SimulatedLedger {
    entropy: Arc<dyn Entropy>,
}

impl SimulatedLedger {
    pub fn new(entropy: Arc<dyn Entropy>) -> Self {
        Self { entropy }
    }
}

impl LedgerBackend for SimulatedLedger {
    fn write(&self, entry: &LedgerEntry) -> Result<String, SubmissionError> {
        let mut hash = [0u8; TRANSACTION_HASH_BYTES];
        self.entropy.fill_bytes(&mut hash);
        let transaction_id = wrap_hex(&hash);

        tracing::debug!(
            entry_id = %entry.id,
            kind = entry.kind(),
            transaction_id = %transaction_id,
            "simulated ledger write"
        );
        Ok(transaction_id)
    }
}
