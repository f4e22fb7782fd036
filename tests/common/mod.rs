// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use greenveil::application::{
    EncryptionService, Entropy, LedgerBackend, LedgerConfig, LedgerSubmissionService,
    SeededEntropy, SimulatedLedger, SubmissionError,
};
use greenveil::domain::{LedgerEntry, PlaintextRecord, ProjectType, PublicMetadata};

/// Helper to create seeded services that never sleep
pub fn test_services(seed: u64) -> (Arc<EncryptionService>, LedgerSubmissionService) {
    let entropy: Arc<dyn Entropy> = Arc::new(SeededEntropy::from_seed(seed));
    let cipher = Arc::new(EncryptionService::new(entropy.clone()));
    let ledger =
        LedgerSubmissionService::simulated(cipher.clone(), entropy, LedgerConfig::instant());
    (cipher, ledger)
}

/// Helper to create a ledger service over a custom backend
pub fn ledger_with_backend(
    backend: Arc<dyn LedgerBackend>,
    config: LedgerConfig,
) -> LedgerSubmissionService {
    let entropy: Arc<dyn Entropy> = Arc::new(SeededEntropy::from_seed(99));
    let cipher = Arc::new(EncryptionService::new(entropy.clone()));
    LedgerSubmissionService::new(cipher, backend, entropy, config)
}

/// Test fixture: the record from the credit-creation form
pub fn texas_record() -> PlaintextRecord {
    PlaintextRecord::new(100.0, 50.0, "renewable_energy", 2024)
}

pub fn texas_metadata() -> PublicMetadata {
    PublicMetadata::new(ProjectType::RenewableEnergy, "Texas", 365)
}

/// Backend failing with a transient error a fixed number of times before
/// delegating to a simulated ledger.
pub struct FlakyLedger {
    failures_left: AtomicU32,
    calls: AtomicU32,
    inner: SimulatedLedger,
}

impl FlakyLedger {
    pub fn new(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            inner: SimulatedLedger::new(Arc::new(SeededEntropy::from_seed(5))),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LedgerBackend for FlakyLedger {
    fn write(&self, entry: &LedgerEntry) -> Result<String, SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(SubmissionError::Unavailable("rpc timeout".into()));
        }
        self.inner.write(entry)
    }
}

/// Backend that rejects every entry.
pub struct RejectingLedger {
    pub calls: AtomicU32,
}

impl RejectingLedger {
    pub fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }
}

impl LedgerBackend for RejectingLedger {
    fn write(&self, entry: &LedgerEntry) -> Result<String, SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SubmissionError::Rejected {
            entry_id: entry.id,
            reason: "contract reverted".into(),
        })
    }
}
