use std::sync::Arc;

use tracing::Instrument;
use uuid::{Builder, Uuid};

use crate::domain::{
    EncodedFields, EntryPayload, FieldValue, LedgerEntry, MarketStats, PublicMetadata,
    SubmissionReceipt,
};

use super::{
    Entropy, LedgerBackend, LedgerConfig, PipelineError, RecordCipher, SimulatedLedger,
    SubmissionError,
};

/// Submits encoded records and trades to the ledger.
///
/// Every successful call yields a fresh receipt; a failed call leaves nothing
/// behind. The cipher is only used to fabricate encoded market statistics.
pub struct LedgerSubmissionService {
    cipher: Arc<dyn RecordCipher>,
    backend: Arc<dyn LedgerBackend>,
    entropy: Arc<dyn Entropy>,
    config: LedgerConfig,
}

impl LedgerSubmissionService {
    pub fn new(
        cipher: Arc<dyn RecordCipher>,
        backend: Arc<dyn LedgerBackend>,
        entropy: Arc<dyn Entropy>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            cipher,
            backend,
            entropy,
            config,
        }
    }

    /// Service backed by the in-process `SimulatedLedger`.
    pub fn simulated(
        cipher: Arc<dyn RecordCipher>,
        entropy: Arc<dyn Entropy>,
        config: LedgerConfig,
    ) -> Self {
        let backend = Arc::new(SimulatedLedger::new(entropy.clone()));
        Self::new(cipher, backend, entropy, config)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ========================
    // Submissions
    // ========================

    /// Record the creation of a carbon credit.
    pub async fn submit_record(
        &self,
        encoded: &EncodedFields,
        metadata: &PublicMetadata,
    ) -> Result<SubmissionReceipt, PipelineError> {
        let entry = self.new_entry(EntryPayload::CreateCredit {
            encoded: encoded.clone(),
            metadata: metadata.clone(),
        });
        let receipt = self.write(&entry).await?;

        tracing::info!(
            transaction_id = %receipt.transaction_id,
            project_type = %metadata.project_type,
            location = %metadata.location,
            duration = metadata.duration,
            "encrypted carbon credit created"
        );
        Ok(receipt)
    }

    /// Record a transfer of an existing credit.
    pub async fn submit_trade(
        &self,
        credit_id: &str,
        encrypted_amount: &str,
        encrypted_price: &str,
        proof: &str,
    ) -> Result<SubmissionReceipt, PipelineError> {
        let entry = self.new_entry(EntryPayload::Trade {
            credit_id: credit_id.to_string(),
            encrypted_amount: encrypted_amount.to_string(),
            encrypted_price: encrypted_price.to_string(),
            proof: proof.to_string(),
        });
        let receipt = self.write(&entry).await?;

        tracing::info!(
            transaction_id = %receipt.transaction_id,
            credit_id,
            "encrypted trade executed"
        );
        Ok(receipt)
    }

    // ========================
    // Market data
    // ========================

    /// Fabricate encoded aggregate figures. Nothing backs these: every call
    /// returns new random magnitudes unrelated to prior submissions.
    pub async fn fetch_aggregate_stats(&self) -> Result<MarketStats, PipelineError> {
        let total_credits = (self.entropy.next_f64() * 10_000.0).floor() as i64;
        let total_volume = (self.entropy.next_f64() * 100_000.0).floor() as i64;
        let average_price = self.entropy.next_f64() * 100.0;
        let active_trades = (self.entropy.next_f64() * 1_000.0).floor() as i64;

        let encode = |value: FieldValue| {
            self.cipher
                .encode_field(&value)
                .map_err(SubmissionError::MarketData)
                .inspect_err(|err| tracing::error!(error = %err, "failed to fetch market data"))
        };

        Ok(MarketStats {
            total_credits: encode(FieldValue::Integer(total_credits))?,
            total_volume: encode(FieldValue::Integer(total_volume))?,
            average_price: encode(FieldValue::Number(average_price))?,
            active_trades: encode(FieldValue::Integer(active_trades))?,
        })
    }

    fn new_entry(&self, payload: EntryPayload) -> LedgerEntry {
        let mut bytes = [0u8; 16];
        self.entropy.fill_bytes(&mut bytes);
        let id: Uuid = Builder::from_random_bytes(bytes).into_uuid();
        LedgerEntry::new(id, payload)
    }

    /// One logical write: latency, backend call, retries on transient failure.
    async fn write(&self, entry: &LedgerEntry) -> Result<SubmissionReceipt, PipelineError> {
        let span = tracing::info_span!(
            "ledger_write",
            entry_id = %entry.id,
            kind = entry.kind(),
            chain_id = self.config.chain_id
        );

        let backend = &self.backend;
        let latency = self.config.latency;
        let result = self
            .config
            .retry
            .run(entry.kind(), move |attempt| async move {
                tracing::debug!(attempt, "submitting entry");
                if !latency.is_zero() {
                    tokio::time::sleep(latency).await;
                }
                backend.write(entry)
            })
            .instrument(span)
            .await;

        match result {
            Ok(transaction_id) => Ok(SubmissionReceipt::new(transaction_id)),
            Err(err) => {
                tracing::error!(entry_id = %entry.id, error = %err, "ledger write failed");
                Err(err.into())
            }
        }
    }
}
