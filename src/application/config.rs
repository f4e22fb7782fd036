use std::time::Duration;

use super::RetryPolicy;

/// Sepolia testnet.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

pub const DEFAULT_RPC_URL: &str = "https://sepolia.infura.io/v3/YOUR_INFURA_PROJECT_ID";

/// Stand-in for network round-trip time on each ledger write.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(2000);

/// Client configuration for the ledger service. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub chain_id: u64,
    /// Recorded for diagnostics only; nothing is sent to it
    pub rpc_url: String,
    pub latency: Duration,
    pub retry: RetryPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            latency: DEFAULT_LATENCY,
            retry: RetryPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// No latency and a single attempt.
    pub fn instant() -> Self {
        Self {
            latency: Duration::ZERO,
            retry: RetryPolicy::none(),
            ..Self::default()
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
