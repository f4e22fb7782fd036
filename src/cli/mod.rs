use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use clap::{Parser, Subcommand};

use crate::application::{
    DEFAULT_CHAIN_ID, DEFAULT_RPC_URL, EncryptionService, Entropy, LedgerConfig,
    LedgerSubmissionService, PipelineError, RetryPolicy, SystemEntropy,
};
use crate::domain::{
    EncodedFields, FieldValue, PlaintextRecord, ProjectType, PublicMetadata, RecordField,
    TradeSide, validate_credit, validate_trade,
};

/// Greenveil - confidential carbon-credit marketplace
#[derive(Parser, Debug)]
#[command(name = "greenveil")]
#[command(about = "Encrypt carbon-credit attributes and submit them to a simulated ledger")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// RPC endpoint of the settlement chain
    #[arg(long, env = "GREENVEIL_RPC_URL", default_value = DEFAULT_RPC_URL, global = true)]
    pub rpc_url: String,

    /// Chain id of the settlement chain
    #[arg(long, env = "GREENVEIL_CHAIN_ID", default_value_t = DEFAULT_CHAIN_ID, global = true)]
    pub chain_id: u64,

    /// Simulated network latency per ledger write, in milliseconds
    #[arg(long, default_value_t = 2000, global = true)]
    pub latency_ms: u64,

    /// Attempts per ledger write before giving up
    #[arg(long, default_value_t = 3, global = true)]
    pub max_attempts: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt a new carbon credit and record it on the ledger
    Create {
        /// Project type: renewable_energy, forest_conservation, carbon_capture, energy_efficiency
        #[arg(short = 't', long = "project-type")]
        project_type: String,

        /// Project location
        #[arg(short, long)]
        location: String,

        /// Amount in tons of CO2
        #[arg(short, long)]
        amount: f64,

        /// Price per ton (USD)
        #[arg(short, long)]
        price: f64,

        /// Vintage year (defaults to the current year)
        #[arg(long)]
        vintage: Option<i32>,

        /// Duration in days
        #[arg(short, long, default_value_t = 365)]
        duration: u32,

        /// Print the raw encrypted tokens
        #[arg(long)]
        show_tokens: bool,
    },

    /// Place an encrypted trade order for an existing credit
    Trade {
        /// Credit identifier
        #[arg(long)]
        credit_id: String,

        /// Amount in tons (max 10,000 per order)
        #[arg(short, long)]
        amount: f64,

        /// Price per ton (USD)
        #[arg(short, long)]
        price: f64,

        /// Order side: buy, sell
        #[arg(short, long, default_value = "buy")]
        side: String,

        /// Print the raw encrypted tokens
        #[arg(long)]
        show_tokens: bool,
    },

    /// Encrypt a single value
    Encode {
        /// Number or text; integers and decimals are detected
        value: String,

        /// Encode as a decimal, the way record amounts and prices are
        #[arg(long)]
        number: bool,
    },

    /// Decrypt a token
    Decode {
        /// Hex-wrapped token
        token: String,
    },

    /// Check a token against a proof
    Verify {
        /// Hex-wrapped token
        token: String,

        /// Hex-wrapped proof
        proof: String,

        /// Only accept a match against this field: amount, price, credit_type, vintage
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Show encrypted market statistics
    Stats {
        /// Decrypt the figures before printing
        #[arg(long)]
        reveal: bool,
    },
}

/// Services constructed once at startup and shared by every command.
pub struct Services {
    pub cipher: Arc<EncryptionService>,
    pub ledger: LedgerSubmissionService,
}

impl Services {
    pub fn new(entropy: Arc<dyn Entropy>, config: LedgerConfig) -> Self {
        let cipher = Arc::new(EncryptionService::new(entropy.clone()));
        let ledger = LedgerSubmissionService::simulated(cipher.clone(), entropy, config);
        Self { cipher, ledger }
    }
}

impl Cli {
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig::default()
            .with_chain_id(self.chain_id)
            .with_rpc_url(self.rpc_url.clone())
            .with_latency(Duration::from_millis(self.latency_ms))
            .with_retry(RetryPolicy::default().with_max_attempts(self.max_attempts))
    }

    pub async fn run(self) -> Result<()> {
        let config = self.ledger_config();
        tracing::debug!(
            chain_id = config.chain_id,
            rpc_url = %config.rpc_url,
            latency_ms = self.latency_ms,
            "client configured"
        );
        let services = Services::new(Arc::new(SystemEntropy), config);
        self.execute(&services).await
    }

    pub async fn execute(self, services: &Services) -> Result<()> {
        match self.command {
            Commands::Create {
                project_type,
                location,
                amount,
                price,
                vintage,
                duration,
                show_tokens,
            } => {
                let project_type = ProjectType::from_str(&project_type).with_context(|| {
                    format!(
                        "Unknown project type '{}'. Use one of: {}",
                        project_type,
                        project_type_names()
                    )
                })?;
                let current_year = Utc::now().year();
                let record = PlaintextRecord::new(
                    amount,
                    price,
                    project_type.as_str(),
                    vintage.unwrap_or(current_year),
                );
                let metadata = PublicMetadata::new(project_type, location, duration);

                run_create_command(services, &record, &metadata, current_year, show_tokens).await?;
            }

            Commands::Trade {
                credit_id,
                amount,
                price,
                side,
                show_tokens,
            } => {
                let side = TradeSide::from_str(&side)
                    .with_context(|| format!("Invalid order side '{}'. Use buy or sell", side))?;
                run_trade_command(services, &credit_id, amount, price, side, show_tokens).await?;
            }

            Commands::Encode { value, number } => {
                let token = run_encode_command(services, &value, number)?;
                println!("{}", token);
            }

            Commands::Decode { token } => {
                run_decode_command(services, &token)?;
            }

            Commands::Verify {
                token,
                proof,
                field,
            } => {
                let field = field
                    .map(|f| {
                        RecordField::from_str(&f).with_context(|| {
                            format!("Unknown field '{}'. Use amount, price, credit_type or vintage", f)
                        })
                    })
                    .transpose()?;
                let valid = run_verify_command(services, &token, &proof, field)?;
                if valid {
                    println!("valid");
                } else {
                    println!("invalid");
                }
            }

            Commands::Stats { reveal } => {
                run_stats_command(services, reveal).await?;
            }
        }

        Ok(())
    }
}

fn project_type_names() -> String {
    ProjectType::all()
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

async fn run_create_command(
    services: &Services,
    record: &PlaintextRecord,
    metadata: &PublicMetadata,
    current_year: i32,
    show_tokens: bool,
) -> Result<()> {
    validate_credit(record, metadata, current_year)
        .map_err(PipelineError::from)
        .context("Form validation failed")?;

    let encoded = services
        .cipher
        .encode_record(record)
        .map_err(PipelineError::from)
        .context("Carbon credit creation failed")?;

    let receipt = services
        .ledger
        .submit_record(&encoded, metadata)
        .await
        .context("Failed to create carbon credit on blockchain")?;

    println!(
        "Carbon credit encrypted and created on blockchain. Transaction: {}",
        receipt.short_id()
    );
    println!(
        "  {} in {} for {} days",
        metadata.project_type, metadata.location, metadata.duration
    );
    if show_tokens {
        print_encoded_fields(&encoded);
    }
    Ok(())
}

async fn run_trade_command(
    services: &Services,
    credit_id: &str,
    amount: f64,
    price: f64,
    side: TradeSide,
    show_tokens: bool,
) -> Result<()> {
    validate_trade(credit_id, amount, price)
        .map_err(PipelineError::from)
        .context("Order validation failed")?;

    let fields = services
        .cipher
        .encode_trade(amount, price)
        .map_err(PipelineError::from)
        .context("Failed to encrypt order")?;

    let receipt = services
        .ledger
        .submit_trade(
            credit_id,
            &fields.encrypted_amount,
            &fields.encrypted_price,
            &fields.proof,
        )
        .await
        .context("Failed to execute trade on blockchain")?;

    let label = match side {
        TradeSide::Buy => "Buy",
        TradeSide::Sell => "Sell",
    };
    println!(
        "{} order submitted, awaiting match. Transaction: {}",
        label,
        receipt.short_id()
    );
    if show_tokens {
        println!("  amount: {}", fields.encrypted_amount);
        println!("  price:  {}", fields.encrypted_price);
        println!("  proof:  {}", fields.proof);
    }
    Ok(())
}

/// `encode 50` yields an integer token, which does not match a price digest;
/// `encode --number 50` encodes `50.0`.
fn run_encode_command(services: &Services, value: &str, number: bool) -> Result<String> {
    let value = if number {
        let n = value
            .trim()
            .parse::<f64>()
            .with_context(|| format!("'{}' is not a number", value))?;
        FieldValue::Number(n)
    } else {
        FieldValue::infer(value)
    };

    let token = services
        .cipher
        .encode_field(&value)
        .map_err(PipelineError::from)
        .context("Failed to encrypt value")?;
    Ok(token)
}

fn run_decode_command(services: &Services, token: &str) -> Result<()> {
    let payload = services
        .cipher
        .decode_payload(token)
        .map_err(PipelineError::from)
        .context("Invalid token")?;

    println!("Value:     {}", payload.value);
    match DateTime::<Utc>::from_timestamp_millis(payload.timestamp) {
        Some(at) => println!("Encrypted: {}", at.format("%Y-%m-%d %H:%M:%S%.3f UTC")),
        None => println!("Encrypted: {} (ms)", payload.timestamp),
    }
    println!("Nonce:     {}", payload.nonce);
    Ok(())
}

fn run_verify_command(
    services: &Services,
    token: &str,
    proof: &str,
    field: Option<RecordField>,
) -> Result<bool> {
    let valid = match field {
        Some(field) => services.cipher.verify_field(field, token, proof),
        None => services.cipher.verify_integrity(token, proof),
    }
    .map_err(PipelineError::from)
    .context("Invalid token")?;

    if !valid {
        tracing::info!("token does not match proof");
    }
    Ok(valid)
}

async fn run_stats_command(services: &Services, reveal: bool) -> Result<()> {
    let stats = services
        .ledger
        .fetch_aggregate_stats()
        .await
        .context("Failed to fetch market data")?;

    for (label, token) in stats.entries() {
        if reveal {
            let value = services
                .cipher
                .decode_token(token)
                .map_err(PipelineError::from)
                .with_context(|| format!("Failed to decrypt {}", label))?;
            let shown = match value {
                FieldValue::Number(n) => format!("{:.2}", n),
                other => other.to_string(),
            };
            println!("{:<14} {}", label, shown);
        } else {
            println!("{:<14} {}", label, token);
        }
    }
    Ok(())
}

fn print_encoded_fields(encoded: &EncodedFields) {
    for field in RecordField::ALL {
        println!("  {:<11} {}", field.as_str(), encoded.token(field));
    }
    println!("  {:<11} {}", "proof", encoded.proof);
}
