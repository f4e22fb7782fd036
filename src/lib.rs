pub mod application;
pub mod cli;
pub mod domain;

pub use application::{EncryptionService, LedgerSubmissionService, PipelineError};
pub use domain::*;
