mod ledger;
mod record;
mod token;
mod validation;

pub use ledger::*;
pub use record::*;
pub use token::*;
pub use validation::*;
