// Application layer - services and the seams they are wired through.
// Services are built once at startup and passed by reference; nothing here
// holds process-wide state.

pub mod backend;
pub mod config;
pub mod encryption;
pub mod entropy;
pub mod error;
pub mod retry;
pub mod submission;

pub use backend::*;
pub use config::*;
pub use encryption::*;
pub use entropy::*;
pub use error::*;
pub use retry::*;
pub use submission::*;
