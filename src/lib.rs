pub mod baker;
pub mod cli;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod runtime;
pub mod secrets;

pub use baker::{HookOutcome, SecretBaker};
pub use error::{BakeError, RuntimeError};
