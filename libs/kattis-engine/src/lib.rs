pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod reporter;

#[cfg(test)]
mod session_tests;

pub use config::{ExitPolicy, SessionConfig};
pub use executor::TestSession;
