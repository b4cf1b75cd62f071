//! Error types for the completion engine

use dataflow_core::{ConfigError, LookupError};
use dataflow_dsl::ParseError;
use thiserror::Error;

/// Failures raised while building a provider or running one strategy.
///
/// `complete` itself never returns these: a failing strategy is logged and
/// contributes no proposals.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Failed to parse: {}", .0.formatted_message())]
    Parse(#[from] ParseError),

    #[error("Invalid completion config: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown completion strategy '{name}'")]
    UnknownStrategy { name: String },
}
