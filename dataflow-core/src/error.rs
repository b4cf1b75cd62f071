//! Error types for collaborator lookups

use thiserror::Error;

/// Failures reported by stream/app repositories.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Repository unavailable: {resource}: {reason}")]
    Unavailable { resource: String, reason: String },

    #[error("Stored definition {name} is unreadable: {reason}")]
    CorruptDefinition { name: String, reason: String },
}
