//! Dataflow Completion - Proposals for Partially Typed Definitions
//!
//! Given a prefix of a stream definition, propose complete continuations.
//! The prefix is parsed with `dataflow-dsl`:
//!
//! ```text
//! prefix ──► parse_stream ──┬─ Ok(stream) ──► expansion strategies ──┐
//!                           │                                        ├─► rank ──► Vec<Proposal>
//!                           └─ Err(error) ──► first recovery match ──┤
//!                                             (or fallback)          │
//! ```
//!
//! Stream and app metadata come from the read-only collaborators in
//! `dataflow-core`. A failing lookup never surfaces from `complete`; the
//! affected strategy is logged and skipped.

pub mod context;
pub mod error;
pub mod expansion;
pub mod proposal;
pub mod provider;
pub mod recovery;
pub mod task;

pub use context::CompletionContext;
pub use error::CompletionError;
pub use expansion::ExpansionStrategy;
pub use proposal::{explanation, Proposal};
pub use provider::StreamCompletionProvider;
pub use recovery::RecoveryStrategy;
pub use task::TaskCompletionProvider;

/// Names accepted in `CompletionConfig::disabled_strategies`.
pub fn strategy_names() -> Vec<&'static str> {
    RecoveryStrategy::ALL
        .iter()
        .map(RecoveryStrategy::name)
        .chain(ExpansionStrategy::ALL.iter().map(ExpansionStrategy::name))
        .collect()
}
