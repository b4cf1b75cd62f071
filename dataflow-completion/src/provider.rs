//! Stream completion provider

use crate::context::CompletionContext;
use crate::error::CompletionError;
use crate::expansion::ExpansionStrategy;
use crate::proposal::{rank, Proposal};
use crate::recovery::{fallback, RecoveryStrategy};
use crate::strategy_names;
use dataflow_core::{AppRegistry, CompletionConfig, StreamDefinitionLookup};
use dataflow_dsl::{parse_stream, ParseError, StreamNode};
use std::sync::Arc;

/// Proposes continuations of a partially typed stream definition.
///
/// The prefix is parsed once. A successful parse runs the expansion
/// strategies; a failure runs the first recovery strategy whose trigger
/// matches, or the generic fallback when none does.
pub struct StreamCompletionProvider {
    lookup: Arc<dyn StreamDefinitionLookup>,
    registry: Arc<dyn AppRegistry>,
    config: CompletionConfig,
}

impl StreamCompletionProvider {
    pub fn new(lookup: Arc<dyn StreamDefinitionLookup>, registry: Arc<dyn AppRegistry>) -> Self {
        Self {
            lookup,
            registry,
            config: CompletionConfig::default(),
        }
    }

    /// Replace the configuration. Unknown strategy names in
    /// `disabled_strategies` are rejected.
    pub fn with_config(mut self, config: CompletionConfig) -> Result<Self, CompletionError> {
        config.validate()?;
        let known = strategy_names();
        if let Some(name) = config.disabled_strategies.iter().find(|n| !known.contains(&n.as_str())) {
            return Err(CompletionError::UnknownStrategy { name: name.clone() });
        }
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Ranked proposals for `prefix`. Never fails: a strategy that errors
    /// is logged and contributes nothing.
    pub fn complete(&self, prefix: &str, detail_level: u32) -> Vec<Proposal> {
        let ctx = CompletionContext {
            lookup: self.lookup.as_ref(),
            registry: self.registry.as_ref(),
            config: &self.config,
            detail_level,
        };

        let mut proposals = Vec::new();
        match parse_stream(prefix) {
            Ok(stream) => self.expand(prefix, &stream, &ctx, &mut proposals),
            Err(error) => {
                tracing::debug!(
                    code = error.code(),
                    offset = error.offset,
                    "prefix does not parse, trying recovery"
                );
                self.recover(prefix, &error, &ctx, &mut proposals);
            }
        }
        rank(prefix, proposals, self.config.max_proposals)
    }

    fn expand(&self, prefix: &str, stream: &StreamNode, ctx: &CompletionContext<'_>, out: &mut Vec<Proposal>) {
        for strategy in ExpansionStrategy::ALL {
            if self.config.is_disabled(strategy.name()) {
                continue;
            }
            let mut found = Vec::new();
            match strategy.add_proposals(prefix, stream, ctx, &mut found) {
                Ok(()) => out.extend(found),
                Err(e) => tracing::warn!(strategy = strategy.name(), error = %e, "Expansion strategy failed"),
            }
        }
    }

    fn recover(&self, prefix: &str, error: &ParseError, ctx: &CompletionContext<'_>, out: &mut Vec<Proposal>) {
        let strategy = RecoveryStrategy::ALL
            .into_iter()
            .filter(|s| !self.config.is_disabled(s.name()))
            .find(|s| s.should_trigger(prefix, error));

        let mut found = Vec::new();
        let (name, result) = match strategy {
            Some(strategy) => (strategy.name(), strategy.add_proposals(prefix, error, ctx, &mut found)),
            None => ("fallback", fallback::add_proposals(prefix, error, ctx, &mut found)),
        };
        match result {
            Ok(()) => out.extend(found),
            Err(e) => tracing::warn!(strategy = name, error = %e, "Recovery strategy failed"),
        }
    }
}
