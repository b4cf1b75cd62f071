//! Dataflow Test Utilities
//!
//! Shared test infrastructure for the dataflow workspace:
//! - In-memory stream and app repositories
//! - Failing collaborators for error-path tests
//! - Proptest generators for completion prefixes
//! - Fixtures matching the ticktock example streams
//! - Proposal assertions

pub use dataflow_core::{
    AppDefinition, AppOption, AppRegistration, AppRegistry, AppType, LookupError, OptionType,
    StreamDefinition, StreamDefinitionLookup,
};

use dataflow_dsl::parse_named_stream;

// ============================================================================
// IN-MEMORY COLLABORATORS
// ============================================================================

/// Stream repository backed by a `Vec`, in insertion order.
///
/// App definitions are derived by parsing each stored DSL, so labels and
/// app types always agree with the parser.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStreamDefinitions {
    streams: Vec<StreamDefinition>,
}

impl InMemoryStreamDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(mut self, name: impl Into<String>, dsl: impl Into<String>) -> Self {
        self.streams.push(StreamDefinition::new(name, dsl));
        self
    }

    pub fn with_definition(mut self, definition: StreamDefinition) -> Self {
        self.streams.push(definition);
        self
    }
}

impl StreamDefinitionLookup for InMemoryStreamDefinitions {
    fn find_stream_definition(&self, name: &str) -> Result<Option<StreamDefinition>, LookupError> {
        Ok(self.streams.iter().find(|s| s.name == name).cloned())
    }

    fn find_all_stream_definitions(&self) -> Result<Vec<StreamDefinition>, LookupError> {
        Ok(self.streams.clone())
    }

    fn find_app_definitions(&self, stream: &StreamDefinition) -> Result<Vec<AppDefinition>, LookupError> {
        let node = parse_named_stream(&stream.name, &stream.dsl).map_err(|e| LookupError::CorruptDefinition {
            name: stream.name.clone(),
            reason: e.formatted_message(),
        })?;
        Ok(node
            .apps
            .iter()
            .zip(node.app_types())
            .map(|(app, app_type)| AppDefinition {
                name: app.name.clone(),
                label: app.label_name().to_string(),
                app_type,
                properties: app
                    .properties()
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
            .collect())
    }
}

/// App registry backed by a `Vec`, in registration order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAppRegistry {
    registrations: Vec<AppRegistration>,
}

impl InMemoryAppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, registration: AppRegistration) -> Self {
        self.registrations.push(registration);
        self
    }
}

impl AppRegistry for InMemoryAppRegistry {
    fn find(&self, name: &str, app_type: AppType) -> Result<Option<AppRegistration>, LookupError> {
        Ok(self
            .registrations
            .iter()
            .find(|r| r.name == name && r.app_type == app_type)
            .cloned())
    }

    fn find_all(&self) -> Result<Vec<AppRegistration>, LookupError> {
        Ok(self.registrations.clone())
    }
}

// ============================================================================
// FAILING COLLABORATORS
// ============================================================================

fn unavailable(resource: &str) -> LookupError {
    LookupError::Unavailable {
        resource: resource.to_string(),
        reason: "connection refused".to_string(),
    }
}

/// Stream repository whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingLookup;

impl StreamDefinitionLookup for FailingLookup {
    fn find_stream_definition(&self, _name: &str) -> Result<Option<StreamDefinition>, LookupError> {
        Err(unavailable("streams"))
    }

    fn find_all_stream_definitions(&self) -> Result<Vec<StreamDefinition>, LookupError> {
        Err(unavailable("streams"))
    }

    fn find_app_definitions(&self, _stream: &StreamDefinition) -> Result<Vec<AppDefinition>, LookupError> {
        Err(unavailable("streams"))
    }
}

/// App registry whose every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRegistry;

impl AppRegistry for FailingRegistry {
    fn find(&self, _name: &str, _app_type: AppType) -> Result<Option<AppRegistration>, LookupError> {
        Err(unavailable("apps"))
    }

    fn find_all(&self) -> Result<Vec<AppRegistration>, LookupError> {
        Err(unavailable("apps"))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest generators for completion inputs.

    use proptest::prelude::*;

    const STREAM_FRAGMENTS: &[&str] = &[
        "http", "hdfs", "filter", "transform", "log", "time", "foo", " ", " ", "|", "||", ">", ":",
        ".", "-", "--", "=", "port", "use.ssl", "expresso", "tap:stream:", "ticktock", "queue:",
        "'", "\"", "x", "1234", "\n", ";", "é",
    ];

    const TASK_FRAGMENTS: &[&str] = &[
        "timestamp", "extract", "load", "a", " ", " ", "&&", "||", "<", ">", "->", "'FAILED'", "0",
        "*", ":", "(", ")", "$END", "--", "=", "\n", ";",
    ];

    fn arb_from_fragments(fragments: &'static [&'static str]) -> impl Strategy<Value = String> {
        prop::collection::vec(prop::sample::select(fragments), 0..12).prop_map(|parts| parts.concat())
    }

    /// Prefix built from stream DSL fragments, usually malformed.
    pub fn arb_stream_prefix() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => arb_from_fragments(STREAM_FRAGMENTS),
            1 => "\\PC{0,40}",
        ]
    }

    /// Prefix built from task DSL fragments, usually malformed.
    pub fn arb_task_prefix() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => arb_from_fragments(TASK_FRAGMENTS),
            1 => "\\PC{0,40}",
        ]
    }

    pub fn arb_detail_level() -> impl Strategy<Value = u32> {
        0u32..4
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built repositories shared by the completion tests.

    use super::*;

    /// Registry with:
    /// - sources `http` (`port`, `use.ssl`), `hdfs`, `time`
    /// - processors `filter` (`expression`, `expresso`), `transform`
    /// - sink `log`
    /// - tasks `timestamp`, `timestamp-batch`, `extract`, `load`
    pub fn app_registry() -> InMemoryAppRegistry {
        InMemoryAppRegistry::new()
            .with(
                AppRegistration::new("http", AppType::Source, "Receives HTTP requests. Listens on the configured port.")
                    .with_option(AppOption::new("port", "The port to listen on.", OptionType::Integer))
                    .with_option(AppOption::new("use.ssl", "Whether to serve over TLS.", OptionType::Boolean)),
            )
            .with(AppRegistration::new("hdfs", AppType::Source, "Reads files from HDFS."))
            .with(AppRegistration::new("time", AppType::Source, "Emits the current time. Ticks once per second."))
            .with(
                AppRegistration::new("filter", AppType::Processor, "Drops messages that do not match.")
                    .with_option(AppOption::new(
                        "expression",
                        "SpEL expression to evaluate. Messages evaluating to false are dropped.",
                        OptionType::String,
                    ))
                    .with_option(
                        AppOption::new("expresso", "Strength of the coffee.", OptionType::Enumeration)
                            .with_hints(["SINGLE", "DOUBLE"]),
                    ),
            )
            .with(AppRegistration::new("transform", AppType::Processor, "Transforms each payload."))
            .with(AppRegistration::new("log", AppType::Sink, "Logs each message."))
            .with(AppRegistration::new("timestamp", AppType::Task, "Logs the current time. Exits immediately."))
            .with(AppRegistration::new("timestamp-batch", AppType::Task, "Logs the time as a batch job."))
            .with(AppRegistration::new("extract", AppType::Task, "Extracts records."))
            .with(AppRegistration::new("load", AppType::Task, "Loads records."))
    }

    /// Streams `ticktock`, `foo` and `bar`.
    pub fn ticktock_streams() -> InMemoryStreamDefinitions {
        InMemoryStreamDefinitions::new()
            .with_definition(StreamDefinition {
                description: Some("Logs the time every second.".to_string()),
                ..StreamDefinition::new("ticktock", "time | log")
            })
            .with_stream("foo", "time | transform | log")
            .with_stream("bar", "time | log")
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over proposal texts.

    /// Assert that `texts` contains `expected`.
    #[track_caller]
    pub fn assert_proposes<S: AsRef<str>>(texts: &[S], expected: &str) {
        assert!(
            texts.iter().any(|t| t.as_ref() == expected),
            "Expected proposal {:?} in {:?}",
            expected,
            texts.iter().map(AsRef::as_ref).collect::<Vec<&str>>()
        );
    }

    /// Assert that `texts` does not contain `unexpected`.
    #[track_caller]
    pub fn assert_not_proposes<S: AsRef<str>>(texts: &[S], unexpected: &str) {
        assert!(
            texts.iter().all(|t| t.as_ref() != unexpected),
            "Did not expect proposal {:?} in {:?}",
            unexpected,
            texts.iter().map(AsRef::as_ref).collect::<Vec<&str>>()
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
