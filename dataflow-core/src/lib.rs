//! Dataflow Core - Definition Types
//!
//! Plain data structures shared by the DSL and completion crates, plus the
//! read-only collaborator traits through which the completion engine reaches
//! stream and app repositories. No parsing lives here.

pub mod config;
pub mod error;
pub mod lookup;

pub use config::{CompletionConfig, ConfigError};
pub use error::LookupError;
pub use lookup::{AppRegistry, StreamDefinitionLookup};

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// APP TYPES
// ============================================================================

/// Role an app plays in a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppType {
    /// Produces data; only valid at the start of a stream.
    Source,
    /// Consumes and produces data; valid between a source and a sink.
    Processor,
    /// Consumes data; only valid at the end of a stream.
    Sink,
    /// Short-lived batch job used in task definitions.
    Task,
    /// Unbound app used in `a || b` lists.
    App,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Source => "source",
            AppType::Processor => "processor",
            AppType::Sink => "sink",
            AppType::Task => "task",
            AppType::App => "app",
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// DEFINITIONS
// ============================================================================

/// A named, stored stream definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDefinition {
    pub name: String,
    /// The DSL text the stream was created from.
    pub dsl: String,
    pub description: Option<String>,
}

impl StreamDefinition {
    pub fn new(name: impl Into<String>, dsl: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dsl: dsl.into(),
            description: None,
        }
    }
}

/// One deployed app inside a stored stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDefinition {
    /// Registered app name, e.g. `time`.
    pub name: String,
    /// Label unique within the owning stream; equals `name` when unlabelled.
    pub label: String,
    pub app_type: AppType,
    /// Properties in declaration order.
    pub properties: Vec<(String, String)>,
}

impl AppDefinition {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// APP REGISTRATIONS
// ============================================================================

/// Declared type of an app option's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    String,
    Integer,
    Boolean,
    Enumeration,
}

/// Metadata for one configurable option of a registered app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppOption {
    /// Dotted option name, e.g. `use.ssl`.
    pub name: String,
    pub description: String,
    pub option_type: OptionType,
    pub default_value: Option<String>,
    /// Explicit candidate values. Booleans get `true`/`false` when empty.
    #[serde(default)]
    pub hints: Vec<String>,
}

impl AppOption {
    pub fn new(name: impl Into<String>, description: impl Into<String>, option_type: OptionType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            option_type,
            default_value: None,
            hints: Vec::new(),
        }
    }

    pub fn with_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints = hints.into_iter().map(Into::into).collect();
        self
    }

    /// Candidate values offered when completing `--name=`.
    pub fn value_hints(&self) -> Vec<String> {
        if !self.hints.is_empty() {
            return self.hints.clone();
        }
        match self.option_type {
            OptionType::Boolean => vec!["false".to_string(), "true".to_string()],
            _ => Vec::new(),
        }
    }
}

/// An app known to the registry, with its option metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRegistration {
    pub name: String,
    pub app_type: AppType,
    pub description: String,
    #[serde(default)]
    pub options: Vec<AppOption>,
}

impl AppRegistration {
    pub fn new(name: impl Into<String>, app_type: AppType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app_type,
            description: description.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: AppOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn option(&self, name: &str) -> Option<&AppOption> {
        self.options.iter().find(|o| o.name == name)
    }
}

// ============================================================================
// TESTS
// ============================================================================
