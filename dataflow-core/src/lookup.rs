//! Read-only collaborator traits used by completion.
//!
//! Implementations must tolerate concurrent reads; callers never mutate
//! through them and never cache results across completion calls.

use crate::error::LookupError;
use crate::{AppDefinition, AppRegistration, AppType, StreamDefinition};

/// Access to stored stream definitions.
pub trait StreamDefinitionLookup: Send + Sync {
    /// Find a stream by exact name.
    fn find_stream_definition(&self, name: &str) -> Result<Option<StreamDefinition>, LookupError>;

    /// All stored streams, in repository order.
    fn find_all_stream_definitions(&self) -> Result<Vec<StreamDefinition>, LookupError>;

    /// The apps deployed by `stream`, in pipeline order, each with its label.
    fn find_app_definitions(&self, stream: &StreamDefinition) -> Result<Vec<AppDefinition>, LookupError>;
}

/// Access to registered apps and their option metadata.
pub trait AppRegistry: Send + Sync {
    fn find(&self, name: &str, app_type: AppType) -> Result<Option<AppRegistration>, LookupError>;

    fn find_all(&self) -> Result<Vec<AppRegistration>, LookupError>;

    /// Registrations of any of the given types, in registry order.
    fn find_all_of(&self, types: &[AppType]) -> Result<Vec<AppRegistration>, LookupError> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|r| types.contains(&r.app_type))
            .collect())
    }
}
