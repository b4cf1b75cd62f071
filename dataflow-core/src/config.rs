//! Configuration loading for the completion engine.

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CompletionConfig {
    /// Upper bound on proposals returned by one `complete` call.
    pub max_proposals: usize,
    /// Strategy names to skip, e.g. `"tap-on-stream"`.
    pub disabled_strategies: Vec<String>,
    /// First numeric suffix used when auto-labelling a repeated app.
    pub label_suffix_start: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_proposals: 50,
            disabled_strategies: Vec::new(),
            label_suffix_start: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl CompletionConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CompletionConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_proposals == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_proposals",
                reason: "must be > 0".to_string(),
            });
        }
        if self.label_suffix_start < 2 {
            return Err(ConfigError::InvalidValue {
                field: "label_suffix_start",
                reason: "must be >= 2".to_string(),
            });
        }
        for (i, name) in self.disabled_strategies.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "disabled_strategies",
                    reason: "must not contain empty names".to_string(),
                });
            }
            if self.disabled_strategies[..i].contains(name) {
                return Err(ConfigError::InvalidValue {
                    field: "disabled_strategies",
                    reason: format!("'{}' listed twice", name),
                });
            }
        }
        Ok(())
    }

    pub fn is_disabled(&self, strategy: &str) -> bool {
        self.disabled_strategies.iter().any(|s| s == strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() -> Result<(), ConfigError> {
        let config = CompletionConfig::from_toml_str("")?;
        assert_eq!(config, CompletionConfig::default());
        Ok(())
    }

    #[test]
    fn test_full_document() -> Result<(), ConfigError> {
        let config = CompletionConfig::from_toml_str(
            r#"
max_proposals = 10
disabled_strategies = ["tap-on-stream"]
label_suffix_start = 3
"#,
        )?;
        assert_eq!(config.max_proposals, 10);
        assert!(config.is_disabled("tap-on-stream"));
        assert!(!config.is_disabled("tap-on-destination"));
        assert_eq!(config.label_suffix_start, 3);
        Ok(())
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = CompletionConfig::from_toml_str("max_proposal = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_max_proposals_rejected() {
        let err = CompletionConfig::from_toml_str("max_proposals = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "max_proposals",
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_disabled_strategy_rejected() {
        let config = CompletionConfig {
            disabled_strategies: vec!["a".to_string(), "a".to_string()],
            ..CompletionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CompletionConfig::from_path(Path::new("/nonexistent/completion.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
