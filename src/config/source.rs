//! Demo message source configuration.

use serde::Deserialize;

use super::invalid;
use crate::error::ConfigError;

/// Placeholder replaced by a generated name in the templates below.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Settings for the generated workload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Number of messages to emit.
    #[serde(default = "default_messages")]
    pub messages: usize,
    /// Names substituted into the templates.
    #[serde(default = "default_names")]
    pub names: Vec<String>,
    /// Request URL template.
    #[serde(default = "default_destination_template")]
    pub destination_template: String,
    /// Request body template.
    #[serde(default = "default_data_template")]
    pub data_template: String,
    /// Seed for name selection; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

const fn default_messages() -> usize {
    10
}

fn default_names() -> Vec<String> {
    vec!["Alice".into(), "Bob".into()]
}

fn default_destination_template() -> String {
    "https://duckduckgo.com/?q={name}&t=h_&ia=web".into()
}

fn default_data_template() -> String {
    "Hi, {name}".into()
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.names.is_empty() {
            return Err(invalid("source.names", "must not be empty"));
        }
        if self.destination_template.is_empty() {
            return Err(ConfigError::MissingField {
                field: "source.destination_template",
            });
        }
        Ok(())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            messages: default_messages(),
            names: default_names(),
            destination_template: default_destination_template(),
            data_template: default_data_template(),
            seed: None,
        }
    }
}
