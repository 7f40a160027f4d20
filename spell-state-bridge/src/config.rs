//! Bridge configuration.

use serde::{Deserialize, Serialize};
use spell_value::ConverterConfig;

/// Settings for a [`StateContextBridge`](crate::StateContextBridge).
///
/// Every field has a default, so an empty table in a host's config file is
/// a valid configuration.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateBridgeConfig {
    /// Prefix of generated handle ids. Ids are `{prefix}{n}` with `n`
    /// counting up from 1.
    pub handle_prefix: String,

    /// Converter used for arguments and results.
    pub converter: ConverterConfig,
}

impl Default for StateBridgeConfig {
    fn default() -> Self {
        Self {
            handle_prefix: "context_".to_owned(),
            converter: ConverterConfig::default(),
        }
    }
}

impl StateBridgeConfig {
    /// Override the handle prefix.
    #[must_use]
    pub fn with_handle_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.handle_prefix = prefix.into();
        self
    }

    /// Override the converter settings.
    #[must_use]
    pub fn with_converter(mut self, converter: ConverterConfig) -> Self {
        self.converter = converter;
        self
    }
}
