//! Converter configuration and the two boundary entry points.

use crate::de;
use crate::error::ConversionError;
use crate::ser::ValueSerializer;
use crate::value::DynamicValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Tunables for a [`Converter`].
///
/// Deserializable so hosts can keep it next to the rest of their
/// configuration; every field has a default.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Maximum nesting of sequences, mappings and records. Deeper values
    /// fail with `DepthExceeded` rather than recursing without bound.
    pub max_depth: usize,

    /// Let text coerce into numbers and booleans (`"42"` → 42,
    /// `"false"` → false). Number and null coercions are always on.
    pub lenient_text: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            lenient_text: true,
        }
    }
}

impl ConverterConfig {
    /// Override the nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Toggle text coercion.
    #[must_use]
    pub fn with_lenient_text(mut self, lenient_text: bool) -> Self {
        self.lenient_text = lenient_text;
        self
    }
}

/// Bidirectional marshalling between native values and [`DynamicValue`].
///
/// Any type implementing serde's traits converts without further
/// boilerplate. Field names follow the type's serde attributes:
/// `#[serde(rename)]` overrides, `#[serde(rename_all)]` applies a case
/// convention, `#[serde(skip)]` omits.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    /// Create a converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert a native value into its boundary representation.
    pub fn to_boundary<T>(&self, value: &T) -> Result<DynamicValue, ConversionError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(ValueSerializer::new(&self.config, 0))
    }

    /// Convert a boundary value into the native target type `T`.
    pub fn from_boundary<T>(&self, value: DynamicValue) -> Result<T, ConversionError>
    where
        T: DeserializeOwned,
    {
        de::from_value(value, &self.config)
    }
}

/// Convert a native value with the default configuration.
pub fn to_boundary<T>(value: &T) -> Result<DynamicValue, ConversionError>
where
    T: Serialize + ?Sized,
{
    value.serialize(ValueSerializer::new(&ConverterConfig::default(), 0))
}

/// Convert a boundary value into `T` with the default configuration.
pub fn from_boundary<T>(value: DynamicValue) -> Result<T, ConversionError>
where
    T: DeserializeOwned,
{
    de::from_value(value, &ConverterConfig::default())
}
