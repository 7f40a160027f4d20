//! Conversion errors with a path to the first failing element.

use crate::value::ValueKind;
use std::fmt;
use thiserror::Error;

/// One step into a collection or record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Position in a sequence.
    Index(usize),
    /// Key of a mapping or name of a record member.
    Field(String),
}

/// Location of a failure inside a nested value, outermost segment first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Whether the failure happened at the root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
            }
        }
        Ok(())
    }
}

/// What went wrong during a conversion.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionErrorKind {
    /// The native shape has no boundary representation.
    #[error("unsupported shape {shape}: {reason}")]
    Unsupported {
        /// Name of the offending shape.
        shape: String,
        /// Why the structural fallback failed.
        reason: String,
    },

    /// The boundary value cannot be coerced into the target shape.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        /// Name of the target shape.
        expected: String,
        /// Tag of the source value.
        found: ValueKind,
    },

    /// Right tag, unusable content (unparsable number text, multi-char `char`).
    #[error("invalid {shape} value {value:?}")]
    InvalidValue {
        /// Name of the target shape.
        shape: String,
        /// Textual rendering of the rejected value.
        value: String,
    },

    /// NaN and infinities cannot round-trip through JSON.
    #[error("non-finite number {0}")]
    NonFinite(f64),

    /// Nesting exceeded the configured limit.
    #[error("nesting deeper than {limit} levels")]
    DepthExceeded {
        /// The configured maximum depth.
        limit: usize,
    },

    /// A record member with no zero value was absent from the mapping.
    #[error("missing field `{field}`")]
    MissingField {
        /// External name of the member.
        field: String,
    },

    /// Raised by a type's own serde implementation.
    #[error("{0}")]
    Custom(String),
}

/// A failed conversion between a native value and a [`DynamicValue`].
///
/// [`DynamicValue`]: crate::DynamicValue
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    kind: ConversionErrorKind,
    path: Path,
}

impl ConversionError {
    /// Create an error at the root of the value.
    pub fn new(kind: ConversionErrorKind) -> Self {
        Self {
            kind,
            path: Path::default(),
        }
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: ValueKind) -> Self {
        Self::new(ConversionErrorKind::Mismatch {
            expected: expected.into(),
            found,
        })
    }

    pub(crate) fn invalid(shape: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::InvalidValue {
            shape: shape.into(),
            value: value.into(),
        })
    }

    pub(crate) fn unsupported(shape: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::Unsupported {
            shape: shape.into(),
            reason: reason.into(),
        })
    }

    /// Prefix the path with the segment of the enclosing collection.
    #[must_use]
    pub fn at(mut self, segment: PathSegment) -> Self {
        self.path.0.insert(0, segment);
        self
    }

    /// What went wrong.
    pub fn kind(&self) -> &ConversionErrorKind {
        &self.kind
    }

    /// Where it went wrong.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the offending shape, when the failure names one.
    pub fn shape(&self) -> Option<&str> {
        match &self.kind {
            ConversionErrorKind::Unsupported { shape, .. }
            | ConversionErrorKind::InvalidValue { shape, .. } => Some(shape),
            ConversionErrorKind::Mismatch { expected, .. } => Some(expected),
            ConversionErrorKind::NonFinite(_) => Some("number"),
            _ => None,
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} at {}", self.kind, self.path)
        }
    }
}

impl std::error::Error for ConversionError {}

impl serde::ser::Error for ConversionError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::new(ConversionErrorKind::Custom(msg.to_string()))
    }
}

impl serde::de::Error for ConversionError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::new(ConversionErrorKind::Custom(msg.to_string()))
    }

    fn missing_field(field: &'static str) -> Self {
        Self::new(ConversionErrorKind::MissingField {
            field: field.to_owned(),
        })
    }
}
