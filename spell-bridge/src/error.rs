//! The single error type that crosses the script boundary.

use spell_value::ConversionError;
use thiserror::Error;

/// Every failure a bridge call can produce.
///
/// Messages name the bridge, method and parameter involved so a script
/// author can act on them without reading host logs.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No bridge with this id is registered.
    #[error("bridge not found: {0}")]
    BridgeNotFound(String),

    /// A bridge with this id is already registered.
    #[error("bridge already registered: {0}")]
    AlreadyRegistered(String),

    /// The bridge was called before `initialize` (or after `cleanup`).
    #[error("bridge {0} is not initialized")]
    NotInitialized(String),

    /// Bridge dependencies form a cycle. Ids are listed in visit order.
    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// A bridge depends on one that is not registered.
    #[error("bridge {bridge} depends on unregistered bridge {dependency}")]
    MissingDependency {
        /// The dependent bridge.
        bridge: String,
        /// The missing dependency.
        dependency: String,
    },

    /// The method is not in the bridge's method table.
    #[error("method {method} not found on bridge {bridge}")]
    MethodNotFound {
        /// Bridge id.
        bridge: String,
        /// Requested method.
        method: String,
    },

    /// Fewer arguments than required parameters.
    #[error("{method}: expected at least {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Method name.
        method: String,
        /// Number of required parameters.
        expected: usize,
        /// Number of arguments supplied.
        actual: usize,
    },

    /// An argument's shape contradicts the declared parameter type.
    #[error("{method}: argument {index} ({param}) expected {expected}, got {actual}")]
    ArgumentType {
        /// Method name.
        method: String,
        /// Parameter name.
        param: String,
        /// Zero-based argument position.
        index: usize,
        /// Declared type.
        expected: String,
        /// Kind of the value supplied.
        actual: String,
    },

    /// An argument passed validation but could not be converted.
    #[error("{method}: cannot convert argument {index} ({param}): {source}")]
    ArgumentConversion {
        /// Method name.
        method: String,
        /// Parameter name.
        param: String,
        /// Zero-based argument position.
        index: usize,
        /// The conversion failure.
        source: ConversionError,
    },

    /// The method's native result could not be converted.
    #[error("{method}: cannot convert result: {source}")]
    ResultConversion {
        /// Method name.
        method: String,
        /// The conversion failure.
        source: ConversionError,
    },

    /// A context handle does not resolve to a tracked context.
    #[error("context not found: {0}")]
    ContextNotFound(String),

    /// The wrapped operation failed.
    #[error("{method}: {source}")]
    Domain {
        /// Method name.
        method: String,
        /// The underlying failure.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl BridgeError {
    /// Wrap a failure of the underlying operation with the method name.
    pub fn domain(
        method: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        BridgeError::Domain {
            method: method.into(),
            source: source.into(),
        }
    }
}
