//! Declarative descriptions of what a bridge exposes.
//!
//! Descriptors are data, not behavior: hosts read them to build
//! documentation, completions and capability grants, and the
//! [`MethodTable`](crate::MethodTable) reads them to validate calls.

use serde::{Deserialize, Serialize};
use spell_value::{DynamicValue, ValueKind};
use std::fmt;

/// Logical type of a parameter or return value as seen by scripts.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// Text.
    String,
    /// Any number.
    Number,
    /// True or false.
    Boolean,
    /// A mapping.
    Object,
    /// A sequence.
    Array,
    /// A script callable. Engines pass these opaquely, so they are not checked.
    Function,
    /// Anything, including null.
    Any,
}

impl TypeTag {
    /// Lower-case name used in manifests and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Object => "object",
            TypeTag::Array => "array",
            TypeTag::Function => "function",
            TypeTag::Any => "any",
        }
    }

    /// Best-effort structural check of an argument against this tag.
    ///
    /// Object and array tags check the value's kind. Scalar tags accept any
    /// scalar, since conversion may still coerce it. `Null` satisfies only
    /// `any` and `function`.
    pub fn accepts(&self, value: &DynamicValue) -> bool {
        match self {
            TypeTag::Any | TypeTag::Function => true,
            _ if value.is_null() => false,
            TypeTag::Object => value.kind() == ValueKind::Mapping,
            TypeTag::Array => value.kind() == ValueKind::Sequence,
            TypeTag::String | TypeTag::Number | TypeTag::Boolean => !value.kind().is_collection(),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parameter of a bridge method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    /// Parameter name, used in error messages.
    pub name: String,
    /// Logical type.
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    /// Whether callers must supply it.
    pub required: bool,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ParamDescriptor {
    /// A parameter callers must supply.
    pub fn required(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            type_tag,
            required: true,
            description: String::new(),
        }
    }

    /// A parameter callers may omit.
    pub fn optional(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            required: false,
            ..Self::required(name, type_tag)
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// One method a bridge exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Method name as scripts call it.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Parameters in positional order.
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
    /// Logical type of the result.
    pub returns: TypeTag,
    /// Capabilities the method needs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability>,
}

impl MethodDescriptor {
    /// A method with no parameters returning `any`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
            returns: TypeTag::Any,
            capabilities: Vec::new(),
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// Set the return type.
    #[must_use]
    pub fn returns(mut self, returns: TypeTag) -> Self {
        self.returns = returns;
        self
    }

    /// Declare a needed capability.
    #[must_use]
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Number of parameters callers must supply.
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }
}

/// Category of resource a capability grants access to.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    /// Files and directories.
    Filesystem,
    /// Outbound or inbound network access.
    Network,
    /// Spawning or signalling processes.
    Process,
    /// In-process shared memory, e.g. state stores.
    Memory,
    /// Clocks and timers.
    Time,
    /// Keys and cryptographic operations.
    Crypto,
    /// Persistent storage.
    Storage,
}

impl CapabilityKind {
    /// Lower-case name used in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Filesystem => "filesystem",
            CapabilityKind::Network => "network",
            CapabilityKind::Process => "process",
            CapabilityKind::Memory => "memory",
            CapabilityKind::Time => "time",
            CapabilityKind::Crypto => "crypto",
            CapabilityKind::Storage => "storage",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared need for access to a resource.
///
/// This is a manifest entry. The host grants or denies it before
/// initializing the bridge; nothing in this crate enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    /// Resource category.
    pub kind: CapabilityKind,
    /// Resource name within the category.
    pub resource: String,
    /// Allowed actions, e.g. `read`, `write`.
    #[serde(default)]
    pub actions: Vec<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Capability {
    /// A capability with no actions.
    pub fn new(kind: CapabilityKind, resource: impl Into<String>) -> Self {
        Self {
            kind,
            resource: resource.into(),
            actions: Vec::new(),
            description: String::new(),
        }
    }

    /// Set the allowed actions.
    #[must_use]
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.resource)?;
        if !self.actions.is_empty() {
            write!(f, " [{}]", self.actions.join(", "))?;
        }
        Ok(())
    }
}

/// Identity and provenance of a bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMetadata {
    /// Display name.
    pub name: String,
    /// Semantic version of the bridge.
    pub version: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Ids of bridges that must be initialized first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Author, if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// License identifier, if published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl BridgeMetadata {
    /// Metadata with a name and version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
            dependencies: Vec::new(),
            author: None,
            license: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Declare a bridge that must be initialized before this one.
    #[must_use]
    pub fn depends_on(mut self, bridge_id: impl Into<String>) -> Self {
        self.dependencies.push(bridge_id.into());
        self
    }

    /// Set the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the license identifier.
    #[must_use]
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }
}
