//! Script-side references to tracked contexts.

use serde::{Deserialize, Serialize};
use spell_state::InheritanceConfig;
use spell_value::{DynamicValue, Mapping};

/// The `type` tag every handle carries.
pub const HANDLE_TYPE: &str = "SharedStateContext";

/// What a script holds in place of a context: its id plus a snapshot of
/// its inheritance flags.
///
/// Only the id is read back; the flags are informational. Scripts may pass
/// either the whole handle or the bare id string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextHandle {
    /// Id of the tracked context.
    #[serde(rename = "_id")]
    pub id: String,
    /// Always [`HANDLE_TYPE`].
    #[serde(rename = "type", default = "handle_type")]
    pub handle_type: String,
    /// Whether parent messages are visible.
    #[serde(rename = "inheritMessages", default = "yes")]
    pub inherit_messages: bool,
    /// Whether parent artifacts are visible.
    #[serde(rename = "inheritArtifacts", default = "yes")]
    pub inherit_artifacts: bool,
    /// Whether parent metadata is visible.
    #[serde(rename = "inheritMetadata", default = "yes")]
    pub inherit_metadata: bool,
}

fn handle_type() -> String {
    HANDLE_TYPE.to_owned()
}

fn yes() -> bool {
    true
}

impl ContextHandle {
    /// A handle for context `id` with the given flags.
    pub fn new(id: impl Into<String>, inheritance: InheritanceConfig) -> Self {
        Self {
            id: id.into(),
            handle_type: handle_type(),
            inherit_messages: inheritance.messages,
            inherit_artifacts: inheritance.artifacts,
            inherit_metadata: inheritance.metadata,
        }
    }

    /// The flags recorded in this handle.
    pub fn inheritance(&self) -> InheritanceConfig {
        InheritanceConfig::new(
            self.inherit_messages,
            self.inherit_artifacts,
            self.inherit_metadata,
        )
    }

    /// Extract a context id from a boundary value.
    ///
    /// Accepts a bare id string or a mapping with a text `_id`. A mapping
    /// whose `type` is present but not [`HANDLE_TYPE`] is not a handle.
    pub fn id_of(value: &DynamicValue) -> Option<&str> {
        match value {
            DynamicValue::Text(id) => Some(id.as_str()),
            DynamicValue::Mapping(map) => {
                if map.get("type").is_some_and(|t| t.as_str() != Some(HANDLE_TYPE)) {
                    return None;
                }
                map.get("_id")?.as_str()
            }
            _ => None,
        }
    }

    /// Whether a mapping stands for a handle rather than a state object:
    /// it carries the handle tag or an `_id`. State objects use `id`.
    pub fn is_handle(map: &Mapping) -> bool {
        map.contains_key("_id")
            || map.get("type").and_then(DynamicValue::as_str) == Some(HANDLE_TYPE)
    }
}
