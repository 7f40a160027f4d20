//! Artifacts: named binary outputs attached to a state.

use serde::{Deserialize, Serialize};
use spell_value::{DynamicValue, Mapping};
use uuid::Uuid;

/// Broad category of an artifact.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// Opaque data.
    #[default]
    Data,
    /// An image.
    Image,
    /// A document.
    Document,
    /// Source code.
    Code,
}

impl ArtifactType {
    fn default_mime_type(self) -> &'static str {
        match self {
            ArtifactType::Data => "application/octet-stream",
            ArtifactType::Image => "image/png",
            ArtifactType::Document => "text/plain",
            ArtifactType::Code => "text/plain",
        }
    }
}

/// A named binary output. Immutable once built.
///
/// The boundary form uses camelCase member names (`mimeType`) and carries
/// `data` as a sequence of byte values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    artifact_type: ArtifactType,
    #[serde(default)]
    data: Vec<u8>,
    #[serde(default)]
    size: usize,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    metadata: Mapping,
}

impl Artifact {
    /// A new artifact with a fresh id and a MIME type implied by its type.
    pub fn new(name: impl Into<String>, artifact_type: ArtifactType, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            artifact_type,
            size: data.len(),
            data,
            mime_type: artifact_type.default_mime_type().to_owned(),
            metadata: Mapping::new(),
        }
    }

    /// Replace the generated id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Override the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<DynamicValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Unique id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category.
    pub fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }

    /// Raw bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes as recorded at creation.
    pub fn size(&self) -> usize {
        self.size
    }

    /// MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Free-form metadata.
    pub fn metadata(&self) -> &Mapping {
        &self.metadata
    }
}
