//! Owned state and the read-only view of it.

use crate::artifact::Artifact;
use crate::message::Message;
use serde::{Deserialize, Serialize};
use spell_value::{DynamicValue, Mapping};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Read-only view of state.
///
/// A child context receives its parent as `Arc<dyn StateReader>`, so it
/// can read everything the parent holds but has no way to write to it.
/// Methods return owned values because implementations may sit behind a
/// lock.
pub trait StateReader: Send + Sync {
    /// Look up a value.
    fn get(&self, key: &str) -> Option<DynamicValue>;

    /// Whether a value exists.
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All value keys, sorted.
    fn keys(&self) -> Vec<String>;

    /// All values.
    fn values(&self) -> Mapping;

    /// Look up an artifact by id.
    fn get_artifact(&self, id: &str) -> Option<Artifact>;

    /// All artifacts keyed by id.
    fn artifacts(&self) -> BTreeMap<String, Artifact>;

    /// Conversation history, oldest first.
    fn messages(&self) -> Vec<Message>;

    /// Look up a metadata entry.
    fn get_metadata(&self, key: &str) -> Option<DynamicValue>;

    /// All metadata.
    fn metadata(&self) -> Mapping;
}

/// The state owned by one component: values, metadata, messages and
/// artifacts.
///
/// On the boundary, values appear under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default = "new_id")]
    id: String,
    #[serde(rename = "data", default)]
    values: Mapping,
    #[serde(default)]
    metadata: Mapping,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    artifacts: BTreeMap<String, Artifact>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// An empty state with a fresh id.
    pub fn new() -> Self {
        Self {
            id: new_id(),
            values: Mapping::new(),
            metadata: Mapping::new(),
            messages: Vec::new(),
            artifacts: BTreeMap::new(),
        }
    }

    /// Replace the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Unique id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<DynamicValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.values.get(key)
    }

    /// Remove a value, returning it.
    pub fn delete(&mut self, key: &str) -> Option<DynamicValue> {
        self.values.remove(key)
    }

    /// Whether a value exists.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// All values.
    pub fn values(&self) -> &Mapping {
        &self.values
    }

    /// Set a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<DynamicValue>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Look up a metadata entry.
    pub fn get_metadata(&self, key: &str) -> Option<&DynamicValue> {
        self.metadata.get(key)
    }

    /// All metadata.
    pub fn metadata(&self) -> &Mapping {
        &self.metadata
    }

    /// Append a message.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Conversation history, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Add an artifact, replacing any with the same id.
    pub fn add_artifact(&mut self, artifact: Artifact) {
        self.artifacts.insert(artifact.id().to_owned(), artifact);
    }

    /// Look up an artifact by id.
    pub fn get_artifact(&self, id: &str) -> Option<&Artifact> {
        self.artifacts.get(id)
    }

    /// All artifacts keyed by id.
    pub fn artifacts(&self) -> &BTreeMap<String, Artifact> {
        &self.artifacts
    }
}

impl StateReader for State {
    fn get(&self, key: &str) -> Option<DynamicValue> {
        State::get(self, key).cloned()
    }

    fn has(&self, key: &str) -> bool {
        State::has(self, key)
    }

    fn keys(&self) -> Vec<String> {
        State::keys(self)
    }

    fn values(&self) -> Mapping {
        self.values.clone()
    }

    fn get_artifact(&self, id: &str) -> Option<Artifact> {
        self.artifacts.get(id).cloned()
    }

    fn artifacts(&self) -> BTreeMap<String, Artifact> {
        self.artifacts.clone()
    }

    fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn get_metadata(&self, key: &str) -> Option<DynamicValue> {
        self.metadata.get(key).cloned()
    }

    fn metadata(&self) -> Mapping {
        self.metadata.clone()
    }
}

/// A lock-protected state reads through its read guard.
impl StateReader for RwLock<State> {
    fn get(&self, key: &str) -> Option<DynamicValue> {
        StateReader::get(&*read(self), key)
    }

    fn has(&self, key: &str) -> bool {
        read(self).has(key)
    }

    fn keys(&self) -> Vec<String> {
        read(self).keys()
    }

    fn values(&self) -> Mapping {
        read(self).values.clone()
    }

    fn get_artifact(&self, id: &str) -> Option<Artifact> {
        StateReader::get_artifact(&*read(self), id)
    }

    fn artifacts(&self) -> BTreeMap<String, Artifact> {
        read(self).artifacts.clone()
    }

    fn messages(&self) -> Vec<Message> {
        read(self).messages.clone()
    }

    fn get_metadata(&self, key: &str) -> Option<DynamicValue> {
        StateReader::get_metadata(&*read(self), key)
    }

    fn metadata(&self) -> Mapping {
        read(self).metadata.clone()
    }
}

fn read(lock: &RwLock<State>) -> std::sync::RwLockReadGuard<'_, State> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

impl<T: StateReader + ?Sized> StateReader for Arc<T> {
    fn get(&self, key: &str) -> Option<DynamicValue> {
        (**self).get(key)
    }

    fn has(&self, key: &str) -> bool {
        (**self).has(key)
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }

    fn values(&self) -> Mapping {
        (**self).values()
    }

    fn get_artifact(&self, id: &str) -> Option<Artifact> {
        (**self).get_artifact(id)
    }

    fn artifacts(&self) -> BTreeMap<String, Artifact> {
        (**self).artifacts()
    }

    fn messages(&self) -> Vec<Message> {
        (**self).messages()
    }

    fn get_metadata(&self, key: &str) -> Option<DynamicValue> {
        (**self).get_metadata(key)
    }

    fn metadata(&self) -> Mapping {
        (**self).metadata()
    }
}
