//! Layered state: a locally-owned state over a read-only parent.

use crate::artifact::Artifact;
use crate::message::Message;
use crate::state::{State, StateReader};
use serde::{Deserialize, Serialize};
use spell_value::{DynamicValue, Mapping};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Which parent categories a context sees.
///
/// Values are always inherited; these flags cover the opt-out categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct InheritanceConfig {
    /// Parent messages precede local ones.
    pub messages: bool,
    /// Parent artifacts are visible unless shadowed locally.
    pub artifacts: bool,
    /// Parent metadata is visible unless shadowed locally.
    pub metadata: bool,
}

impl Default for InheritanceConfig {
    fn default() -> Self {
        Self::all()
    }
}

impl InheritanceConfig {
    /// Explicit flags.
    pub fn new(messages: bool, artifacts: bool, metadata: bool) -> Self {
        Self {
            messages,
            artifacts,
            metadata,
        }
    }

    /// Inherit every category.
    pub fn all() -> Self {
        Self::new(true, true, true)
    }

    /// Inherit values only.
    pub fn none() -> Self {
        Self::new(false, false, false)
    }
}

/// A parent-aware state view for a child component.
///
/// Reads consult the local state first and fall back to the parent
/// according to the [`InheritanceConfig`]. Writes always go to the local
/// state; the parent is held as a [`StateReader`] and cannot be written
/// through this type.
///
/// ```
/// use spell_state::{SharedStateContext, State};
/// use std::sync::Arc;
///
/// let mut parent = State::new();
/// parent.set("k", "P");
/// parent.set("only_parent", 1);
///
/// let ctx = SharedStateContext::new(Arc::new(parent));
/// ctx.set("k", "C");
///
/// assert_eq!(ctx.get("k"), Some("C".into()));
/// assert!(ctx.has("only_parent"));
/// ```
pub struct SharedStateContext {
    local: Arc<RwLock<State>>,
    parent: Arc<dyn StateReader>,
    inheritance: InheritanceConfig,
}

impl fmt::Debug for SharedStateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStateContext")
            .field("local", &*self.read_local())
            .field("inheritance", &self.inheritance)
            .finish_non_exhaustive()
    }
}

impl SharedStateContext {
    /// A context over `parent` with an empty local state, inheriting
    /// everything.
    pub fn new(parent: Arc<dyn StateReader>) -> Self {
        Self {
            local: Arc::new(RwLock::new(State::new())),
            parent,
            inheritance: InheritanceConfig::default(),
        }
    }

    /// A view with different inheritance over the same local state and
    /// parent. `self` is unchanged; writes through either are visible to
    /// both.
    pub fn with_inheritance(&self, inheritance: InheritanceConfig) -> Self {
        Self {
            local: Arc::clone(&self.local),
            parent: Arc::clone(&self.parent),
            inheritance,
        }
    }

    /// Current inheritance flags.
    pub fn inheritance(&self) -> InheritanceConfig {
        self.inheritance
    }

    /// The parent this context reads through.
    pub fn parent(&self) -> &Arc<dyn StateReader> {
        &self.parent
    }

    fn read_local(&self) -> RwLockReadGuard<'_, State> {
        self.local.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_local(&self) -> RwLockWriteGuard<'_, State> {
        self.local.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a value locally, then in the parent.
    pub fn get(&self, key: &str) -> Option<DynamicValue> {
        let local = self.read_local().get(key).cloned();
        local.or_else(|| self.parent.get(key))
    }

    /// Write a value to the local state.
    pub fn set(&self, key: impl Into<String>, value: impl Into<DynamicValue>) {
        self.write_local().set(key, value);
    }

    /// Remove a local value. A parent value with the same key becomes
    /// visible again.
    pub fn delete(&self, key: &str) -> Option<DynamicValue> {
        self.write_local().delete(key)
    }

    /// Whether a value exists locally or in the parent.
    pub fn has(&self, key: &str) -> bool {
        self.read_local().has(key) || self.parent.has(key)
    }

    /// Union of local and parent keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.parent.keys().into_iter().collect();
        keys.extend(self.read_local().keys());
        keys.into_iter().collect()
    }

    /// Union of local and parent values; local wins on collision.
    pub fn values(&self) -> Mapping {
        let mut values = self.parent.values();
        values.extend(self.read_local().values().clone());
        values
    }

    /// Look up an artifact locally, then in the parent if inherited.
    pub fn get_artifact(&self, id: &str) -> Option<Artifact> {
        let local = self.read_local().get_artifact(id).cloned();
        match local {
            Some(artifact) => Some(artifact),
            None if self.inheritance.artifacts => self.parent.get_artifact(id),
            None => None,
        }
    }

    /// Visible artifacts; local shadows parent on the same id.
    pub fn artifacts(&self) -> BTreeMap<String, Artifact> {
        let local = self.read_local().artifacts().clone();
        if !self.inheritance.artifacts {
            return local;
        }
        let mut merged = self.parent.artifacts();
        merged.extend(local);
        merged
    }

    /// Visible messages: parent history first when inherited, then local.
    pub fn messages(&self) -> Vec<Message> {
        let local = self.read_local().messages().to_vec();
        if !self.inheritance.messages {
            return local;
        }
        let mut merged = self.parent.messages();
        merged.extend(local);
        merged
    }

    /// Look up metadata locally, then in the parent if inherited.
    pub fn get_metadata(&self, key: &str) -> Option<DynamicValue> {
        let local = self.read_local().get_metadata(key).cloned();
        match local {
            Some(value) => Some(value),
            None if self.inheritance.metadata => self.parent.get_metadata(key),
            None => None,
        }
    }

    /// Visible metadata; local wins on collision.
    pub fn metadata(&self) -> Mapping {
        let local = self.read_local().metadata().clone();
        if !self.inheritance.metadata {
            return local;
        }
        let mut merged = self.parent.metadata();
        merged.extend(local);
        merged
    }

    /// Write a metadata entry to the local state.
    pub fn set_metadata(&self, key: impl Into<String>, value: impl Into<DynamicValue>) {
        self.write_local().set_metadata(key, value);
    }

    /// Append a message to the local history.
    pub fn add_message(&self, message: Message) {
        self.write_local().add_message(message);
    }

    /// Add an artifact to the local state.
    pub fn add_artifact(&self, artifact: Artifact) {
        self.write_local().add_artifact(artifact);
    }

    /// Snapshot of the local state only, never merged.
    pub fn local_state(&self) -> State {
        self.read_local().clone()
    }

    /// A sibling: same parent and inheritance, empty local state.
    pub fn fresh_clone(&self) -> Self {
        Self {
            local: Arc::new(RwLock::new(State::new())),
            parent: Arc::clone(&self.parent),
            inheritance: self.inheritance,
        }
    }

    /// Materialize the merged view as an independent state.
    ///
    /// The result keeps the local state's id and has no link back to this
    /// context or its parent. The local side is read under one guard, so
    /// concurrent writes land either wholly before or wholly after it.
    pub fn flatten(&self) -> State {
        let local = self.read_local();
        let mut values = self.parent.values();
        values.extend(local.values().clone());
        let mut metadata = if self.inheritance.metadata {
            self.parent.metadata()
        } else {
            Mapping::new()
        };
        metadata.extend(local.metadata().clone());
        let mut messages = if self.inheritance.messages {
            self.parent.messages()
        } else {
            Vec::new()
        };
        messages.extend_from_slice(local.messages());
        let mut artifacts = if self.inheritance.artifacts {
            self.parent.artifacts()
        } else {
            BTreeMap::new()
        };
        artifacts.extend(local.artifacts().clone());
        let mut state = State::new().with_id(local.id());
        drop(local);

        for (key, value) in values {
            state.set(key, value);
        }
        for (key, value) in metadata {
            state.set_metadata(key, value);
        }
        for message in messages {
            state.add_message(message);
        }
        for artifact in artifacts.into_values() {
            state.add_artifact(artifact);
        }
        state
    }
}

/// Contexts nest: a grandchild reads its parent's merged view.
impl StateReader for SharedStateContext {
    fn get(&self, key: &str) -> Option<DynamicValue> {
        SharedStateContext::get(self, key)
    }

    fn has(&self, key: &str) -> bool {
        SharedStateContext::has(self, key)
    }

    fn keys(&self) -> Vec<String> {
        SharedStateContext::keys(self)
    }

    fn values(&self) -> Mapping {
        SharedStateContext::values(self)
    }

    fn get_artifact(&self, id: &str) -> Option<Artifact> {
        SharedStateContext::get_artifact(self, id)
    }

    fn artifacts(&self) -> BTreeMap<String, Artifact> {
        SharedStateContext::artifacts(self)
    }

    fn messages(&self) -> Vec<Message> {
        SharedStateContext::messages(self)
    }

    fn get_metadata(&self, key: &str) -> Option<DynamicValue> {
        SharedStateContext::get_metadata(self, key)
    }

    fn metadata(&self) -> Mapping {
        SharedStateContext::metadata(self)
    }
}
