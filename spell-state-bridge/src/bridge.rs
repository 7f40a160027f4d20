//! `StateContextBridge`: layered state contexts addressed by handle.

use crate::config::StateBridgeConfig;
use crate::handle::ContextHandle;
use serde::Serialize;
use spell_bridge::{
    Bridge, BridgeError, BridgeMetadata, CallArgs, Capability, CapabilityKind, Lifecycle,
    MethodDescriptor, MethodTable, ParamDescriptor, TypeTag,
};
use spell_state::{InheritanceConfig, Message, Role, SharedStateContext, State, StateReader};
use spell_value::{Converter, DynamicValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Id under which the bridge registers.
pub const BRIDGE_ID: &str = "state_context";

/// Result of a keyed lookup: scripts cannot tell "absent" from "null"
/// without the flag.
#[derive(Debug, Serialize)]
struct Lookup {
    value: DynamicValue,
    exists: bool,
}

impl Lookup {
    fn new(found: Option<DynamicValue>) -> Self {
        Self {
            exists: found.is_some(),
            value: found.unwrap_or_default(),
        }
    }
}

/// Exposes [`SharedStateContext`] to scripts.
///
/// Contexts live in the bridge and scripts hold [`ContextHandle`]s. Every
/// method except `createSharedContext` takes a handle (or bare id) first;
/// an id the bridge does not track fails with `ContextNotFound`.
///
/// `withInheritanceConfig` and `clone` register a new context and return
/// a new handle. The handle passed in keeps its flags.
pub struct StateContextBridge {
    config: StateBridgeConfig,
    lifecycle: Lifecycle,
    table: MethodTable<StateContextBridge>,
    contexts: RwLock<HashMap<String, Arc<SharedStateContext>>>,
    next_id: AtomicU64,
}

impl Default for StateContextBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl StateContextBridge {
    /// A bridge with default configuration.
    pub fn new() -> Self {
        Self::with_config(StateBridgeConfig::default())
    }

    /// A bridge with the given configuration.
    pub fn with_config(config: StateBridgeConfig) -> Self {
        let converter = Converter::new(config.converter.clone());
        Self {
            config,
            lifecycle: Lifecycle::new(),
            table: method_table(converter),
            contexts: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &StateBridgeConfig {
        &self.config
    }

    fn read_contexts(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<SharedStateContext>>> {
        self.contexts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_contexts(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<SharedStateContext>>> {
        self.contexts.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track a new context over `parent` and return its handle.
    pub fn create(&self, parent: Arc<dyn StateReader>) -> ContextHandle {
        let handle = self.track(SharedStateContext::new(parent));
        tracing::debug!(context = %handle.id, "spell.state.context.create");
        handle
    }

    fn track(&self, context: SharedStateContext) -> ContextHandle {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}{n}", self.config.handle_prefix);
        let handle = ContextHandle::new(id.clone(), context.inheritance());
        self.write_contexts().insert(id, Arc::new(context));
        handle
    }

    /// The tracked context with this id.
    pub fn context(&self, id: &str) -> Option<Arc<SharedStateContext>> {
        self.read_contexts().get(id).cloned()
    }

    /// Stop tracking a context. Returns whether it was tracked.
    ///
    /// Contexts nested under it keep reading through it.
    pub fn release(&self, id: &str) -> bool {
        let released = self.write_contexts().remove(id).is_some();
        if released {
            tracing::debug!(context = id, "spell.state.context.release");
        }
        released
    }

    /// Number of tracked contexts.
    pub fn context_count(&self) -> usize {
        self.read_contexts().len()
    }

    fn release_all(&self) -> usize {
        let mut contexts = self.write_contexts();
        let n = contexts.len();
        contexts.clear();
        n
    }

    fn handle_id<'a>(args: &'a CallArgs<'_>, index: usize) -> Result<&'a str, BridgeError> {
        let raw = args.raw(index);
        raw.and_then(ContextHandle::id_of)
            .ok_or_else(|| BridgeError::ArgumentType {
                method: args.method().to_owned(),
                param: "context".to_owned(),
                index,
                expected: "context handle".to_owned(),
                actual: raw.map_or_else(|| "nothing".to_owned(), |v| v.kind().to_string()),
            })
    }

    fn resolve(
        &self,
        args: &CallArgs<'_>,
        index: usize,
    ) -> Result<Arc<SharedStateContext>, BridgeError> {
        let id = Self::handle_id(args, index)?;
        self.context(id)
            .ok_or_else(|| BridgeError::ContextNotFound(id.to_owned()))
    }

    /// A parent is either a tracked context (for nesting) or a state
    /// object. A state object without an id gets a fresh one.
    fn parent(&self, args: &CallArgs<'_>) -> Result<Arc<dyn StateReader>, BridgeError> {
        if let Some(DynamicValue::Mapping(map)) = args.raw(0) {
            if ContextHandle::is_handle(map) {
                let parent: Arc<dyn StateReader> = self.resolve(args, 0)?;
                return Ok(parent);
            }
        }
        let state: State = args.get(0)?;
        let parent: Arc<dyn StateReader> = Arc::new(state);
        Ok(parent)
    }
}

fn context_param() -> ParamDescriptor {
    ParamDescriptor::required("context", TypeTag::Any).with_description("context handle or id")
}

fn key_param() -> ParamDescriptor {
    ParamDescriptor::required("key", TypeTag::String)
}

fn method_table(converter: Converter) -> MethodTable<StateContextBridge> {
    let access = Capability::new(CapabilityKind::Memory, BRIDGE_ID)
        .with_actions(["read", "write"])
        .with_description("Access to shared state context operations");
    let describe = |name: &str, description: &str| {
        MethodDescriptor::new(name)
            .with_description(description)
            .capability(access.clone())
    };

    MethodTable::new(BRIDGE_ID)
        .with_converter(converter)
        .method(
            describe("createSharedContext", "Create a context over a parent state or context")
                .param(
                    ParamDescriptor::required("parent", TypeTag::Object)
                        .with_description("state object or context handle"),
                )
                .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| {
                let parent = bridge.parent(args)?;
                Ok(bridge.create(parent))
            },
        )
        .method(
            describe(
                "withInheritanceConfig",
                "A new context sharing local state, with different inheritance",
            )
            .param(context_param())
            .param(ParamDescriptor::required("messages", TypeTag::Boolean))
            .param(ParamDescriptor::required("artifacts", TypeTag::Boolean))
            .param(ParamDescriptor::required("metadata", TypeTag::Boolean))
            .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| {
                let context = bridge.resolve(args, 0)?;
                let inheritance = InheritanceConfig::new(
                    args.strict_bool(1)?,
                    args.strict_bool(2)?,
                    args.strict_bool(3)?,
                );
                let handle = bridge.track(context.with_inheritance(inheritance));
                tracing::debug!(context = %handle.id, ?inheritance, "spell.state.context.reconfigure");
                Ok(handle)
            },
        )
        .method(
            describe("get", "Look up a value locally, then in the parent")
                .param(context_param())
                .param(key_param())
                .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| {
                let context = bridge.resolve(args, 0)?;
                Ok(Lookup::new(context.get(&args.get::<String>(1)?)))
            },
        )
        .method(
            describe("set", "Write a value to the local state")
                .param(context_param())
                .param(key_param())
                .param(ParamDescriptor::optional("value", TypeTag::Any)),
            |bridge: &StateContextBridge, args| {
                let context = bridge.resolve(args, 0)?;
                let value = args.raw(2).cloned().unwrap_or_default();
                context.set(args.get::<String>(1)?, value);
                Ok(())
            },
        )
        .method(
            describe("has", "Whether a value exists locally or in the parent")
                .param(context_param())
                .param(key_param())
                .returns(TypeTag::Boolean),
            |bridge: &StateContextBridge, args| {
                let context = bridge.resolve(args, 0)?;
                Ok(context.has(&args.get::<String>(1)?))
            },
        )
        .method(
            describe("keys", "Union of local and parent keys")
                .param(context_param())
                .returns(TypeTag::Array),
            |bridge: &StateContextBridge, args| Ok(bridge.resolve(args, 0)?.keys()),
        )
        .method(
            describe("values", "Union of local and parent values, local first")
                .param(context_param())
                .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| Ok(bridge.resolve(args, 0)?.values()),
        )
        .method(
            describe("getArtifact", "Look up a visible artifact by id")
                .param(context_param())
                .param(ParamDescriptor::required("id", TypeTag::String))
                .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| {
                let context = bridge.resolve(args, 0)?;
                Ok(context.get_artifact(&args.get::<String>(1)?))
            },
        )
        .method(
            describe("artifacts", "Visible artifacts keyed by id")
                .param(context_param())
                .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| Ok(bridge.resolve(args, 0)?.artifacts()),
        )
        .method(
            describe("messages", "Visible messages, parent history first")
                .param(context_param())
                .returns(TypeTag::Array),
            |bridge: &StateContextBridge, args| Ok(bridge.resolve(args, 0)?.messages()),
        )
        .method(
            describe("getMetadata", "Look up visible metadata")
                .param(context_param())
                .param(key_param())
                .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| {
                let context = bridge.resolve(args, 0)?;
                Ok(Lookup::new(context.get_metadata(&args.get::<String>(1)?)))
            },
        )
        .method(
            describe("localState", "The local state only, never merged")
                .param(context_param())
                .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| Ok(bridge.resolve(args, 0)?.local_state()),
        )
        .method(
            describe("clone", "A sibling context with the same parent and an empty local state")
                .param(context_param())
                .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| {
                let context = bridge.resolve(args, 0)?;
                let handle = bridge.track(context.fresh_clone());
                tracing::debug!(context = %handle.id, "spell.state.context.clone");
                Ok(handle)
            },
        )
        .method(
            describe("asState", "Materialize the merged view as an independent state")
                .param(context_param())
                .returns(TypeTag::Object),
            |bridge: &StateContextBridge, args| Ok(bridge.resolve(args, 0)?.flatten()),
        )
        .method(
            describe("setMetadata", "Write a metadata entry to the local state")
                .param(context_param())
                .param(key_param())
                .param(ParamDescriptor::optional("value", TypeTag::Any)),
            |bridge: &StateContextBridge, args| {
                let context = bridge.resolve(args, 0)?;
                let value = args.raw(2).cloned().unwrap_or_default();
                context.set_metadata(args.get::<String>(1)?, value);
                Ok(())
            },
        )
        .method(
            describe("addMessage", "Append a message to the local history")
                .param(context_param())
                .param(ParamDescriptor::required("role", TypeTag::String))
                .param(ParamDescriptor::required("content", TypeTag::String)),
            |bridge: &StateContextBridge, args| {
                let context = bridge.resolve(args, 0)?;
                let role: Role = args.get(1)?;
                context.add_message(Message::new(role, args.get::<String>(2)?));
                Ok(())
            },
        )
        .method(
            describe("releaseContext", "Stop tracking a context")
                .param(context_param())
                .returns(TypeTag::Boolean),
            |bridge: &StateContextBridge, args| {
                let id = StateContextBridge::handle_id(args, 0)?;
                Ok(bridge.release(id))
            },
        )
}

impl Bridge for StateContextBridge {
    fn id(&self) -> &str {
        BRIDGE_ID
    }

    fn metadata(&self) -> BridgeMetadata {
        BridgeMetadata::new("State Context Bridge", "1.0.0")
            .with_description("Parent/child state sharing with selective inheritance")
            .with_author("spell")
            .with_license("MIT OR Apache-2.0")
    }

    fn methods(&self) -> &[MethodDescriptor] {
        self.table.descriptors()
    }

    fn initialize(&self) -> Result<(), BridgeError> {
        self.lifecycle.initialize(self.id(), || Ok(()))
    }

    fn cleanup(&self) -> Result<(), BridgeError> {
        self.lifecycle.cleanup(self.id(), || {
            let released = self.release_all();
            tracing::debug!(released, "spell.state.context.release_all");
            Ok(())
        })
    }

    fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    fn dispatch(&self, method: &str, args: Vec<DynamicValue>) -> Result<DynamicValue, BridgeError> {
        self.lifecycle.ensure_initialized(self.id())?;
        self.table.dispatch(self, method, args)
    }
}
