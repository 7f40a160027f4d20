//! Bridge registry: register, initialize in dependency order, dispatch.

use crate::bridge::Bridge;
use crate::descriptor::Capability;
use crate::error::BridgeError;
use spell_value::DynamicValue;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The set of bridges a host exposes to its script engines.
///
/// The registry is an ordinary value owned by the host and passed to
/// whatever needs it; there is no process-wide instance. Bridges are held
/// as `Arc<dyn Bridge>` and the internal lock is released before calling
/// into any bridge, so bridges may themselves use the registry.
#[derive(Default)]
pub struct BridgeRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    bridges: HashMap<String, Arc<dyn Bridge>>,
    order: Vec<String>,
}

impl BridgeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a bridge under its own id.
    pub fn register(&self, bridge: Arc<dyn Bridge>) -> Result<(), BridgeError> {
        let id = bridge.id().to_owned();
        let mut inner = self.write();
        if inner.bridges.contains_key(&id) {
            return Err(BridgeError::AlreadyRegistered(id));
        }
        tracing::debug!(bridge = %id, "spell.bridge.register");
        inner.order.push(id.clone());
        inner.bridges.insert(id, bridge);
        Ok(())
    }

    /// Remove a bridge, returning it. It is not cleaned up.
    pub fn unregister(&self, id: &str) -> Option<Arc<dyn Bridge>> {
        let mut inner = self.write();
        inner.order.retain(|existing| existing != id);
        inner.bridges.remove(id)
    }

    /// Look up a bridge by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Bridge>> {
        self.read().bridges.get(id).cloned()
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> Vec<String> {
        self.read().order.clone()
    }

    /// Capabilities each registered bridge declares, keyed by bridge id.
    ///
    /// Hosts grant or deny these before calling [`initialize`](Self::initialize).
    pub fn manifest(&self) -> BTreeMap<String, Vec<Capability>> {
        let bridges: Vec<_> = self.read().bridges.values().cloned().collect();
        bridges
            .into_iter()
            .map(|b| (b.id().to_owned(), b.capabilities()))
            .collect()
    }

    /// Initialize a bridge after its dependencies, depth first.
    pub fn initialize(&self, id: &str) -> Result<(), BridgeError> {
        for bridge in self.init_order(id)? {
            bridge.initialize()?;
        }
        Ok(())
    }

    /// Initialize every bridge, respecting dependencies.
    pub fn initialize_all(&self) -> Result<(), BridgeError> {
        for id in self.ids() {
            self.initialize(&id)?;
        }
        Ok(())
    }

    /// Clean up one bridge.
    pub fn cleanup(&self, id: &str) -> Result<(), BridgeError> {
        self.get(id)
            .ok_or_else(|| BridgeError::BridgeNotFound(id.to_owned()))?
            .cleanup()
    }

    /// Clean up every bridge in reverse registration order.
    ///
    /// Every bridge is attempted even when some fail; the first failure
    /// is returned.
    pub fn cleanup_all(&self) -> Result<(), BridgeError> {
        let bridges: Vec<_> = {
            let inner = self.read();
            inner
                .order
                .iter()
                .rev()
                .filter_map(|id| inner.bridges.get(id).cloned())
                .collect()
        };
        let mut first_error = None;
        for bridge in bridges {
            if let Err(e) = bridge.cleanup() {
                tracing::warn!(bridge = %bridge.id(), error = %e, "spell.bridge.cleanup_failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Call a method on a registered bridge.
    pub fn dispatch(
        &self,
        bridge_id: &str,
        method: &str,
        args: Vec<DynamicValue>,
    ) -> Result<DynamicValue, BridgeError> {
        let bridge = self
            .get(bridge_id)
            .ok_or_else(|| BridgeError::BridgeNotFound(bridge_id.to_owned()))?;
        bridge.dispatch(method, args)
    }

    /// Bridges to initialize for `id`, dependencies first.
    fn init_order(&self, id: &str) -> Result<Vec<Arc<dyn Bridge>>, BridgeError> {
        let bridges = self.read().bridges.clone();
        if !bridges.contains_key(id) {
            return Err(BridgeError::BridgeNotFound(id.to_owned()));
        }
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut path = Vec::new();
        visit(id, &bridges, &mut done, &mut path, &mut order)?;
        Ok(order)
    }
}

fn visit(
    id: &str,
    bridges: &HashMap<String, Arc<dyn Bridge>>,
    done: &mut HashSet<String>,
    path: &mut Vec<String>,
    order: &mut Vec<Arc<dyn Bridge>>,
) -> Result<(), BridgeError> {
    if done.contains(id) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|p| p == id) {
        let mut cycle = path[start..].to_vec();
        cycle.push(id.to_owned());
        return Err(BridgeError::DependencyCycle(cycle));
    }
    let Some(bridge) = bridges.get(id) else {
        return Err(BridgeError::BridgeNotFound(id.to_owned()));
    };
    path.push(id.to_owned());
    for dependency in bridge.metadata().dependencies {
        if !bridges.contains_key(&dependency) {
            return Err(BridgeError::MissingDependency {
                bridge: id.to_owned(),
                dependency,
            });
        }
        visit(&dependency, bridges, done, path, order)?;
    }
    path.pop();
    done.insert(id.to_owned());
    order.push(Arc::clone(bridge));
    Ok(())
}
