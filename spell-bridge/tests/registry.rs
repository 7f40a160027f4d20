use spell_bridge::*;
use spell_value::DynamicValue;
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

struct Node {
    id: String,
    deps: Vec<String>,
    fail_cleanup: bool,
    log: Log,
    lifecycle: Lifecycle,
    table: MethodTable<Node>,
}

impl Node {
    fn new(id: &str, deps: &[&str], log: &Log) -> Self {
        let table = MethodTable::new(id).method(
            MethodDescriptor::new("ping")
                .returns(TypeTag::String)
                .capability(Capability::new(CapabilityKind::Time, id)),
            |node: &Node, _| Ok(format!("pong from {}", node.id)),
        );
        Self {
            id: id.to_owned(),
            deps: deps.iter().map(|d| (*d).to_owned()).collect(),
            fail_cleanup: false,
            log: Arc::clone(log),
            lifecycle: Lifecycle::new(),
            table,
        }
    }

    fn failing_cleanup(mut self) -> Self {
        self.fail_cleanup = true;
        self
    }
}

impl Bridge for Node {
    fn id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> BridgeMetadata {
        self.deps
            .iter()
            .fold(BridgeMetadata::new(&self.id, "0.1.0"), |m, d| {
                m.depends_on(d.clone())
            })
    }

    fn methods(&self) -> &[MethodDescriptor] {
        self.table.descriptors()
    }

    fn initialize(&self) -> Result<(), BridgeError> {
        self.lifecycle.initialize(&self.id, || {
            self.log.lock().unwrap().push(self.id.clone());
            Ok(())
        })
    }

    fn cleanup(&self) -> Result<(), BridgeError> {
        self.lifecycle.cleanup(&self.id, || {
            if self.fail_cleanup {
                Err(BridgeError::domain("cleanup", format!("{} stuck", self.id)))
            } else {
                Ok(())
            }
        })
    }

    fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    fn dispatch(&self, method: &str, args: Vec<DynamicValue>) -> Result<DynamicValue, BridgeError> {
        self.lifecycle.ensure_initialized(&self.id)?;
        self.table.dispatch(self, method, args)
    }
}

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

#[test]
fn duplicate_registration_rejected() {
    let log = log();
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(Node::new("a", &[], &log))).unwrap();
    let err = registry
        .register(Arc::new(Node::new("a", &[], &log)))
        .unwrap_err();
    assert!(matches!(err, BridgeError::AlreadyRegistered(ref id) if id == "a"));
}

#[test]
fn dependencies_initialize_first() {
    let log = log();
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(Node::new("c", &["b"], &log))).unwrap();
    registry.register(Arc::new(Node::new("b", &["a"], &log))).unwrap();
    registry.register(Arc::new(Node::new("a", &[], &log))).unwrap();

    registry.initialize("c").unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);

    // Already initialized bridges are not set up again.
    registry.initialize_all().unwrap();
    assert_eq!(log.lock().unwrap().len(), 3);
}

#[test]
fn cycles_are_detected() {
    let log = log();
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(Node::new("a", &["b"], &log))).unwrap();
    registry.register(Arc::new(Node::new("b", &["a"], &log))).unwrap();

    let err = registry.initialize("a").unwrap_err();
    assert!(matches!(err, BridgeError::DependencyCycle(ref ids) if ids == &["a", "b", "a"]));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn missing_dependency_reported() {
    let log = log();
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(Node::new("a", &["ghost"], &log))).unwrap();
    let err = registry.initialize("a").unwrap_err();
    assert_eq!(
        err.to_string(),
        "bridge a depends on unregistered bridge ghost"
    );
}

#[test]
fn cleanup_all_is_best_effort() {
    let log = log();
    let registry = BridgeRegistry::new();
    let a = Arc::new(Node::new("a", &[], &log).failing_cleanup());
    let b = Arc::new(Node::new("b", &[], &log));
    let c = Arc::new(Node::new("c", &[], &log).failing_cleanup());
    for node in [&a, &b, &c] {
        registry.register(Arc::clone(node) as Arc<dyn Bridge>).unwrap();
    }
    registry.initialize_all().unwrap();

    let err = registry.cleanup_all().unwrap_err();
    // Reverse registration order: c fails first.
    assert_eq!(err.to_string(), "cleanup: c stuck");
    assert!(!a.is_initialized());
    assert!(!b.is_initialized());
    assert!(!c.is_initialized());
}

#[test]
fn dispatch_routes_by_bridge_id() {
    let log = log();
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(Node::new("a", &[], &log))).unwrap();

    let err = registry.dispatch("a", "ping", vec![]).unwrap_err();
    assert!(matches!(err, BridgeError::NotInitialized(_)));

    registry.initialize("a").unwrap();
    assert_eq!(
        registry.dispatch("a", "ping", vec![]).unwrap(),
        DynamicValue::from("pong from a")
    );

    let err = registry.dispatch("zzz", "ping", vec![]).unwrap_err();
    assert!(matches!(err, BridgeError::BridgeNotFound(ref id) if id == "zzz"));
}

#[test]
fn manifest_lists_capabilities_per_bridge() {
    let log = log();
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(Node::new("a", &[], &log))).unwrap();
    registry.register(Arc::new(Node::new("b", &[], &log))).unwrap();

    let manifest = registry.manifest();
    assert_eq!(manifest.len(), 2);
    assert_eq!(manifest["b"][0].kind, CapabilityKind::Time);
    assert_eq!(manifest["b"][0].resource, "b");
}

#[test]
fn unregister_removes_bridge() {
    let log = log();
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(Node::new("a", &[], &log))).unwrap();
    registry.register(Arc::new(Node::new("b", &[], &log))).unwrap();

    assert!(registry.unregister("a").is_some());
    assert!(registry.get("a").is_none());
    assert_eq!(registry.ids(), vec!["b"]);
    assert!(matches!(
        registry.cleanup("a"),
        Err(BridgeError::BridgeNotFound(_))
    ));
}
