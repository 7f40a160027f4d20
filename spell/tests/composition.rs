//! Composition through the prelude: a host-defined bridge alongside the
//! state context bridge in one registry.

use serde::{Deserialize, Serialize};
use serde_json::json;
use spell::prelude::*;
use std::sync::Arc;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Summary {
    word_count: u32,
    title: String,
}

struct TextBridge {
    lifecycle: Lifecycle,
    table: MethodTable<TextBridge>,
}

impl TextBridge {
    fn new() -> Self {
        let table = MethodTable::new("text").method(
            MethodDescriptor::new("summarize")
                .param(ParamDescriptor::required("text", TypeTag::String))
                .returns(TypeTag::Object),
            |_: &TextBridge, args| {
                let text: String = args.get(0)?;
                Ok(Summary {
                    word_count: text.split_whitespace().count() as u32,
                    title: text.split_whitespace().next().unwrap_or_default().to_owned(),
                })
            },
        );
        Self {
            lifecycle: Lifecycle::new(),
            table,
        }
    }
}

impl Bridge for TextBridge {
    fn id(&self) -> &str {
        "text"
    }

    fn metadata(&self) -> BridgeMetadata {
        BridgeMetadata::new("Text", "0.1.0").depends_on("state_context")
    }

    fn methods(&self) -> &[MethodDescriptor] {
        self.table.descriptors()
    }

    fn initialize(&self) -> Result<(), BridgeError> {
        self.lifecycle.initialize(self.id(), || Ok(()))
    }

    fn cleanup(&self) -> Result<(), BridgeError> {
        self.lifecycle.cleanup(self.id(), || Ok(()))
    }

    fn is_initialized(&self) -> bool {
        self.lifecycle.is_initialized()
    }

    fn dispatch(&self, method: &str, args: Vec<DynamicValue>) -> Result<DynamicValue, BridgeError> {
        self.lifecycle.ensure_initialized(self.id())?;
        self.table.dispatch(self, method, args)
    }
}

#[test]
fn dependency_initialized_first() {
    let registry = BridgeRegistry::new();
    let state = Arc::new(StateContextBridge::new());
    registry.register(Arc::new(TextBridge::new())).unwrap();
    registry.register(state.clone()).unwrap();

    registry.initialize("text").unwrap();
    assert!(state.is_initialized());
}

#[test]
fn results_flow_between_bridges() {
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(StateContextBridge::new())).unwrap();
    registry.register(Arc::new(TextBridge::new())).unwrap();
    registry.initialize_all().unwrap();

    let summary = registry
        .dispatch("text", "summarize", vec!["release notes draft".into()])
        .unwrap();
    let ctx = registry
        .dispatch(
            "state_context",
            "createSharedContext",
            vec![DynamicValue::from(json!({"data": {}}))],
        )
        .unwrap();
    registry
        .dispatch("state_context", "set", vec![ctx.clone(), "summary".into(), summary])
        .unwrap();

    let found = registry
        .dispatch("state_context", "get", vec![ctx, "summary".into()])
        .unwrap();
    let stored: Summary = from_boundary(found.get("value").cloned().unwrap_or_default()).unwrap();
    assert_eq!(
        stored,
        Summary {
            word_count: 3,
            title: "release".into()
        }
    );
}

#[test]
fn manifest_lists_every_bridge() {
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(StateContextBridge::new())).unwrap();
    registry.register(Arc::new(TextBridge::new())).unwrap();

    let manifest = registry.manifest();
    assert_eq!(manifest.keys().collect::<Vec<_>>(), vec!["state_context", "text"]);
    assert!(manifest["text"].is_empty());
    assert_eq!(manifest["state_context"][0].kind, CapabilityKind::Memory);
}
