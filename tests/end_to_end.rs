//! End-to-end scenarios across the spell crates, without a script engine.
//!
//! 1. **Flatten**: parent state, child context, merged snapshot
//! 2. **Native records**: typed values cross the boundary into a context
//! 3. **Sibling agents**: concurrent children of one parent
//! 4. **Host lifecycle**: registry init, dispatch, cleanup

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use spell_bridge::{Bridge, BridgeError, BridgeRegistry};
use spell_state::{Message, SharedStateContext, State, StateReader};
use spell_state_bridge::{StateContextBridge, BRIDGE_ID};
use spell_value::{from_boundary, to_boundary, DynamicValue};
use std::sync::Arc;
use std::thread;

fn registry() -> BridgeRegistry {
    let registry = BridgeRegistry::new();
    registry.register(Arc::new(StateContextBridge::new())).unwrap();
    registry.initialize_all().unwrap();
    registry
}

fn call(registry: &BridgeRegistry, method: &str, args: Vec<DynamicValue>) -> DynamicValue {
    registry.dispatch(BRIDGE_ID, method, args).unwrap()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 1. Flatten
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn flatten_through_bridge() {
    let registry = registry();
    let parent = DynamicValue::from(json!({
        "data": {"x": 1},
        "messages": [{"role": "user", "content": "hi"}],
    }));
    let ctx = call(&registry, "createSharedContext", vec![parent]);
    call(&registry, "set", vec![ctx.clone(), "y".into(), 2.into()]);

    let flat: Value = call(&registry, "asState", vec![ctx]).into();
    assert_eq!(flat["data"], json!({"x": 1, "y": 2}));
    assert_eq!(flat["messages"], json!([{"role": "user", "content": "hi"}]));
}

#[test]
fn flatten_native_matches_bridge_shape() {
    let mut parent = State::new();
    parent.set("x", 1);
    parent.add_message(Message::user("hi"));
    let ctx = SharedStateContext::new(Arc::new(parent));
    ctx.set("y", 2);

    let flat = Value::from(to_boundary(&ctx.flatten()).unwrap());
    assert_eq!(flat["data"], json!({"x": 1, "y": 2}));
    assert_eq!(flat["messages"], json!([{"role": "user", "content": "hi"}]));

    // A flattened state can seed the next generation.
    let back: State = from_boundary(DynamicValue::from(flat)).unwrap();
    assert_eq!(back.get("y"), Some(&DynamicValue::from(2)));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 2. Native records
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Task {
    task_id: u32,
    title: String,
    tags: Vec<String>,
    done: bool,
}

#[test]
fn typed_record_roundtrips_through_context() {
    let registry = registry();
    let ctx = call(
        &registry,
        "createSharedContext",
        vec![DynamicValue::from(json!({}))],
    );
    let task = Task {
        task_id: 7,
        title: "write notes".into(),
        tags: vec!["docs".into()],
        done: false,
    };
    call(
        &registry,
        "set",
        vec![ctx.clone(), "task".into(), to_boundary(&task).unwrap()],
    );

    let found = call(&registry, "get", vec![ctx, "task".into()]);
    let value = found.get("value").cloned().unwrap_or_default();
    assert_eq!(value.get("taskId"), Some(&DynamicValue::from(7)));
    assert_eq!(from_boundary::<Task>(value).unwrap(), task);
}

#[test]
fn script_supplied_loose_record() {
    // Scripts send numbers as text and omit fields.
    let value = DynamicValue::from(json!({"taskId": "12", "title": "triage", "extra": true}));
    let task: Task = from_boundary(value).unwrap();
    assert_eq!(
        task,
        Task {
            task_id: 12,
            title: "triage".into(),
            tags: vec![],
            done: false,
        }
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 3. Sibling agents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn siblings_share_parent_not_local() {
    let mut parent = State::new();
    parent.set("goal", "ship");
    let parent: Arc<dyn StateReader> = Arc::new(parent);

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let parent = Arc::clone(&parent);
            thread::spawn(move || {
                let ctx = SharedStateContext::new(parent);
                ctx.set("worker", i);
                ctx.add_message(Message::assistant(format!("worker {i} done")));
                ctx.flatten()
            })
        })
        .collect();

    for (i, worker) in workers.into_iter().enumerate() {
        let state = worker.join().unwrap();
        assert_eq!(state.get("goal"), Some(&DynamicValue::from("ship")));
        assert_eq!(state.get("worker"), Some(&DynamicValue::from(i)));
        assert_eq!(state.messages().len(), 1);
    }
    assert_eq!(parent.keys(), vec!["goal"]);
}

#[test]
fn concurrent_dispatch_on_one_bridge() {
    let bridge = Arc::new(StateContextBridge::new());
    bridge.initialize().unwrap();
    let ctx = bridge
        .dispatch("createSharedContext", vec![DynamicValue::from(json!({"data": {"n": 0}}))])
        .unwrap();

    let writers: Vec<_> = (0..8u32)
        .map(|i| {
            let bridge = Arc::clone(&bridge);
            let ctx = ctx.clone();
            thread::spawn(move || {
                bridge
                    .dispatch("set", vec![ctx, format!("k{i}").into(), i.into()])
                    .unwrap();
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let keys: Value = bridge.dispatch("keys", vec![ctx]).unwrap().into();
    assert_eq!(keys.as_array().map(Vec::len), Some(9));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 4. Host lifecycle
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn cleanup_invalidates_handles() {
    let registry = registry();
    let ctx = call(
        &registry,
        "createSharedContext",
        vec![DynamicValue::from(json!({}))],
    );
    registry.cleanup_all().unwrap();

    let err = registry.dispatch(BRIDGE_ID, "keys", vec![ctx.clone()]).unwrap_err();
    assert!(matches!(err, BridgeError::NotInitialized(_)));

    registry.initialize(BRIDGE_ID).unwrap();
    let err = registry.dispatch(BRIDGE_ID, "keys", vec![ctx]).unwrap_err();
    assert!(matches!(err, BridgeError::ContextNotFound(_)));
}

#[test]
fn unknown_bridge_and_method() {
    let registry = registry();
    assert!(matches!(
        registry.dispatch("nope", "get", vec![]).unwrap_err(),
        BridgeError::BridgeNotFound(_)
    ));
    assert!(matches!(
        registry.dispatch(BRIDGE_ID, "delete", vec![]).unwrap_err(),
        BridgeError::MethodNotFound { .. }
    ));
}
