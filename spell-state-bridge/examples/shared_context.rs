//! A parent agent shares state with two child agents.
//!
//! Set RUST_LOG=debug to see the dispatch and context events.
//!
//! Run with: RUST_LOG=debug cargo run --example shared_context -p spell-state-bridge

use serde_json::json;
use spell_bridge::BridgeRegistry;
use spell_state_bridge::{StateContextBridge, BRIDGE_ID};
use spell_value::DynamicValue;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber (respects RUST_LOG env var).
    tracing_subscriber::fmt::init();

    let registry = BridgeRegistry::new();
    registry.register(Arc::new(StateContextBridge::new()))?;
    for (bridge, caps) in registry.manifest() {
        for cap in caps {
            println!("{bridge} needs {cap}");
        }
    }
    registry.initialize_all()?;

    let call = |method: &str, args: Vec<DynamicValue>| registry.dispatch(BRIDGE_ID, method, args);

    let parent = DynamicValue::from(json!({
        "id": "planner",
        "data": {"goal": "ship it", "budget": 3},
        "metadata": {"owner": "planner"},
        "messages": [{"role": "user", "content": "plan the release"}],
    }));
    let researcher = call("createSharedContext", vec![parent])?;

    // The writer sees values but not the planner's conversation.
    let writer = call(
        "withInheritanceConfig",
        vec![researcher.clone(), false.into(), true.into(), true.into()],
    )?;

    call("set", vec![researcher.clone(), "budget".into(), 2.into()])?;
    call("set", vec![researcher.clone(), "sources".into(), vec!["rfc", "blog"].into()])?;
    call(
        "addMessage",
        vec![researcher.clone(), "assistant".into(), "found two sources".into()],
    )?;

    println!("researcher budget: {}", call("get", vec![researcher.clone(), "budget".into()])?);
    println!("researcher messages: {}", call("messages", vec![researcher.clone()])?);
    println!("writer messages: {}", call("messages", vec![writer.clone()])?);

    let sibling = call("clone", vec![researcher.clone()])?;
    println!("sibling keys: {}", call("keys", vec![sibling])?);

    println!("flattened: {}", call("asState", vec![researcher])?);

    registry.cleanup_all()?;
    Ok(())
}
