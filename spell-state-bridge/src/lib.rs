//! # spell-state-bridge: Layered state contexts for script engines
//!
//! [`StateContextBridge`] keeps [`SharedStateContext`](spell_state::SharedStateContext)s
//! on the native side and hands scripts a [`ContextHandle`] for each. A
//! script creates a context over a parent state, reads through it with
//! fallback to the parent, and writes only to the context's own local
//! state.
//!
//! ```
//! use serde_json::json;
//! use spell_bridge::Bridge;
//! use spell_state_bridge::StateContextBridge;
//! use spell_value::DynamicValue;
//!
//! let bridge = StateContextBridge::new();
//! bridge.initialize().unwrap();
//!
//! let parent = DynamicValue::from(json!({"data": {"x": 1}}));
//! let handle = bridge.dispatch("createSharedContext", vec![parent]).unwrap();
//! bridge
//!     .dispatch("set", vec![handle.clone(), "y".into(), 2.into()])
//!     .unwrap();
//!
//! let keys = bridge.dispatch("keys", vec![handle]).unwrap();
//! assert_eq!(serde_json::Value::from(keys), json!(["x", "y"]));
//! ```

#![deny(missing_docs)]

pub mod bridge;
pub mod config;
pub mod handle;

pub use bridge::{StateContextBridge, BRIDGE_ID};
pub use config::StateBridgeConfig;
pub use handle::{ContextHandle, HANDLE_TYPE};
