//! Bridge lifecycle: uninitialized → initialized → cleaned up.

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Where a bridge is in its lifecycle.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Never initialized.
    #[default]
    Uninitialized,
    /// Ready to dispatch.
    Initialized,
    /// Resources released. May be initialized again.
    CleanedUp,
}

/// Thread-safe lifecycle tracker embedded in a bridge.
///
/// Transitions run a caller-supplied closure under the lifecycle's write
/// lock, so the state only advances when the closure succeeds and two
/// threads never initialize the same bridge concurrently.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: RwLock<LifecycleState>,
}

impl Lifecycle {
    /// A lifecycle in the `Uninitialized` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether dispatch is allowed.
    pub fn is_initialized(&self) -> bool {
        self.state() == LifecycleState::Initialized
    }

    /// Run `setup` and move to `Initialized`.
    ///
    /// A no-op success if already initialized; `setup` is not run again.
    pub fn initialize<F>(&self, bridge: &str, setup: F) -> Result<(), BridgeError>
    where
        F: FnOnce() -> Result<(), BridgeError>,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state == LifecycleState::Initialized {
            return Ok(());
        }
        setup()?;
        *state = LifecycleState::Initialized;
        tracing::info!(bridge, "spell.bridge.initialize");
        Ok(())
    }

    /// Run `teardown` and move to `CleanedUp`.
    ///
    /// A no-op success unless currently initialized.
    pub fn cleanup<F>(&self, bridge: &str, teardown: F) -> Result<(), BridgeError>
    where
        F: FnOnce() -> Result<(), BridgeError>,
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state != LifecycleState::Initialized {
            return Ok(());
        }
        // Resources are considered released even if teardown reports an error.
        *state = LifecycleState::CleanedUp;
        tracing::info!(bridge, "spell.bridge.cleanup");
        teardown()
    }

    /// Fail with `NotInitialized` unless dispatch is allowed.
    pub fn ensure_initialized(&self, bridge: &str) -> Result<(), BridgeError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(BridgeError::NotInitialized(bridge.to_owned()))
        }
    }
}
