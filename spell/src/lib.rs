#![deny(missing_docs)]
//! # spell: umbrella crate
//!
//! One import surface for the spell crates. Re-exports each crate behind a
//! feature flag, plus a `prelude` for the common path.
//!
//! | Feature | Crates |
//! |---------|--------|
//! | `core` (default) | `spell-value`, `spell-bridge` |
//! | `state` (default) | `spell-state`, `spell-state-bridge` |

#[cfg(feature = "core")]
pub use spell_bridge;
#[cfg(feature = "state")]
pub use spell_state;
#[cfg(feature = "state")]
pub use spell_state_bridge;
#[cfg(feature = "core")]
pub use spell_value;

/// Common imports for hosts wiring bridges into a script engine.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use spell_value::{
        from_boundary, to_boundary, ConversionError, Converter, ConverterConfig, DynamicValue,
        Mapping,
    };

    #[cfg(feature = "core")]
    pub use spell_bridge::{
        Bridge, BridgeError, BridgeMetadata, BridgeRegistry, CallArgs, Capability,
        CapabilityKind, Lifecycle, MethodDescriptor, MethodTable, ParamDescriptor, TypeTag,
    };

    #[cfg(feature = "state")]
    pub use spell_state::{
        Artifact, ArtifactType, InheritanceConfig, Message, Role, SharedStateContext, State,
        StateReader,
    };

    #[cfg(feature = "state")]
    pub use spell_state_bridge::{ContextHandle, StateBridgeConfig, StateContextBridge};
}
