//! # spell-bridge: The dispatch contract between scripts and native code
//!
//! A bridge exposes a coherent set of native operations to script engines
//! through one entry point: `dispatch(method, args)`, where arguments and
//! result are [`DynamicValue`](spell_value::DynamicValue)s.
//!
//! | Piece | Type | What it does |
//! |-------|------|-------------|
//! | Descriptors | [`MethodDescriptor`], [`ParamDescriptor`], [`TypeTag`] | Declare methods once |
//! | Manifest | [`Capability`], [`CapabilityKind`], [`BridgeMetadata`] | What the host must grant |
//! | Dispatch | [`MethodTable`], [`CallArgs`], [`validate`] | Validate, convert, invoke |
//! | Lifecycle | [`Lifecycle`], [`LifecycleState`] | Uninitialized → initialized → cleaned up |
//! | Registry | [`BridgeRegistry`] | Host-owned set of bridges, dependency-ordered init |
//! | Errors | [`BridgeError`] | One discriminated error for every failure |
//!
//! Validation happens before a handler runs: unknown methods, too few
//! arguments and structurally wrong arguments (a mapping where an array is
//! declared, say) never reach native code.

#![deny(missing_docs)]

pub mod bridge;
pub mod descriptor;
pub mod error;
pub mod lifecycle;
pub mod method;
pub mod registry;

pub use bridge::Bridge;
pub use descriptor::{
    BridgeMetadata, Capability, CapabilityKind, MethodDescriptor, ParamDescriptor, TypeTag,
};
pub use error::BridgeError;
pub use lifecycle::{Lifecycle, LifecycleState};
pub use method::{validate, CallArgs, MethodTable};
pub use registry::BridgeRegistry;
