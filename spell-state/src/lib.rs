//! # spell-state: Owned state and layered state contexts
//!
//! A [`State`] is the bag of values, metadata, messages and artifacts one
//! component owns. A [`SharedStateContext`] layers a fresh local state over
//! a read-only parent so a child component can see what its parent knows
//! without being able to change it.
//!
//! | Category | Read fallback to parent | Controlled by |
//! |----------|-------------------------|---------------|
//! | values | always |: |
//! | messages | parent first, then local | [`InheritanceConfig::messages`] |
//! | artifacts | local shadows parent by id | [`InheritanceConfig::artifacts`] |
//! | metadata | local shadows parent by key | [`InheritanceConfig::metadata`] |
//!
//! The parent is held as an `Arc<dyn StateReader>`. [`StateReader`] has no
//! write methods, so the read-only guarantee is a property of the types,
//! not of discipline. `SharedStateContext` is itself a `StateReader`,
//! which lets contexts nest.

#![deny(missing_docs)]

pub mod artifact;
pub mod context;
pub mod message;
pub mod state;

pub use artifact::{Artifact, ArtifactType};
pub use context::{InheritanceConfig, SharedStateContext};
pub use message::{Message, Role};
pub use state::{State, StateReader};
