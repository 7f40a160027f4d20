//! The `Bridge` trait.

use crate::descriptor::{BridgeMetadata, Capability, MethodDescriptor};
use crate::error::BridgeError;
use spell_value::DynamicValue;

/// A component exposing native operations to script engines.
///
/// Scripts see a bridge as an id plus a table of methods taking and
/// returning [`DynamicValue`]s. Implementations usually hold a
/// [`Lifecycle`](crate::Lifecycle) and a [`MethodTable`](crate::MethodTable)
/// and delegate to them:
///
/// ```ignore
/// fn dispatch(&self, method: &str, args: Vec<DynamicValue>) -> Result<DynamicValue, BridgeError> {
///     self.lifecycle.ensure_initialized(self.id())?;
///     self.table.dispatch(self, method, args)
/// }
/// ```
pub trait Bridge: Send + Sync {
    /// Stable identifier scripts use to address the bridge.
    fn id(&self) -> &str;

    /// Name, version and dependencies.
    fn metadata(&self) -> BridgeMetadata;

    /// Every method the bridge exposes, in declaration order.
    fn methods(&self) -> &[MethodDescriptor];

    /// Capabilities the host must grant before `initialize`.
    ///
    /// Defaults to the union of the methods' capabilities.
    fn capabilities(&self) -> Vec<Capability> {
        let mut caps: Vec<Capability> = Vec::new();
        for cap in self.methods().iter().flat_map(|m| &m.capabilities) {
            if !caps.contains(cap) {
                caps.push(cap.clone());
            }
        }
        caps
    }

    /// Acquire resources. Calling it twice is a no-op success.
    fn initialize(&self) -> Result<(), BridgeError>;

    /// Release resources. The bridge may be initialized again afterwards.
    fn cleanup(&self) -> Result<(), BridgeError>;

    /// Whether `dispatch` is currently allowed.
    fn is_initialized(&self) -> bool;

    /// Invoke a method by name with raw boundary arguments.
    fn dispatch(&self, method: &str, args: Vec<DynamicValue>) -> Result<DynamicValue, BridgeError>;
}
