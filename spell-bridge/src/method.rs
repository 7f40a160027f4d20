//! Method tables: descriptors bound to typed handlers, plus validation.

use crate::descriptor::MethodDescriptor;
use crate::error::BridgeError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use spell_value::{Converter, DynamicValue};

type Handler<B> =
    Box<dyn Fn(&B, &CallArgs<'_>) -> Result<DynamicValue, BridgeError> + Send + Sync>;

/// The methods of bridge type `B`, each declared once with its descriptor.
///
/// Handlers are plain functions of the bridge and the call arguments that
/// return any serializable value; the table converts the result back to a
/// [`DynamicValue`].
///
/// ```
/// use spell_bridge::{MethodDescriptor, MethodTable, ParamDescriptor, TypeTag};
/// use spell_value::DynamicValue;
///
/// struct Calc;
///
/// let table = MethodTable::<Calc>::new("calc").method(
///     MethodDescriptor::new("add")
///         .param(ParamDescriptor::required("a", TypeTag::Number))
///         .param(ParamDescriptor::required("b", TypeTag::Number))
///         .returns(TypeTag::Number),
///     |_calc, args| Ok(args.get::<f64>(0)? + args.get::<f64>(1)?),
/// );
///
/// let sum = table
///     .dispatch(&Calc, "add", vec![DynamicValue::from(2), DynamicValue::from("3")])
///     .unwrap();
/// assert_eq!(sum, DynamicValue::from(5));
/// ```
pub struct MethodTable<B> {
    bridge_id: String,
    converter: Converter,
    // Parallel vectors: `handlers[i]` serves `descriptors[i]`.
    descriptors: Vec<MethodDescriptor>,
    handlers: Vec<Handler<B>>,
}

impl<B> MethodTable<B> {
    /// An empty table for the bridge with this id.
    pub fn new(bridge_id: impl Into<String>) -> Self {
        Self {
            bridge_id: bridge_id.into(),
            converter: Converter::default(),
            descriptors: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Use a specific converter for arguments and results.
    #[must_use]
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Declare a method and bind its handler.
    ///
    /// Declaring a name twice replaces the earlier entry.
    #[must_use]
    pub fn method<R, F>(mut self, descriptor: MethodDescriptor, handler: F) -> Self
    where
        B: 'static,
        R: Serialize,
        F: Fn(&B, &CallArgs<'_>) -> Result<R, BridgeError> + Send + Sync + 'static,
    {
        let name = descriptor.name.clone();
        let handler: Handler<B> = Box::new(move |bridge: &B, args: &CallArgs<'_>| {
            let result = handler(bridge, args)?;
            args.converter
                .to_boundary(&result)
                .map_err(|source| BridgeError::ResultConversion {
                    method: name.clone(),
                    source,
                })
        });
        match self.position(&descriptor.name) {
            Some(i) => {
                self.descriptors[i] = descriptor;
                self.handlers[i] = handler;
            }
            None => {
                self.descriptors.push(descriptor);
                self.handlers.push(handler);
            }
        }
        self
    }

    /// The bridge id this table belongs to.
    pub fn bridge_id(&self) -> &str {
        &self.bridge_id
    }

    /// The converter used for arguments and results.
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Descriptors in declaration order.
    pub fn descriptors(&self) -> &[MethodDescriptor] {
        &self.descriptors
    }

    /// Look up a method descriptor by name.
    pub fn get(&self, method: &str) -> Option<&MethodDescriptor> {
        self.position(method).map(|i| &self.descriptors[i])
    }

    fn position(&self, method: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.name == method)
    }

    /// Validate the call, run the handler and convert its result.
    ///
    /// Fails with `MethodNotFound`, `ArgumentCount` or `ArgumentType`
    /// without running the handler.
    pub fn dispatch(
        &self,
        bridge: &B,
        method: &str,
        args: Vec<DynamicValue>,
    ) -> Result<DynamicValue, BridgeError> {
        let i = self
            .position(method)
            .ok_or_else(|| BridgeError::MethodNotFound {
                bridge: self.bridge_id.clone(),
                method: method.to_owned(),
            })?;
        let descriptor = &self.descriptors[i];
        validate(descriptor, &args)?;
        tracing::debug!(
            bridge = %self.bridge_id,
            method,
            args = args.len(),
            "spell.bridge.dispatch"
        );
        let call = CallArgs {
            descriptor,
            values: args,
            converter: &self.converter,
        };
        (self.handlers[i])(bridge, &call)
    }
}

/// Check a call against a method descriptor without running it.
///
/// Checks that enough arguments were supplied, then that every supplied
/// required argument is structurally compatible with its declared tag.
pub fn validate(descriptor: &MethodDescriptor, args: &[DynamicValue]) -> Result<(), BridgeError> {
    let required = descriptor.required_count();
    if args.len() < required {
        return Err(BridgeError::ArgumentCount {
            method: descriptor.name.clone(),
            expected: required,
            actual: args.len(),
        });
    }
    for (index, (param, arg)) in descriptor.params.iter().zip(args).enumerate() {
        if param.required && !param.type_tag.accepts(arg) {
            return Err(BridgeError::ArgumentType {
                method: descriptor.name.clone(),
                param: param.name.clone(),
                index,
                expected: param.type_tag.to_string(),
                actual: arg.kind().to_string(),
            });
        }
    }
    Ok(())
}

/// Validated arguments of one call, converted on demand.
pub struct CallArgs<'a> {
    descriptor: &'a MethodDescriptor,
    values: Vec<DynamicValue>,
    converter: &'a Converter,
}

impl<'a> CallArgs<'a> {
    /// Name of the method being called.
    pub fn method(&self) -> &str {
        &self.descriptor.name
    }

    /// Number of arguments supplied.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no arguments were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw boundary value at `index`.
    pub fn raw(&self, index: usize) -> Option<&DynamicValue> {
        self.values.get(index)
    }

    /// Convert the argument at `index` into `T`.
    ///
    /// A missing argument converts from `Null`, i.e. to `T`'s zero value
    /// where it has one.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, BridgeError> {
        let value = self.values.get(index).cloned().unwrap_or_default();
        self.converter
            .from_boundary(value)
            .map_err(|source| BridgeError::ArgumentConversion {
                method: self.descriptor.name.clone(),
                param: self.param_name(index),
                index,
                source,
            })
    }

    /// Convert the argument at `index`, or `None` when absent or null.
    pub fn optional<T: DeserializeOwned>(&self, index: usize) -> Result<Option<T>, BridgeError> {
        match self.values.get(index) {
            None | Some(DynamicValue::Null) => Ok(None),
            Some(_) => self.get(index).map(Some),
        }
    }

    /// The argument at `index`, which must be exactly a boolean.
    pub fn strict_bool(&self, index: usize) -> Result<bool, BridgeError> {
        match self.values.get(index) {
            Some(DynamicValue::Bool(b)) => Ok(*b),
            other => Err(BridgeError::ArgumentType {
                method: self.descriptor.name.clone(),
                param: self.param_name(index),
                index,
                expected: "boolean".to_owned(),
                actual: other.map_or_else(|| "nothing".to_owned(), |v| v.kind().to_string()),
            }),
        }
    }

    /// The converter in use for this call.
    pub fn converter(&self) -> &'a Converter {
        self.converter
    }

    fn param_name(&self, index: usize) -> String {
        self.descriptor
            .params
            .get(index)
            .map_or_else(|| format!("arg{index}"), |p| p.name.clone())
    }
}
