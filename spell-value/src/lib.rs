//! # spell-value: Dynamic values at the script/host boundary
//!
//! Every value that crosses between a script engine and native Rust code is
//! a [`DynamicValue`]: null, boolean, number, text, sequence or mapping.
//! This crate defines that type and the [`Converter`] that marshals native
//! values to and from it.
//!
//! ## Conversion
//!
//! | Direction | Entry point | Driven by |
//! |-----------|-------------|-----------|
//! | native → boundary | [`to_boundary`] | the value's runtime shape (`Serialize`) |
//! | boundary → native | [`from_boundary`] | the target type (`Deserialize`) |
//!
//! Any type deriving serde's traits converts without per-type code. Record
//! members use their serde names, so `#[serde(rename)]`,
//! `#[serde(rename_all)]` and `#[serde(skip)]` control the boundary view.
//!
//! Converting back is lenient for scalars: any number converts into any
//! numeric type, text such as `"42"` or `"false"` coerces, and `Null`
//! yields the target's zero value. Collections are strict; asking for a
//! scalar from a sequence fails with a [`ConversionError`] carrying the path
//! to the offending element.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use spell_value::{from_boundary, to_boundary, DynamicValue};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Tool {
//!     tool_name: String,
//!     max_retries: u8,
//! }
//!
//! let tool = Tool { tool_name: "grep".into(), max_retries: 3 };
//! let value = to_boundary(&tool).unwrap();
//! assert_eq!(value.get("toolName"), Some(&DynamicValue::from("grep")));
//!
//! let back: Tool = from_boundary(value).unwrap();
//! assert_eq!(back, tool);
//! ```

#![deny(missing_docs)]

pub mod convert;
pub mod error;
pub mod value;

mod de;
mod ser;

pub use convert::{from_boundary, to_boundary, Converter, ConverterConfig};
pub use error::{ConversionError, ConversionErrorKind, Path, PathSegment};
pub use value::{DynamicValue, Mapping, ValueKind, MAX_SAFE_INTEGER};
