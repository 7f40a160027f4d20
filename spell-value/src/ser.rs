//! Native → boundary: a serde `Serializer` whose output is a [`DynamicValue`].

use crate::convert::ConverterConfig;
use crate::error::{ConversionError, ConversionErrorKind, PathSegment};
use crate::value::{format_number, DynamicValue, Mapping};
use serde::ser::{self, Impossible, Serialize};
use std::fmt;

#[derive(Clone, Copy)]
pub(crate) struct ValueSerializer<'a> {
    config: &'a ConverterConfig,
    depth: usize,
}

impl<'a> ValueSerializer<'a> {
    pub(crate) fn new(config: &'a ConverterConfig, depth: usize) -> Self {
        Self { config, depth }
    }

    /// Serializer for the members of a collection opened at this level.
    fn nested(self) -> Result<Self, ConversionError> {
        let depth = self.depth + 1;
        if depth > self.config.max_depth {
            return Err(ConversionError::new(ConversionErrorKind::DepthExceeded {
                limit: self.config.max_depth,
            }));
        }
        Ok(Self {
            config: self.config,
            depth,
        })
    }
}

fn number(n: f64) -> Result<DynamicValue, ConversionError> {
    if n.is_finite() {
        Ok(DynamicValue::Number(n))
    } else {
        Err(ConversionError::new(ConversionErrorKind::NonFinite(n)))
    }
}

fn single_entry(key: &str, value: DynamicValue) -> DynamicValue {
    let mut map = Mapping::new();
    map.insert(key.to_owned(), value);
    DynamicValue::Mapping(map)
}

impl<'a> ser::Serializer for ValueSerializer<'a> {
    type Ok = DynamicValue;
    type Error = ConversionError;

    type SerializeSeq = SerializeSequence<'a>;
    type SerializeTuple = SerializeSequence<'a>;
    type SerializeTupleStruct = SerializeSequence<'a>;
    type SerializeTupleVariant = SerializeTupleVariant<'a>;
    type SerializeMap = SerializeMapping<'a>;
    type SerializeStruct = SerializeRecord<'a>;
    type SerializeStructVariant = SerializeStructVariant<'a>;

    fn serialize_bool(self, v: bool) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v as f64))
    }

    fn serialize_i128(self, v: i128) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v as f64))
    }

    fn serialize_u8(self, v: u8) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v as f64))
    }

    fn serialize_u128(self, v: u128) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Number(v as f64))
    }

    fn serialize_f32(self, v: f32) -> Result<DynamicValue, ConversionError> {
        number(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<DynamicValue, ConversionError> {
        number(v)
    }

    fn serialize_char(self, v: char) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Text(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<DynamicValue, ConversionError> {
        self.nested()?;
        Ok(DynamicValue::Sequence(
            v.iter().map(|b| DynamicValue::Number((*b).into())).collect(),
        ))
    }

    fn serialize_none(self) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(
        self,
        value: &T,
    ) -> Result<DynamicValue, ConversionError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Text(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<DynamicValue, ConversionError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<DynamicValue, ConversionError> {
        let inner = value
            .serialize(self.nested()?)
            .map_err(|e| e.at(PathSegment::Field(variant.to_owned())))?;
        Ok(single_entry(variant, inner))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeSequence<'a>, ConversionError> {
        Ok(SerializeSequence {
            child: self.nested()?,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeSequence<'a>, ConversionError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeSequence<'a>, ConversionError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant<'a>, ConversionError> {
        Ok(SerializeTupleVariant {
            variant,
            seq: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMapping<'a>, ConversionError> {
        Ok(SerializeMapping {
            child: self.nested()?,
            map: Mapping::new(),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<SerializeRecord<'a>, ConversionError> {
        Ok(SerializeRecord {
            child: self.nested()?,
            map: Mapping::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant<'a>, ConversionError> {
        Ok(SerializeStructVariant {
            variant,
            record: self.serialize_struct(name, len)?,
        })
    }
}

pub(crate) struct SerializeSequence<'a> {
    child: ValueSerializer<'a>,
    items: Vec<DynamicValue>,
}

impl SerializeSequence<'_> {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ConversionError> {
        let index = self.items.len();
        let item = value
            .serialize(self.child)
            .map_err(|e| e.at(PathSegment::Index(index)))?;
        self.items.push(item);
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeSequence<'_> {
    type Ok = DynamicValue;
    type Error = ConversionError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ConversionError> {
        self.push(value)
    }

    fn end(self) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Sequence(self.items))
    }
}

impl ser::SerializeTuple for SerializeSequence<'_> {
    type Ok = DynamicValue;
    type Error = ConversionError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ConversionError> {
        self.push(value)
    }

    fn end(self) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Sequence(self.items))
    }
}

impl ser::SerializeTupleStruct for SerializeSequence<'_> {
    type Ok = DynamicValue;
    type Error = ConversionError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ConversionError> {
        self.push(value)
    }

    fn end(self) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Sequence(self.items))
    }
}

pub(crate) struct SerializeTupleVariant<'a> {
    variant: &'static str,
    seq: SerializeSequence<'a>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant<'_> {
    type Ok = DynamicValue;
    type Error = ConversionError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ConversionError> {
        self.seq
            .push(value)
            .map_err(|e| e.at(PathSegment::Field(self.variant.to_owned())))
    }

    fn end(self) -> Result<DynamicValue, ConversionError> {
        Ok(single_entry(
            self.variant,
            DynamicValue::Sequence(self.seq.items),
        ))
    }
}

pub(crate) struct SerializeMapping<'a> {
    child: ValueSerializer<'a>,
    map: Mapping,
    pending_key: Option<String>,
}

impl ser::SerializeMap for SerializeMapping<'_> {
    type Ok = DynamicValue;
    type Error = ConversionError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), ConversionError> {
        self.pending_key = Some(key_to_text(key)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ConversionError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| ser::Error::custom("map value serialized before its key"))?;
        let value = value
            .serialize(self.child)
            .map_err(|e| e.at(PathSegment::Field(key.clone())))?;
        self.map.insert(key, value);
        Ok(())
    }

    fn end(self) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Mapping(self.map))
    }
}

pub(crate) struct SerializeRecord<'a> {
    child: ValueSerializer<'a>,
    map: Mapping,
}

impl ser::SerializeStruct for SerializeRecord<'_> {
    type Ok = DynamicValue;
    type Error = ConversionError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ConversionError> {
        let value = value
            .serialize(self.child)
            .map_err(|e| e.at(PathSegment::Field(key.to_owned())))?;
        self.map.insert(key.to_owned(), value);
        Ok(())
    }

    fn end(self) -> Result<DynamicValue, ConversionError> {
        Ok(DynamicValue::Mapping(self.map))
    }
}

pub(crate) struct SerializeStructVariant<'a> {
    variant: &'static str,
    record: SerializeRecord<'a>,
}

impl ser::SerializeStructVariant for SerializeStructVariant<'_> {
    type Ok = DynamicValue;
    type Error = ConversionError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ConversionError> {
        ser::SerializeStruct::serialize_field(&mut self.record, key, value)
            .map_err(|e| e.at(PathSegment::Field(self.variant.to_owned())))
    }

    fn end(self) -> Result<DynamicValue, ConversionError> {
        Ok(single_entry(
            self.variant,
            DynamicValue::Mapping(self.record.map),
        ))
    }
}

/// Stringify a map key. Scalars use their textual form; compound keys
/// fall back to their JSON encoding.
fn key_to_text<T: Serialize + ?Sized>(key: &T) -> Result<String, ConversionError> {
    match key.serialize(KeySerializer) {
        Ok(text) => Ok(text),
        Err(KeyError::Compound) => serde_json::to_string(key)
            .map_err(|e| ConversionError::unsupported("map key", e.to_string())),
        Err(KeyError::Custom(msg)) => Err(ConversionError::new(ConversionErrorKind::Custom(msg))),
    }
}

#[derive(Debug)]
enum KeyError {
    Compound,
    Custom(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::Compound => f.write_str("compound map key"),
            KeyError::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for KeyError {}

impl ser::Error for KeyError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        KeyError::Custom(msg.to_string())
    }
}

struct KeySerializer;

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = KeyError;

    type SerializeSeq = Impossible<String, KeyError>;
    type SerializeTuple = Impossible<String, KeyError>;
    type SerializeTupleStruct = Impossible<String, KeyError>;
    type SerializeTupleVariant = Impossible<String, KeyError>;
    type SerializeMap = Impossible<String, KeyError>;
    type SerializeStruct = Impossible<String, KeyError>;
    type SerializeStructVariant = Impossible<String, KeyError>;

    fn serialize_bool(self, v: bool) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_i128(self, v: i128) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_u128(self, v: u128) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<String, KeyError> {
        Ok(format_number(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<String, KeyError> {
        Ok(format_number(v))
    }

    fn serialize_char(self, v: char) -> Result<String, KeyError> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String, KeyError> {
        Ok(v.to_owned())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_none(self) -> Result<String, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<String, KeyError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<String, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<String, KeyError> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String, KeyError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, KeyError> {
        Err(KeyError::Compound)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, KeyError> {
        Err(KeyError::Compound)
    }
}
