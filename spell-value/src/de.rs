//! Boundary → native: a serde `Deserializer` driven by the target type.
//!
//! The target shape decides which coercions apply. Scalars are lenient,
//! collections are strict, and `Null` stands in for the zero value of
//! whatever the target asks for.
//!
//! Absent record members are left to serde first, so `#[serde(default)]`
//! and aliases behave as declared. Only a member serde reports as missing
//! is filled with `Null` and decoded again.

use crate::convert::ConverterConfig;
use crate::error::{ConversionError, ConversionErrorKind, PathSegment};
use crate::value::{format_number, DynamicValue, Mapping, ValueKind, MAX_SAFE_INTEGER};
use serde::de::value::StringDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;
use std::collections::btree_map;
use std::vec;

/// Decode `value` into `T`, giving each missing record member its zero
/// value.
pub(crate) fn from_value<T: DeserializeOwned>(
    mut value: DynamicValue,
    config: &ConverterConfig,
) -> Result<T, ConversionError> {
    let mut filled: Option<ConversionError> = None;
    loop {
        let err = match T::deserialize(ValueDeserializer::new(value.clone(), config, 0)) {
            Ok(native) => return Ok(native),
            Err(err) => err,
        };
        // A member whose type has no zero value stays missing.
        if let Some(missing) = filled.take() {
            if rejects_filled_null(&missing, &err) {
                return Err(missing);
            }
        }
        let ConversionErrorKind::MissingField { field } = err.kind() else {
            return Err(err);
        };
        if !insert_null(&mut value, err.path().segments(), field) {
            return Err(err);
        }
        filled = Some(err);
    }
}

fn rejects_filled_null(missing: &ConversionError, err: &ConversionError) -> bool {
    let ConversionErrorKind::MissingField { field } = missing.kind() else {
        return false;
    };
    let at_member = err.path().segments().split_last().is_some_and(|(last, parent)| {
        parent == missing.path().segments() && *last == PathSegment::Field(field.clone())
    });
    at_member
        && matches!(
            err.kind(),
            ConversionErrorKind::Mismatch {
                found: ValueKind::Null,
                ..
            }
        )
}

/// Insert `field: Null` into the record at `path`. Returns false when the
/// path does not lead to a record or the member is already present.
fn insert_null(value: &mut DynamicValue, path: &[PathSegment], field: &str) -> bool {
    let mut current = value;
    for segment in path {
        let Some(next) = descend(current, segment) else {
            return false;
        };
        current = next;
    }
    if current.is_null() {
        *current = DynamicValue::Mapping(Mapping::new());
    }
    match current {
        DynamicValue::Mapping(map) if !map.contains_key(field) => {
            map.insert(field.to_owned(), DynamicValue::Null);
            true
        }
        _ => false,
    }
}

fn descend<'v>(
    value: &'v mut DynamicValue,
    segment: &PathSegment,
) -> Option<&'v mut DynamicValue> {
    // A variant named by text alone has its content spelled out.
    if let PathSegment::Field(key) = segment {
        if value.as_str() == Some(key.as_str()) {
            *value = DynamicValue::Mapping(Mapping::from([(key.clone(), DynamicValue::Null)]));
        }
    }
    match (value, segment) {
        (DynamicValue::Sequence(items), PathSegment::Index(index)) => items.get_mut(*index),
        (DynamicValue::Mapping(map), PathSegment::Field(key)) => map.get_mut(key),
        _ => None,
    }
}

pub(crate) struct ValueDeserializer<'a> {
    value: DynamicValue,
    config: &'a ConverterConfig,
    depth: usize,
}

impl<'a> ValueDeserializer<'a> {
    pub(crate) fn new(value: DynamicValue, config: &'a ConverterConfig, depth: usize) -> Self {
        Self {
            value,
            config,
            depth,
        }
    }

    fn coerce_bool(&self) -> Result<bool, ConversionError> {
        match &self.value {
            DynamicValue::Null => Ok(false),
            DynamicValue::Bool(b) => Ok(*b),
            DynamicValue::Number(n) => Ok(*n != 0.0),
            DynamicValue::Text(s) if self.config.lenient_text => {
                Ok(!(s.is_empty() || s == "false" || s == "0"))
            }
            other => Err(ConversionError::mismatch("bool", other.kind())),
        }
    }

    fn coerce_number(&self, shape: &str) -> Result<f64, ConversionError> {
        match &self.value {
            DynamicValue::Null => Ok(0.0),
            DynamicValue::Number(n) => Ok(*n),
            DynamicValue::Text(s) if self.config.lenient_text => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ConversionError::invalid(shape, s.as_str())),
            other => Err(ConversionError::mismatch(shape, other.kind())),
        }
    }

    fn coerce_text(self) -> Result<String, ConversionError> {
        match self.value {
            DynamicValue::Null => Ok(String::new()),
            DynamicValue::Bool(b) => Ok(b.to_string()),
            DynamicValue::Number(n) => Ok(format_number(n)),
            DynamicValue::Text(s) => Ok(s),
            other => Err(ConversionError::mismatch("string", other.kind())),
        }
    }
}

macro_rules! deserialize_number {
    ($($method:ident => $visit:ident($t:ty)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
                let n = self.coerce_number(stringify!($t))?;
                visitor.$visit(n as $t)
            }
        )*
    };
}

impl<'de, 'a> de::Deserializer<'de> for ValueDeserializer<'a> {
    type Error = ConversionError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        match self.value {
            DynamicValue::Null => visitor.visit_unit(),
            DynamicValue::Bool(b) => visitor.visit_bool(b),
            DynamicValue::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                if n < 0.0 {
                    visitor.visit_i64(n as i64)
                } else {
                    visitor.visit_u64(n as u64)
                }
            }
            DynamicValue::Number(n) => visitor.visit_f64(n),
            DynamicValue::Text(s) => visitor.visit_string(s),
            DynamicValue::Sequence(items) => visitor.visit_seq(SeqDeserializer::new(
                items,
                self.config,
                nested(self.depth, self.config)?,
            )),
            DynamicValue::Mapping(map) => visitor.visit_map(MapDeserializer::new(
                map,
                self.config,
                nested(self.depth, self.config)?,
            )),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        visitor.visit_bool(self.coerce_bool()?)
    }

    deserialize_number! {
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        match &self.value {
            DynamicValue::Null => visitor.visit_char('\0'),
            DynamicValue::Text(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(ConversionError::invalid("char", s.as_str())),
                }
            }
            other => Err(ConversionError::mismatch("char", other.kind())),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        visitor.visit_string(self.coerce_text()?)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        visitor.visit_string(self.coerce_text()?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        match self.value {
            DynamicValue::Null => visitor.visit_byte_buf(Vec::new()),
            DynamicValue::Text(s) => visitor.visit_byte_buf(s.into_bytes()),
            DynamicValue::Sequence(_) => self.deserialize_seq(visitor),
            other => Err(ConversionError::mismatch("bytes", other.kind())),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        if self.value.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        match self.value {
            DynamicValue::Null => visitor.visit_unit(),
            other => Err(ConversionError::mismatch("unit", other.kind())),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        let items = match self.value {
            DynamicValue::Null => Vec::new(),
            DynamicValue::Sequence(items) => items,
            other => return Err(ConversionError::mismatch("sequence", other.kind())),
        };
        let depth = nested(self.depth, self.config)?;
        visitor.visit_seq(SeqDeserializer::new(items, self.config, depth))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        if self.value.is_null() {
            let depth = nested(self.depth, self.config)?;
            let zeros = vec![DynamicValue::Null; len];
            return visitor.visit_seq(SeqDeserializer::new(zeros, self.config, depth));
        }
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        let map = match self.value {
            DynamicValue::Null => Mapping::new(),
            DynamicValue::Mapping(map) => map,
            other => return Err(ConversionError::mismatch("mapping", other.kind())),
        };
        let depth = nested(self.depth, self.config)?;
        visitor.visit_map(MapDeserializer::new(map, self.config, depth))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        let depth = nested(self.depth, self.config)?;
        let map = match self.value {
            DynamicValue::Mapping(map) => map,
            DynamicValue::Null => Mapping::new(),
            DynamicValue::Sequence(items) => {
                return visitor.visit_seq(SeqDeserializer::new(items, self.config, depth));
            }
            other => return Err(ConversionError::mismatch(name, other.kind())),
        };
        visitor.visit_map(MapDeserializer::new(map, self.config, depth))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        match self.value {
            DynamicValue::Text(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
                config: self.config,
                depth: self.depth,
            }),
            DynamicValue::Mapping(map) if map.len() == 1 => {
                let depth = nested(self.depth, self.config)?;
                let mut entries = map.into_iter();
                let Some((variant, value)) = entries.next() else {
                    return Err(ConversionError::mismatch(name, ValueKind::Mapping));
                };
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                    config: self.config,
                    depth,
                })
            }
            other => Err(ConversionError::mismatch(name, other.kind())),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        match self.value {
            DynamicValue::Text(s) => visitor.visit_string(s),
            DynamicValue::Number(n) if n >= 0.0 && n.fract() == 0.0 => visitor.visit_u64(n as u64),
            other => Err(ConversionError::mismatch("identifier", other.kind())),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        visitor.visit_unit()
    }
}

fn nested(depth: usize, config: &ConverterConfig) -> Result<usize, ConversionError> {
    let depth = depth + 1;
    if depth > config.max_depth {
        return Err(ConversionError::new(ConversionErrorKind::DepthExceeded {
            limit: config.max_depth,
        }));
    }
    Ok(depth)
}

struct SeqDeserializer<'a> {
    iter: vec::IntoIter<DynamicValue>,
    index: usize,
    config: &'a ConverterConfig,
    depth: usize,
}

impl<'a> SeqDeserializer<'a> {
    fn new(items: Vec<DynamicValue>, config: &'a ConverterConfig, depth: usize) -> Self {
        Self {
            iter: items.into_iter(),
            index: 0,
            config,
            depth,
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer<'_> {
    type Error = ConversionError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, ConversionError> {
        let Some(value) = self.iter.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(ValueDeserializer::new(value, self.config, self.depth))
            .map(Some)
            .map_err(|e| e.at(PathSegment::Index(index)))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer<'a> {
    iter: btree_map::IntoIter<String, DynamicValue>,
    pending: Option<(String, DynamicValue)>,
    config: &'a ConverterConfig,
    depth: usize,
}

impl<'a> MapDeserializer<'a> {
    fn new(map: Mapping, config: &'a ConverterConfig, depth: usize) -> Self {
        Self {
            iter: map.into_iter(),
            pending: None,
            config,
            depth,
        }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer<'_> {
    type Error = ConversionError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, ConversionError> {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        let parsed = seed
            .deserialize(KeyDeserializer {
                key: key.clone(),
                config: self.config,
                depth: self.depth,
            })
            .map_err(|e| e.at(PathSegment::Field(key.clone())))?;
        self.pending = Some((key, value));
        Ok(Some(parsed))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, ConversionError> {
        let (key, value) = self
            .pending
            .take()
            .ok_or_else(|| de::Error::custom("map value requested before its key"))?;
        seed.deserialize(ValueDeserializer::new(value, self.config, self.depth))
            .map_err(|e| e.at(PathSegment::Field(key)))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer<'a> {
    variant: String,
    value: Option<DynamicValue>,
    config: &'a ConverterConfig,
    depth: usize,
}

impl<'de, 'a> EnumAccess<'de> for EnumDeserializer<'a> {
    type Error = ConversionError;
    type Variant = VariantDeserializer<'a>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, VariantDeserializer<'a>), ConversionError> {
        let name: StringDeserializer<ConversionError> = self.variant.clone().into_deserializer();
        let tag = seed.deserialize(name)?;
        Ok((
            tag,
            VariantDeserializer {
                variant: self.variant,
                value: self.value,
                config: self.config,
                depth: self.depth,
            },
        ))
    }
}

struct VariantDeserializer<'a> {
    variant: String,
    value: Option<DynamicValue>,
    config: &'a ConverterConfig,
    depth: usize,
}

impl<'a> VariantDeserializer<'a> {
    fn content(self) -> (String, ValueDeserializer<'a>) {
        let value = self.value.unwrap_or_default();
        (
            self.variant,
            ValueDeserializer::new(value, self.config, self.depth),
        )
    }
}

impl<'de> VariantAccess<'de> for VariantDeserializer<'_> {
    type Error = ConversionError;

    fn unit_variant(self) -> Result<(), ConversionError> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, ConversionError> {
        let (variant, content) = self.content();
        seed.deserialize(content)
            .map_err(|e| e.at(PathSegment::Field(variant)))
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        let (variant, content) = self.content();
        de::Deserializer::deserialize_tuple(content, len, visitor)
            .map_err(|e| e.at(PathSegment::Field(variant)))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        let (variant, content) = self.content();
        de::Deserializer::deserialize_struct(content, "variant", fields, visitor)
            .map_err(|e| e.at(PathSegment::Field(variant)))
    }
}

/// Deserializes a mapping key into the target key type.
///
/// Scalar key types parse the text; compound key types parse it as JSON,
/// mirroring how they were stringified on the way out.
struct KeyDeserializer<'a> {
    key: String,
    config: &'a ConverterConfig,
    depth: usize,
}

impl<'a> KeyDeserializer<'a> {
    fn parse<T: std::str::FromStr>(&self, shape: &str) -> Result<T, ConversionError> {
        self.key
            .trim()
            .parse::<T>()
            .map_err(|_| ConversionError::invalid(shape, self.key.as_str()))
    }

    fn compound(self) -> Result<ValueDeserializer<'a>, ConversionError> {
        let json: serde_json::Value = serde_json::from_str(&self.key)
            .map_err(|_| ConversionError::invalid("map key", self.key.as_str()))?;
        Ok(ValueDeserializer::new(json.into(), self.config, self.depth))
    }
}

macro_rules! deserialize_key {
    ($($method:ident => $visit:ident($t:ty)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
                visitor.$visit(self.parse::<$t>(stringify!($t))?)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for KeyDeserializer<'_> {
    type Error = ConversionError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        visitor.visit_string(self.key)
    }

    deserialize_key! {
        deserialize_bool => visit_bool(bool),
        deserialize_i8 => visit_i8(i8),
        deserialize_i16 => visit_i16(i16),
        deserialize_i32 => visit_i32(i32),
        deserialize_i64 => visit_i64(i64),
        deserialize_i128 => visit_i128(i128),
        deserialize_u8 => visit_u8(u8),
        deserialize_u16 => visit_u16(u16),
        deserialize_u32 => visit_u32(u32),
        deserialize_u64 => visit_u64(u64),
        deserialize_u128 => visit_u128(u128),
        deserialize_f32 => visit_f32(f32),
        deserialize_f64 => visit_f64(f64),
        deserialize_char => visit_char(char),
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        let name: StringDeserializer<ConversionError> = self.key.into_deserializer();
        visitor.visit_enum(name)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        de::Deserializer::deserialize_seq(self.compound()?, visitor)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        de::Deserializer::deserialize_tuple(self.compound()?, len, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        de::Deserializer::deserialize_tuple_struct(self.compound()?, name, len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, ConversionError> {
        de::Deserializer::deserialize_map(self.compound()?, visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, ConversionError> {
        de::Deserializer::deserialize_struct(self.compound()?, name, fields, visitor)
    }

    forward_to_deserialize_any! {
        str string bytes byte_buf unit unit_struct identifier ignored_any
    }
}
