//! The closed value type that crosses the script/host boundary.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Ordered-key mapping used for boundary objects.
pub type Mapping = BTreeMap<String, DynamicValue>;

/// Largest integer an `f64` represents exactly (2^53).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A language-agnostic value passed between script engines and native code.
///
/// The tag set is deliberately closed: every engine can represent these six
/// shapes, and every value round-trips through JSON. Numbers are always
/// double precision; integers above 2^53 lose precision.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    /// Absent value (`nil`, `null`, `undefined`).
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Double-precision number.
    Number(f64),
    /// UTF-8 text.
    Text(String),
    /// Ordered sequence.
    Sequence(Vec<DynamicValue>),
    /// Text-keyed mapping with ordered keys.
    Mapping(Mapping),
}

/// The tag of a [`DynamicValue`], used in error messages and type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`DynamicValue::Null`]
    Null,
    /// [`DynamicValue::Bool`]
    Bool,
    /// [`DynamicValue::Number`]
    Number,
    /// [`DynamicValue::Text`]
    Text,
    /// [`DynamicValue::Sequence`]
    Sequence,
    /// [`DynamicValue::Mapping`]
    Mapping,
}

impl ValueKind {
    /// Lower-case name of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
        }
    }

    /// Whether the tag is a collection (sequence or mapping).
    pub fn is_collection(&self) -> bool {
        matches!(self, ValueKind::Sequence | ValueKind::Mapping)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DynamicValue {
    /// The tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            DynamicValue::Null => ValueKind::Null,
            DynamicValue::Bool(_) => ValueKind::Bool,
            DynamicValue::Number(_) => ValueKind::Number,
            DynamicValue::Text(_) => ValueKind::Text,
            DynamicValue::Sequence(_) => ValueKind::Sequence,
            DynamicValue::Mapping(_) => ValueKind::Mapping,
        }
    }

    /// Whether this is [`DynamicValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, DynamicValue::Null)
    }

    /// The boolean, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is a `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynamicValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text, if this is a `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The elements, if this is a `Sequence`.
    pub fn as_sequence(&self) -> Option<&[DynamicValue]> {
        match self {
            DynamicValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this is a `Mapping`.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            DynamicValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this is a `Mapping`.
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        self.as_mapping().and_then(|map| map.get(key))
    }
}

/// Render a number the way script engines print it: integral values
/// without a fractional part.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::Value::from(self.clone());
        write!(f, "{json}")
    }
}

impl Serialize for DynamicValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DynamicValue::Null => serializer.serialize_unit(),
            DynamicValue::Bool(b) => serializer.serialize_bool(*b),
            DynamicValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            DynamicValue::Text(s) => serializer.serialize_str(s),
            DynamicValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DynamicValue::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct DynamicValueVisitor;

impl<'de> Visitor<'de> for DynamicValueVisitor {
    type Value = DynamicValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any boundary value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<DynamicValue, E> {
        Ok(DynamicValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<DynamicValue, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<DynamicValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(DynamicValue::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<DynamicValue, A::Error> {
        let mut map = Mapping::new();
        while let Some((k, v)) = access.next_entry::<String, DynamicValue>()? {
            map.insert(k, v);
        }
        Ok(DynamicValue::Mapping(map))
    }
}

impl<'de> Deserialize<'de> for DynamicValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DynamicValueVisitor)
    }
}

impl From<serde_json::Value> for DynamicValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DynamicValue::Null,
            serde_json::Value::Bool(b) => DynamicValue::Bool(b),
            serde_json::Value::Number(n) => DynamicValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => DynamicValue::Text(s),
            serde_json::Value::Array(items) => {
                DynamicValue::Sequence(items.into_iter().map(DynamicValue::from).collect())
            }
            serde_json::Value::Object(map) => DynamicValue::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, DynamicValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<DynamicValue> for serde_json::Value {
    fn from(value: DynamicValue) -> Self {
        match value {
            DynamicValue::Null => serde_json::Value::Null,
            DynamicValue::Bool(b) => serde_json::Value::Bool(b),
            DynamicValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    serde_json::Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            DynamicValue::Text(s) => serde_json::Value::String(s),
            DynamicValue::Sequence(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            DynamicValue::Mapping(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        DynamicValue::Bool(b)
    }
}

macro_rules! from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DynamicValue {
                fn from(n: $t) -> Self {
                    DynamicValue::Number(n as f64)
                }
            }
        )*
    };
}

from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::Text(s.to_owned())
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        DynamicValue::Text(s)
    }
}

impl From<Mapping> for DynamicValue {
    fn from(map: Mapping) -> Self {
        DynamicValue::Mapping(map)
    }
}

impl<T: Into<DynamicValue>> From<Vec<T>> for DynamicValue {
    fn from(items: Vec<T>) -> Self {
        DynamicValue::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<DynamicValue>> From<Option<T>> for DynamicValue {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(DynamicValue::Null)
    }
}

impl FromIterator<(String, DynamicValue)> for DynamicValue {
    fn from_iter<I: IntoIterator<Item = (String, DynamicValue)>>(iter: I) -> Self {
        DynamicValue::Mapping(iter.into_iter().collect())
    }
}

impl FromIterator<DynamicValue> for DynamicValue {
    fn from_iter<I: IntoIterator<Item = DynamicValue>>(iter: I) -> Self {
        DynamicValue::Sequence(iter.into_iter().collect())
    }
}
