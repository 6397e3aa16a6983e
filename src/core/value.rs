//! Hydrated output values.
use chrono::{DateTime, FixedOffset};
use serde::{
    Serialize, Serializer,
    de::DeserializeOwned,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::Value;

/// A single coerced field value
#[derive(Debug, Clone, PartialEq)]
pub enum HydratedValue {
    Null,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// List of raw strings (header / parameter arrays, command words)
    List(Vec<String>),
    /// JSON carried through untouched (mixed, object and untyped array fields)
    Json(Value),
    Date(DateTime<FixedOffset>),
    Dto(HydratedDto),
    DtoList(Vec<HydratedDto>),
}

impl HydratedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, HydratedValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HydratedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HydratedValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HydratedValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HydratedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            HydratedValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            HydratedValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            HydratedValue::Date(date) => Some(date),
            _ => None,
        }
    }

    pub fn as_dto(&self) -> Option<&HydratedDto> {
        match self {
            HydratedValue::Dto(dto) => Some(dto),
            _ => None,
        }
    }

    pub fn as_dto_list(&self) -> Option<&[HydratedDto]> {
        match self {
            HydratedValue::DtoList(items) => Some(items),
            _ => None,
        }
    }
}

impl Serialize for HydratedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HydratedValue::Null => serializer.serialize_unit(),
            HydratedValue::String(s) => serializer.serialize_str(s),
            HydratedValue::Int(i) => serializer.serialize_i64(*i),
            HydratedValue::Float(f) => serializer.serialize_f64(*f),
            HydratedValue::Bool(b) => serializer.serialize_bool(*b),
            HydratedValue::List(items) => items.serialize(serializer),
            HydratedValue::Json(value) => value.serialize(serializer),
            HydratedValue::Date(date) => date.serialize(serializer),
            HydratedValue::Dto(dto) => dto.serialize(serializer),
            HydratedValue::DtoList(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// A fully populated DTO. Fields keep their declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct HydratedDto {
    type_name: String,
    fields: Vec<(String, HydratedValue)>,
}

impl HydratedDto {
    pub(crate) fn new(type_name: impl Into<String>, fields: Vec<(String, HydratedValue)>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Registered name of the DTO type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn get(&self, field: &str) -> Option<&HydratedValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &HydratedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Convert into a typed struct through its serde representation
    pub fn into_typed<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::from_value(serde_json::to_value(&self)?)
    }
}

impl Serialize for HydratedDto {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
