// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::ids::*;

pub const KEY_FIELD: &str = "key";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    TextList(Vec<String>),
}

impl FieldValue {
    /// String form shared by the grid cells and the filter predicate.
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Decimal(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::TextList(values) => values.join(","),
        }
    }

    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "int",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "string",
            Self::TextList(_) => "string[]",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::TextList(values)
    }
}

/// Field name to value, in the order the fields were first seen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields(Vec<(String, FieldValue)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = Fields;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an object of field values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Fields, A::Error> {
                let mut fields = Fields::new();
                while let Some(name) = access.next_key::<String>()? {
                    let value = access.next_value::<FieldValue>()?;
                    fields.insert(name, value);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

pub type DetailPayload = Fields;

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub key: RowKey,
    pub fields: Fields,
}

impl Row {
    pub fn new(key: impl Into<RowKey>, fields: Fields) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// Cell text for a column; the `key` column reads the row key.
    pub fn cell(&self, column: &str) -> Option<String> {
        if column == KEY_FIELD {
            return Some(self.key.to_string());
        }
        self.fields.get(column).map(FieldValue::display)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(KEY_FIELD, &self.key)?;
        for (name, value) in self.fields.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RowVisitor;

        impl<'de> Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a row object with a `key` member")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Row, A::Error> {
                let mut key = None;
                let mut fields = Fields::new();
                while let Some(name) = access.next_key::<String>()? {
                    if name == KEY_FIELD {
                        if key.is_some() {
                            return Err(de::Error::duplicate_field(KEY_FIELD));
                        }
                        key = Some(access.next_value::<RowKey>()?);
                    } else {
                        fields.insert(name, access.next_value::<FieldValue>()?);
                    }
                }
                let key = key.ok_or_else(|| de::Error::missing_field(KEY_FIELD))?;
                Ok(Row { key, fields })
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

/// Selected row keys in the order the grid reported them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection(Vec<RowKey>);

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(key: impl Into<RowKey>) -> Self {
        Self(vec![key.into()])
    }

    /// Key that detail fetches target.
    pub fn primary(&self) -> Option<&RowKey> {
        self.0.first()
    }

    pub fn contains(&self, key: &RowKey) -> bool {
        self.0.contains(key)
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<RowKey>> FromIterator<K> for Selection {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut keys: Vec<RowKey> = Vec::new();
        for key in iter {
            let key = key.into();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Self(keys)
    }
}

/// Tag carried by an in-flight detail fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub request_id: RequestId,
    pub key: RowKey,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailStatus {
    #[default]
    Idle,
    Loading {
        ticket: DetailTicket,
    },
    Loaded {
        key: RowKey,
        payload: DetailPayload,
    },
    Failed {
        key: RowKey,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DatasetStatus {
    #[default]
    Pending,
    Loading,
    Ready,
    Failed(String),
}
