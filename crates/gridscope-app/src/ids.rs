// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RowKey(String);

impl RowKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for RowKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// Upstream services hand out numeric ids as often as string ids.
impl<'de> Deserialize<'de> for RowKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RowKeyVisitor;

        impl Visitor<'_> for RowKeyVisitor {
            type Value = RowKey;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a string or integer row key")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<RowKey, E> {
                Ok(RowKey::from(value))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<RowKey, E> {
                Ok(RowKey::from(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<RowKey, E> {
                Ok(RowKey::new(value.to_string()))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<RowKey, E> {
                Ok(RowKey::new(value.to_string()))
            }
        }

        deserializer.deserialize_any(RowKeyVisitor)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Next id in the generation sequence; never returns zero.
    pub const fn next(self) -> Self {
        let next = self.0.wrapping_add(1);
        if next == 0 { Self(1) } else { Self(next) }
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
