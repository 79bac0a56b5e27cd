//! Request parameters and their form encoding.
//!
//! # Design
//! `Params` keeps insertion order so encoded output is deterministic. Nested
//! maps flatten to `parent[child]` keys, recursively for deeper levels
//! (`parent[child][grandchild]`), and lists to `key[0]`, `key[1]`. A mapping is
//! never sent as a scalar.

use serde_json::Value;

use crate::error::{Error, Result};

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Scalar(String),
    Map(Params),
    List(Vec<ParamValue>),
}

/// Ordered key/value parameters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing an existing one with the same key in place.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Add a nested mapping, encoded as `key[child]` pairs.
    pub fn nested(self, key: impl Into<String>, params: Params) -> Self {
        self.insert(key, ParamValue::Map(params))
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Flatten into form pairs.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, value) in &self.entries {
            flatten_into(key.clone(), value, &mut out);
        }
        out
    }

    /// `application/x-www-form-urlencoded` text for the flattened pairs.
    pub fn encode(&self) -> Result<String> {
        serde_urlencoded::to_string(self.flatten()).map_err(|e| Error::InvalidParams(e.to_string()))
    }
}

fn flatten_into(key: String, value: &ParamValue, out: &mut Vec<(String, String)>) {
    match value {
        ParamValue::Scalar(s) => out.push((key, s.clone())),
        ParamValue::Map(children) => {
            for (child, v) in &children.entries {
                flatten_into(format!("{key}[{child}]"), v, out);
            }
        }
        ParamValue::List(items) => {
            for (i, v) in items.iter().enumerate() {
                flatten_into(format!("{key}[{i}]"), v, out);
            }
        }
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Params::new(), |p, (k, v)| p.insert(k, v))
    }
}

impl From<Params> for ParamValue {
    fn from(p: Params) -> Self {
        ParamValue::Map(p)
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Scalar(s)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Scalar(s.to_string())
    }
}

impl From<&String> for ParamValue {
    fn from(s: &String) -> Self {
        ParamValue::Scalar(s.clone())
    }
}

macro_rules! scalar_from_display {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(v: $t) -> Self {
                    ParamValue::Scalar(v.to_string())
                }
            }
        )*
    };
}

scalar_from_display!(bool, i32, i64, u32, u64, usize, f64);

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<Value> for Params {
    type Error = Error;

    /// Converts a JSON object. `null` members are dropped.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let mut params = Params::new();
                for (k, v) in map {
                    if let Some(v) = param_from_json(v) {
                        params = params.insert(k, v);
                    }
                }
                Ok(params)
            }
            other => Err(Error::InvalidParams(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

fn param_from_json(value: Value) -> Option<ParamValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.into()),
        Value::Number(n) => Some(ParamValue::Scalar(n.to_string())),
        Value::String(s) => Some(s.into()),
        Value::Array(items) => Some(ParamValue::List(
            items.into_iter().filter_map(param_from_json).collect(),
        )),
        Value::Object(map) => {
            let mut params = Params::new();
            for (k, v) in map {
                if let Some(v) = param_from_json(v) {
                    params = params.insert(k, v);
                }
            }
            Some(ParamValue::Map(params))
        }
    }
}
