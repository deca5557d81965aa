use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// User-configurable properties of a node instance.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(transparent)]
pub struct PropertyMap {
    properties: BTreeMap<String, Value>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// The property, or `Value::Undefined` when absent.
    pub fn value(&self, key: &str) -> Value {
        self.properties.get(key).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }

    pub fn get_number(&self, key: &str, default: f64) -> f64 {
        match self.properties.get(key) {
            Some(v) if !v.is_nullish() => {
                let n = v.to_number();
                if n.is_nan() { default } else { n }
            }
            _ => default,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.properties
            .get(key)
            .map(Value::truthy)
            .unwrap_or(default)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.properties.get(key) {
            Some(v) if !v.is_nullish() => v.to_display_string(),
            _ => default.to_string(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.properties.keys()
    }

    /// Fills in every key of `defaults` that is missing here.
    pub fn merge_defaults(&mut self, defaults: &PropertyMap) {
        for (key, value) in &defaults.properties {
            self.properties
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}
