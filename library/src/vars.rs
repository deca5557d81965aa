//! Process-wide variable table.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::value::Value;

/// Named values shared by every node in a program.
///
/// Cloning yields another handle to the same table. There is no type
/// enforcement and no isolation: a write is visible to the very next read.
#[derive(Clone, Default)]
pub struct VariableStore {
    values: Rc<RefCell<HashMap<String, Value>>>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Value::Undefined` when the name is unknown.
    pub fn get(&self, name: &str) -> Value {
        self.values
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    pub fn set(&self, name: &str, value: Value) {
        self.values.borrow_mut().insert(name.to_string(), value);
    }

    pub fn delete(&self, name: &str) -> bool {
        self.values.borrow_mut().remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.values.borrow_mut().clear();
    }

    /// Creates a variable under `base`, or `var1`, `var2`, … when taken.
    /// Returns the name actually used.
    pub fn add_unique(&self, base: Option<&str>, value: Value) -> String {
        let mut name = base.unwrap_or("var").to_string();
        let mut counter = 1;
        while self.contains(&name) {
            name = format!("var{}", counter);
            counter += 1;
        }
        self.set(&name, value);
        name
    }

    /// Flat, name-sorted copy for serialization and display.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Replaces the whole table.
    pub fn restore(&self, snapshot: BTreeMap<String, Value>) {
        let mut values = self.values.borrow_mut();
        values.clear();
        values.extend(snapshot);
    }

    /// Coerces user-entered text; see [`Value::parse_literal`].
    pub fn parse_value(text: &str) -> Value {
        Value::parse_literal(text)
    }
}
