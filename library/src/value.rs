//! Runtime values carried by data pins, properties and variables.
//!
//! `Value` is deliberately loose: ports only declare a kind, so every node
//! coerces what it reads. The coercions follow the usual scripting-language
//! rules (truthiness, `==`, numeric parsing) so that programs behave the way
//! users expect when they wire a string into a number input.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sprite::SpriteId;

/// Object key used to encode a sprite reference in JSON.
const SPRITE_KEY: &str = "$sprite";

static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(Infinity|(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?)$").expect("valid regex")
});

static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(Infinity|(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?)").expect("valid regex")
});

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "serde_json::Value", from = "serde_json::Value")]
pub enum Value {
    /// No value at all: unconnected pins, missing variables, out-of-range reads.
    #[default]
    Undefined,
    Null,
    Number(f64),
    String(String),
    Boolean(bool),
    /// Immutable snapshot; "modifying" an array always produces a new one.
    Array(Rc<Vec<Value>>),
    Object(Rc<BTreeMap<String, Value>>),
    /// Reference to a sprite on the stage, resolved at use time.
    Sprite(SpriteId),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    pub fn empty_array() -> Self {
        Value::array(Vec::new())
    }

    /// `undefined` or `null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns `default` when this value is nullish, otherwise `self`.
    pub fn or_else(self, default: impl Into<Value>) -> Value {
        if self.is_nullish() {
            default.into()
        } else {
            self
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Sprite(_) => true,
        }
    }

    /// Strict numeric conversion; unparseable input becomes NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_number_strict(s),
            Value::Array(items) => match items.len() {
                0 => 0.0,
                1 => Value::String(items[0].to_display_string()).to_number(),
                _ => f64::NAN,
            },
            Value::Object(_) | Value::Sprite(_) => f64::NAN,
        }
    }

    /// The input value as a number, or `default` when it is nullish.
    pub fn number_or(&self, default: f64) -> f64 {
        if self.is_nullish() {
            default
        } else {
            self.to_number()
        }
    }

    pub fn as_array(&self) -> Option<&Rc<Vec<Value>>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_sprite(&self) -> Option<SpriteId> {
        match self {
            Value::Sprite(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Human-facing text: numbers without trailing `.0`, arrays comma-joined.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Array(items) => items
                .iter()
                .map(|v| {
                    if v.is_nullish() {
                        String::new()
                    } else {
                        v.to_display_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Sprite(id) => format!("[sprite {}]", id),
        }
    }

    /// Text used by print-like nodes: structured values become JSON.
    pub fn to_text(&self) -> String {
        match self {
            Value::Array(_) | Value::Object(_) => self.to_json().to_string(),
            other => other.to_display_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Sprite(id) => serde_json::json!({ SPRITE_KEY: id.to_string() }),
        }
    }

    /// Parses user-entered text: `true`/`false`/`null`, then numeric
    /// literals, then JSON arrays/objects, otherwise the raw string.
    pub fn parse_literal(text: &str) -> Value {
        let trimmed = text.trim();
        match trimmed {
            "true" => return Value::Boolean(true),
            "false" => return Value::Boolean(false),
            "null" => return Value::Null,
            _ => {}
        }
        if NUMERIC_LITERAL.is_match(trimmed) {
            return Value::Number(parse_number_strict(trimmed));
        }
        let structured = (trimmed.starts_with('[') && trimmed.ends_with(']'))
            || (trimmed.starts_with('{') && trimmed.ends_with('}'));
        if structured {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
                return Value::from(json);
            }
        }
        Value::String(text.to_string())
    }

    /// Loose equality as used by the compare node's `==` and `!=`.
    ///
    /// `null` and `undefined` equal each other and nothing else; numbers,
    /// strings and booleans are compared numerically when their kinds differ;
    /// arrays and objects compare structurally, or by their text form against
    /// a primitive.
    pub fn loose_eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (Sprite(a), Sprite(b)) => a == b,
            (Sprite(_), _) | (_, Sprite(_)) => false,
            (Array(a), Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            (Object(a), Object(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.loose_eq(w)))
            }
            (Array(_) | Object(_), Array(_) | Object(_)) => false,
            (Boolean(_), _) => Number(self.to_number()).loose_eq(other),
            (_, Boolean(_)) => self.loose_eq(&Number(other.to_number())),
            (Array(_) | Object(_), _) => String(self.to_display_string()).loose_eq(other),
            (_, Array(_) | Object(_)) => self.loose_eq(&String(other.to_display_string())),
            (Number(a), String(_)) => *a == other.to_number(),
            (String(_), Number(b)) => self.to_number() == *b,
        }
    }

    /// Relational ordering for `<`, `>`, `<=`, `>=`.
    ///
    /// Two strings compare lexicographically; anything else compares
    /// numerically. `None` means the values are unordered (a NaN is
    /// involved), which makes every relational operator false.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        let a = self.to_primitive();
        let b = other.to_primitive();
        if let (Value::String(x), Value::String(y)) = (&a, &b) {
            return Some(x.cmp(y));
        }
        a.to_number().partial_cmp(&b.to_number())
    }

    fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Object(_) => Value::String(self.to_display_string()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value as f64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::array(value)
    }
}

impl From<SpriteId> for Value {
    fn from(value: SpriteId) -> Self {
        Value::Sprite(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::array(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => {
                if o.len() == 1 {
                    if let Some(id) = o
                        .get(SPRITE_KEY)
                        .and_then(|v| v.as_str())
                        .and_then(|s| s.parse::<SpriteId>().ok())
                    {
                        return Value::Sprite(id);
                    }
                }
                Value::Object(Rc::new(
                    o.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
                ))
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

/// Formats a number the way users expect to read it (`3`, `0.5`, `NaN`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}

/// Parses the longest numeric prefix, ignoring leading whitespace.
/// Returns NaN when the text does not start with a number.
pub fn parse_float_prefix(text: &str) -> f64 {
    let trimmed = text.trim_start();
    match NUMERIC_PREFIX.find(trimmed) {
        Some(m) => parse_number_strict(m.as_str()),
        None => f64::NAN,
    }
}

fn parse_number_strict(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if !NUMERIC_LITERAL.is_match(trimmed) {
        return f64::NAN;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= (i64::MAX as f64) {
        serde_json::Value::Number(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_parsing_priority() {
        assert_eq!(Value::parse_literal("true"), Value::Boolean(true));
        assert_eq!(Value::parse_literal(" null "), Value::Null);
        assert_eq!(Value::parse_literal("42"), Value::Number(42.0));
        assert_eq!(Value::parse_literal("-1.5e2"), Value::Number(-150.0));
        assert_eq!(
            Value::parse_literal("[1, 2]"),
            Value::array(vec![Value::Number(1.0), Value::Number(2.0)])
        );
        assert_eq!(Value::parse_literal("[oops"), Value::from("[oops"));
        assert_eq!(Value::parse_literal("hello world"), Value::from("hello world"));
    }

    #[test]
    fn loose_equality_coerces_between_kinds() {
        assert!(Value::Number(1.0).loose_eq(&Value::from("1")));
        assert!(Value::Boolean(true).loose_eq(&Value::Number(1.0)));
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(!Value::Null.loose_eq(&Value::Number(0.0)));
        assert!(!Value::Number(f64::NAN).loose_eq(&Value::Number(f64::NAN)));
        assert!(Value::array(vec![1.into(), 2.into()]).loose_eq(&Value::from("1,2")));
    }

    #[test]
    fn relational_compare_strings_and_numbers() {
        assert_eq!(
            Value::from("apple").loose_cmp(&Value::from("banana")),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::from("10").loose_cmp(&Value::Number(9.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::from("abc").loose_cmp(&Value::Number(1.0)), None);
    }

    #[test]
    fn float_prefix_matches_leading_number() {
        assert_eq!(parse_float_prefix("  12px"), 12.0);
        assert_eq!(parse_float_prefix("3.5e"), 3.5);
        assert!(parse_float_prefix("px12").is_nan());
    }

    #[test]
    fn numbers_format_without_trailing_zero() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(Value::Number(f64::INFINITY).to_display_string(), "Infinity");
    }

    #[test]
    fn json_round_trip_keeps_sprite_refs() {
        let id = SpriteId::new();
        let value = Value::array(vec![Value::Sprite(id), Value::from("x")]);
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
