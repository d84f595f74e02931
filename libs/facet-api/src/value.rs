use std::collections::{BTreeMap, BTreeSet};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};

/// Application-side value.
///
/// Every converter accepts a `Value` on serialize and produces one on
/// deserialize. The shapes mirror what a schema can describe:
/// - Scalars: `String`, `Number`, `Binary`, `Bool`, `Date`
/// - Sets: `StringSet`, `NumberSet`, `BinarySet` (distinct elements, no order)
/// - Compounds: `List` (ordered), `Map` (named fields)
///
/// `Null` stands for "not provided". An optional converter given `Null`
/// produces no wire value, and a map field holding `Null` counts as missing.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Number(f64),
    Binary(Vec<u8>),
    Bool(bool),
    Date(DateTime<Utc>),

    StringSet(BTreeSet<String>),
    /// Distinct numbers. Compared as a set; [`Value::number_set`] and
    /// deserialization keep them ascending without duplicates.
    NumberSet(Vec<f64>),
    BinarySet(BTreeSet<Vec<u8>>),

    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the dynamic kind, used in type-mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Binary(_) => "binary",
            Value::Bool(_) => "boolean",
            Value::Date(_) => "date",
            Value::StringSet(_) => "string set",
            Value::NumberSet(_) => "number set",
            Value::BinarySet(_) => "binary set",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Field lookup on a map value. `None` for non-maps and for `Null` fields.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_map()
            .and_then(|m| m.get(field))
            .filter(|v| !v.is_null())
    }

    /// Build a map value from `(name, value)` pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn string_set<S, I>(items: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Value::StringSet(items.into_iter().map(Into::into).collect())
    }

    /// Number set, sorted ascending with duplicates removed.
    pub fn number_set<I>(items: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Value::NumberSet(sorted_distinct(items.into_iter().collect()))
    }

    /// Convert plain JSON input. Objects become maps, arrays become lists.
    ///
    /// JSON has no set, binary or date shapes; those only enter through
    /// typed records or deserialization.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as JSON for display. Dates use RFC 3339, binary uses base64,
    /// sets become arrays.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::String(s) => Json::String(s.clone()),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Binary(b) => Json::String(STANDARD.encode(b)),
            Value::Bool(b) => Json::Bool(*b),
            Value::Date(d) => Json::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::StringSet(s) => Json::Array(s.iter().cloned().map(Json::String).collect()),
            Value::NumberSet(s) => Json::Array(
                s.iter()
                    .filter_map(|n| serde_json::Number::from_f64(*n))
                    .map(Json::Number)
                    .collect(),
            ),
            Value::BinarySet(s) => Json::Array(
                s.iter().map(|b| Json::String(STANDARD.encode(b))).collect(),
            ),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn sorted_distinct(mut numbers: Vec<f64>) -> Vec<f64> {
    numbers.sort_by(f64::total_cmp);
    numbers.dedup();
    numbers
}

/// Structural equality, except that number sets ignore order and duplicates.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::StringSet(a), Value::StringSet(b)) => a == b,
            (Value::NumberSet(a), Value::NumberSet(b)) => {
                sorted_distinct(a.clone()) == sorted_distinct(b.clone())
            }
            (Value::BinarySet(a), Value::BinarySet(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_json_maps_objects_and_arrays() {
        let json = serde_json::json!({ "id": "u1", "tags": ["a", "b"], "age": 3 });
        let value = Value::from_json(json);

        assert_eq!(value.get("id"), Some(&Value::from("u1")));
        assert_eq!(
            value.get("tags"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(value.get("age"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn get_skips_null_fields() {
        let value = Value::map([("name", Value::Null)]);
        assert_eq!(value.get("name"), None);
    }

    #[test]
    fn number_sets_compare_as_sets() {
        assert_eq!(Value::number_set([2.0, 1.0, 2.0]), Value::NumberSet(vec![1.0, 2.0]));
        assert_eq!(
            Value::NumberSet(vec![2.0, 1.0, 2.0]),
            Value::NumberSet(vec![1.0, 2.0])
        );
        assert_ne!(Value::NumberSet(vec![1.0]), Value::NumberSet(vec![1.0, 2.0]));
        assert_ne!(Value::NumberSet(vec![1.0]), Value::List(vec![Value::Number(1.0)]));
    }

    #[test]
    fn to_json_renders_sets_as_arrays() {
        let value = Value::string_set(["b", "a"]);
        assert_eq!(value.to_json(), serde_json::json!(["a", "b"]));
    }
}
