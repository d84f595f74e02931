use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::error::{FacetError, Result};
use crate::value::Value;

/// Conversion of a Rust value into an application [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion of an application [`Value`] back into a Rust value.
///
/// Fails with a type mismatch when the dynamic kind does not fit.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

/// One field of a hand-declared record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    /// `Option<_>` in the record type; must match an optional converter.
    pub optional: bool,
}

impl FieldDecl {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            optional: true,
        }
    }
}

/// A hand-declared record type standing beside a map schema.
///
/// The schema tree is the source of truth; `FIELDS` is checked against it
/// when a typed entity is built, so a drift between the two is caught at
/// schema-construction time instead of on the first write.
pub trait Record: IntoValue + FromValue {
    const FIELDS: &'static [FieldDecl];
}

/// Field-by-field reader for implementing [`FromValue`] on records.
///
/// ```ignore
/// let mut fields = Fields::new(value)?;
/// Ok(User { id: fields.take("id")?, name: fields.take("name")? })
/// ```
pub struct Fields(BTreeMap<String, Value>);

impl Fields {
    pub fn new(value: Value) -> Result<Self> {
        match value {
            Value::Map(m) => Ok(Self(m)),
            other => Err(FacetError::type_mismatch("map", other.kind_name())),
        }
    }

    /// Remove and convert one field. A missing field reads as `Null`, so
    /// only `Option<_>` targets accept it.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T> {
        let value = self.0.remove(name).unwrap_or(Value::Null);
        T::from_value(value).map_err(|e| e.with_context(name))
    }
}

fn mismatch<T>(expected: &'static str, value: &Value) -> Result<T> {
    Err(FacetError::type_mismatch(expected, value.kind_name()))
}

/// Binary payload. A newtype so `Vec<u8>` stays free to mean a list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Bytes(pub Vec<u8>);

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => mismatch("string", &other),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Number(n) => Ok(n),
            other => mismatch("number", &other),
        }
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Number(self as f64)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= (1u64 << 53) as f64 => Ok(n as i64),
            Value::Number(n) => Err(FacetError::invalid("integer", format!("{n} is not integral"))),
            other => mismatch("number", &other),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => mismatch("boolean", &other),
        }
    }
}

impl IntoValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::Date(self)
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Date(d) => Ok(d),
            other => mismatch("date", &other),
        }
    }
}

impl IntoValue for Bytes {
    fn into_value(self) -> Value {
        Value::Binary(self.0)
    }
}

impl FromValue for Bytes {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Binary(b) => Ok(Bytes(b)),
            other => mismatch("binary", &other),
        }
    }
}

impl IntoValue for BTreeSet<String> {
    fn into_value(self) -> Value {
        Value::StringSet(self)
    }
}

impl FromValue for BTreeSet<String> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::StringSet(s) => Ok(s),
            other => mismatch("string set", &other),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map(IntoValue::into_value).unwrap_or(Value::Null)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| T::from_value(v).map_err(|e| e.with_context(i)))
                .collect(),
            other => mismatch("list", &other),
        }
    }
}

impl<T: IntoValue> IntoValue for BTreeMap<String, T> {
    fn into_value(self) -> Value {
        Value::Map(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(fields) => fields
                .into_iter()
                .map(|(k, v)| {
                    let converted = T::from_value(v).map_err(|e| e.with_context(&k))?;
                    Ok((k, converted))
                })
                .collect(),
            other => mismatch("map", &other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn option_maps_null_to_none() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::from("x")).unwrap(),
            Some("x".to_string())
        );
    }

    #[test]
    fn fields_take_reports_field_path() {
        let mut fields = Fields::new(Value::map([("id", Value::Number(1.0))])).unwrap();
        let err = fields.take::<String>("id").unwrap_err();

        assert_eq!(err.path(), Some("id"));
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn integer_rejects_fractions() {
        assert_eq!(i64::from_value(Value::Number(4.0)).unwrap(), 4);
        assert!(i64::from_value(Value::Number(4.5)).is_err());
    }
}
