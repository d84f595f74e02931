use std::collections::BTreeMap;

use facet_api::{AttributeValue, FacetError, Result, Value};

use super::{Attr, Attribute, BoxFuture};

/// Map with arbitrary string keys and one value converter.
///
/// Uses the native map variant with unconstrained keys. Absent values
/// (optional converter given `Null`) are omitted.
#[derive(Debug)]
pub struct RecordAttribute {
    value: Attr,
}

impl RecordAttribute {
    pub fn new(value: Attr) -> Self {
        Self { value }
    }
}

impl Attribute for RecordAttribute {
    fn describe(&self) -> String {
        format!("record<string, {}>", self.value.describe())
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        let Value::Map(input) = value else {
            return Err(FacetError::type_mismatch("map", value.kind_name()));
        };
        let mut out = BTreeMap::new();
        for (key, v) in input {
            if let Some(av) = self.value.serialize(v).map_err(|e| e.with_context(key))? {
                out.insert(key.clone(), av);
            }
        }
        Ok(Some(AttributeValue::M(out)))
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        let AttributeValue::M(wire) = av else {
            return Err(FacetError::type_mismatch("M", format!("wire {}", av.tag())));
        };
        wire.iter()
            .map(|(key, v)| {
                let value = self.value.deserialize(v).map_err(|e| e.with_context(key))?;
                Ok((key.clone(), value))
            })
            .collect::<Result<BTreeMap<_, _>>>()
            .map(Value::Map)
    }

    fn fill_defaults(&self, value: Value) -> Result<Value> {
        match value {
            Value::Map(input) => input
                .into_iter()
                .map(|(key, v)| {
                    let v = self.value.fill_defaults(v).map_err(|e| e.with_context(&key))?;
                    Ok((key, v))
                })
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Map),
            other => Ok(other),
        }
    }

    fn resolve_defaults(&self, value: Value) -> BoxFuture<'_, Result<Value>> {
        Box::pin(async move {
            let input = match value {
                Value::Map(input) => input,
                other => return Ok(other),
            };
            let mut out = BTreeMap::new();
            for (key, v) in input {
                let v = self
                    .value
                    .resolve_defaults(v)
                    .await
                    .map_err(|e| e.with_context(&key))?;
                out.insert(key, v);
            }
            Ok(Value::Map(out))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::f;
    use facet_api::ErrorKind;

    #[test]
    fn preserves_arbitrary_keys() {
        let attr = f::record(f::number());
        let value = Value::map([("alpha", Value::Number(1.0)), ("beta gamma", Value::Number(2.0))]);
        let av = attr.serialize(&value).unwrap().unwrap();
        assert_eq!(av.as_m().unwrap().len(), 2);
        assert_eq!(attr.deserialize(&av).unwrap(), value);
    }

    #[test]
    fn optional_values_are_omitted() {
        let attr = f::record(f::string().optional());
        let value = Value::map([("a", Value::from("x")), ("b", Value::Null)]);
        let av = attr.serialize(&value).unwrap().unwrap();
        assert!(!av.as_m().unwrap().contains_key("b"));
    }

    #[test]
    fn value_errors_name_the_key() {
        let attr = f::record(f::boolean());
        let err = attr
            .serialize(&Value::map([("flag", Value::from("yes"))]))
            .unwrap_err();
        assert_eq!(err.path(), Some("flag"));
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
