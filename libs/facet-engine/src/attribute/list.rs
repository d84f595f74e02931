use facet_api::{AttributeValue, FacetError, Result, Value};

use super::{Attr, Attribute, BoxFuture};

/// Ordered homogeneous sequence; each element goes through `element`.
#[derive(Debug)]
pub struct ListAttribute {
    element: Attr,
}

impl ListAttribute {
    pub fn new(element: Attr) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Attr {
        &self.element
    }
}

impl Attribute for ListAttribute {
    fn describe(&self) -> String {
        format!("list<{}>", self.element.describe())
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        let Value::List(items) = value else {
            return Err(FacetError::type_mismatch("list", value.kind_name()));
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match self.element.serialize(item).map_err(|e| e.with_context(i))? {
                Some(av) => out.push(av),
                None => {
                    return Err(
                        FacetError::invalid("list", "elements cannot be absent").with_context(i)
                    );
                }
            }
        }
        Ok(Some(AttributeValue::L(out)))
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        let AttributeValue::L(items) = av else {
            return Err(FacetError::type_mismatch("L", format!("wire {}", av.tag())));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.element.deserialize(item).map_err(|e| e.with_context(i)))
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    fn fill_defaults(&self, value: Value) -> Result<Value> {
        match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    self.element
                        .fill_defaults(item)
                        .map_err(|e| e.with_context(i))
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            other => Ok(other),
        }
    }

    fn resolve_defaults(&self, value: Value) -> BoxFuture<'_, Result<Value>> {
        Box::pin(async move {
            let items = match value {
                Value::List(items) => items,
                other => return Ok(other),
            };
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let resolved = self
                    .element
                    .resolve_defaults(item)
                    .await
                    .map_err(|e| e.with_context(i))?;
                out.push(resolved);
            }
            Ok(Value::List(out))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::f;
    use facet_api::ErrorKind;

    #[test]
    fn lists_of_maps_round_trip() {
        let attr = f::map([("id", f::string()), ("n", f::number().optional())]).list();
        let value = Value::List(vec![
            Value::map([("id", Value::from("a")), ("n", Value::Number(1.0))]),
            Value::map([("id", Value::from("b"))]),
        ]);

        let av = attr.serialize(&value).unwrap().unwrap();
        assert_eq!(attr.deserialize(&av).unwrap(), value);
    }

    #[test]
    fn non_list_input_is_a_type_mismatch() {
        let err = f::list(f::string()).serialize(&Value::from("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn element_errors_carry_their_index() {
        let attr = f::number().list();
        let value = Value::List(vec![Value::Number(1.0), Value::from("two")]);
        let err = attr.serialize(&value).unwrap_err();
        assert_eq!(err.path(), Some("1"));
    }

    #[test]
    fn absent_elements_are_rejected() {
        let attr = f::string().optional().list();
        let err = attr.serialize(&Value::List(vec![Value::Null])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}
