use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;

use facet_api::{AttributeValue, FacetError, Result, Value};

use super::{Attr, Attribute, BoxFuture};

/// Named heterogeneous field set, closed over its declared fields.
///
/// Field order is declaration order and drives traversal (and therefore
/// which error surfaces first). The required set, every field whose
/// converter is not optional, is computed once here.
///
/// Cloning shares the field table.
#[derive(Debug, Clone)]
pub struct MapAttribute {
    fields: Arc<[(String, Attr)]>,
    required: Arc<[String]>,
}

impl MapAttribute {
    /// Later declarations of the same name replace earlier ones.
    pub fn new<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Attr)>,
    {
        let mut table: Vec<(String, Attr)> = Vec::new();
        for (name, attr) in fields {
            let name = name.into();
            match table.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = attr,
                None => table.push((name, attr)),
            }
        }
        let required = table
            .iter()
            .filter(|(_, attr)| !attr.is_optional())
            .map(|(name, _)| name.clone())
            .collect();
        Self {
            fields: table.into(),
            required,
        }
    }

    pub fn fields(&self) -> &[(String, Attr)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Attr> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// Names of non-optional fields, in declaration order.
    pub fn required_fields(&self) -> &[String] {
        &self.required
    }

    fn check_declared<'a>(&self, mut names: impl Iterator<Item = &'a String>) -> Result<()> {
        match names.find(|name| self.field(name).is_none()) {
            Some(name) => Err(FacetError::UndeclaredField(name.clone())),
            None => Ok(()),
        }
    }

    fn missing(&self, resolved: &[bool]) -> Result<()> {
        let missing: Vec<String> = self
            .fields
            .iter()
            .zip(resolved)
            .filter(|((_, attr), done)| !**done && !attr.is_optional())
            .map(|((name, _), _)| name.clone())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FacetError::MissingRequired(missing))
        }
    }
}

fn present<'a>(input: &'a BTreeMap<String, Value>, name: &str) -> Option<&'a Value> {
    input.get(name).filter(|v| !v.is_null())
}

impl Attribute for MapAttribute {
    fn describe(&self) -> String {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, attr)| format!("{name}: {}", attr.describe()))
            .collect();
        format!("{{ {} }}", fields.join(", "))
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        let Value::Map(input) = value else {
            return Err(FacetError::type_mismatch("map", value.kind_name()));
        };
        self.check_declared(input.keys())?;

        let mut out = BTreeMap::new();
        let mut resolved = vec![false; self.fields.len()];
        for (i, (name, attr)) in self.fields.iter().enumerate() {
            let serialized = match (present(input, name), attr.default_value()) {
                (Some(v), _) => attr.serialize(v),
                (None, Some(default)) => default
                    .resolve(name)
                    .and_then(|v| attr.serialize(&v)),
                (None, None) => continue,
            }
            .map_err(|e| e.with_context(name))?;

            resolved[i] = true;
            if let Some(av) = serialized {
                out.insert(name.clone(), av);
            }
        }
        self.missing(&resolved)?;
        Ok(Some(AttributeValue::M(out)))
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        let AttributeValue::M(wire) = av else {
            return Err(FacetError::type_mismatch("M", format!("wire {}", av.tag())));
        };
        self.check_declared(wire.keys())?;

        let mut out = BTreeMap::new();
        let mut resolved = vec![false; self.fields.len()];
        for (i, (name, attr)) in self.fields.iter().enumerate() {
            let Some(field_av) = wire.get(name) else {
                continue;
            };
            let value = attr
                .deserialize(field_av)
                .map_err(|e| e.with_context(name))?;
            resolved[i] = true;
            out.insert(name.clone(), value);
        }
        self.missing(&resolved)?;
        Ok(Value::Map(out))
    }

    fn as_map(&self) -> Option<&MapAttribute> {
        Some(self)
    }

    fn fill_defaults(&self, value: Value) -> Result<Value> {
        let mut input = match value {
            Value::Map(input) => input,
            other => return Ok(other),
        };
        for (name, attr) in self.fields.iter() {
            let current = input.remove(name).filter(|v| !v.is_null());
            let filled = match (current, attr.default_value()) {
                (Some(v), _) => Some(v),
                (None, Some(default)) => {
                    Some(default.resolve(name).map_err(|e| e.with_context(name))?)
                }
                (None, None) => None,
            };
            if let Some(v) = filled {
                let v = attr.fill_defaults(v).map_err(|e| e.with_context(name))?;
                input.insert(name.clone(), v);
            }
        }
        Ok(Value::Map(input))
    }

    fn resolve_defaults(&self, value: Value) -> BoxFuture<'_, Result<Value>> {
        Box::pin(async move {
            let mut input = match value {
                Value::Map(input) => input,
                other => return Ok(other),
            };

            // Providers of one map run together; none sees its siblings.
            let pending = self
                .fields
                .iter()
                .filter(|(name, _)| present(&input, name).is_none())
                .filter_map(|(name, attr)| attr.default_value().map(|d| (name, d)))
                .map(|(name, default)| async move {
                    let value = default.resolve_async(name).await?;
                    Ok::<_, FacetError>((name.clone(), value))
                });
            for (name, value) in try_join_all(pending).await? {
                input.insert(name, value);
            }

            for (name, attr) in self.fields.iter() {
                let Some(current) = input.remove(name) else {
                    continue;
                };
                let resolved = attr
                    .resolve_defaults(current)
                    .await
                    .map_err(|e| e.with_context(name))?;
                input.insert(name.clone(), resolved);
            }
            Ok(Value::Map(input))
        })
    }
}
