use std::collections::BTreeMap;

use facet_api::{AttributeValue, FacetError, Result, Value};

use super::{Attr, Attribute, BoxFuture};

/// Tagged alternative over map-shaped variants.
///
/// On the wire a union is a map holding the discriminant as `S(tag)` next to
/// the active variant's fields. The application value is the same flat map,
/// discriminant included. Variants never see the discriminant themselves.
#[derive(Debug)]
pub struct UnionAttribute {
    discriminant: String,
    variants: Vec<(String, Attr)>,
}

/// Collects variants; [`UnionBuilder::build`] validates them.
#[derive(Debug)]
pub struct UnionBuilder {
    discriminant: String,
    variants: Vec<(String, Attr)>,
}

impl UnionBuilder {
    pub fn new(discriminant: impl Into<String>) -> Self {
        Self {
            discriminant: discriminant.into(),
            variants: Vec::new(),
        }
    }

    pub fn variant(mut self, tag: impl Into<String>, schema: Attr) -> Self {
        self.variants.push((tag.into(), schema));
        self
    }

    /// Fails when there are no variants, a tag repeats, a variant is not a
    /// map, or a variant declares the discriminant field.
    pub fn build(self) -> Result<Attr> {
        if self.variants.is_empty() {
            return Err(FacetError::SchemaMismatch(format!(
                "union on '{}' has no variants",
                self.discriminant
            )));
        }
        for (i, (tag, schema)) in self.variants.iter().enumerate() {
            if self.variants[..i].iter().any(|(t, _)| t == tag) {
                return Err(FacetError::SchemaMismatch(format!(
                    "union variant '{tag}' declared twice"
                )));
            }
            let Some(map) = schema.as_map() else {
                return Err(FacetError::SchemaMismatch(format!(
                    "union variant '{tag}' must be a map, found {}",
                    schema.describe()
                )));
            };
            if map.field(&self.discriminant).is_some() {
                return Err(FacetError::SchemaMismatch(format!(
                    "union variant '{tag}' redeclares discriminant '{}'",
                    self.discriminant
                )));
            }
        }
        Ok(Attr::new(UnionAttribute {
            discriminant: self.discriminant,
            variants: self.variants,
        }))
    }
}

impl UnionAttribute {
    pub fn discriminant(&self) -> &str {
        &self.discriminant
    }

    fn variant(&self, tag: &str) -> Result<&Attr> {
        self.variants
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, schema)| schema)
            .ok_or_else(|| {
                FacetError::invalid("union", format!("unknown variant '{tag}'"))
                    .with_context(&self.discriminant)
            })
    }

    /// Split the discriminant off an application map.
    fn split(&self, value: &Value) -> Result<(String, BTreeMap<String, Value>)> {
        let Value::Map(input) = value else {
            return Err(FacetError::type_mismatch("map", value.kind_name()));
        };
        let mut rest = input.clone();
        match rest.remove(&self.discriminant) {
            Some(Value::String(tag)) => Ok((tag, rest)),
            Some(Value::Null) | None => {
                Err(FacetError::MissingRequired(vec![self.discriminant.clone()]))
            }
            Some(other) => Err(FacetError::type_mismatch("string", other.kind_name())
                .with_context(&self.discriminant)),
        }
    }
}

impl Attribute for UnionAttribute {
    fn describe(&self) -> String {
        let tags: Vec<&str> = self.variants.iter().map(|(t, _)| t.as_str()).collect();
        format!("union<{}: {}>", self.discriminant, tags.join(" | "))
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        let (tag, rest) = self.split(value)?;
        let variant = self.variant(&tag)?;
        let Some(AttributeValue::M(mut wire)) = variant.serialize(&Value::Map(rest))? else {
            return Err(FacetError::type_mismatch("M", "non-map variant output"));
        };
        wire.insert(self.discriminant.clone(), AttributeValue::S(tag));
        Ok(Some(AttributeValue::M(wire)))
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        let AttributeValue::M(wire) = av else {
            return Err(FacetError::type_mismatch("M", format!("wire {}", av.tag())));
        };
        let mut rest = wire.clone();
        let tag = match rest.remove(&self.discriminant) {
            Some(AttributeValue::S(tag)) => tag,
            Some(other) => {
                return Err(FacetError::type_mismatch("S", format!("wire {}", other.tag()))
                    .with_context(&self.discriminant));
            }
            None => return Err(FacetError::MissingRequired(vec![self.discriminant.clone()])),
        };
        let variant = self.variant(&tag)?;
        let Value::Map(mut fields) = variant.deserialize(&AttributeValue::M(rest))? else {
            return Err(FacetError::type_mismatch("map", "non-map variant output"));
        };
        fields.insert(self.discriminant.clone(), Value::String(tag));
        Ok(Value::Map(fields))
    }

    fn fill_defaults(&self, value: Value) -> Result<Value> {
        let Ok((tag, rest)) = self.split(&value) else {
            return Ok(value);
        };
        let Ok(variant) = self.variant(&tag) else {
            return Ok(value);
        };
        let Value::Map(mut fields) = variant.fill_defaults(Value::Map(rest))? else {
            return Ok(value);
        };
        fields.insert(self.discriminant.clone(), Value::String(tag));
        Ok(Value::Map(fields))
    }

    fn resolve_defaults(&self, value: Value) -> BoxFuture<'_, Result<Value>> {
        Box::pin(async move {
            let Ok((tag, rest)) = self.split(&value) else {
                return Ok(value);
            };
            let Ok(variant) = self.variant(&tag) else {
                return Ok(value);
            };
            let Value::Map(mut fields) = variant.resolve_defaults(Value::Map(rest)).await? else {
                return Ok(value);
            };
            fields.insert(self.discriminant.clone(), Value::String(tag));
            Ok(Value::Map(fields))
        })
    }
}
