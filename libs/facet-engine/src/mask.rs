//! # Attribute masks
//!
//! A [`Mask`] declares which fields of a map schema a key-derivation function
//! depends on: `select` marks a leaf, `nested` descends into a map field.
//! Only read-only fields may be selected, recursively, so a derived key can
//! never go stale after the item is written.
//!
//! Masks are written by hand next to the schema and checked against it when
//! the key derivation is built. At call time the compute function receives a
//! [`Projection`] holding exactly the selected fields and nothing else.

use std::collections::BTreeMap;

use facet_api::{FacetError, FromValue, Result, Value};

use crate::attribute::{Attribute, MapAttribute};

/// One selected entry of a mask.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskNode {
    Selected,
    Nested(Mask),
}

/// Partial tree mirroring a map schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mask {
    fields: Vec<(String, MaskNode)>,
}

impl Mask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a whole field.
    pub fn select(mut self, field: impl Into<String>) -> Self {
        self.set(field.into(), MaskNode::Selected);
        self
    }

    /// Select some sub-fields of a nested map field.
    pub fn nested(mut self, field: impl Into<String>, mask: Mask) -> Self {
        self.set(field.into(), MaskNode::Nested(mask));
        self
    }

    fn set(&mut self, field: String, node: MaskNode) {
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = node,
            None => self.fields.push((field, node)),
        }
    }

    pub fn fields(&self) -> &[(String, MaskNode)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every selection against `schema`.
    ///
    /// Selected fields must be declared and read-only; nested selections
    /// must point at read-only map fields.
    pub fn validate(&self, schema: &MapAttribute) -> Result<()> {
        for (name, node) in &self.fields {
            Self::validate_field(schema, name, node)
                .map_err(|e| e.with_context(name))?;
        }
        Ok(())
    }

    fn validate_field(schema: &MapAttribute, name: &str, node: &MaskNode) -> Result<()> {
        let Some(attr) = schema.field(name) else {
            return Err(FacetError::MaskViolation(format!(
                "field '{name}' is not declared in the schema"
            )));
        };
        if !attr.is_read_only() {
            return Err(FacetError::MaskViolation(format!(
                "field '{name}' is not read-only"
            )));
        }
        match node {
            MaskNode::Selected => Ok(()),
            MaskNode::Nested(inner) => match attr.as_map() {
                Some(nested) => inner.validate(nested),
                None => Err(FacetError::MaskViolation(format!(
                    "field '{name}' is {}, not a map",
                    attr.describe()
                ))),
            },
        }
    }

    /// Fill constant and factory defaults of the selected fields only.
    ///
    /// Providers of unselected fields never run, so a key lookup does not
    /// trip over an asynchronous default the key does not depend on.
    pub fn fill_defaults(&self, schema: &MapAttribute, value: Value) -> Result<Value> {
        let mut input = match value {
            Value::Map(input) => input,
            other => return Ok(other),
        };
        for (name, node) in &self.fields {
            let Some(attr) = schema.field(name) else {
                continue;
            };
            let current = match input.remove(name).filter(|v| !v.is_null()) {
                Some(v) => v,
                None => match attr.default_value() {
                    Some(default) => default.resolve(name).map_err(|e| e.with_context(name))?,
                    None => continue,
                },
            };
            let filled = match (node, attr.as_map()) {
                (MaskNode::Nested(inner), Some(nested)) => inner.fill_defaults(nested, current),
                _ => attr.fill_defaults(current),
            }
            .map_err(|e| e.with_context(name))?;
            input.insert(name.clone(), filled);
        }
        Ok(Value::Map(input))
    }

    /// Copy the selected fields out of an application map value.
    ///
    /// Selected fields missing from the value are missing from the
    /// projection too; an index compute function can use that to decline.
    pub fn project(&self, value: &Value) -> Projection {
        let mut out = BTreeMap::new();
        if let Value::Map(input) = value {
            for (name, node) in &self.fields {
                let Some(field) = input.get(name).filter(|v| !v.is_null()) else {
                    continue;
                };
                let projected = match node {
                    MaskNode::Selected => field.clone(),
                    MaskNode::Nested(inner) => Value::Map(inner.project(field).fields),
                };
                out.insert(name.clone(), projected);
            }
        }
        Projection { fields: out }
    }
}

/// The masked view of an entity handed to key compute functions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    fields: BTreeMap<String, Value>,
}

impl Projection {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    fn require(&self, field: &str) -> Result<&Value> {
        self.fields
            .get(field)
            .ok_or_else(|| FacetError::MissingRequired(vec![field.to_string()]))
    }

    /// String field; missing or non-string is an error.
    pub fn str(&self, field: &str) -> Result<&str> {
        let value = self.require(field)?;
        value
            .as_str()
            .ok_or_else(|| FacetError::type_mismatch("string", value.kind_name()).with_context(field))
    }

    /// String field if present.
    pub fn opt_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn number(&self, field: &str) -> Result<f64> {
        let value = self.require(field)?;
        value
            .as_f64()
            .ok_or_else(|| FacetError::type_mismatch("number", value.kind_name()).with_context(field))
    }

    /// Projection of a nested map selection.
    pub fn nested(&self, field: &str) -> Result<Projection> {
        match self.require(field)? {
            Value::Map(fields) => Ok(Projection {
                fields: fields.clone(),
            }),
            other => Err(FacetError::type_mismatch("map", other.kind_name()).with_context(field)),
        }
    }

    /// Decode into a hand-declared type shaped like the mask.
    pub fn decode<T: FromValue>(&self) -> Result<T> {
        T::from_value(self.clone().into_value())
    }

    pub fn into_value(self) -> Value {
        Value::Map(self.fields)
    }
}
