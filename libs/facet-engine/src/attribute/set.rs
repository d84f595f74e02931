use std::collections::BTreeSet;

use facet_api::{AttributeValue, FacetError, Result, Value};

use super::Attribute;
use super::scalar::{number_from_wire, number_to_wire};

// Set input is either the matching set variant or a list of one element
// kind. Duplicates collapse; the store keeps no order, so none is promised.

fn empty_set(kind: &'static str) -> FacetError {
    FacetError::invalid(kind, "sets cannot be empty")
}

fn element_mismatch(expected: &'static str, index: usize, value: &Value) -> FacetError {
    FacetError::type_mismatch(expected, value.kind_name()).with_context(index)
}

#[derive(Debug, Default)]
pub struct StringSetAttribute;

impl StringSetAttribute {
    fn collect(value: &Value) -> Result<BTreeSet<String>> {
        match value {
            Value::StringSet(s) => Ok(s.clone()),
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(element_mismatch("string", i, other)),
                })
                .collect(),
            other => Err(FacetError::type_mismatch("string set", other.kind_name())),
        }
    }
}

impl Attribute for StringSetAttribute {
    fn describe(&self) -> String {
        "set<string>".to_string()
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        let set = Self::collect(value)?;
        if set.is_empty() {
            return Err(empty_set("string set"));
        }
        Ok(Some(AttributeValue::Ss(set.into_iter().collect())))
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        match av {
            AttributeValue::Ss(items) if items.is_empty() => Err(empty_set("string set")),
            AttributeValue::Ss(items) => Ok(Value::StringSet(items.iter().cloned().collect())),
            other => Err(FacetError::type_mismatch("SS", format!("wire {}", other.tag()))),
        }
    }
}

#[derive(Debug, Default)]
pub struct NumberSetAttribute;

impl NumberSetAttribute {
    fn collect(value: &Value) -> Result<Vec<f64>> {
        match value {
            Value::NumberSet(s) => Ok(s.clone()),
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Number(n) => Ok(*n),
                    other => Err(element_mismatch("number", i, other)),
                })
                .collect(),
            other => Err(FacetError::type_mismatch("number set", other.kind_name())),
        }
    }

    /// Ascending, without duplicates.
    fn normalize(mut numbers: Vec<f64>) -> Vec<f64> {
        numbers.sort_by(f64::total_cmp);
        numbers.dedup();
        numbers
    }
}

impl Attribute for NumberSetAttribute {
    fn describe(&self) -> String {
        "set<number>".to_string()
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        let numbers = Self::normalize(Self::collect(value)?);
        if numbers.is_empty() {
            return Err(empty_set("number set"));
        }
        let encoded = numbers
            .into_iter()
            .map(number_to_wire)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(AttributeValue::Ns(encoded)))
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        match av {
            AttributeValue::Ns(items) if items.is_empty() => Err(empty_set("number set")),
            AttributeValue::Ns(items) => {
                let numbers = items
                    .iter()
                    .map(|s| number_from_wire(s))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::number_set(numbers))
            }
            other => Err(FacetError::type_mismatch("NS", format!("wire {}", other.tag()))),
        }
    }
}

#[derive(Debug, Default)]
pub struct BinarySetAttribute;

impl BinarySetAttribute {
    fn collect(value: &Value) -> Result<BTreeSet<Vec<u8>>> {
        match value {
            Value::BinarySet(s) => Ok(s.clone()),
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Binary(b) => Ok(b.clone()),
                    other => Err(element_mismatch("binary", i, other)),
                })
                .collect(),
            other => Err(FacetError::type_mismatch("binary set", other.kind_name())),
        }
    }
}

impl Attribute for BinarySetAttribute {
    fn describe(&self) -> String {
        "set<binary>".to_string()
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        let set = Self::collect(value)?;
        if set.is_empty() {
            return Err(empty_set("binary set"));
        }
        Ok(Some(AttributeValue::Bs(set.into_iter().collect())))
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        match av {
            AttributeValue::Bs(items) if items.is_empty() => Err(empty_set("binary set")),
            AttributeValue::Bs(items) => Ok(Value::BinarySet(items.iter().cloned().collect())),
            other => Err(FacetError::type_mismatch("BS", format!("wire {}", other.tag()))),
        }
    }
}
