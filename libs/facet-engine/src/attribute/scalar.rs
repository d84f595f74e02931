use chrono::{DateTime, SecondsFormat, Utc};

use facet_api::{AttributeValue, FacetError, Result, Value};

use super::Attribute;

fn wire_mismatch<T>(expected: &'static str, av: &AttributeValue) -> Result<T> {
    Err(FacetError::type_mismatch(expected, format!("wire {}", av.tag())))
}

fn input_mismatch<T>(expected: &'static str, value: &Value) -> Result<T> {
    Err(FacetError::type_mismatch(expected, value.kind_name()))
}

/// Canonical base-10 form. Non-finite numbers cannot be stored.
pub(crate) fn number_to_wire(n: f64) -> Result<String> {
    if !n.is_finite() {
        return Err(FacetError::invalid("number", format!("{n} is not finite")));
    }
    Ok(n.to_string())
}

pub(crate) fn number_from_wire(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FacetError::type_mismatch("number", format!("'{s}'")))
}

#[derive(Debug, Default)]
pub struct StringAttribute;

impl Attribute for StringAttribute {
    fn describe(&self) -> String {
        "string".to_string()
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        match value {
            Value::String(s) => Ok(Some(AttributeValue::S(s.clone()))),
            other => input_mismatch("string", other),
        }
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        match av {
            AttributeValue::S(s) => Ok(Value::String(s.clone())),
            other => wire_mismatch("S", other),
        }
    }
}

#[derive(Debug, Default)]
pub struct NumberAttribute;

impl Attribute for NumberAttribute {
    fn describe(&self) -> String {
        "number".to_string()
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        match value {
            Value::Number(n) => Ok(Some(AttributeValue::N(number_to_wire(*n)?))),
            other => input_mismatch("number", other),
        }
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        match av {
            AttributeValue::N(s) => Ok(Value::Number(number_from_wire(s)?)),
            other => wire_mismatch("N", other),
        }
    }
}

#[derive(Debug, Default)]
pub struct BinaryAttribute;

impl Attribute for BinaryAttribute {
    fn describe(&self) -> String {
        "binary".to_string()
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        match value {
            Value::Binary(b) => Ok(Some(AttributeValue::B(b.clone()))),
            other => input_mismatch("binary", other),
        }
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        match av {
            AttributeValue::B(b) => Ok(Value::Binary(b.clone())),
            other => wire_mismatch("B", other),
        }
    }
}

#[derive(Debug, Default)]
pub struct BooleanAttribute;

impl Attribute for BooleanAttribute {
    fn describe(&self) -> String {
        "boolean".to_string()
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        match value {
            Value::Bool(b) => Ok(Some(AttributeValue::Bool(*b))),
            other => input_mismatch("boolean", other),
        }
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        match av {
            AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
            other => wire_mismatch("BOOL", other),
        }
    }
}

/// Date stored as an RFC 3339 string with `Z` suffix. Fractional seconds
/// are written with as many digits (0, 3, 6 or 9) as needed to keep them.
///
/// String input is accepted when it parses as RFC 3339 and is normalized.
#[derive(Debug, Default)]
pub struct DateAttribute;

impl DateAttribute {
    fn parse(s: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| FacetError::invalid("date", format!("'{s}': {e}")))
    }

    fn format(d: &DateTime<Utc>) -> String {
        d.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

impl Attribute for DateAttribute {
    fn describe(&self) -> String {
        "date".to_string()
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        match value {
            Value::Date(d) => Ok(Some(AttributeValue::S(Self::format(d)))),
            Value::String(s) => Ok(Some(AttributeValue::S(Self::format(&Self::parse(s)?)))),
            other => input_mismatch("date", other),
        }
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        match av {
            AttributeValue::S(s) => Ok(Value::Date(Self::parse(s)?)),
            other => wire_mismatch("S", other),
        }
    }
}

/// String restricted to a fixed set of values (enumerations, entity tags).
#[derive(Debug)]
pub struct LiteralAttribute {
    allowed: Vec<String>,
}

impl LiteralAttribute {
    pub fn new<S, I>(allowed: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    fn check(&self, s: &str) -> Result<()> {
        if self.allowed.iter().any(|a| a == s) {
            Ok(())
        } else {
            Err(FacetError::invalid(
                "literal",
                format!("'{s}' is not one of [{}]", self.allowed.join(", ")),
            ))
        }
    }
}

impl Attribute for LiteralAttribute {
    fn describe(&self) -> String {
        let quoted: Vec<String> = self.allowed.iter().map(|a| format!("\"{a}\"")).collect();
        quoted.join(" | ")
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        match value {
            Value::String(s) => {
                self.check(s)?;
                Ok(Some(AttributeValue::S(s.clone())))
            }
            other => input_mismatch("string", other),
        }
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        match av {
            AttributeValue::S(s) => {
                self.check(s)?;
                Ok(Value::String(s.clone()))
            }
            other => wire_mismatch("S", other),
        }
    }
}
