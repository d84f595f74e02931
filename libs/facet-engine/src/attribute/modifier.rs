use std::fmt;
use std::sync::Arc;

use facet_api::{AttributeValue, FacetError, Result, Value};

use super::{Attr, Attribute, BoxFuture, MapAttribute};

pub type DefaultFuture = BoxFuture<'static, Result<Value>>;

/// Where a default comes from.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
    Async(Arc<dyn Fn() -> DefaultFuture + Send + Sync>),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory"),
            DefaultValue::Async(_) => f.write_str("Async"),
        }
    }
}

impl DefaultValue {
    /// Resolve without awaiting. Async providers are an error here.
    pub fn resolve(&self, field: &str) -> Result<Value> {
        match self {
            DefaultValue::Value(v) => Ok(v.clone()),
            DefaultValue::Factory(provider) => Ok(provider()),
            DefaultValue::Async(_) => Err(FacetError::AsyncDefault(field.to_string())),
        }
    }

    pub async fn resolve_async(&self, field: &str) -> Result<Value> {
        match self {
            DefaultValue::Async(provider) => {
                provider()
                    .await
                    .map_err(|e| FacetError::DefaultProvider {
                        field: field.to_string(),
                        message: e.to_string(),
                    })
            }
            other => other.resolve(field),
        }
    }
}

// ---------------------------------------------------------------------------
// Optional
// ---------------------------------------------------------------------------

/// `Null` serializes to "absent" without consulting the inner converter.
#[derive(Debug)]
pub struct Optional {
    inner: Attr,
}

impl Optional {
    pub fn new(inner: Attr) -> Self {
        Self { inner }
    }
}

impl Attribute for Optional {
    fn describe(&self) -> String {
        format!("{}?", self.inner.describe())
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        if value.is_null() {
            return Ok(None);
        }
        self.inner.serialize(value)
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        self.inner.deserialize(av)
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }

    fn default_value(&self) -> Option<&DefaultValue> {
        self.inner.default_value()
    }

    fn as_map(&self) -> Option<&MapAttribute> {
        self.inner.as_map()
    }

    fn fill_defaults(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(value);
        }
        self.inner.fill_defaults(value)
    }

    fn resolve_defaults(&self, value: Value) -> BoxFuture<'_, Result<Value>> {
        if value.is_null() {
            return Box::pin(std::future::ready(Ok(value)));
        }
        self.inner.resolve_defaults(value)
    }
}

// ---------------------------------------------------------------------------
// Defaulted
// ---------------------------------------------------------------------------

/// Carries a default for the enclosing map to use when the field is missing.
/// Wire encoding is the inner converter's, unchanged.
#[derive(Debug)]
pub struct Defaulted {
    inner: Attr,
    default: DefaultValue,
}

impl Defaulted {
    pub fn new(inner: Attr, default: DefaultValue) -> Self {
        Self { inner, default }
    }
}

impl Attribute for Defaulted {
    fn describe(&self) -> String {
        format!("{} = default", self.inner.describe())
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        self.inner.serialize(value)
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        self.inner.deserialize(av)
    }

    fn is_optional(&self) -> bool {
        self.inner.is_optional()
    }

    fn is_read_only(&self) -> bool {
        self.inner.is_read_only()
    }

    fn default_value(&self) -> Option<&DefaultValue> {
        Some(&self.default)
    }

    fn as_map(&self) -> Option<&MapAttribute> {
        self.inner.as_map()
    }

    fn fill_defaults(&self, value: Value) -> Result<Value> {
        self.inner.fill_defaults(value)
    }

    fn resolve_defaults(&self, value: Value) -> BoxFuture<'_, Result<Value>> {
        self.inner.resolve_defaults(value)
    }
}

// ---------------------------------------------------------------------------
// ReadOnly
// ---------------------------------------------------------------------------

/// Pure marker consulted by key-derivation masks.
#[derive(Debug)]
pub struct ReadOnly {
    inner: Attr,
}

impl ReadOnly {
    pub fn new(inner: Attr) -> Self {
        Self { inner }
    }
}

impl Attribute for ReadOnly {
    fn describe(&self) -> String {
        format!("readonly {}", self.inner.describe())
    }

    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>> {
        self.inner.serialize(value)
    }

    fn deserialize(&self, av: &AttributeValue) -> Result<Value> {
        self.inner.deserialize(av)
    }

    fn is_optional(&self) -> bool {
        self.inner.is_optional()
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn default_value(&self) -> Option<&DefaultValue> {
        self.inner.default_value()
    }

    fn as_map(&self) -> Option<&MapAttribute> {
        self.inner.as_map()
    }

    fn fill_defaults(&self, value: Value) -> Result<Value> {
        self.inner.fill_defaults(value)
    }

    fn resolve_defaults(&self, value: Value) -> BoxFuture<'_, Result<Value>> {
        self.inner.resolve_defaults(value)
    }
}
