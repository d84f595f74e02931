//! # Attribute converters
//!
//! Every schema node implements [`Attribute`]: `serialize` turns an
//! application [`Value`] into a wire [`AttributeValue`], `deserialize` goes
//! back. Nodes are immutable and shared through [`Attr`], a cheap `Arc`
//! handle. Modifiers (`optional`, `default`, `read_only`, `list`) wrap the
//! handle in a new node and never touch the wrapped one, so a base converter
//! can be reused across independent chains.
//!
//! | Kind | Wire | Application |
//! |------|------|-------------|
//! | string / literal | `S` | `String` |
//! | number | `N` | `Number` |
//! | binary | `B` | `Binary` |
//! | boolean | `BOOL` | `Bool` |
//! | date | `S` (RFC 3339) | `Date` |
//! | string/number/binary set | `SS` / `NS` / `BS` | set variants |
//! | list | `L` | `List` |
//! | map / union / record | `M` | `Map` |

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use facet_api::{AttributeValue, Result, Value};

mod list;
mod map;
mod modifier;
mod record;
mod scalar;
mod set;
mod union;

pub use list::ListAttribute;
pub use map::MapAttribute;
pub use modifier::{DefaultFuture, DefaultValue, Defaulted, Optional, ReadOnly};
pub use record::RecordAttribute;
pub use scalar::{
    BinaryAttribute, BooleanAttribute, DateAttribute, LiteralAttribute, NumberAttribute,
    StringAttribute,
};
pub use set::{BinarySetAttribute, NumberSetAttribute, StringSetAttribute};
pub use union::{UnionAttribute, UnionBuilder};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Converter contract shared by every schema node.
pub trait Attribute: Send + Sync + fmt::Debug {
    /// Human-readable type, e.g. `string` or `list<number>`.
    fn describe(&self) -> String;

    /// Convert an application value to its wire form.
    ///
    /// `Ok(None)` means "absent": only optional converters return it, for
    /// `Value::Null` input. Containers omit absent values from the wire.
    fn serialize(&self, value: &Value) -> Result<Option<AttributeValue>>;

    fn deserialize(&self, av: &AttributeValue) -> Result<Value>;

    fn is_optional(&self) -> bool {
        false
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn default_value(&self) -> Option<&DefaultValue> {
        None
    }

    /// The map schema beneath any modifiers, if this node is a map.
    fn as_map(&self) -> Option<&MapAttribute> {
        None
    }

    /// Fill missing defaulted fields using constant and factory providers.
    fn fill_defaults(&self, value: Value) -> Result<Value> {
        Ok(value)
    }

    /// Fill missing defaulted fields, awaiting asynchronous providers.
    fn resolve_defaults(&self, value: Value) -> BoxFuture<'_, Result<Value>> {
        Box::pin(std::future::ready(Ok(value)))
    }
}

/// Shared handle to an immutable schema node.
#[derive(Clone)]
pub struct Attr(Arc<dyn Attribute>);

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl Attr {
    pub fn new(attribute: impl Attribute + 'static) -> Self {
        Self(Arc::new(attribute))
    }

    /// Accept `Value::Null` as "not provided"; omitted from the wire.
    pub fn optional(self) -> Attr {
        Attr::new(Optional::new(self))
    }

    /// Mark immutable. Only read-only fields may feed key derivation.
    pub fn read_only(self) -> Attr {
        Attr::new(ReadOnly::new(self))
    }

    /// Constant default, used when the field is missing from map input.
    pub fn default(self, value: impl Into<Value>) -> Attr {
        Attr::new(Defaulted::new(self, DefaultValue::Value(value.into())))
    }

    /// Default computed on each use.
    pub fn default_with<F>(self, provider: F) -> Attr
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Attr::new(Defaulted::new(self, DefaultValue::Factory(Arc::new(provider))))
    }

    /// Asynchronous default; only resolved by `serialize_async`.
    pub fn default_async<F, Fut>(self, provider: F) -> Attr
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let provider = move || -> DefaultFuture { Box::pin(provider()) };
        Attr::new(Defaulted::new(self, DefaultValue::Async(Arc::new(provider))))
    }

    /// Lift into a list whose elements use this converter.
    pub fn list(self) -> Attr {
        Attr::new(ListAttribute::new(self))
    }

    /// Serialize after resolving every default, awaiting async providers.
    pub async fn serialize_async(&self, value: Value) -> Result<Option<AttributeValue>> {
        let resolved = self.0.resolve_defaults(value).await?;
        self.0.serialize(&resolved)
    }
}

impl std::ops::Deref for Attr {
    type Target = dyn Attribute;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<A: Attribute + 'static> From<A> for Attr {
    fn from(attribute: A) -> Self {
        Attr::new(attribute)
    }
}
