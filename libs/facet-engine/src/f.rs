//! Schema declaration surface: one factory per converter kind.
//!
//! ```ignore
//! let users = f::map([
//!     ("type", f::tag("user")),
//!     ("id", f::string().read_only()),
//!     ("name", f::string().optional()),
//!     ("roles", f::string_set().default(Value::string_set(["member"]))),
//! ]);
//! ```

use crate::attribute::{
    Attr, BinaryAttribute, BinarySetAttribute, BooleanAttribute, DateAttribute, ListAttribute,
    LiteralAttribute, MapAttribute, NumberAttribute, NumberSetAttribute, RecordAttribute,
    StringAttribute, StringSetAttribute, UnionBuilder,
};

pub fn string() -> Attr {
    Attr::new(StringAttribute)
}

pub fn number() -> Attr {
    Attr::new(NumberAttribute)
}

pub fn binary() -> Attr {
    Attr::new(BinaryAttribute)
}

pub fn boolean() -> Attr {
    Attr::new(BooleanAttribute)
}

pub fn date() -> Attr {
    Attr::new(DateAttribute)
}

/// String limited to the given values.
pub fn literal<S, I>(allowed: I) -> Attr
where
    S: Into<String>,
    I: IntoIterator<Item = S>,
{
    Attr::new(LiteralAttribute::new(allowed))
}

pub fn string_set() -> Attr {
    Attr::new(StringSetAttribute)
}

pub fn number_set() -> Attr {
    Attr::new(NumberSetAttribute)
}

pub fn binary_set() -> Attr {
    Attr::new(BinarySetAttribute)
}

pub fn list(element: Attr) -> Attr {
    Attr::new(ListAttribute::new(element))
}

pub fn map<K, I>(fields: I) -> Attr
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Attr)>,
{
    Attr::new(MapAttribute::new(fields))
}

pub fn record(value: Attr) -> Attr {
    Attr::new(RecordAttribute::new(value))
}

pub fn union(discriminant: impl Into<String>) -> UnionBuilder {
    UnionBuilder::new(discriminant)
}

/// Fixed discriminator stamped on every item of an entity: read-only,
/// defaulted, and limited to exactly `value`.
pub fn tag(value: &str) -> Attr {
    literal([value]).default(value).read_only()
}
