pub mod attribute;
pub mod config;
pub mod entity;
pub mod f;
pub mod key;
pub mod mask;
pub mod table;

pub use attribute::{Attr, Attribute, DefaultValue, MapAttribute};
pub use config::TableConfig;
pub use entity::{Entity, TypedEntity};
pub use key::{IndexKey, KeyDerivation, KeyOutput, PrimaryKey};
pub use mask::{Mask, MaskNode, Projection};
pub use table::{EntityBuilder, Table};

pub use facet_api::{
    AttributeValue, Bytes, ErrorKind, FacetError, FieldDecl, Fields, FromValue, IntoValue, Item,
    ItemStore, KeyTuple, Record, Result, Value,
};
