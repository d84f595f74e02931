pub mod attribute_value;
pub mod error;
pub mod key;
pub mod record;
pub mod storage;
pub mod value;

pub use attribute_value::{AttributeValue, Item};
pub use error::{ErrorKind, FacetError, Result};
pub use key::{IndexKeyNames, KeySchema, KeyTuple};
pub use record::{Bytes, FieldDecl, Fields, FromValue, IntoValue, Record};
pub use storage::{ItemStore, StoreFuture};
pub use value::Value;
