use std::fmt;
use std::sync::Arc;

use facet_api::{FacetError, KeyTuple, Result, Value};

use crate::attribute::MapAttribute;
use crate::mask::{Mask, Projection};

/// What a compute function may produce, and how it is checked.
pub trait KeyOutput: Sized {
    fn validate(&self) -> Result<()>;
}

fn validate_tuple(key: &KeyTuple) -> Result<()> {
    if key.partition.is_empty() {
        return Err(FacetError::InvalidKey("partition token is empty".into()));
    }
    if key.sort.is_empty() {
        return Err(FacetError::InvalidKey("sort token is empty".into()));
    }
    Ok(())
}

impl KeyOutput for KeyTuple {
    fn validate(&self) -> Result<()> {
        validate_tuple(self)
    }
}

/// `None` opts the item out of the index.
impl KeyOutput for Option<KeyTuple> {
    fn validate(&self) -> Result<()> {
        self.as_ref().map_or(Ok(()), validate_tuple)
    }
}

type ComputeFn<R> = Arc<dyn Fn(&Projection) -> Result<R> + Send + Sync>;

/// A mask bound to a compute function, validated against one map schema.
pub struct KeyDerivation<R> {
    mask: Mask,
    compute: ComputeFn<R>,
}

/// Always yields a location; every item needs one.
pub type PrimaryKey = KeyDerivation<KeyTuple>;

/// May decline, leaving the item out of a sparse index.
pub type IndexKey = KeyDerivation<Option<KeyTuple>>;

impl<R> Clone for KeyDerivation<R> {
    fn clone(&self) -> Self {
        Self {
            mask: self.mask.clone(),
            compute: Arc::clone(&self.compute),
        }
    }
}

impl<R> fmt::Debug for KeyDerivation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDerivation")
            .field("mask", &self.mask)
            .finish_non_exhaustive()
    }
}

impl<R: KeyOutput> KeyDerivation<R> {
    /// Fails with a mask violation if `mask` selects anything that is not a
    /// declared, read-only field of `schema`.
    pub fn new<F>(schema: &MapAttribute, mask: Mask, compute: F) -> Result<Self>
    where
        F: Fn(&Projection) -> Result<R> + Send + Sync + 'static,
    {
        mask.validate(schema)?;
        Ok(Self {
            mask,
            compute: Arc::new(compute),
        })
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Run the compute function over the masked view of `entity`.
    ///
    /// `entity` should already have its defaults filled, so read-only
    /// defaulted fields (entity tags) are visible.
    pub fn derive(&self, entity: &Value) -> Result<R> {
        let projection = self.mask.project(entity);
        let key = (self.compute)(&projection)?;
        key.validate()?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::f;
    use facet_api::ErrorKind;

    fn schema() -> MapAttribute {
        MapAttribute::new([
            ("id", f::string().read_only()),
            ("name", f::string()),
            ("email", f::string().optional().read_only()),
        ])
    }

    #[test]
    fn primary_key_from_masked_view() {
        let pk = PrimaryKey::new(&schema(), Mask::new().select("id"), |e| {
            Ok(KeyTuple::new(format!("user#{}", e.str("id")?), "user"))
        })
        .unwrap();

        let entity = Value::map([("id", Value::from("42")), ("name", Value::from("x"))]);
        assert_eq!(pk.derive(&entity).unwrap(), KeyTuple::new("user#42", "user"));
    }

    #[test]
    fn compute_function_cannot_see_unselected_fields() {
        let pk = PrimaryKey::new(&schema(), Mask::new().select("id"), |e| {
            assert!(e.get("name").is_none());
            Ok(KeyTuple::new(e.str("id")?, "user"))
        })
        .unwrap();
        let entity = Value::map([("id", Value::from("42")), ("name", Value::from("x"))]);
        pk.derive(&entity).unwrap();
    }

    #[test]
    fn mask_over_mutable_field_fails_at_construction() {
        let err = PrimaryKey::new(&schema(), Mask::new().select("name"), |_| {
            Ok(KeyTuple::new("a", "b"))
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MaskViolation);
    }

    #[test]
    fn index_may_decline() {
        let gsi = IndexKey::new(&schema(), Mask::new().select("email"), |e| {
            Ok(e.opt_str("email").map(|email| KeyTuple::new(email, "user")))
        })
        .unwrap();

        let without = Value::map([("id", Value::from("1"))]);
        assert_eq!(gsi.derive(&without).unwrap(), None);

        let with = Value::map([("id", Value::from("1")), ("email", Value::from("a@b"))]);
        assert_eq!(gsi.derive(&with).unwrap(), Some(KeyTuple::new("a@b", "user")));
    }

    #[test]
    fn empty_tokens_are_rejected() {
        let pk = PrimaryKey::new(&schema(), Mask::new(), |_| Ok(KeyTuple::new("", "x"))).unwrap();
        let err = pk.derive(&Value::map::<&str, _>([])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Key);
    }
}
