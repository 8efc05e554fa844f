//! Dynamic property providers ("adaptors").
//!
//! An adaptor hands out named, typed properties on demand. The first request
//! for a name creates an empty property and caches it; later requests return
//! the same cell, so anything linked to it keeps working when its value or
//! upstream source changes.
//!
//! # Root chain
//!
//! ```text
//! [FrameAdaptor] ◄── [SecondaryStructureAdaptor]? ◄── [FilteredAdaptor] ◄── subgraph adaptors
//!   raw frame          optional, inserted on demand      particle filter      (ParentedAdaptor)
//! ```
//!
//! Children refer to their parent through a [`ProviderRef`], which is a weak
//! pointer: the pipeline owns every adaptor, children never do.

pub mod filtered;
pub mod frame;
pub mod parented;
pub mod secondary_structure;

pub use filtered::FilteredAdaptor;
pub use frame::FrameAdaptor;
pub use parented::ParentedAdaptor;
pub use secondary_structure::SecondaryStructureAdaptor;

use crate::error::{Result, VisError};
use crate::property::{AnyProperty, Property, PropertyValue};
use crate::types::ValueType;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// A node that can provide properties by name and type.
pub trait DynamicPropertyProvider {
    /// Return the cached property `name`, creating an empty one on first use.
    ///
    /// Fails with [`VisError::TypeMismatch`] if `name` already exists with a
    /// different type.
    fn get_or_create_property(&self, name: &str, value_type: ValueType) -> Result<AnyProperty>;

    /// Return an already materialised property.
    fn get_property(&self, name: &str) -> Option<AnyProperty>;

    /// Snapshot of every materialised `(name, property)` pair.
    fn list_properties(&self) -> Vec<(String, AnyProperty)>;
}

/// Typed convenience methods for any provider.
pub trait ProviderExt: DynamicPropertyProvider {
    fn get_or_create<T: PropertyValue>(&self, name: &str) -> Result<Property<T>> {
        let property = self.get_or_create_property(name, T::VALUE_TYPE)?;
        property
            .typed::<T>()
            .cloned()
            .ok_or_else(|| VisError::TypeMismatch {
                name: name.to_string(),
                existing: property.value_type(),
                requested: T::VALUE_TYPE,
            })
    }
}

impl<P: DynamicPropertyProvider + ?Sized> ProviderExt for P {}

/// Weak reference to a provider, used as the value of parent-reference
/// properties.
#[derive(Clone)]
pub struct ProviderRef(Weak<dyn DynamicPropertyProvider>);

impl ProviderRef {
    pub fn new<P: DynamicPropertyProvider + 'static>(provider: &Rc<P>) -> Self {
        let weak: Weak<P> = Rc::downgrade(provider);
        Self(weak)
    }

    /// The provider, if it is still alive.
    pub fn upgrade(&self) -> Option<Rc<dyn DynamicPropertyProvider>> {
        self.0.upgrade()
    }

    pub fn ptr_eq(&self, other: &ProviderRef) -> bool {
        std::ptr::addr_eq(self.0.as_ptr(), other.0.as_ptr())
    }
}

impl fmt::Debug for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderRef")
            .field(&self.0.as_ptr().cast::<()>())
            .finish()
    }
}

/// Memo table from property name to the property created for it.
#[derive(Default)]
pub struct PropertyTable {
    properties: RefCell<BTreeMap<String, AnyProperty>>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached property for `name`, creating it if needed. The flag is true
    /// when the property was created by this call.
    pub fn get_or_create(&self, name: &str, value_type: ValueType) -> Result<(AnyProperty, bool)> {
        if let Some(existing) = self.properties.borrow().get(name) {
            check_type(name, existing, value_type)?;
            return Ok((existing.clone(), false));
        }
        let property = AnyProperty::new(value_type);
        self.properties
            .borrow_mut()
            .insert(name.to_string(), property.clone());
        Ok((property, true))
    }

    /// Cache an externally built property under `name`.
    pub fn insert(&self, name: &str, property: AnyProperty) {
        self.properties
            .borrow_mut()
            .insert(name.to_string(), property);
    }

    pub fn get(&self, name: &str) -> Option<AnyProperty> {
        self.properties.borrow().get(name).cloned()
    }

    pub fn list(&self) -> Vec<(String, AnyProperty)> {
        self.properties
            .borrow()
            .iter()
            .map(|(name, property)| (name.clone(), property.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.properties.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.borrow().is_empty()
    }
}

/// Fail with [`VisError::TypeMismatch`] unless `property` has `requested` type.
pub(crate) fn check_type(name: &str, property: &AnyProperty, requested: ValueType) -> Result<()> {
    if property.value_type() == requested {
        Ok(())
    } else {
        Err(VisError::TypeMismatch {
            name: name.to_string(),
            existing: property.value_type(),
            requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Array;

    #[test]
    fn test_table_memoizes() {
        let table = PropertyTable::new();
        let (a, created_a) = table.get_or_create("particle.positions", ValueType::Vec3Array).unwrap();
        let (b, created_b) = table.get_or_create("particle.positions", ValueType::Vec3Array).unwrap();
        assert!(created_a);
        assert!(!created_b);
        assert!(a.ptr_eq(&b));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_table_type_mismatch() {
        let table = PropertyTable::new();
        table.get_or_create("scale", ValueType::Float).unwrap();
        let err = table.get_or_create("scale", ValueType::String).unwrap_err();
        assert!(matches!(
            err,
            VisError::TypeMismatch {
                existing: ValueType::Float,
                requested: ValueType::String,
                ..
            }
        ));
    }

    #[test]
    fn test_provider_ext_typed() {
        let adaptor = Rc::new(FrameAdaptor::new());
        let typed: Property<Array<u32>> = adaptor.get_or_create("particle.elements").unwrap();
        let any = adaptor.get_property("particle.elements").unwrap();
        assert!(any.typed::<Array<u32>>().unwrap().ptr_eq(&typed));
    }

    #[test]
    fn test_provider_ref_weak() {
        let adaptor = Rc::new(FrameAdaptor::new());
        let reference = ProviderRef::new(&adaptor);
        assert!(reference.upgrade().is_some());
        assert!(reference.ptr_eq(&ProviderRef::new(&adaptor)));
        drop(adaptor);
        assert!(reference.upgrade().is_none());
    }
}
