//! Adaptor that guarantees per-residue secondary structure is available.

use super::{check_type, DynamicPropertyProvider, ParentedAdaptor, ProviderExt, ProviderRef};
use crate::error::Result;
use crate::frame::keys;
use crate::property::{AnyProperty, Property};
use crate::types::{Array, SecondaryStructure, ValueType};
use std::cell::RefCell;
use std::rc::Rc;

/// Forwards everything from its parent, but answers requests for
/// `residue.secondarystructures` even when the parent has none: missing
/// assignments default to [`SecondaryStructure::Loop`] for every residue
/// listed in `residue.names`.
pub struct SecondaryStructureAdaptor {
    base: Rc<ParentedAdaptor>,
    assignments: RefCell<Option<Property<Array<SecondaryStructure>>>>,
}

impl SecondaryStructureAdaptor {
    pub fn new() -> Self {
        Self {
            base: ParentedAdaptor::new(),
            assignments: RefCell::new(None),
        }
    }

    pub fn parent_adaptor(&self) -> &Property<ProviderRef> {
        self.base.parent_adaptor()
    }

    pub fn set_parent<P: DynamicPropertyProvider + 'static>(&self, parent: &Rc<P>) {
        self.base.set_parent(parent);
    }

    fn assignments(&self) -> Result<Property<Array<SecondaryStructure>>> {
        if let Some(existing) = self.assignments.borrow().as_ref() {
            return Ok(existing.clone());
        }
        let provided = self
            .base
            .get_or_create::<Array<SecondaryStructure>>(keys::RESIDUE_SECONDARY_STRUCTURES)?;
        let names = self.base.get_or_create::<Array<String>>(keys::RESIDUE_NAMES)?;

        let inputs = vec![provided.observer(), names.observer()];
        let derived = Property::derived(inputs, move || {
            provided.try_value().or_else(|| {
                names
                    .try_value()
                    .map(|names| vec![SecondaryStructure::Loop; names.len()].into())
            })
        });
        *self.assignments.borrow_mut() = Some(derived.clone());
        Ok(derived)
    }
}

impl Default for SecondaryStructureAdaptor {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicPropertyProvider for SecondaryStructureAdaptor {
    fn get_or_create_property(&self, name: &str, value_type: ValueType) -> Result<AnyProperty> {
        if name == keys::RESIDUE_SECONDARY_STRUCTURES {
            let property = AnyProperty::from(self.assignments()?);
            check_type(name, &property, value_type)?;
            return Ok(property);
        }
        self.base.get_or_create_property(name, value_type)
    }

    fn get_property(&self, name: &str) -> Option<AnyProperty> {
        if name == keys::RESIDUE_SECONDARY_STRUCTURES {
            return self.assignments.borrow().clone().map(AnyProperty::from);
        }
        self.base.get_property(name)
    }

    fn list_properties(&self) -> Vec<(String, AnyProperty)> {
        let mut properties: Vec<_> = self
            .base
            .list_properties()
            .into_iter()
            .filter(|(name, _)| name != keys::RESIDUE_SECONDARY_STRUCTURES)
            .collect();
        if let Some(assignments) = self.assignments.borrow().clone() {
            properties.push((
                keys::RESIDUE_SECONDARY_STRUCTURES.to_string(),
                assignments.into(),
            ));
        }
        properties
    }
}
