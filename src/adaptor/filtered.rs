//! Adaptor that restricts per-particle data to a subset of particles.

use super::{
    check_type, DynamicPropertyProvider, ParentedAdaptor, PropertyTable, ProviderExt, ProviderRef,
};
use crate::error::Result;
use crate::frame::keys;
use crate::property::{AnyProperty, Property};
use crate::types::{Array, BondPair, ValueType, Vec3};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A [`ParentedAdaptor`] whose per-particle arrays are gathered through a
/// particle filter.
///
/// * Indices at or past the parent's particle count (the length of
///   `particle.positions`) are dropped from the filter first. Every derived
///   property uses that same restricted filter, so bond indices and array
///   positions agree.
/// * Array properties whose name contains the per-particle marker are
///   replaced by `source[filter[i]]`.
/// * The bond key is rewritten to keep only bonds whose endpoints both pass
///   the filter, renumbered to positions within the filter.
/// * Everything else is forwarded untouched.
///
/// With the filter undefined every property passes through unchanged.
pub struct FilteredAdaptor {
    base: Rc<ParentedAdaptor>,
    filter: Property<Array<u32>>,
    restricted: RefCell<Option<Property<Array<u32>>>>,
    exposed: PropertyTable,
    per_particle_marker: String,
    bond_key: String,
}

impl Default for FilteredAdaptor {
    fn default() -> Self {
        Self::new()
    }
}

impl FilteredAdaptor {
    pub fn new() -> Self {
        Self::with_convention(keys::PER_PARTICLE_MARKER, keys::BOND_PAIRS)
    }

    /// Create an adaptor with custom naming for per-particle and bond data.
    pub fn with_convention(per_particle_marker: &str, bond_key: &str) -> Self {
        Self {
            base: ParentedAdaptor::new(),
            filter: Property::new(),
            restricted: RefCell::new(None),
            exposed: PropertyTable::new(),
            per_particle_marker: per_particle_marker.to_string(),
            bond_key: bond_key.to_string(),
        }
    }

    /// Ordered particle indices to keep. Undefined means keep everything.
    pub fn particle_filter(&self) -> &Property<Array<u32>> {
        &self.filter
    }

    pub fn parent_adaptor(&self) -> &Property<ProviderRef> {
        self.base.parent_adaptor()
    }

    pub fn set_parent<P: DynamicPropertyProvider + 'static>(&self, parent: &Rc<P>) {
        self.base.set_parent(parent);
    }

    fn is_per_particle(&self, name: &str, value_type: ValueType) -> bool {
        value_type.is_array() && name.contains(&self.per_particle_marker)
    }

    /// The particle filter with out-of-range indices removed.
    fn restricted_filter(&self) -> Result<Property<Array<u32>>> {
        if let Some(existing) = self.restricted.borrow().as_ref() {
            return Ok(existing.clone());
        }
        let positions = self
            .base
            .get_or_create::<Array<Vec3>>(keys::PARTICLE_POSITIONS)?;
        let filter = self.filter.clone();
        let inputs = vec![filter.observer(), positions.observer()];
        let restricted = Property::derived(inputs, move || {
            let indices = filter.try_value()?;
            Some(match positions.try_value() {
                Some(positions) => restrict_filter(&indices, positions.len()),
                None => indices,
            })
        });
        *self.restricted.borrow_mut() = Some(restricted.clone());
        Ok(restricted)
    }

    fn build(&self, name: &str, source: AnyProperty) -> Result<AnyProperty> {
        if name == self.bond_key {
            if let AnyProperty::BondArray(bonds) = &source {
                let filter = self.restricted_filter()?;
                return Ok(AnyProperty::BondArray(filter_bonds(bonds.clone(), filter)));
            }
        }
        if !self.is_per_particle(name, source.value_type()) {
            return Ok(source);
        }
        let filter = self.restricted_filter()?;
        Ok(match source {
            AnyProperty::IntArray(p) => AnyProperty::IntArray(filter_array(p, filter)),
            AnyProperty::FloatArray(p) => AnyProperty::FloatArray(filter_array(p, filter)),
            AnyProperty::StringArray(p) => AnyProperty::StringArray(filter_array(p, filter)),
            AnyProperty::Vec3Array(p) => AnyProperty::Vec3Array(filter_array(p, filter)),
            AnyProperty::ColorArray(p) => AnyProperty::ColorArray(filter_array(p, filter)),
            AnyProperty::BondArray(p) => AnyProperty::BondArray(filter_array(p, filter)),
            AnyProperty::SecondaryStructureArray(p) => {
                AnyProperty::SecondaryStructureArray(filter_array(p, filter))
            }
            AnyProperty::SelectionArray(p) => AnyProperty::SelectionArray(filter_array(p, filter)),
            other => other,
        })
    }
}

impl DynamicPropertyProvider for FilteredAdaptor {
    fn get_or_create_property(&self, name: &str, value_type: ValueType) -> Result<AnyProperty> {
        if let Some(existing) = self.exposed.get(name) {
            check_type(name, &existing, value_type)?;
            return Ok(existing);
        }
        let source = self.base.get_or_create_property(name, value_type)?;
        let exposed = self.build(name, source)?;
        self.exposed.insert(name, exposed.clone());
        Ok(exposed)
    }

    fn get_property(&self, name: &str) -> Option<AnyProperty> {
        self.exposed.get(name)
    }

    fn list_properties(&self) -> Vec<(String, AnyProperty)> {
        self.exposed.list()
    }
}

/// `filter` without the indices at or past `particle_count`.
pub fn restrict_filter(filter: &[u32], particle_count: usize) -> Array<u32> {
    filter
        .iter()
        .copied()
        .filter(|&i| (i as usize) < particle_count)
        .collect()
}

/// `values[filter[i]]` for every in-range index in `filter`.
pub fn gather<T: Clone>(values: &[T], filter: &[u32]) -> Array<T> {
    filter
        .iter()
        .filter_map(|&i| values.get(i as usize).cloned())
        .collect()
}

/// Keep bonds whose endpoints both appear in `filter`, renumbered to their
/// position within `filter`.
pub fn remap_bonds(bonds: &[BondPair], filter: &[u32]) -> Array<BondPair> {
    let mut position = HashMap::with_capacity(filter.len());
    for (new_index, &old_index) in filter.iter().enumerate() {
        position.entry(old_index).or_insert(new_index as u32);
    }
    bonds
        .iter()
        .filter_map(|bond| {
            let a = *position.get(&bond.a)?;
            let b = *position.get(&bond.b)?;
            Some(BondPair::new(a, b))
        })
        .collect()
}

fn filter_array<T: Clone + 'static>(
    source: Property<Array<T>>,
    filter: Property<Array<u32>>,
) -> Property<Array<T>> {
    let inputs = vec![source.observer(), filter.observer()];
    Property::derived(inputs, move || {
        let values = source.try_value()?;
        Some(match filter.try_value() {
            Some(indices) => gather(&values, &indices),
            None => values,
        })
    })
}

fn filter_bonds(
    source: Property<Array<BondPair>>,
    filter: Property<Array<u32>>,
) -> Property<Array<BondPair>> {
    let inputs = vec![source.observer(), filter.observer()];
    Property::derived(inputs, move || {
        let bonds = source.try_value()?;
        Some(match filter.try_value() {
            Some(indices) => remap_bonds(&bonds, &indices),
            None => bonds,
        })
    })
}
