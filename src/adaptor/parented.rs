//! Adaptor that forwards properties from a replaceable parent.

use super::{DynamicPropertyProvider, PropertyTable, ProviderRef};
use crate::error::Result;
use crate::property::{AnyProperty, ChangeListener, Observable, Property};
use crate::types::{Value, ValueType};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

/// Forwards every requested property to the same-named property of its
/// parent, unless the property has been overridden locally.
///
/// The parent is itself held in a property. Whenever that reference changes,
/// every non-overridden property is relinked to the new parent (or unlinked
/// when the parent is cleared) before the notification returns.
pub struct ParentedAdaptor {
    table: PropertyTable,
    overrides: RefCell<BTreeSet<String>>,
    parent: Property<ProviderRef>,
}

impl ParentedAdaptor {
    /// Create an adaptor with no parent.
    pub fn new() -> Rc<Self> {
        let adaptor = Rc::new(Self {
            table: PropertyTable::new(),
            overrides: RefCell::new(BTreeSet::new()),
            parent: Property::new(),
        });
        let weak: Weak<Self> = Rc::downgrade(&adaptor);
        adaptor.parent.subscribe(weak);
        adaptor
    }

    /// The parent-reference property.
    pub fn parent_adaptor(&self) -> &Property<ProviderRef> {
        &self.parent
    }

    pub fn set_parent<P: DynamicPropertyProvider + 'static>(&self, parent: &Rc<P>) {
        self.parent.set_value(ProviderRef::new(parent));
    }

    pub fn clear_parent(&self) {
        self.parent.undefine();
    }

    pub fn parent(&self) -> Option<Rc<dyn DynamicPropertyProvider>> {
        self.parent.try_value().and_then(|r| r.upgrade())
    }

    /// Give `name` a local value that hides whatever the parent provides.
    pub fn override_value(&self, name: &str, value: Value) -> Result<AnyProperty> {
        let (property, _) = self.table.get_or_create(name, value.value_type())?;
        self.overrides.borrow_mut().insert(name.to_string());
        property.set_value(value)?;
        Ok(property)
    }

    /// Drop a local override and fall back to the parent's property.
    pub fn clear_override(&self, name: &str) {
        if !self.overrides.borrow_mut().remove(name) {
            return;
        }
        if let Some(property) = self.table.get(name) {
            property.undefine();
            self.relink(name, &property, self.parent().as_deref());
        }
    }

    pub fn is_overridden(&self, name: &str) -> bool {
        self.overrides.borrow().contains(name)
    }

    /// Link one property to its counterpart on `parent`, or unlink it.
    fn relink(&self, name: &str, property: &AnyProperty, parent: Option<&dyn DynamicPropertyProvider>) {
        let Some(parent) = parent else {
            property.unlink();
            return;
        };
        let linked = parent
            .get_or_create_property(name, property.value_type())
            .and_then(|source| property.link_to(&source));
        if let Err(e) = linked {
            tracing::warn!("Cannot forward '{}' from parent: {}", name, e);
            property.unlink();
        }
    }

    /// Relink every non-overridden property to the current parent.
    fn reconcile(&self) {
        let parent = self.parent();
        let mut relinked = 0usize;
        for (name, property) in self.table.list() {
            if self.is_overridden(&name) {
                continue;
            }
            self.relink(&name, &property, parent.as_deref());
            relinked += 1;
        }
        tracing::debug!(
            "Parent {} ({} properties relinked)",
            if parent.is_some() { "changed" } else { "cleared" },
            relinked
        );
    }
}

impl ChangeListener for ParentedAdaptor {
    fn on_changed(&self) {
        self.reconcile();
    }
}

impl DynamicPropertyProvider for ParentedAdaptor {
    fn get_or_create_property(&self, name: &str, value_type: ValueType) -> Result<AnyProperty> {
        let (property, created) = self.table.get_or_create(name, value_type)?;
        if created {
            if let Some(parent) = self.parent() {
                self.relink(name, &property, Some(parent.as_ref()));
            }
        }
        Ok(property)
    }

    fn get_property(&self, name: &str) -> Option<AnyProperty> {
        self.table.get(name)
    }

    fn list_properties(&self) -> Vec<(String, AnyProperty)> {
        self.table.list()
    }
}
