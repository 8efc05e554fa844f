//! Reactive property cells.
//!
//! A [`Property<T>`] is a shared handle to a single-value cell that can be
//! undefined, hold an explicit value, delegate to another property (a *link*),
//! or be *derived* from other properties through a closure.
//!
//! # Propagation
//!
//! ```text
//! frame ──set──► [raw] ◄──link── [filtered] ◄──link── [node input]
//!                  │                  ▲
//!                  └──── notify ──────┘──── notify ────►
//! ```
//!
//! Every mutation marks the cell dirty and synchronously notifies its
//! listeners, which mark themselves dirty and notify theirs in turn. Listeners
//! are held as `Weak` pointers, so a source never keeps its dependents alive.
//! Cycles are rejected when a link is created, which bounds the recursion.
//!
//! Dirty flags are only ever cleared explicitly by the consumer that read the
//! change.

pub mod any;

pub use any::{AnyProperty, PropertyValue};

use crate::error::{Result, VisError};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Receives change notifications from an [`Observable`].
pub trait ChangeListener {
    fn on_changed(&self);
}

/// Type-erased subscription surface of a property.
pub trait Observable {
    /// Register a listener. Dead listeners are pruned on the next notification.
    fn subscribe(&self, listener: Weak<dyn ChangeListener>);

    /// Remove a listener, identified by the address of its allocation.
    fn unsubscribe(&self, listener: *const ());

    fn is_dirty(&self) -> bool;

    /// Whether the cell at `target` is this property or feeds it, through a
    /// link or a derivation input.
    fn depends_on(&self, target: *const ()) -> bool;
}

/// Lazily computed binding.
struct Derivation<T> {
    compute: Box<dyn Fn() -> Option<T>>,
    /// `None` when stale.
    cached: Option<Option<T>>,
    inputs: Vec<Box<dyn Observable>>,
}

enum Binding<T> {
    Undefined,
    Value(T),
    Linked(Property<T>),
    Derived(Derivation<T>),
}

struct PropertyInner<T> {
    binding: RefCell<Binding<T>>,
    dirty: Cell<bool>,
    listeners: RefCell<Vec<Weak<dyn ChangeListener>>>,
}

impl<T> PropertyInner<T> {
    fn notify(&self) {
        let live: Vec<Rc<dyn ChangeListener>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|l| l.strong_count() > 0);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in live {
            listener.on_changed();
        }
    }

    fn mark_changed(&self) {
        self.dirty.set(true);
        self.notify();
    }
}

impl<T> ChangeListener for PropertyInner<T> {
    fn on_changed(&self) {
        if let Binding::Derived(derivation) = &mut *self.binding.borrow_mut() {
            derivation.cached = None;
        }
        self.mark_changed();
    }
}

/// Shared handle to a reactive value cell.
///
/// Cloning the handle does not clone the cell; both handles observe the same
/// value and dirty flag.
pub struct Property<T> {
    inner: Rc<PropertyInner<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Property<T> {
    /// Create an undefined, dirty property.
    pub fn new() -> Self {
        Self::from_binding(Binding::Undefined)
    }

    /// Create a property holding `value`.
    pub fn with_value(value: T) -> Self {
        Self::from_binding(Binding::Value(value))
    }

    /// Create a property whose value is computed by `compute` and recomputed
    /// whenever one of `inputs` reports a change.
    pub fn derived<F>(inputs: Vec<Box<dyn Observable>>, compute: F) -> Self
    where
        F: Fn() -> Option<T> + 'static,
    {
        let property = Self::new();
        let listener = property.as_listener();
        for input in &inputs {
            input.subscribe(listener.clone());
        }
        *property.inner.binding.borrow_mut() = Binding::Derived(Derivation {
            compute: Box::new(compute),
            cached: None,
            inputs,
        });
        property
    }

    fn from_binding(binding: Binding<T>) -> Self {
        Self {
            inner: Rc::new(PropertyInner {
                binding: RefCell::new(binding),
                dirty: Cell::new(true),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    fn as_listener(&self) -> Weak<dyn ChangeListener> {
        let weak: Weak<PropertyInner<T>> = Rc::downgrade(&self.inner);
        weak
    }

    fn address(&self) -> *const () {
        Rc::as_ptr(&self.inner) as *const ()
    }

    /// Recompute a stale derivation.
    fn refresh_derived(&self) {
        let stale = matches!(
            &*self.inner.binding.borrow(),
            Binding::Derived(d) if d.cached.is_none()
        );
        if !stale {
            return;
        }
        let computed = match &*self.inner.binding.borrow() {
            Binding::Derived(d) => (d.compute)(),
            _ => return,
        };
        if let Binding::Derived(d) = &mut *self.inner.binding.borrow_mut() {
            d.cached = Some(computed);
        }
    }

    /// Effective value, following links and derivations.
    pub fn value(&self) -> Result<T> {
        self.refresh_derived();
        let linked = match &*self.inner.binding.borrow() {
            Binding::Undefined => return Err(VisError::NoValue),
            Binding::Value(v) => return Ok(v.clone()),
            Binding::Derived(d) => {
                return d.cached.clone().flatten().ok_or(VisError::NoValue);
            }
            Binding::Linked(source) => source.clone(),
        };
        linked.value()
    }

    /// Effective value, or `None` when undefined.
    pub fn try_value(&self) -> Option<T> {
        self.value().ok()
    }

    pub fn has_value(&self) -> bool {
        self.refresh_derived();
        let linked = match &*self.inner.binding.borrow() {
            Binding::Undefined => return false,
            Binding::Value(_) => return true,
            Binding::Derived(d) => return matches!(d.cached, Some(Some(_))),
            Binding::Linked(source) => source.clone(),
        };
        linked.has_value()
    }

    /// Whether this property holds its own explicit value.
    pub fn has_explicit_value(&self) -> bool {
        matches!(&*self.inner.binding.borrow(), Binding::Value(_))
    }

    pub fn is_derived(&self) -> bool {
        matches!(&*self.inner.binding.borrow(), Binding::Derived(_))
    }

    /// Set an explicit value, dropping any link or derivation.
    pub fn set_value(&self, value: T) {
        let previous = self.inner.binding.replace(Binding::Value(value));
        self.release(previous);
        self.inner.mark_changed();
    }

    /// The property this one delegates to, if any.
    pub fn linked_source(&self) -> Option<Property<T>> {
        match &*self.inner.binding.borrow() {
            Binding::Linked(source) => Some(source.clone()),
            _ => None,
        }
    }

    pub fn has_linked_source(&self) -> bool {
        matches!(&*self.inner.binding.borrow(), Binding::Linked(_))
    }

    /// Delegate this property's value to `source`, or clear the delegation.
    ///
    /// Fails with [`VisError::CyclicLink`] if `source` is this property or
    /// depends on it through links or derivations; the property is left
    /// untouched in that case.
    pub fn set_linked_source(&self, source: Option<&Property<T>>) -> Result<()> {
        let Some(source) = source else {
            self.unlink();
            return Ok(());
        };

        if self.linked_source().is_some_and(|current| current.ptr_eq(source)) {
            return Ok(());
        }

        if source.depends_on(self.address()) {
            return Err(VisError::CyclicLink);
        }

        source.subscribe(self.as_listener());
        let previous = self.inner.binding.replace(Binding::Linked(source.clone()));
        self.release(previous);
        self.inner.mark_changed();
        Ok(())
    }

    /// Drop the link, leaving the property undefined. No-op when unlinked.
    pub fn unlink(&self) {
        if self.has_linked_source() {
            let previous = self.inner.binding.replace(Binding::Undefined);
            self.release(previous);
            self.inner.mark_changed();
        }
    }

    /// Clear both value and link. Only marks dirty if something was cleared.
    pub fn undefine(&self) {
        let previous = self.inner.binding.replace(Binding::Undefined);
        let had_binding = !matches!(previous, Binding::Undefined);
        self.release(previous);
        if had_binding {
            self.inner.mark_changed();
        }
    }

    /// Drop the subscriptions held by a binding that is being replaced.
    fn release(&self, previous: Binding<T>) {
        let me = self.address();
        match previous {
            Binding::Linked(source) => source.unsubscribe(me),
            Binding::Derived(derivation) => {
                for input in &derivation.inputs {
                    input.unsubscribe(me);
                }
            }
            Binding::Undefined | Binding::Value(_) => {}
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    pub fn mark_dirty(&self) {
        self.inner.dirty.set(true);
    }

    pub fn clear_dirty(&self) {
        self.inner.dirty.set(false);
    }

    /// Boxed subscription handle, for use as a derivation input.
    pub fn observer(&self) -> Box<dyn Observable> {
        Box::new(self.clone())
    }

    /// Whether both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Property<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live listeners, for diagnostics.
    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }
}

impl<T: Clone + 'static> Observable for Property<T> {
    fn subscribe(&self, listener: Weak<dyn ChangeListener>) {
        self.inner.listeners.borrow_mut().push(listener);
    }

    fn unsubscribe(&self, listener: *const ()) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|l| l.as_ptr() as *const () != listener);
    }

    fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    fn depends_on(&self, target: *const ()) -> bool {
        if self.address() == target {
            return true;
        }
        match &*self.inner.binding.borrow() {
            Binding::Linked(source) => source.depends_on(target),
            Binding::Derived(d) => d.inputs.iter().any(|input| input.depends_on(target)),
            Binding::Undefined | Binding::Value(_) => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Property");
        match &*self.inner.binding.borrow() {
            Binding::Undefined => s.field("value", &"<undefined>"),
            Binding::Value(v) => s.field("value", v),
            Binding::Linked(_) => s.field("value", &"<linked>"),
            Binding::Derived(_) => s.field("value", &"<derived>"),
        };
        s.field("dirty", &self.inner.dirty.get()).finish()
    }
}
