//! Type-erased properties.
//!
//! Adaptors and the resolver deal with properties whose type is only known at
//! runtime (a name plus a declared [`ValueType`]). [`AnyProperty`] is a closed
//! enum over `Property<T>` for every supported value type, so those call sites
//! dispatch with a `match` instead of runtime type inspection.

use super::{Observable, Property};
use crate::error::{Result, VisError};
use crate::types::{for_each_value_type, Value, ValueType};

/// Implemented by every Rust type that can be stored in an [`AnyProperty`].
pub trait PropertyValue: Clone + 'static {
    const VALUE_TYPE: ValueType;

    fn wrap(property: Property<Self>) -> AnyProperty;

    fn unwrap(property: &AnyProperty) -> Option<&Property<Self>>;
}

macro_rules! define_any_property {
    ($($variant:ident => $ty:ty, $label:literal;)*) => {
        /// A property of any supported value type.
        #[derive(Clone, Debug)]
        pub enum AnyProperty {
            $($variant(Property<$ty>),)*
        }

        $(
            impl PropertyValue for $ty {
                const VALUE_TYPE: ValueType = ValueType::$variant;

                fn wrap(property: Property<Self>) -> AnyProperty {
                    AnyProperty::$variant(property)
                }

                fn unwrap(property: &AnyProperty) -> Option<&Property<Self>> {
                    match property {
                        AnyProperty::$variant(p) => Some(p),
                        _ => None,
                    }
                }
            }
        )*

        impl AnyProperty {
            /// Create a property of the given type holding `value`.
            pub fn with_value(value: Value) -> Self {
                match value {
                    $(Value::$variant(v) => AnyProperty::$variant(Property::with_value(v)),)*
                }
            }

            /// Create an empty property of the given type.
            pub fn new(value_type: ValueType) -> Self {
                match value_type {
                    $(ValueType::$variant => AnyProperty::$variant(Property::new()),)*
                }
            }

            pub fn value_type(&self) -> ValueType {
                match self {
                    $(AnyProperty::$variant(_) => ValueType::$variant,)*
                }
            }

            pub fn has_value(&self) -> bool {
                match self {
                    $(AnyProperty::$variant(p) => p.has_value(),)*
                }
            }

            pub fn has_linked_source(&self) -> bool {
                match self {
                    $(AnyProperty::$variant(p) => p.has_linked_source(),)*
                }
            }

            pub fn is_dirty(&self) -> bool {
                match self {
                    $(AnyProperty::$variant(p) => p.is_dirty(),)*
                }
            }

            pub fn mark_dirty(&self) {
                match self {
                    $(AnyProperty::$variant(p) => p.mark_dirty(),)*
                }
            }

            pub fn clear_dirty(&self) {
                match self {
                    $(AnyProperty::$variant(p) => p.clear_dirty(),)*
                }
            }

            pub fn undefine(&self) {
                match self {
                    $(AnyProperty::$variant(p) => p.undefine(),)*
                }
            }

            /// Effective value as a [`Value`].
            pub fn value(&self) -> Result<Value> {
                match self {
                    $(AnyProperty::$variant(p) => p.value().map(Value::$variant),)*
                }
            }

            /// Set an explicit value. Fails if the value's type differs.
            pub fn set_value(&self, value: Value) -> Result<()> {
                match (self, value) {
                    $((AnyProperty::$variant(p), Value::$variant(v)) => {
                        p.set_value(v);
                        Ok(())
                    })*
                    (_, value) => Err(VisError::TypeMismatch {
                        name: String::new(),
                        existing: self.value_type(),
                        requested: value.value_type(),
                    }),
                }
            }

            /// Link this property to `source`. Both must have the same type.
            pub fn link_to(&self, source: &AnyProperty) -> Result<()> {
                match (self, source) {
                    $((AnyProperty::$variant(p), AnyProperty::$variant(s)) => {
                        p.set_linked_source(Some(s))
                    })*
                    _ => Err(VisError::TypeMismatch {
                        name: String::new(),
                        existing: self.value_type(),
                        requested: source.value_type(),
                    }),
                }
            }

            /// Remove any link, leaving the property undefined if it was linked.
            pub fn unlink(&self) {
                match self {
                    $(AnyProperty::$variant(p) => p.unlink(),)*
                }
            }

            pub fn ptr_eq(&self, other: &AnyProperty) -> bool {
                match (self, other) {
                    $((AnyProperty::$variant(a), AnyProperty::$variant(b)) => a.ptr_eq(b),)*
                    _ => false,
                }
            }

            /// Boxed subscription handle, for use as a derivation input.
            pub fn observer(&self) -> Box<dyn Observable> {
                match self {
                    $(AnyProperty::$variant(p) => p.observer(),)*
                }
            }
        }
    };
}

for_each_value_type!(define_any_property);

impl AnyProperty {
    /// Wrap a typed property.
    pub fn from_typed<T: PropertyValue>(property: Property<T>) -> Self {
        T::wrap(property)
    }

    /// Borrow the typed property, if the type matches.
    pub fn typed<T: PropertyValue>(&self) -> Option<&Property<T>> {
        T::unwrap(self)
    }

}

impl<T: PropertyValue> From<Property<T>> for AnyProperty {
    fn from(property: Property<T>) -> Self {
        T::wrap(property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Array, Color, Vec3};

    #[test]
    fn test_new_has_declared_type() {
        for &ty in ValueType::all() {
            let p = AnyProperty::new(ty);
            assert_eq!(p.value_type(), ty);
            assert!(!p.has_value());
        }
    }

    #[test]
    fn test_set_value_type_checked() {
        let p = AnyProperty::new(ValueType::Float);
        p.set_value(Value::Float(1.5)).unwrap();
        assert_eq!(p.value().unwrap(), Value::Float(1.5));
        assert!(matches!(
            p.set_value(Value::Bool(true)),
            Err(VisError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_link_same_type() {
        let source = AnyProperty::with_value(Value::Color(Color::RED));
        let target = AnyProperty::new(ValueType::Color);
        target.link_to(&source).unwrap();
        assert_eq!(target.value().unwrap(), Value::Color(Color::RED));
        target.unlink();
        assert!(!target.has_value());
    }

    #[test]
    fn test_link_type_mismatch() {
        let source = AnyProperty::new(ValueType::FloatArray);
        let target = AnyProperty::new(ValueType::Vec3Array);
        assert!(matches!(
            target.link_to(&source),
            Err(VisError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_typed_access() {
        let positions: Array<Vec3> = vec![Vec3::ZERO].into();
        let typed = Property::with_value(positions);
        let any = AnyProperty::from(typed.clone());
        assert_eq!(any.value_type(), ValueType::Vec3Array);
        assert!(any.typed::<Array<Vec3>>().unwrap().ptr_eq(&typed));
        assert!(any.typed::<Array<f32>>().is_none());
    }
}
