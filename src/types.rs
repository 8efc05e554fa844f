//! Core value types for visgraph
//!
//! This module contains the data carried by properties: geometric and colour
//! primitives, bond pairs, secondary structure assignments and the colour
//! mappings used by colouring nodes. It also defines [`ValueType`], the closed
//! set of types a property can be declared with, and [`Value`], the matching
//! type-erased value used for frames and literal parameters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Immutable shared array. Replaced wholesale, never mutated in place, so
/// readers on other threads can keep a clone without locking.
pub type Array<T> = Arc<[T]>;

/// A set of indices (e.g. the residues forming one chain).
pub type Selection = Arc<[u32]>;

/// A 3D position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Linear RGBA colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const GREY: Color = Color::rgb(0.5, 0.5, 0.5);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 0.92, 0.016);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        let a = if hex.len() == 8 { channel(6)? } else { 1.0 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Linear interpolation between two colours.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color::rgba(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// A colour stop within a [`Gradient`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient in `0.0..=1.0`.
    pub position: f32,
    pub color: Color,
}

/// Piecewise-linear colour gradient.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    /// Build a gradient from stops. Stops are sorted by position.
    pub fn new(mut stops: Vec<GradientStop>) -> Self {
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { stops }
    }

    /// Evenly space the given colours from 0 to 1.
    pub fn from_colors(colors: &[Color]) -> Self {
        let last = colors.len().saturating_sub(1).max(1) as f32;
        Self::new(
            colors
                .iter()
                .enumerate()
                .map(|(i, &color)| GradientStop {
                    position: if colors.len() == 1 { 0.0 } else { i as f32 / last },
                    color,
                })
                .collect(),
        )
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Sample the gradient at `t`, clamped to `0.0..=1.0`.
    pub fn evaluate(&self, t: f32) -> Color {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Color::WHITE,
        };
        if t <= first.position {
            return first.color;
        }
        if t >= last.position {
            return last.color;
        }
        for pair in self.stops.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if t >= lo.position && t <= hi.position {
                let span = hi.position - lo.position;
                if span <= f32::EPSILON {
                    return hi.color;
                }
                return lo.color.lerp(hi.color, (t - lo.position) / span);
            }
        }
        last.color
    }
}

/// An edge between two particles, by particle index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BondPair {
    pub a: u32,
    pub b: u32,
}

impl BondPair {
    pub const fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }
}

/// Per-residue secondary structure assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryStructure {
    Helix,
    Sheet,
    Turn,
    #[default]
    Loop,
}

impl SecondaryStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecondaryStructure::Helix => "helix",
            SecondaryStructure::Sheet => "sheet",
            SecondaryStructure::Turn => "turn",
            SecondaryStructure::Loop => "loop",
        }
    }
}

/// Maps atomic numbers to colours.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementColorMapping {
    pub colors: BTreeMap<u32, Color>,
    pub default: Color,
}

impl ElementColorMapping {
    pub fn map(&self, element: u32) -> Color {
        self.colors.get(&element).copied().unwrap_or(self.default)
    }
}

/// Maps arbitrary keys (residue names, structure names, ...) to colours.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringColorMapping {
    pub colors: BTreeMap<String, Color>,
    pub default: Color,
}

impl StringColorMapping {
    pub fn map(&self, key: &str) -> Color {
        self.colors
            .get(key)
            .or_else(|| self.colors.get(&key.to_ascii_lowercase()))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Invokes `$m!` with the full list of property value types, as
/// `Variant => RustType, "name";` entries.
macro_rules! for_each_value_type {
    ($m:ident) => {
        $m! {
            Bool => bool, "bool";
            Float => f32, "float";
            String => String, "string";
            Color => $crate::types::Color, "color";
            Gradient => $crate::types::Gradient, "gradient";
            ElementColorMapping => $crate::types::ElementColorMapping, "element_color_mapping";
            StringColorMapping => $crate::types::StringColorMapping, "string_color_mapping";
            IntArray => $crate::types::Array<u32>, "int_array";
            FloatArray => $crate::types::Array<f32>, "float_array";
            StringArray => $crate::types::Array<String>, "string_array";
            Vec3Array => $crate::types::Array<$crate::types::Vec3>, "vec3_array";
            ColorArray => $crate::types::Array<$crate::types::Color>, "color_array";
            BondArray => $crate::types::Array<$crate::types::BondPair>, "bond_array";
            SecondaryStructureArray => $crate::types::Array<$crate::types::SecondaryStructure>, "secondary_structure_array";
            SelectionArray => $crate::types::Array<$crate::types::Selection>, "selection_array";
        }
    };
}

pub(crate) use for_each_value_type;

macro_rules! define_value_types {
    ($($variant:ident => $ty:ty, $label:literal;)*) => {
        /// The declared type of a property.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum ValueType {
            $($variant,)*
        }

        impl ValueType {
            /// Snake-case name, as used in templates.
            pub fn name(&self) -> &'static str {
                match self {
                    $(ValueType::$variant => $label,)*
                }
            }

            /// Get all value types.
            pub fn all() -> &'static [ValueType] {
                &[$(ValueType::$variant,)*]
            }
        }

        /// A type-erased property value.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Value {
            $($variant($ty),)*
        }

        impl Value {
            pub fn value_type(&self) -> ValueType {
                match self {
                    $(Value::$variant(_) => ValueType::$variant,)*
                }
            }
        }

        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

for_each_value_type!(define_value_types);

impl ValueType {
    /// Whether values of this type are arrays (and so may be per-particle).
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            ValueType::IntArray
                | ValueType::FloatArray
                | ValueType::StringArray
                | ValueType::Vec3Array
                | ValueType::ColorArray
                | ValueType::BondArray
                | ValueType::SecondaryStructureArray
                | ValueType::SelectionArray
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Value {
    /// Number of elements for array values, `None` for scalars.
    pub fn array_len(&self) -> Option<usize> {
        match self {
            Value::IntArray(v) => Some(v.len()),
            Value::FloatArray(v) => Some(v.len()),
            Value::StringArray(v) => Some(v.len()),
            Value::Vec3Array(v) => Some(v.len()),
            Value::ColorArray(v) => Some(v.len()),
            Value::BondArray(v) => Some(v.len()),
            Value::SecondaryStructureArray(v) => Some(v.len()),
            Value::SelectionArray(v) => Some(v.len()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_from_hex() {
        let c = Color::from_hex("#ff0000").unwrap();
        assert_eq!(c, Color::RED);
        let c = Color::from_hex("00ff0080").unwrap();
        assert_eq!(c.g, 1.0);
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        assert!(Color::from_hex("#abc").is_none());
        assert!(Color::from_hex("#gg0000").is_none());
    }

    #[test]
    fn test_gradient_evaluate() {
        let g = Gradient::from_colors(&[Color::BLACK, Color::WHITE]);
        assert_eq!(g.evaluate(-1.0), Color::BLACK);
        assert_eq!(g.evaluate(2.0), Color::WHITE);
        let mid = g.evaluate(0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_gradient_three_stops() {
        let g = Gradient::from_colors(&[Color::RED, Color::GREEN, Color::BLUE]);
        assert_eq!(g.stops().len(), 3);
        assert_eq!(g.evaluate(0.5), Color::GREEN);
        assert_eq!(Gradient::default().evaluate(0.3), Color::WHITE);
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(ValueType::Vec3Array.to_string(), "vec3_array");
        assert!(ValueType::BondArray.is_array());
        assert!(!ValueType::Gradient.is_array());
        assert_eq!(ValueType::all().len(), 15);
    }

    #[test]
    fn test_value_type_serde_name() {
        let ty: ValueType = serde_json::from_str("\"element_color_mapping\"").unwrap();
        assert_eq!(ty, ValueType::ElementColorMapping);
    }

    #[test]
    fn test_value_from() {
        let v = Value::from(Array::<u32>::from(vec![1, 2, 3]));
        assert_eq!(v.value_type(), ValueType::IntArray);
        assert_eq!(v.array_len(), Some(3));
        assert_eq!(Value::from(1.5f32).array_len(), None);
    }

    #[test]
    fn test_string_mapping_case_fallback() {
        let mut colors = BTreeMap::new();
        colors.insert("helix".to_string(), Color::RED);
        let m = StringColorMapping {
            colors,
            default: Color::GREY,
        };
        assert_eq!(m.map("HELIX"), Color::RED);
        assert_eq!(m.map("sheet"), Color::GREY);
    }
}
