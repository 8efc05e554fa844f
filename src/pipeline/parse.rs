//! Literal parameter parsing.
//!
//! Each input type that can be written as a literal has an [`InputKind`] and
//! one parser. Parsers return `None` for malformed values; the resolver then
//! falls through to its next source.

use crate::error::{Result, VisError};
use crate::pipeline::spec::SpecValue;
use crate::types::{
    Color, ElementColorMapping, Gradient, GradientStop, StringColorMapping, Value, ValueType,
};
use std::collections::BTreeMap;

/// Input types that accept literal parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Bool,
    Scalar,
    String,
    Color,
    Gradient,
    ElementColorMapping,
    StringColorMapping,
}

impl InputKind {
    /// The literal kind for a value type, if it has one.
    pub fn for_type(value_type: ValueType) -> Option<InputKind> {
        match value_type {
            ValueType::Bool => Some(InputKind::Bool),
            ValueType::Float => Some(InputKind::Scalar),
            ValueType::String => Some(InputKind::String),
            ValueType::Color => Some(InputKind::Color),
            ValueType::Gradient => Some(InputKind::Gradient),
            ValueType::ElementColorMapping => Some(InputKind::ElementColorMapping),
            ValueType::StringColorMapping => Some(InputKind::StringColorMapping),
            _ => None,
        }
    }

    pub fn parse(&self, spec: &SpecValue) -> Option<Value> {
        match self {
            InputKind::Bool => spec.as_bool().map(Value::Bool),
            InputKind::Scalar => parse_scalar(spec).map(Value::Float),
            InputKind::String => spec.as_str().map(|s| Value::String(s.to_string())),
            InputKind::Color => parse_color(spec).map(Value::Color),
            InputKind::Gradient => parse_gradient(spec).map(Value::Gradient),
            InputKind::ElementColorMapping => {
                parse_element_mapping(spec).map(Value::ElementColorMapping)
            }
            InputKind::StringColorMapping => {
                parse_string_mapping(spec).map(Value::StringColorMapping)
            }
        }
    }
}

/// Parse `spec` as a literal for an input named `input` of type `value_type`.
///
/// `Ok(None)` means the value did not parse; [`VisError::UnsupportedInputType`]
/// means no literal can ever target this input.
pub fn parse_literal(input: &str, value_type: ValueType, spec: &SpecValue) -> Result<Option<Value>> {
    let kind = InputKind::for_type(value_type).ok_or_else(|| VisError::UnsupportedInputType {
        input: input.to_string(),
        value_type,
    })?;
    Ok(kind.parse(spec))
}

/// A number, or a string holding one.
pub fn parse_scalar(spec: &SpecValue) -> Option<f32> {
    match spec {
        SpecValue::Number(n) => Some(*n as f32),
        SpecValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A hex string (`#RRGGBB`, `#RRGGBBAA`), a colour name, or a list of
/// three or four components in `0..=1`.
pub fn parse_color(spec: &SpecValue) -> Option<Color> {
    match spec {
        SpecValue::String(s) => named_color(s).or_else(|| Color::from_hex(s.trim())),
        SpecValue::List(items) => {
            let components: Option<Vec<f32>> = items.iter().map(|c| c.as_f64().map(|v| v as f32)).collect();
            match components?.as_slice() {
                [r, g, b] => Some(Color::rgb(*r, *g, *b)),
                [r, g, b, a] => Some(Color::rgba(*r, *g, *b, *a)),
                _ => None,
            }
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name.trim().to_ascii_lowercase().as_str() {
        "white" => Color::WHITE,
        "black" => Color::BLACK,
        "grey" | "gray" => Color::GREY,
        "red" => Color::RED,
        "green" => Color::GREEN,
        "blue" => Color::BLUE,
        "yellow" => Color::YELLOW,
        "cyan" => Color::CYAN,
        "magenta" => Color::MAGENTA,
        _ => return None,
    };
    Some(color)
}

/// A list of colours spaced evenly, or a list of `[position, colour]` pairs.
pub fn parse_gradient(spec: &SpecValue) -> Option<Gradient> {
    let items = spec.as_list()?;
    if items.is_empty() {
        return None;
    }
    if let Some(colors) = items.iter().map(parse_color).collect::<Option<Vec<_>>>() {
        return Some(Gradient::from_colors(&colors));
    }
    let stops = items
        .iter()
        .map(|item| match item.as_list()? {
            [position, color] => Some(GradientStop {
                position: parse_scalar(position)?,
                color: parse_color(color)?,
            }),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Gradient::new(stops))
}

/// A map from element symbol (or atomic number) to colour. The key
/// `default` sets the fallback colour.
pub fn parse_element_mapping(spec: &SpecValue) -> Option<ElementColorMapping> {
    let mut mapping = ElementColorMapping {
        colors: BTreeMap::new(),
        default: Color::GREY,
    };
    for (key, value) in spec.as_map()? {
        let color = parse_color(value)?;
        if key.eq_ignore_ascii_case("default") {
            mapping.default = color;
            continue;
        }
        let element = atomic_number(key)?;
        mapping.colors.insert(element, color);
    }
    Some(mapping)
}

/// A map from arbitrary keys to colour. The key `default` sets the
/// fallback colour. Keys are stored lowercase.
pub fn parse_string_mapping(spec: &SpecValue) -> Option<StringColorMapping> {
    let mut mapping = StringColorMapping {
        colors: BTreeMap::new(),
        default: Color::WHITE,
    };
    for (key, value) in spec.as_map()? {
        let color = parse_color(value)?;
        if key.eq_ignore_ascii_case("default") {
            mapping.default = color;
        } else {
            mapping.colors.insert(key.to_ascii_lowercase(), color);
        }
    }
    Some(mapping)
}

const ELEMENT_SYMBOLS: &[&str] = &[
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe",
];

/// Atomic number for an element symbol or a numeric string.
pub fn atomic_number(key: &str) -> Option<u32> {
    let key = key.trim();
    if let Ok(number) = key.parse::<u32>() {
        return Some(number);
    }
    ELEMENT_SYMBOLS
        .iter()
        .position(|symbol| symbol.eq_ignore_ascii_case(key))
        .map(|index| index as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> SpecValue {
        entries.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color(&"red".into()), Some(Color::RED));
        assert_eq!(parse_color(&"#0000ff".into()), Some(Color::BLUE));
        assert_eq!(
            parse_color(&SpecValue::from(vec![0.0, 1.0, 0.0])),
            Some(Color::GREEN)
        );
        assert_eq!(parse_color(&"element".into()), None);
        assert_eq!(parse_color(&SpecValue::from(1.0)), None);
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(parse_scalar(&SpecValue::from(0.5)), Some(0.5));
        assert_eq!(parse_scalar(&"2".into()), Some(2.0));
        assert_eq!(parse_scalar(&"big".into()), None);
    }

    #[test]
    fn test_parse_gradient() {
        let gradient = parse_gradient(&SpecValue::from(vec!["black", "white"])).unwrap();
        assert_eq!(gradient.evaluate(0.0), Color::BLACK);
        assert_eq!(gradient.evaluate(1.0), Color::WHITE);

        let stops = SpecValue::List(vec![
            SpecValue::List(vec![SpecValue::from(1.0), "red".into()]),
            SpecValue::List(vec![SpecValue::from(0.0), "blue".into()]),
        ]);
        let gradient = parse_gradient(&stops).unwrap();
        assert_eq!(gradient.evaluate(0.0), Color::BLUE);

        assert!(parse_gradient(&SpecValue::List(vec![])).is_none());
    }

    #[test]
    fn test_parse_element_mapping() {
        let mapping = parse_element_mapping(&map(&[("C", "grey"), ("o", "red"), ("default", "white")]))
            .unwrap();
        assert_eq!(mapping.map(8), Color::RED);
        assert_eq!(mapping.map(6), Color::GREY);
        assert_eq!(mapping.map(1), Color::WHITE);
        assert!(parse_element_mapping(&map(&[("Xx", "red")])).is_none());
    }

    #[test]
    fn test_parse_string_mapping() {
        let mapping = parse_string_mapping(&map(&[("Helix", "magenta")])).unwrap();
        assert_eq!(mapping.map("helix"), Color::MAGENTA);
        assert_eq!(mapping.map("sheet"), Color::WHITE);
    }

    #[test]
    fn test_parse_literal_unsupported() {
        let err = parse_literal("particle.positions", ValueType::Vec3Array, &"x".into()).unwrap_err();
        assert!(matches!(err, VisError::UnsupportedInputType { .. }));
        assert_eq!(
            parse_literal("scale", ValueType::Float, &SpecValue::from(1.0)).unwrap(),
            Some(Value::Float(1.0))
        );
        assert_eq!(parse_literal("scale", ValueType::Float, &"x".into()).unwrap(), None);
    }

    #[test]
    fn test_atomic_number() {
        assert_eq!(atomic_number("H"), Some(1));
        assert_eq!(atomic_number("Fe"), Some(26));
        assert_eq!(atomic_number("17"), Some(17));
        assert_eq!(atomic_number("Zz"), None);
    }
}
