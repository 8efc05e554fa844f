//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use visgraph::pipeline::{Pipeline, PipelineBuilder, SpecValue, TemplateRegistry};
use visgraph::types::{Color, Value};

/// Parse a JSON specification, panicking on malformed test input
pub fn spec(json: &str) -> SpecValue {
    SpecValue::from_json_str(json).expect("test spec should be valid JSON")
}

/// Build a pipeline from the built-in templates
pub fn build_builtin(json: &str) -> Pipeline {
    PipelineBuilder::new(TemplateRegistry::with_builtins())
        .build(&spec(json))
        .expect("pipeline should build")
}

/// Role and template name of every subgraph, in order
pub fn roles(pipeline: &Pipeline) -> Vec<(String, String)> {
    pipeline
        .subgraphs()
        .iter()
        .map(|s| (s.role().unwrap_or("").to_string(), s.name().to_string()))
        .collect()
}

/// Assert two colours are approximately equal
pub fn assert_color_eq(a: Color, b: Color, epsilon: f32) {
    let close = (a.r - b.r).abs() < epsilon
        && (a.g - b.g).abs() < epsilon
        && (a.b - b.b).abs() < epsilon
        && (a.a - b.a).abs() < epsilon;
    assert!(
        close,
        "Expected {:?} to be approximately equal to {:?} (epsilon: {})",
        a, b, epsilon
    );
}

/// Unwrap a colour value
pub fn as_color(value: Value) -> Color {
    match value {
        Value::Color(c) => c,
        other => panic!("expected a colour, got {:?}", other),
    }
}
