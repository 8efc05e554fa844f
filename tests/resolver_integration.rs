//! Integration tests for pipeline assembly and input resolution

mod common;

use common::builders::{tint_probe, tint_source, tripeptide, MoleculeBuilder};
use common::mock_helpers::{builtin_backed_loader, empty_loader, MockLoader};
use common::{as_color, assert_color_eq, build_builtin, roles, spec};
use visgraph::frame::keys;
use visgraph::pipeline::{
    BindingSource, PipelineBuilder, PipelineState, SubgraphId, SubgraphTemplate, TemplateLoader,
    TemplateRegistry,
};
use visgraph::types::{Color, Value};
use visgraph::VisError;

fn tint_builder() -> PipelineBuilder {
    let mut registry = TemplateRegistry::new();
    registry.register("color", "source", tint_source());
    registry.register("render", "probe", tint_probe());
    PipelineBuilder::new(registry)
}

fn tint(json: &str) -> (Color, BindingSource) {
    let pipeline = tint_builder().build(&spec(json)).unwrap();
    let render = pipeline.subgraph(SubgraphId(1)).unwrap();
    let binding = pipeline
        .bindings()
        .iter()
        .find(|b| b.subgraph == SubgraphId(1) && b.input == "tint")
        .unwrap();
    (as_color(render.input("tint").unwrap().value().unwrap()), binding.source)
}

#[test]
fn test_local_parameter_beats_root_parameter() {
    let (color, source) = tint(
        r#"{"color": "source", "render": {"type": "probe", "tint": "red"}, "tint": "green"}"#,
    );
    assert_eq!(color, Color::RED);
    assert_eq!(source, BindingSource::LocalParameter);
}

#[test]
fn test_root_parameter_beats_earlier_output() {
    let (color, source) = tint(r#"{"color": "source", "render": "probe", "tint": "green"}"#);
    assert_eq!(color, Color::GREEN);
    assert_eq!(source, BindingSource::RootParameter);
}

#[test]
fn test_earlier_output_used_without_parameters() {
    let (color, source) = tint(r#"{"color": "source", "render": "probe"}"#);
    assert_eq!(color, Color::BLUE);
    assert_eq!(
        source,
        BindingSource::Output {
            subgraph: SubgraphId(0)
        }
    );
}

#[test]
fn test_unparseable_local_parameter_falls_through() {
    let (color, source) = tint(
        r#"{"color": "source", "render": {"type": "probe", "tint": 5}, "tint": "green"}"#,
    );
    assert_eq!(color, Color::GREEN);
    assert_eq!(source, BindingSource::RootParameter);
}

#[test]
fn test_output_link_tracks_upstream_changes() {
    let pipeline = tint_builder()
        .build(&spec(r#"{"color": "source", "render": "probe"}"#))
        .unwrap();
    let source = pipeline.subgraph(SubgraphId(0)).unwrap();
    source
        .input("seed")
        .unwrap()
        .set_value(Value::Color(Color::CYAN))
        .unwrap();
    let render = pipeline.subgraph(SubgraphId(1)).unwrap();
    let tint = render.input("tint").unwrap();
    assert!(tint.is_dirty());
    assert_eq!(as_color(tint.value().unwrap()), Color::CYAN);
}

#[test]
fn test_rebuilds_share_no_state() {
    let builder = PipelineBuilder::new(TemplateRegistry::with_builtins());
    let spec = spec(r#"{"color": "element"}"#);
    let mut first = builder.build(&spec).unwrap();
    let mut second = builder.build(&spec).unwrap();

    first.on_new_frame(&tripeptide());
    first.refresh();
    second.refresh();

    assert!(first.output(keys::PARTICLE_COLORS).unwrap().has_value());
    assert!(!second.output(keys::PARTICLE_COLORS).unwrap().has_value());
    assert!(!first
        .output(keys::PARTICLE_COLORS)
        .unwrap()
        .ptr_eq(second.output(keys::PARTICLE_COLORS).unwrap()));

    let scale = |p: &visgraph::Pipeline| p.subgraphs()[1].input("scale").unwrap().clone();
    scale(&first).set_value(Value::Float(3.0)).unwrap();
    assert_eq!(scale(&second).value().unwrap(), Value::Float(0.1));
}

#[test]
fn test_default_sequence_inserted_first() {
    let pipeline = build_builtin(r#"{"color": "sequence gradient"}"#);
    assert_eq!(
        roles(&pipeline),
        vec![
            ("sequence".to_string(), "entities".to_string()),
            ("color".to_string(), "sequence gradient".to_string()),
            ("render".to_string(), "ball and stick".to_string()),
        ]
    );
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[test]
fn test_explicit_sequence_not_duplicated() {
    let pipeline = build_builtin(r#"{"sequence": "dna", "color": "sequence gradient"}"#);
    let sequences = roles(&pipeline)
        .into_iter()
        .filter(|(role, _)| role == "sequence")
        .count();
    assert_eq!(sequences, 1);
    assert_eq!(pipeline.subgraphs()[0].name(), "dna");
}

#[test]
fn test_no_sequence_without_requirement() {
    let pipeline = build_builtin(r#"{"color": "element"}"#);
    assert!(roles(&pipeline).iter().all(|(role, _)| role != "sequence"));
}

#[test]
fn test_sequence_gradient_end_to_end() {
    let mut pipeline = build_builtin(r#"{"color": {"type": "sequence gradient", "gradient": ["black", "white"]}}"#);
    pipeline.on_new_frame(&tripeptide());
    pipeline.refresh();

    let frame = pipeline.render_frame().unwrap();
    assert_eq!(frame.particle_count(), 6);
    // Entity 0 holds two residues: start and end of the gradient.
    assert_color_eq(frame.colors[0], Color::BLACK, 1e-5);
    assert_color_eq(frame.colors[2], Color::WHITE, 1e-5);
    assert_eq!(frame.bond_count(), 5);
}

#[test]
fn test_secondary_structure_adaptor_feeds_colouring() {
    let mut pipeline = build_builtin(r#"{"color": "secondary structure"}"#);
    assert!(pipeline.has_secondary_structure_adaptor());

    pipeline.on_new_frame(&tripeptide());
    pipeline.refresh();
    let Value::ColorArray(colors) = pipeline.output(keys::PARTICLE_COLORS).unwrap().value().unwrap()
    else {
        panic!("expected colours");
    };
    // Without assignments every residue is a loop.
    assert_eq!(colors.len(), 6);
    assert!(colors.iter().all(|&c| c == Color::WHITE));
}

#[test]
fn test_cartoon_uses_widths_and_adaptor_positions() {
    let mut pipeline = build_builtin(r#"{"render": "cartoon", "width": "uniform"}"#);
    assert!(pipeline.has_secondary_structure_adaptor());

    let frame = MoleculeBuilder::new()
        .residue("ALA", 0)
        .atom("CA", 6)
        .residue("GLY", 0)
        .atom("CA", 6)
        .atom("C", 6)
        .build();
    pipeline.on_new_frame(&frame);
    pipeline.refresh();

    let buffers = pipeline.render_frame().unwrap();
    assert_eq!(buffers.particle_count(), 3);
    assert!(buffers.scales.iter().all(|&s| (s - 0.2).abs() < 1e-6));

    let widths = pipeline
        .bindings()
        .iter()
        .find(|b| b.input == keys::PARTICLE_WIDTHS)
        .unwrap();
    assert_eq!(
        widths.source,
        BindingSource::Output {
            subgraph: SubgraphId(0)
        }
    );
}

#[test]
fn test_nearest_adaptor_serves_later_inputs() {
    let mut registry = TemplateRegistry::with_builtins();
    registry.register(
        "color",
        "adapted",
        SubgraphTemplate::builder("adapted").adaptor("source").build(),
    );
    let pipeline = PipelineBuilder::new(registry)
        .build(&spec(r#"{"color": "adapted"}"#))
        .unwrap();

    let positions = pipeline
        .bindings()
        .iter()
        .find(|b| b.input == keys::PARTICLE_POSITIONS)
        .unwrap();
    assert_eq!(
        positions.source,
        BindingSource::Adaptor {
            subgraph: SubgraphId(0)
        }
    );
}

#[test]
fn test_unknown_subgraph_is_an_error() {
    let err = PipelineBuilder::new(empty_loader())
        .build(&spec("{}"))
        .unwrap_err();
    match err {
        VisError::UnknownSubgraph { role, name } => {
            assert_eq!(role, "render");
            assert_eq!(name, "ball and stick");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_literal_role_value_is_not_a_subgraph() {
    let pipeline = PipelineBuilder::new(builtin_backed_loader())
        .build(&spec(r##"{"color": "#00ff00", "scale": 0.25}"##))
        .unwrap();
    assert_eq!(pipeline.subgraphs().len(), 1);
    let render = &pipeline.subgraphs()[0];
    assert_eq!(as_color(render.input("color").unwrap().value().unwrap()), Color::GREEN);
    assert_eq!(render.input("scale").unwrap().value().unwrap(), Value::Float(0.25));
}

#[test]
fn test_loader_is_asked_by_role() {
    let registry = TemplateRegistry::with_builtins();
    let mut loader = MockLoader::new();
    loader
        .expect_load_template()
        .withf(|role, name| role == "color" && name == "element")
        .times(1)
        .returning(move |role, name| registry.load_template(role, name));
    let registry = TemplateRegistry::with_builtins();
    loader
        .expect_load_template()
        .withf(|role, name| role == "render" && name == "ball and stick")
        .times(1)
        .returning(move |role, name| registry.load_template(role, name));

    let pipeline = PipelineBuilder::new(loader)
        .build(&spec(r#"{"color": "element"}"#))
        .unwrap();
    assert_eq!(pipeline.subgraphs().len(), 2);
}

#[test]
fn test_config_changes_default_render() {
    let mut config = visgraph::VisConfig::default();
    config.defaults.render = "cartoon".to_string();
    let pipeline = PipelineBuilder::new(TemplateRegistry::with_builtins())
        .with_config(&config)
        .build(&spec("{}"))
        .unwrap();
    assert_eq!(pipeline.subgraphs()[0].name(), "cartoon");
}
