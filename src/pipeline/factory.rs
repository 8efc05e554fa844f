//! Pipeline assembly from a declarative specification.
//!
//! [`PipelineBuilder::build`] runs five steps:
//! 1. Select one template per role (`sequence`, `color`, `scale`, `width`,
//!    `render`) through the loader. `render` falls back to a default.
//! 2. Add structural requirements: a default sequence provider when some
//!    template needs `sequence.lengths`, and a secondary structure adaptor
//!    when some template needs `residue.secondarystructures`.
//! 3. Instantiate every template, sequence provider first.
//! 4. Parent every subgraph adaptor to the root filtered adaptor.
//! 5. Resolve every subgraph input, in instantiation order, from the first
//!    source that applies:
//!    local parameter, root parameter, earlier output (nearest first),
//!    pipeline input, existing default, nearest earlier adaptor, and
//!    finally the root filtered adaptor.
//!
//! Errors in steps 1 to 4 abort the build. Resolution problems are kept as
//! diagnostics on the pipeline.

use crate::adaptor::{DynamicPropertyProvider, FilteredAdaptor, FrameAdaptor, PropertyTable};
use crate::config::VisConfig;
use crate::error::{Result, VisError};
use crate::frame::keys;
use crate::pipeline::id::SubgraphId;
use crate::pipeline::loader::TemplateLoader;
use crate::pipeline::node::{NodeFactory, NodePlugin};
use crate::pipeline::parse::{parse_color, parse_literal, parse_scalar};
use crate::pipeline::spec::SpecValue;
use crate::pipeline::subgraph::{Subgraph, SubgraphInput};
use crate::pipeline::template::SubgraphTemplate;
use crate::pipeline::{BindingSource, InputBinding, Pipeline, PipelineState};
use crate::property::AnyProperty;
use crate::types::ValueType;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Roles that select subgraphs, in instantiation order.
pub const ROLES: &[&str] = &["sequence", "color", "scale", "width", "render"];

const SEQUENCE_ROLE: &str = "sequence";
const RENDER_ROLE: &str = "render";
const TYPE_KEY: &str = "type";

/// A template picked for a role, with its local parameters.
struct Selection {
    role: &'static str,
    template: SubgraphTemplate,
    parameters: BTreeMap<String, SpecValue>,
}

/// Builds [`Pipeline`]s from specifications.
///
/// The builder is reusable: every call to [`build`](Self::build) creates a
/// pipeline that shares no state with earlier ones.
pub struct PipelineBuilder {
    loader: Box<dyn TemplateLoader>,
    nodes: NodeFactory,
    default_render: String,
    default_sequence: String,
    per_particle_marker: String,
    bond_key: String,
    inputs: Vec<(String, ValueType)>,
}

impl PipelineBuilder {
    pub fn new(loader: impl TemplateLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            nodes: NodeFactory::new(),
            default_render: "ball and stick".to_string(),
            default_sequence: "entities".to_string(),
            per_particle_marker: keys::PER_PARTICLE_MARKER.to_string(),
            bond_key: keys::BOND_PAIRS.to_string(),
            inputs: Vec::new(),
        }
    }

    /// Apply default template names and the filter convention from `config`.
    pub fn with_config(mut self, config: &VisConfig) -> Self {
        self.default_render = config.defaults.render.clone();
        self.default_sequence = config.defaults.sequence.clone();
        self.per_particle_marker = config.filter.per_particle_marker.clone();
        self.bond_key = config.filter.bond_key.clone();
        self
    }

    pub fn default_render(mut self, name: impl Into<String>) -> Self {
        self.default_render = name.into();
        self
    }

    pub fn default_sequence(mut self, name: impl Into<String>) -> Self {
        self.default_sequence = name.into();
        self
    }

    /// Declare a pipeline-level input that subgraph inputs of the same name
    /// may link to.
    pub fn input(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.inputs.push((name.into(), value_type));
        self
    }

    /// Make a plugin node type available to templates.
    pub fn register_node<F>(mut self, type_id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn NodePlugin> + 'static,
    {
        self.nodes.register(type_id, constructor);
        self
    }

    pub fn build(&self, spec: &SpecValue) -> Result<Pipeline> {
        let root = spec.as_map().ok_or_else(|| {
            VisError::Config(format!("specification must be a map, got {}", spec.kind()))
        })?;

        let mut pipeline = self.empty_pipeline()?;

        let mut selections = self.select(root)?;
        self.add_default_sequence(&mut selections)?;
        if selections.iter().any(|s| {
            s.template
                .declares_input(keys::RESIDUE_SECONDARY_STRUCTURES, ValueType::SecondaryStructureArray)
        }) {
            pipeline.insert_secondary_structure_adaptor();
        }

        for selection in selections {
            let mut subgraph = selection
                .template
                .instantiate(&self.nodes)
                .map_err(|e| e.with_context(format!("instantiating {} subgraph", selection.role)))?;
            subgraph.role = Some(selection.role.to_string());
            subgraph.parameters = selection.parameters;
            pipeline.subgraphs.push(subgraph);
        }

        pipeline.transition(PipelineState::Wiring);
        for subgraph in &pipeline.subgraphs {
            for (_, adaptor) in subgraph.adaptors() {
                adaptor.set_parent(&pipeline.filtered);
            }
        }

        let mut resolver = Resolver {
            root,
            subgraphs: &pipeline.subgraphs,
            inputs: &pipeline.inputs,
            filtered: &pipeline.filtered,
            bindings: Vec::new(),
            diagnostics: Vec::new(),
        };
        for index in 0..pipeline.subgraphs.len() {
            resolver.resolve_subgraph(index);
        }
        let Resolver {
            bindings,
            diagnostics,
            ..
        } = resolver;

        for diagnostic in &diagnostics {
            tracing::warn!("Pipeline diagnostic: {}", diagnostic);
        }
        pipeline.bindings = bindings;
        pipeline.diagnostics = diagnostics;
        pipeline.transition(PipelineState::Ready);
        Ok(pipeline)
    }

    fn empty_pipeline(&self) -> Result<Pipeline> {
        let inputs = PropertyTable::new();
        for (name, value_type) in &self.inputs {
            inputs.get_or_create(name, *value_type)?;
        }
        let frame = Rc::new(FrameAdaptor::new());
        let filtered = Rc::new(FilteredAdaptor::with_convention(
            &self.per_particle_marker,
            &self.bond_key,
        ));
        filtered.set_parent(&frame);
        Ok(Pipeline {
            state: PipelineState::Unwired,
            frame,
            secondary_structure: None,
            filtered,
            subgraphs: Vec::new(),
            inputs,
            bindings: Vec::new(),
            diagnostics: Vec::new(),
        })
    }

    fn select(&self, root: &BTreeMap<String, SpecValue>) -> Result<Vec<Selection>> {
        let mut selections = Vec::new();
        for &role in ROLES {
            let selection = match root.get(role) {
                Some(entry) => self.select_role(role, entry)?,
                None => None,
            };
            match selection {
                Some(selection) => selections.push(selection),
                None if role == RENDER_ROLE => {
                    tracing::debug!("No render subgraph given, using '{}'", self.default_render);
                    selections.push(self.load(role, &self.default_render, BTreeMap::new())?);
                }
                None => {}
            }
        }
        Ok(selections)
    }

    fn select_role(&self, role: &'static str, entry: &SpecValue) -> Result<Option<Selection>> {
        match entry {
            SpecValue::String(name) => {
                if let Some(template) = self.loader.load_template(role, name) {
                    return Ok(Some(Selection {
                        role,
                        template,
                        parameters: BTreeMap::new(),
                    }));
                }
                if is_role_literal(role, entry) {
                    tracing::debug!("Treating {} '{}' as a literal parameter", role, name);
                    return Ok(None);
                }
                Err(VisError::UnknownSubgraph {
                    role: role.to_string(),
                    name: name.clone(),
                })
            }
            SpecValue::Map(map) => match map.get(TYPE_KEY).and_then(SpecValue::as_str) {
                Some(name) => {
                    let parameters = map
                        .iter()
                        .filter(|(key, _)| key.as_str() != TYPE_KEY)
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect();
                    self.load(role, name, parameters).map(Some)
                }
                None => {
                    tracing::debug!("{} map has no '{}' field, ignored", role, TYPE_KEY);
                    Ok(None)
                }
            },
            other => {
                tracing::debug!("Treating {} {} as a literal parameter", role, other);
                Ok(None)
            }
        }
    }

    fn load(
        &self,
        role: &'static str,
        name: &str,
        parameters: BTreeMap<String, SpecValue>,
    ) -> Result<Selection> {
        let template = self
            .loader
            .load_template(role, name)
            .ok_or_else(|| VisError::UnknownSubgraph {
                role: role.to_string(),
                name: name.to_string(),
            })?;
        Ok(Selection {
            role,
            template,
            parameters,
        })
    }

    fn add_default_sequence(&self, selections: &mut Vec<Selection>) -> Result<()> {
        let has_sequence = selections.iter().any(|s| s.role == SEQUENCE_ROLE);
        let needs_sequence = selections
            .iter()
            .any(|s| s.template.declares_input(keys::SEQUENCE_LENGTHS, ValueType::IntArray));
        if has_sequence || !needs_sequence {
            return Ok(());
        }
        tracing::debug!(
            "Inserting default sequence subgraph '{}'",
            self.default_sequence
        );
        let selection = self.load(SEQUENCE_ROLE, &self.default_sequence, BTreeMap::new())?;
        selections.insert(0, selection);
        Ok(())
    }
}

/// Whether a role value that names no template reads as a literal instead.
fn is_role_literal(role: &str, value: &SpecValue) -> bool {
    match role {
        "color" => parse_color(value).is_some(),
        "scale" | "width" => parse_scalar(value).is_some(),
        _ => false,
    }
}

/// Input resolution state for one build.
struct Resolver<'a> {
    root: &'a BTreeMap<String, SpecValue>,
    subgraphs: &'a [Subgraph],
    inputs: &'a PropertyTable,
    filtered: &'a Rc<FilteredAdaptor>,
    bindings: Vec<InputBinding>,
    diagnostics: Vec<VisError>,
}

impl Resolver<'_> {
    fn resolve_subgraph(&mut self, index: usize) {
        let subgraphs = self.subgraphs;
        let subgraph = &subgraphs[index];
        for input in subgraph.inputs() {
            let source = self.resolve_input(index, subgraph, input);
            tracing::debug!(
                "{} '{}' input '{}' <- {}",
                subgraph.role().unwrap_or("?"),
                subgraph.name(),
                input.name,
                source
            );
            self.bindings.push(InputBinding {
                subgraph: SubgraphId(index as u32),
                input: input.name.clone(),
                source,
            });
        }
    }

    fn resolve_input(&mut self, index: usize, subgraph: &Subgraph, input: &SubgraphInput) -> BindingSource {
        let value_type = input.property.value_type();
        let subgraphs = self.subgraphs;
        let root = self.root;

        if let Some(value) = subgraph.parameters().get(&input.name) {
            if self.apply_literal(input, value) {
                return BindingSource::LocalParameter;
            }
        }

        if let Some(value) = root.get(&input.name) {
            if self.apply_literal(input, value) {
                return BindingSource::RootParameter;
            }
        }

        for earlier in (0..index).rev() {
            let Some(output) = subgraphs[earlier].output(&input.name) else {
                continue;
            };
            if output.value_type() != value_type {
                tracing::debug!(
                    "Skipping output '{}' of subgraph {}: {} is not {}",
                    input.name,
                    earlier,
                    output.value_type(),
                    value_type
                );
                continue;
            }
            if self.link(input, output) {
                return BindingSource::Output {
                    subgraph: SubgraphId(earlier as u32),
                };
            }
        }

        if let Some(pipeline_input) = self.inputs.get(&input.name) {
            if pipeline_input.value_type() == value_type && self.link(input, &pipeline_input) {
                return BindingSource::PipelineInput;
            }
        }

        if input.property.has_value() {
            return BindingSource::Default;
        }

        let provider = (0..index)
            .rev()
            .find_map(|earlier| subgraphs[earlier].provider().map(|p| (earlier, p)));
        if let Some((earlier, provider)) = provider {
            return match provider.get_or_create_property(&input.name, value_type) {
                Ok(property) if self.link(input, &property) => BindingSource::Adaptor {
                    subgraph: SubgraphId(earlier as u32),
                },
                Ok(_) => BindingSource::Unresolved,
                Err(e) => {
                    self.diagnostics.push(e.with_context(format!("input '{}'", input.name)));
                    BindingSource::Unresolved
                }
            };
        }

        let filtered = self.filtered;
        match filtered.get_or_create_property(&input.name, value_type) {
            Ok(property) if self.link(input, &property) => BindingSource::RootAdaptor,
            Ok(_) => BindingSource::Unresolved,
            Err(e) => {
                self.diagnostics.push(e.with_context(format!("input '{}'", input.name)));
                BindingSource::Unresolved
            }
        }
    }

    /// Parse and set a literal. Returns false if resolution should move on.
    fn apply_literal(&mut self, input: &SubgraphInput, value: &SpecValue) -> bool {
        let value_type = input.property.value_type();
        match parse_literal(&input.name, value_type, value) {
            Ok(Some(parsed)) => match input.property.set_value(parsed) {
                Ok(()) => true,
                Err(e) => {
                    self.diagnostics.push(e.with_context(format!("input '{}'", input.name)));
                    false
                }
            },
            Ok(None) => {
                tracing::debug!(
                    "Parameter {} for '{}' is not a valid {}",
                    value,
                    input.name,
                    value_type
                );
                false
            }
            Err(e) => {
                self.diagnostics.push(e);
                false
            }
        }
    }

    fn link(&mut self, input: &SubgraphInput, source: &AnyProperty) -> bool {
        match input.property.link_to(source) {
            Ok(()) => true,
            Err(e) => {
                self.diagnostics.push(e.with_context(format!("linking input '{}'", input.name)));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::loader::TemplateRegistry;

    fn builder() -> PipelineBuilder {
        PipelineBuilder::new(TemplateRegistry::with_builtins())
    }

    fn roles(pipeline: &Pipeline) -> Vec<(&str, &str)> {
        pipeline
            .subgraphs()
            .iter()
            .map(|s| (s.role().unwrap_or(""), s.name()))
            .collect()
    }

    #[test]
    fn test_default_render() {
        let pipeline = builder().build(&SpecValue::empty_map()).unwrap();
        assert_eq!(roles(&pipeline), vec![("render", "ball and stick")]);
        assert_eq!(pipeline.state(), PipelineState::Ready);
        assert!(pipeline.diagnostics().is_empty());
    }

    #[test]
    fn test_non_map_spec() {
        let err = builder().build(&SpecValue::from("cartoon")).unwrap_err();
        assert!(matches!(err, VisError::Config(_)));
    }

    #[test]
    fn test_role_order_and_default_sequence() {
        let spec = SpecValue::from_json_str(
            r#"{"render": "ball and stick", "scale": "uniform", "color": "sequence gradient"}"#,
        )
        .unwrap();
        let pipeline = builder().build(&spec).unwrap();
        assert_eq!(
            roles(&pipeline),
            vec![
                ("sequence", "entities"),
                ("color", "sequence gradient"),
                ("scale", "uniform"),
                ("render", "ball and stick"),
            ]
        );
        let lengths = pipeline
            .bindings()
            .iter()
            .find(|b| b.subgraph == SubgraphId(1) && b.input == keys::SEQUENCE_LENGTHS)
            .unwrap();
        assert_eq!(lengths.source, BindingSource::Output { subgraph: SubgraphId(0) });
    }

    #[test]
    fn test_unknown_subgraph_aborts() {
        let spec = SpecValue::from_json_str(r#"{"color": "rainbow"}"#).unwrap();
        assert!(matches!(
            builder().build(&spec),
            Err(VisError::UnknownSubgraph { .. })
        ));
        let spec = SpecValue::from_json_str(r#"{"color": {"type": "rainbow"}}"#).unwrap();
        assert!(matches!(
            builder().build(&spec),
            Err(VisError::UnknownSubgraph { .. })
        ));
    }

    #[test]
    fn test_role_literal_is_parameter() {
        let spec = SpecValue::from_json_str(r#"{"color": "red", "scale": 0.5}"#).unwrap();
        let pipeline = builder().build(&spec).unwrap();
        assert_eq!(roles(&pipeline), vec![("render", "ball and stick")]);
        let render = &pipeline.subgraphs()[0];
        assert_eq!(
            render.input("color").unwrap().value().unwrap(),
            crate::types::Value::Color(crate::types::Color::RED)
        );
        assert_eq!(
            render.input("scale").unwrap().value().unwrap(),
            crate::types::Value::Float(0.5)
        );
    }

    #[test]
    fn test_secondary_structure_adaptor_inserted() {
        let plain = builder().build(&SpecValue::empty_map()).unwrap();
        assert!(!plain.has_secondary_structure_adaptor());

        let spec = SpecValue::from_json_str(r#"{"color": "secondary structure"}"#).unwrap();
        let pipeline = builder().build(&spec).unwrap();
        assert!(pipeline.has_secondary_structure_adaptor());
    }

    #[test]
    fn test_unsupported_literal_is_diagnostic() {
        let spec = SpecValue::from_json_str(r#"{"particle.positions": "here"}"#).unwrap();
        let pipeline = builder().build(&spec).unwrap();
        assert!(pipeline
            .diagnostics()
            .iter()
            .any(|d| matches!(d, VisError::UnsupportedInputType { .. })));
        let binding = pipeline
            .bindings()
            .iter()
            .find(|b| b.input == keys::PARTICLE_POSITIONS)
            .unwrap();
        assert_eq!(binding.source, BindingSource::RootAdaptor);
    }
}
