//! Subgraph templates.
//!
//! A template is a serde document describing a small graph: declared inputs,
//! nodes with port bindings, exported outputs, and parented adaptors.
//!
//! ```toml
//! name = "uniform"
//!
//! [[inputs]]
//! name = "particle.positions"
//! type = "vec3_array"
//!
//! [[inputs]]
//! name = "scale"
//! type = "float"
//! default = 0.1
//!
//! [[nodes]]
//! id = "scale"
//! type = "uniform_scale"
//!
//! [[outputs]]
//! name = "particle.scales"
//! source = "scale.particle.scales"
//! ```
//!
//! Binding sources are a template input name, `node_id.port`, or
//! `adaptor_id.property`. Unbound node inputs bind to the template input of
//! the same name, if there is one.

use crate::adaptor::{DynamicPropertyProvider, ParentedAdaptor};
use crate::error::{Result, VisError};
use crate::pipeline::node::{AnyNode, NodeFactory};
use crate::pipeline::parse::parse_literal;
use crate::pipeline::port::find_port;
use crate::pipeline::spec::SpecValue;
use crate::pipeline::subgraph::{Subgraph, SubgraphInput};
use crate::property::AnyProperty;
use crate::types::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInput {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<SpecValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateNode {
    pub id: String,
    /// Built-in node id (see [`NodeType::id`](crate::pipeline::NodeType::id))
    /// or a registered plugin name.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Input port name to binding source.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOutput {
    pub name: String,
    pub source: String,
    /// Required when the source is an adaptor property.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgraphTemplate {
    pub name: String,
    /// Ids of parented adaptors created with each instance.
    #[serde(default)]
    pub adaptors: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<TemplateInput>,
    #[serde(default)]
    pub nodes: Vec<TemplateNode>,
    #[serde(default)]
    pub outputs: Vec<TemplateOutput>,
}

impl SubgraphTemplate {
    pub fn builder(name: impl Into<String>) -> TemplateBuilder {
        TemplateBuilder {
            template: SubgraphTemplate {
                name: name.into(),
                inputs: Vec::new(),
                nodes: Vec::new(),
                outputs: Vec::new(),
                adaptors: Vec::new(),
            },
        }
    }

    /// Whether the template declares an input `name` of type `value_type`.
    pub fn declares_input(&self, name: &str, value_type: ValueType) -> bool {
        self.inputs
            .iter()
            .any(|i| i.name == name && i.value_type == value_type)
    }

    /// Create an independent instance with fresh properties and nodes.
    pub fn instantiate(&self, factory: &NodeFactory) -> Result<Subgraph> {
        self.check_unique_ids()?;

        let inputs = self
            .inputs
            .iter()
            .map(|input| self.create_input(input))
            .collect::<Result<Vec<_>>>()?;

        let adaptors: Vec<(String, Rc<ParentedAdaptor>)> = self
            .adaptors
            .iter()
            .map(|id| (id.clone(), ParentedAdaptor::new()))
            .collect();

        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                factory
                    .create(&node.node_type)
                    .map(|created| (node.id.clone(), created))
                    .ok_or_else(|| {
                        self.invalid(format!("node '{}' has unknown type '{}'", node.id, node.node_type))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let scope = Scope {
            inputs: &inputs,
            nodes: &nodes,
            adaptors: &adaptors,
        };
        for (template_node, (_, node)) in self.nodes.iter().zip(&nodes) {
            self.bind_node(template_node, node, &scope)?;
        }

        let outputs = self
            .outputs
            .iter()
            .map(|output| {
                scope
                    .resolve(&output.source, output.value_type)
                    .map(|property| (output.name.clone(), property))
                    .map_err(|message| {
                        self.invalid(format!("output '{}': {}", output.name, message))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::trace!(
            "Instantiated '{}' ({} inputs, {} nodes, {} adaptors)",
            self.name,
            inputs.len(),
            nodes.len(),
            adaptors.len()
        );

        Ok(Subgraph {
            name: self.name.clone(),
            role: None,
            parameters: BTreeMap::new(),
            inputs,
            outputs,
            nodes,
            adaptors,
        })
    }

    fn invalid(&self, message: impl Into<String>) -> VisError {
        VisError::invalid_template(self.name.clone(), message)
    }

    fn check_unique_ids(&self) -> Result<()> {
        let mut ids = BTreeSet::new();
        for id in self.nodes.iter().map(|n| &n.id).chain(&self.adaptors) {
            if !ids.insert(id.as_str()) {
                return Err(self.invalid(format!("duplicate id '{}'", id)));
            }
        }
        let mut names = BTreeSet::new();
        for input in &self.inputs {
            if !names.insert(input.name.as_str()) {
                return Err(self.invalid(format!("duplicate input '{}'", input.name)));
            }
        }
        let mut names = BTreeSet::new();
        for output in &self.outputs {
            if !names.insert(output.name.as_str()) {
                return Err(self.invalid(format!("duplicate output '{}'", output.name)));
            }
        }
        Ok(())
    }

    fn create_input(&self, input: &TemplateInput) -> Result<SubgraphInput> {
        let property = AnyProperty::new(input.value_type);
        if let Some(default) = &input.default {
            let parsed = parse_literal(&input.name, input.value_type, default)
                .map_err(|e| self.invalid(format!("default for '{}': {}", input.name, e)))?
                .ok_or_else(|| {
                    self.invalid(format!(
                        "default for '{}' is not a valid {}",
                        input.name, input.value_type
                    ))
                })?;
            property.set_value(parsed)?;
        }
        Ok(SubgraphInput {
            name: input.name.clone(),
            property,
        })
    }

    fn bind_node(&self, template_node: &TemplateNode, node: &AnyNode, scope: &Scope<'_>) -> Result<()> {
        for port in template_node.bindings.keys() {
            let is_input = find_port(node.ports(), port).is_some_and(|p| p.is_input());
            if !is_input {
                return Err(self.invalid(format!(
                    "node '{}' has no input port '{}'",
                    template_node.id, port
                )));
            }
        }

        for port in node.ports().iter().filter(|p| p.is_input()) {
            let Some(target) = node.input(port.name) else {
                continue;
            };
            let source = match template_node.bindings.get(port.name) {
                Some(source) => scope
                    .resolve(source, Some(port.value_type))
                    .map_err(|message| {
                        self.invalid(format!("{}.{}: {}", template_node.id, port.name, message))
                    })?,
                None => match scope.input(port.name) {
                    Some(input) => input.clone(),
                    None => continue,
                },
            };
            target.link_to(&source).map_err(|e| {
                self.invalid(format!("{}.{}: {}", template_node.id, port.name, e))
            })?;
        }
        Ok(())
    }
}

/// Names visible to bindings while instantiating.
struct Scope<'a> {
    inputs: &'a [SubgraphInput],
    nodes: &'a [(String, AnyNode)],
    adaptors: &'a [(String, Rc<ParentedAdaptor>)],
}

impl Scope<'_> {
    fn input(&self, name: &str) -> Option<&AnyProperty> {
        self.inputs
            .iter()
            .find(|i| i.name == name)
            .map(|i| &i.property)
    }

    fn resolve(&self, source: &str, value_type: Option<ValueType>) -> std::result::Result<AnyProperty, String> {
        if let Some(input) = self.input(source) {
            return Ok(input.clone());
        }
        let Some((owner, name)) = source.split_once('.') else {
            return Err(format!("unknown source '{}'", source));
        };
        if let Some((_, node)) = self.nodes.iter().find(|(id, _)| id == owner) {
            return node
                .output(name)
                .cloned()
                .ok_or_else(|| format!("node '{}' has no output '{}'", owner, name));
        }
        if let Some((_, adaptor)) = self.adaptors.iter().find(|(id, _)| id == owner) {
            let value_type = value_type
                .ok_or_else(|| format!("adaptor source '{}' needs a declared type", source))?;
            return adaptor
                .get_or_create_property(name, value_type)
                .map_err(|e| e.to_string());
        }
        Err(format!("unknown source '{}'", source))
    }
}

/// Fluent construction of templates in code.
pub struct TemplateBuilder {
    template: SubgraphTemplate,
}

impl TemplateBuilder {
    pub fn input(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.template.inputs.push(TemplateInput {
            name: name.into(),
            value_type,
            default: None,
        });
        self
    }

    pub fn input_with_default(
        mut self,
        name: impl Into<String>,
        value_type: ValueType,
        default: impl Into<SpecValue>,
    ) -> Self {
        self.template.inputs.push(TemplateInput {
            name: name.into(),
            value_type,
            default: Some(default.into()),
        });
        self
    }

    pub fn node(self, id: impl Into<String>, node_type: impl Into<String>) -> Self {
        self.node_with_bindings(id, node_type, &[])
    }

    pub fn node_with_bindings(
        mut self,
        id: impl Into<String>,
        node_type: impl Into<String>,
        bindings: &[(&str, &str)],
    ) -> Self {
        self.template.nodes.push(TemplateNode {
            id: id.into(),
            node_type: node_type.into(),
            bindings: bindings
                .iter()
                .map(|&(port, source)| (port.to_string(), source.to_string()))
                .collect(),
        });
        self
    }

    pub fn output(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.template.outputs.push(TemplateOutput {
            name: name.into(),
            source: source.into(),
            value_type: None,
        });
        self
    }

    pub fn typed_output(
        mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        self.template.outputs.push(TemplateOutput {
            name: name.into(),
            source: source.into(),
            value_type: Some(value_type),
        });
        self
    }

    pub fn adaptor(mut self, id: impl Into<String>) -> Self {
        self.template.adaptors.push(id.into());
        self
    }

    pub fn build(self) -> SubgraphTemplate {
        self.template
    }
}
