//! Node abstraction for the pipeline.
//!
//! Two-layer design:
//! - **`NodePlugin` trait** for nodes supplied by the embedding application.
//! - **`BuiltinNode` enum** for all built-in nodes, dispatched with a `match`.
//!
//! `AnyNode` wraps either variant so subgraphs can handle both uniformly.
//!
//! Every node owns its input and output properties. The resolver links inputs
//! to upstream properties; downstream consumers link to outputs.

use crate::pipeline::node_type::NodeType;
use crate::pipeline::nodes::{
    DnaSequenceNode, ElementColorNode, EntitySequenceNode, ParticleRenderNode,
    SecondaryStructureColorNode, SequenceGradientColorNode, UniformScaleNode,
};
use crate::pipeline::port::PortDescriptor;
use crate::property::{AnyProperty, Property, PropertyValue};
use std::collections::BTreeMap;

/// The properties a node exposes, by port name.
#[derive(Default)]
pub struct NodeIo {
    inputs: BTreeMap<&'static str, AnyProperty>,
    outputs: BTreeMap<&'static str, AnyProperty>,
}

impl NodeIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input port and return its typed handle.
    pub fn input<T: PropertyValue>(&mut self, name: &'static str) -> Property<T> {
        let property = Property::new();
        self.inputs.insert(name, AnyProperty::from(property.clone()));
        property
    }

    /// Register an output port and return its typed handle.
    pub fn output<T: PropertyValue>(&mut self, name: &'static str) -> Property<T> {
        let property = Property::new();
        self.outputs.insert(name, AnyProperty::from(property.clone()));
        property
    }

    pub fn get_input(&self, name: &str) -> Option<&AnyProperty> {
        self.inputs.get(name)
    }

    pub fn get_output(&self, name: &str) -> Option<&AnyProperty> {
        self.outputs.get(name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&'static str, &AnyProperty)> {
        self.inputs.iter().map(|(k, v)| (*k, v))
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&'static str, &AnyProperty)> {
        self.outputs.iter().map(|(k, v)| (*k, v))
    }

    pub fn is_input_dirty(&self) -> bool {
        self.inputs.values().any(AnyProperty::is_dirty)
    }

    pub fn clear_input_dirty(&self) {
        for input in self.inputs.values() {
            input.clear_dirty();
        }
    }

    pub fn undefine_outputs(&self) {
        for output in self.outputs.values() {
            output.undefine();
        }
    }

    /// Run the usual output-node cycle: skip unless an input is dirty,
    /// recompute with `update` (which returns `None` when the inputs are not
    /// usable, in which case all outputs are undefined), then clear the input
    /// dirty flags.
    pub fn refresh_with(&self, update: impl FnOnce() -> Option<()>) {
        if !self.is_input_dirty() {
            return;
        }
        if update().is_none() {
            self.undefine_outputs();
        }
        self.clear_input_dirty();
    }
}

/// Trait for nodes supplied by the embedding application.
pub trait NodePlugin {
    /// Human-readable name of this node.
    fn name(&self) -> &str;

    /// Port descriptors for this node.
    fn ports(&self) -> &[PortDescriptor];

    /// The node's input and output properties.
    fn io(&self) -> &NodeIo;

    /// Recompute outputs if any input changed.
    fn refresh(&mut self);
}

/// Enum dispatch for built-in nodes.
pub enum BuiltinNode {
    EntitySequence(EntitySequenceNode),
    DnaSequence(DnaSequenceNode),
    ElementColor(ElementColorNode),
    SequenceGradientColor(SequenceGradientColorNode),
    SecondaryStructureColor(SecondaryStructureColorNode),
    UniformScale(UniformScaleNode),
    ParticleRender(ParticleRenderNode),
}

impl BuiltinNode {
    /// Create a fresh node of the given type.
    pub fn new(node_type: NodeType) -> Self {
        match node_type {
            NodeType::EntitySequence => BuiltinNode::EntitySequence(EntitySequenceNode::new()),
            NodeType::DnaSequence => BuiltinNode::DnaSequence(DnaSequenceNode::new()),
            NodeType::ElementColor => BuiltinNode::ElementColor(ElementColorNode::new()),
            NodeType::SequenceGradientColor => {
                BuiltinNode::SequenceGradientColor(SequenceGradientColorNode::new())
            }
            NodeType::SecondaryStructureColor => {
                BuiltinNode::SecondaryStructureColor(SecondaryStructureColorNode::new())
            }
            NodeType::UniformScale => BuiltinNode::UniformScale(UniformScaleNode::new()),
            NodeType::ParticleRender => BuiltinNode::ParticleRender(ParticleRenderNode::new()),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            BuiltinNode::EntitySequence(_) => NodeType::EntitySequence,
            BuiltinNode::DnaSequence(_) => NodeType::DnaSequence,
            BuiltinNode::ElementColor(_) => NodeType::ElementColor,
            BuiltinNode::SequenceGradientColor(_) => NodeType::SequenceGradientColor,
            BuiltinNode::SecondaryStructureColor(_) => NodeType::SecondaryStructureColor,
            BuiltinNode::UniformScale(_) => NodeType::UniformScale,
            BuiltinNode::ParticleRender(_) => NodeType::ParticleRender,
        }
    }

    pub fn name(&self) -> &str {
        self.node_type().display_name()
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        match self {
            BuiltinNode::EntitySequence(n) => n.ports(),
            BuiltinNode::DnaSequence(n) => n.ports(),
            BuiltinNode::ElementColor(n) => n.ports(),
            BuiltinNode::SequenceGradientColor(n) => n.ports(),
            BuiltinNode::SecondaryStructureColor(n) => n.ports(),
            BuiltinNode::UniformScale(n) => n.ports(),
            BuiltinNode::ParticleRender(n) => n.ports(),
        }
    }

    pub fn io(&self) -> &NodeIo {
        match self {
            BuiltinNode::EntitySequence(n) => n.io(),
            BuiltinNode::DnaSequence(n) => n.io(),
            BuiltinNode::ElementColor(n) => n.io(),
            BuiltinNode::SequenceGradientColor(n) => n.io(),
            BuiltinNode::SecondaryStructureColor(n) => n.io(),
            BuiltinNode::UniformScale(n) => n.io(),
            BuiltinNode::ParticleRender(n) => n.io(),
        }
    }

    pub fn refresh(&mut self) {
        match self {
            BuiltinNode::EntitySequence(n) => n.refresh(),
            BuiltinNode::DnaSequence(n) => n.refresh(),
            BuiltinNode::ElementColor(n) => n.refresh(),
            BuiltinNode::SequenceGradientColor(n) => n.refresh(),
            BuiltinNode::SecondaryStructureColor(n) => n.refresh(),
            BuiltinNode::UniformScale(n) => n.refresh(),
            // Render buffers are pulled by the consumer.
            BuiltinNode::ParticleRender(_) => {}
        }
    }
}

/// Wrapper that holds either a built-in node or a plugin.
pub enum AnyNode {
    Builtin(BuiltinNode),
    Plugin(Box<dyn NodePlugin>),
}

impl AnyNode {
    pub fn name(&self) -> &str {
        match self {
            AnyNode::Builtin(n) => n.name(),
            AnyNode::Plugin(n) => n.name(),
        }
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        match self {
            AnyNode::Builtin(n) => n.ports(),
            AnyNode::Plugin(n) => n.ports(),
        }
    }

    pub fn io(&self) -> &NodeIo {
        match self {
            AnyNode::Builtin(n) => n.io(),
            AnyNode::Plugin(n) => n.io(),
        }
    }

    pub fn refresh(&mut self) {
        match self {
            AnyNode::Builtin(n) => n.refresh(),
            AnyNode::Plugin(n) => n.refresh(),
        }
    }

    pub fn input(&self, name: &str) -> Option<&AnyProperty> {
        self.io().get_input(name)
    }

    pub fn output(&self, name: &str) -> Option<&AnyProperty> {
        self.io().get_output(name)
    }

    /// The render node, if this is one.
    pub fn as_render(&self) -> Option<&ParticleRenderNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::ParticleRender(n)) => Some(n),
            _ => None,
        }
    }
}

type PluginConstructor = Box<dyn Fn() -> Box<dyn NodePlugin>>;

/// Creates nodes by template type id: built-in ids first, then plugins.
#[derive(Default)]
pub struct NodeFactory {
    plugins: BTreeMap<String, PluginConstructor>,
}

impl NodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin node type. Built-in ids cannot be shadowed.
    pub fn register<F>(&mut self, type_id: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn NodePlugin> + 'static,
    {
        let type_id = type_id.into();
        if NodeType::from_id(&type_id).is_some() {
            tracing::warn!("Plugin '{}' shadows a built-in node type, ignored", type_id);
            return;
        }
        self.plugins.insert(type_id, Box::new(constructor));
    }

    pub fn create(&self, type_id: &str) -> Option<AnyNode> {
        if let Some(node_type) = NodeType::from_id(type_id) {
            return Some(AnyNode::Builtin(BuiltinNode::new(node_type)));
        }
        self.plugins
            .get(type_id)
            .map(|constructor| AnyNode::Plugin(constructor()))
    }

    pub fn plugin_ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::port::PortDirection;
    use crate::types::ValueType;

    static DOUBLE_PORTS: &[PortDescriptor] = &[
        PortDescriptor::input("x", ValueType::Float),
        PortDescriptor::output("y", ValueType::Float),
    ];

    struct Double {
        x: Property<f32>,
        y: Property<f32>,
        io: NodeIo,
    }

    impl Double {
        fn new() -> Self {
            let mut io = NodeIo::new();
            Self {
                x: io.input("x"),
                y: io.output("y"),
                io,
            }
        }
    }

    impl NodePlugin for Double {
        fn name(&self) -> &str {
            "Double"
        }

        fn ports(&self) -> &[PortDescriptor] {
            DOUBLE_PORTS
        }

        fn io(&self) -> &NodeIo {
            &self.io
        }

        fn refresh(&mut self) {
            self.io.refresh_with(|| {
                self.y.set_value(self.x.try_value()? * 2.0);
                Some(())
            });
        }
    }

    #[test]
    fn test_factory_builtin_and_plugin() {
        let mut factory = NodeFactory::new();
        factory.register("double", || Box::new(Double::new()));
        factory.register("uniform_scale", || Box::new(Double::new()));

        assert!(matches!(
            factory.create("uniform_scale"),
            Some(AnyNode::Builtin(BuiltinNode::UniformScale(_)))
        ));
        let mut node = factory.create("double").unwrap();
        assert_eq!(node.name(), "Double");
        node.input("x").unwrap().set_value(crate::types::Value::Float(3.0)).unwrap();
        node.refresh();
        assert_eq!(
            node.output("y").unwrap().value().unwrap(),
            crate::types::Value::Float(6.0)
        );
        assert!(factory.create("triple").is_none());
        assert_eq!(factory.plugin_ids().collect::<Vec<_>>(), vec!["double"]);
    }

    #[test]
    fn test_ports_match_io() {
        for &node_type in NodeType::all() {
            let node = BuiltinNode::new(node_type);
            assert_eq!(node.node_type(), node_type);
            for port in node.ports() {
                let property = match port.direction {
                    PortDirection::Input => node.io().get_input(port.name),
                    PortDirection::Output => node.io().get_output(port.name),
                };
                let property = property
                    .unwrap_or_else(|| panic!("{}: missing port {}", node_type, port.name));
                assert_eq!(property.value_type(), port.value_type, "{}.{}", node_type, port.name);
            }
            let declared = node.ports().len();
            let registered = node.io().inputs().count() + node.io().outputs().count();
            assert_eq!(declared, registered, "{}", node_type);
        }
    }

    #[test]
    fn test_refresh_with_only_when_dirty() {
        let mut io = NodeIo::new();
        let input: Property<f32> = io.input("x");
        let output: Property<f32> = io.output("y");
        let calls = std::cell::Cell::new(0);

        let update = || {
            calls.set(calls.get() + 1);
            output.set_value(input.try_value()? * 2.0);
            Some(())
        };
        input.set_value(2.0);
        io.refresh_with(update);
        assert_eq!(output.value().unwrap(), 4.0);
        assert!(!input.is_dirty());

        io.refresh_with(|| {
            calls.set(calls.get() + 1);
            Some(())
        });
        assert_eq!(calls.get(), 1);

        input.undefine();
        io.refresh_with(|| input.try_value().map(|_| ()));
        assert!(!output.has_value());
    }
}
