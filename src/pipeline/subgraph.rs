//! Instantiated subgraphs.

use crate::adaptor::ParentedAdaptor;
use crate::pipeline::id::NodeId;
use crate::pipeline::node::AnyNode;
use crate::pipeline::nodes::ParticleRenderNode;
use crate::pipeline::spec::SpecValue;
use crate::property::AnyProperty;
use std::collections::BTreeMap;
use std::rc::Rc;

/// A declared input of a subgraph instance.
#[derive(Debug, Clone)]
pub struct SubgraphInput {
    pub name: String,
    pub property: AnyProperty,
}

/// One instance of a [`SubgraphTemplate`](crate::pipeline::SubgraphTemplate).
///
/// Every instance owns fresh properties, nodes and adaptors; two instances
/// of the same template share nothing.
pub struct Subgraph {
    pub(crate) name: String,
    pub(crate) role: Option<String>,
    pub(crate) parameters: BTreeMap<String, SpecValue>,
    pub(crate) inputs: Vec<SubgraphInput>,
    pub(crate) outputs: Vec<(String, AnyProperty)>,
    pub(crate) nodes: Vec<(String, AnyNode)>,
    pub(crate) adaptors: Vec<(String, Rc<ParentedAdaptor>)>,
}

impl Subgraph {
    /// Template name this instance was created from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role the instance was selected for, if any.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Literal parameters local to this instance.
    pub fn parameters(&self) -> &BTreeMap<String, SpecValue> {
        &self.parameters
    }

    pub fn inputs(&self) -> &[SubgraphInput] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&AnyProperty> {
        self.inputs
            .iter()
            .find(|i| i.name == name)
            .map(|i| &i.property)
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, &AnyProperty)> {
        self.outputs.iter().map(|(name, p)| (name.as_str(), p))
    }

    pub fn output(&self, name: &str) -> Option<&AnyProperty> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &AnyNode)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn node(&self, id: &str) -> Option<&AnyNode> {
        self.nodes
            .iter()
            .find(|(node_id, _)| node_id == id)
            .map(|(_, node)| node)
    }

    pub fn node_by_index(&self, id: NodeId) -> Option<&AnyNode> {
        self.nodes.get(id.index()).map(|(_, node)| node)
    }

    pub fn adaptors(&self) -> impl Iterator<Item = (&str, &Rc<ParentedAdaptor>)> {
        self.adaptors.iter().map(|(id, a)| (id.as_str(), a))
    }

    /// The adaptor later subgraphs may pull properties from: the last one
    /// declared.
    pub fn provider(&self) -> Option<&Rc<ParentedAdaptor>> {
        self.adaptors.last().map(|(_, adaptor)| adaptor)
    }

    pub fn render_node(&self) -> Option<&ParticleRenderNode> {
        self.nodes.iter().find_map(|(_, node)| node.as_render())
    }

    /// Refresh every node in declaration order.
    pub fn refresh(&mut self) {
        for (_, node) in &mut self.nodes {
            node.refresh();
        }
    }
}

impl std::fmt::Debug for Subgraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subgraph")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("inputs", &self.inputs.iter().map(|i| &i.name).collect::<Vec<_>>())
            .field("outputs", &self.outputs.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("nodes", &self.nodes.iter().map(|(id, _)| id).collect::<Vec<_>>())
            .field("adaptors", &self.adaptors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::id::NodeId;
    use crate::pipeline::loader::TemplateLoader;
    use crate::pipeline::node::NodeFactory;
    use crate::pipeline::TemplateRegistry;

    #[test]
    fn test_cartoon_instance_layout() {
        let template = TemplateRegistry::with_builtins()
            .load_template("render", "cartoon")
            .unwrap();
        let subgraph = template.instantiate(&NodeFactory::new()).unwrap();

        assert_eq!(subgraph.name(), "cartoon");
        assert!(subgraph.role().is_none());
        assert_eq!(subgraph.nodes().count(), 2);
        assert_eq!(
            subgraph.node_by_index(NodeId(1)).unwrap().name(),
            "Particle Render"
        );
        assert!(subgraph.node_by_index(NodeId::INVALID).is_none());
        assert!(subgraph.render_node().is_some());
        assert!(subgraph.provider().is_some());
        assert!(subgraph.input("scheme").unwrap().has_value());
        assert!(subgraph.output("particle.colors").is_none());
    }
}
