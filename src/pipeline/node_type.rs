//! Node type enumeration for template-driven node creation.
//!
//! Templates name their nodes by the snake_case form of these variants.

use serde::{Deserialize, Serialize};

/// Types of built-in nodes that templates can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    // Sequence providers
    /// Splits residues into sequences by entity.
    EntitySequence,
    /// Finds nucleic acid chains through their phosphorus atoms.
    DnaSequence,

    // Colouring
    /// Colours particles by element.
    ElementColor,
    /// Colours particles along a gradient by position in their sequence.
    SequenceGradientColor,
    /// Colours particles by the secondary structure of their residue.
    SecondaryStructureColor,

    // Scaling
    /// Gives every particle the same scale.
    UniformScale,

    // Rendering
    /// Collects particle and bond buffers for the render consumer.
    ParticleRender,
}

impl NodeType {
    /// Get the display name for this node type.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeType::EntitySequence => "Entity Sequence",
            NodeType::DnaSequence => "DNA Sequence",
            NodeType::ElementColor => "Element Color",
            NodeType::SequenceGradientColor => "Sequence Gradient Color",
            NodeType::SecondaryStructureColor => "Secondary Structure Color",
            NodeType::UniformScale => "Uniform Scale",
            NodeType::ParticleRender => "Particle Render",
        }
    }

    /// The identifier used in templates.
    pub fn id(&self) -> &'static str {
        match self {
            NodeType::EntitySequence => "entity_sequence",
            NodeType::DnaSequence => "dna_sequence",
            NodeType::ElementColor => "element_color",
            NodeType::SequenceGradientColor => "sequence_gradient_color",
            NodeType::SecondaryStructureColor => "secondary_structure_color",
            NodeType::UniformScale => "uniform_scale",
            NodeType::ParticleRender => "particle_render",
        }
    }

    /// Look up a node type by its template identifier.
    pub fn from_id(id: &str) -> Option<NodeType> {
        Self::all().iter().copied().find(|t| t.id() == id)
    }

    /// Get all available node types.
    pub fn all() -> &'static [NodeType] {
        &[
            NodeType::EntitySequence,
            NodeType::DnaSequence,
            NodeType::ElementColor,
            NodeType::SequenceGradientColor,
            NodeType::SecondaryStructureColor,
            NodeType::UniformScale,
            NodeType::ParticleRender,
        ]
    }

    /// Check if this node type provides sequences.
    pub fn is_sequence_provider(&self) -> bool {
        matches!(self, NodeType::EntitySequence | NodeType::DnaSequence)
    }

    /// Check if this node type is a render sink.
    pub fn is_sink(&self) -> bool {
        matches!(self, NodeType::ParticleRender)
    }

    /// Get a detailed description of what this node does.
    pub fn description(&self) -> &'static str {
        match self {
            NodeType::EntitySequence =>
                "Groups consecutive residues with the same entity.\n\
                 Outputs one residue selection per entity run.",

            NodeType::DnaSequence =>
                "Finds chains of standard nucleic acids.\n\
                 Follows phosphorus atoms, split on entity change.",

            NodeType::ElementColor =>
                "Colours each particle by its element.\n\
                 Unknown elements use the scheme default.",

            NodeType::SequenceGradientColor =>
                "Colours residues along a gradient.\n\
                 Start of each sequence to its end.",

            NodeType::SecondaryStructureColor =>
                "Colours residues by secondary structure.\n\
                 Scheme keys are helix, sheet, turn and loop.",

            NodeType::UniformScale =>
                "Assigns one scale to every particle.",

            NodeType::ParticleRender =>
                "Collects positions, colours, scales and bonds.\n\
                 Hands a snapshot to the renderer when inputs change.",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
