//! Built-in pipeline node implementations.

pub mod dna_sequence;
pub mod element_color;
pub mod entity_sequence;
pub mod particle_render;
pub mod secondary_structure_color;
pub mod sequence_gradient_color;
pub mod uniform_scale;

pub use dna_sequence::DnaSequenceNode;
pub use element_color::ElementColorNode;
pub use entity_sequence::EntitySequenceNode;
pub use particle_render::{ParticleRenderNode, RenderFrame};
pub use secondary_structure_color::SecondaryStructureColorNode;
pub use sequence_gradient_color::SequenceGradientColorNode;
pub use uniform_scale::UniformScaleNode;
