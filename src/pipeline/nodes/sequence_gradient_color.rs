//! SequenceGradientColorNode: colour residues along a gradient by their
//! position within their sequence.

use crate::frame::keys;
use crate::pipeline::node::NodeIo;
use crate::pipeline::port::PortDescriptor;
use crate::property::Property;
use crate::types::{Array, Color, Gradient, Selection, ValueType};
use std::collections::HashMap;

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input(keys::PARTICLE_RESIDUES, ValueType::IntArray),
    PortDescriptor::input(keys::RESIDUE_SEQUENCES, ValueType::SelectionArray),
    PortDescriptor::input(keys::SEQUENCE_LENGTHS, ValueType::IntArray),
    PortDescriptor::input("gradient", ValueType::Gradient),
    PortDescriptor::output(keys::PARTICLE_COLORS, ValueType::ColorArray),
];

/// Residues outside every sequence get this colour.
const UNSEQUENCED: Color = Color::GREY;

pub struct SequenceGradientColorNode {
    particle_residues: Property<Array<u32>>,
    residue_sequences: Property<Array<Selection>>,
    sequence_lengths: Property<Array<u32>>,
    gradient: Property<Gradient>,
    colors: Property<Array<Color>>,
    io: NodeIo,
}

impl SequenceGradientColorNode {
    pub fn new() -> Self {
        let mut io = NodeIo::new();
        Self {
            particle_residues: io.input(keys::PARTICLE_RESIDUES),
            residue_sequences: io.input(keys::RESIDUE_SEQUENCES),
            sequence_lengths: io.input(keys::SEQUENCE_LENGTHS),
            gradient: io.input("gradient"),
            colors: io.output(keys::PARTICLE_COLORS),
            io,
        }
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    pub fn io(&self) -> &NodeIo {
        &self.io
    }

    pub fn refresh(&mut self) {
        self.io.refresh_with(|| self.update());
    }

    fn update(&self) -> Option<()> {
        let particle_residues = self.particle_residues.try_value()?;
        let sequences = self.residue_sequences.try_value()?;
        let lengths = self.sequence_lengths.try_value()?;
        let gradient = self.gradient.try_value()?;

        let residue_colors = residue_gradient(&sequences, &lengths, &gradient);
        self.colors.set_value(
            particle_residues
                .iter()
                .map(|r| residue_colors.get(r).copied().unwrap_or(UNSEQUENCED))
                .collect(),
        );
        Some(())
    }
}

impl Default for SequenceGradientColorNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Colour of every sequenced residue. Position `i` of a sequence of length
/// `n` samples the gradient at `i / (n - 1)`.
fn residue_gradient(
    sequences: &[Selection],
    lengths: &[u32],
    gradient: &Gradient,
) -> HashMap<u32, Color> {
    let mut colors = HashMap::new();
    for (index, sequence) in sequences.iter().enumerate() {
        let length = lengths
            .get(index)
            .map(|&l| l as usize)
            .unwrap_or(sequence.len())
            .max(sequence.len());
        let span = length.saturating_sub(1).max(1) as f32;
        for (position, &residue) in sequence.iter().enumerate() {
            colors.insert(residue, gradient.evaluate(position as f32 / span));
        }
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_along_sequence() {
        let mut node = SequenceGradientColorNode::new();
        node.gradient
            .set_value(Gradient::from_colors(&[Color::BLACK, Color::WHITE]));
        node.residue_sequences
            .set_value(vec![Selection::from(vec![0, 1, 2])].into());
        node.sequence_lengths.set_value(vec![3].into());
        node.particle_residues.set_value(vec![0, 2, 5].into());
        node.refresh();

        let colors = node.colors.value().unwrap();
        assert_eq!(colors[0], Color::BLACK);
        assert_eq!(colors[1], Color::WHITE);
        assert_eq!(colors[2], UNSEQUENCED);
    }
}
