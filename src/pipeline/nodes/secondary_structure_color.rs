//! SecondaryStructureColorNode: colour particles by the secondary structure
//! of their residue.

use crate::frame::keys;
use crate::pipeline::node::NodeIo;
use crate::pipeline::port::PortDescriptor;
use crate::property::Property;
use crate::types::{Array, Color, SecondaryStructure, StringColorMapping, ValueType};

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input(keys::PARTICLE_RESIDUES, ValueType::IntArray),
    PortDescriptor::input(keys::RESIDUE_SECONDARY_STRUCTURES, ValueType::SecondaryStructureArray),
    PortDescriptor::input("scheme", ValueType::StringColorMapping),
    PortDescriptor::output(keys::PARTICLE_COLORS, ValueType::ColorArray),
];

pub struct SecondaryStructureColorNode {
    particle_residues: Property<Array<u32>>,
    secondary_structures: Property<Array<SecondaryStructure>>,
    scheme: Property<StringColorMapping>,
    colors: Property<Array<Color>>,
    io: NodeIo,
}

impl SecondaryStructureColorNode {
    pub fn new() -> Self {
        let mut io = NodeIo::new();
        Self {
            particle_residues: io.input(keys::PARTICLE_RESIDUES),
            secondary_structures: io.input(keys::RESIDUE_SECONDARY_STRUCTURES),
            scheme: io.input("scheme"),
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
        let residues = self.particle_residues.try_value()?;
        let structures = self.secondary_structures.try_value()?;
        let scheme = self.scheme.try_value()?;
        self.colors.set_value(
            residues
                .iter()
                .map(|&r| {
                    let structure = structures.get(r as usize).copied().unwrap_or_default();
                    scheme.map(structure.as_str())
                })
                .collect(),
        );
        Some(())
    }
}

impl Default for SecondaryStructureColorNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_by_structure() {
        let mut node = SecondaryStructureColorNode::new();
        let mut scheme = StringColorMapping::default();
        scheme.colors.insert("helix".into(), Color::MAGENTA);
        scheme.colors.insert("loop".into(), Color::WHITE);
        node.scheme.set_value(scheme);
        node.secondary_structures
            .set_value(vec![SecondaryStructure::Helix, SecondaryStructure::Loop].into());
        node.particle_residues.set_value(vec![0, 1, 9].into());
        node.refresh();

        assert_eq!(
            &*node.colors.value().unwrap(),
            &[Color::MAGENTA, Color::WHITE, Color::WHITE]
        );
    }
}
