//! Test data builders for creating frames and templates

use visgraph::frame::{keys, Frame};
use visgraph::pipeline::SubgraphTemplate;
use visgraph::types::{Array, BondPair, ValueType, Vec3};

/// Builder for a small molecule frame
///
/// Particles are laid out on the x axis. Residues are assigned with
/// [`residue`](Self::residue) and chained together by entity.
pub struct MoleculeBuilder {
    elements: Vec<u32>,
    names: Vec<String>,
    residues: Vec<u32>,
    residue_names: Vec<String>,
    entities: Vec<u32>,
    bonds: Vec<BondPair>,
}

impl MoleculeBuilder {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            names: Vec::new(),
            residues: Vec::new(),
            residue_names: Vec::new(),
            entities: Vec::new(),
            bonds: Vec::new(),
        }
    }

    /// Start a new residue in `entity`
    pub fn residue(mut self, name: &str, entity: u32) -> Self {
        self.residue_names.push(name.to_string());
        self.entities.push(entity);
        self
    }

    /// Add a particle to the current residue
    pub fn atom(mut self, name: &str, element: u32) -> Self {
        let residue = self.residue_names.len().saturating_sub(1) as u32;
        self.elements.push(element);
        self.names.push(name.to_string());
        self.residues.push(residue);
        self
    }

    pub fn bond(mut self, a: u32, b: u32) -> Self {
        self.bonds.push(BondPair::new(a, b));
        self
    }

    pub fn particle_count(&self) -> usize {
        self.elements.len()
    }

    pub fn build(self) -> Frame {
        let positions: Vec<Vec3> = (0..self.elements.len())
            .map(|i| Vec3::new(i as f32, 0.0, 0.0))
            .collect();
        Frame::new()
            .with(keys::PARTICLE_POSITIONS, Array::from(positions))
            .with(keys::PARTICLE_ELEMENTS, Array::from(self.elements))
            .with(keys::PARTICLE_NAMES, Array::from(self.names))
            .with(keys::PARTICLE_RESIDUES, Array::from(self.residues))
            .with(keys::RESIDUE_NAMES, Array::from(self.residue_names))
            .with(keys::RESIDUE_ENTITIES, Array::from(self.entities))
            .with(keys::BOND_PAIRS, Array::from(self.bonds))
    }
}

impl Default for MoleculeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Two alanines in entity 0 and one glycine in entity 1, bonded in a chain
pub fn tripeptide() -> Frame {
    MoleculeBuilder::new()
        .residue("ALA", 0)
        .atom("N", 7)
        .atom("CA", 6)
        .residue("ALA", 0)
        .atom("N", 7)
        .atom("CA", 6)
        .residue("GLY", 1)
        .atom("N", 7)
        .atom("CA", 6)
        .bond(0, 1)
        .bond(1, 2)
        .bond(2, 3)
        .bond(3, 4)
        .bond(4, 5)
        .build()
}

/// A colour template that forwards its `seed` input as output `tint`
pub fn tint_source() -> SubgraphTemplate {
    SubgraphTemplate::builder("source")
        .input_with_default("seed", ValueType::Color, "blue")
        .output("tint", "seed")
        .build()
}

/// A render-role template with a single `tint` input and no nodes
pub fn tint_probe() -> SubgraphTemplate {
    SubgraphTemplate::builder("probe")
        .input("tint", ValueType::Color)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_molecule_builder() {
        let builder = MoleculeBuilder::new()
            .residue("ALA", 0)
            .atom("N", 7)
            .atom("CA", 6);
        assert_eq!(builder.particle_count(), 2);
        let frame = builder.build();
        assert!(frame.contains(keys::PARTICLE_POSITIONS));
        assert!(frame.contains(keys::RESIDUE_ENTITIES));
    }
}
