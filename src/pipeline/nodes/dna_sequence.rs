//! DnaSequenceNode: chains of standard nucleic acids.

use crate::frame::keys;
use crate::pipeline::node::NodeIo;
use crate::pipeline::port::PortDescriptor;
use crate::property::Property;
use crate::types::{Array, Selection, ValueType};

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input(keys::PARTICLE_NAMES, ValueType::StringArray),
    PortDescriptor::input(keys::PARTICLE_RESIDUES, ValueType::IntArray),
    PortDescriptor::input(keys::RESIDUE_NAMES, ValueType::StringArray),
    PortDescriptor::input(keys::RESIDUE_ENTITIES, ValueType::IntArray),
    PortDescriptor::output(keys::RESIDUE_SEQUENCES, ValueType::SelectionArray),
    PortDescriptor::output(keys::SEQUENCE_PARTICLES, ValueType::IntArray),
    PortDescriptor::output(keys::SEQUENCE_LENGTHS, ValueType::IntArray),
];

const NUCLEIC_ACIDS: &[&str] = &["A", "C", "G", "T", "U", "DA", "DC", "DG", "DT", "DU"];

/// Whether `residue_name` is one of the standard nucleic acid residues.
pub fn is_standard_nucleic_acid(residue_name: &str) -> bool {
    NUCLEIC_ACIDS
        .iter()
        .any(|n| n.eq_ignore_ascii_case(residue_name.trim()))
}

/// Finds DNA/RNA chains by walking phosphorus atoms.
///
/// A chain is a run of `P` atoms whose residues are standard nucleic acids,
/// broken whenever the residue's entity changes.
pub struct DnaSequenceNode {
    particle_names: Property<Array<String>>,
    particle_residues: Property<Array<u32>>,
    residue_names: Property<Array<String>>,
    residue_entities: Property<Array<u32>>,
    residue_sequences: Property<Array<Selection>>,
    sequence_particles: Property<Array<u32>>,
    sequence_lengths: Property<Array<u32>>,
    io: NodeIo,
}

/// Residue and phosphorus indices of each chain.
#[derive(Debug, Default, PartialEq)]
pub struct DnaChains {
    pub residues: Vec<Vec<u32>>,
    pub phosphates: Vec<Vec<u32>>,
}

impl DnaSequenceNode {
    pub fn new() -> Self {
        let mut io = NodeIo::new();
        Self {
            particle_names: io.input(keys::PARTICLE_NAMES),
            particle_residues: io.input(keys::PARTICLE_RESIDUES),
            residue_names: io.input(keys::RESIDUE_NAMES),
            residue_entities: io.input(keys::RESIDUE_ENTITIES),
            residue_sequences: io.output(keys::RESIDUE_SEQUENCES),
            sequence_particles: io.output(keys::SEQUENCE_PARTICLES),
            sequence_lengths: io.output(keys::SEQUENCE_LENGTHS),
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
        let chains = find_chains(
            &self.particle_names.try_value()?,
            &self.particle_residues.try_value()?,
            &self.residue_names.try_value()?,
            &self.residue_entities.try_value()?,
        );
        tracing::debug!("Found {} nucleic acid chains", chains.residues.len());

        self.sequence_lengths
            .set_value(chains.phosphates.iter().map(|c| c.len() as u32).collect());
        self.sequence_particles
            .set_value(chains.phosphates.iter().flatten().copied().collect());
        self.residue_sequences.set_value(
            chains
                .residues
                .into_iter()
                .map(Selection::from)
                .collect(),
        );
        Some(())
    }
}

impl Default for DnaSequenceNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk particles in order and collect nucleic acid chains.
///
/// Particles whose residue or entity index is out of range are ignored.
pub fn find_chains(
    particle_names: &[String],
    particle_residues: &[u32],
    residue_names: &[String],
    residue_entities: &[u32],
) -> DnaChains {
    let mut chains = DnaChains::default();
    let mut residues = Vec::new();
    let mut phosphates = Vec::new();
    let mut current_entity = None;

    for (particle, name) in particle_names.iter().enumerate() {
        if !name.trim().eq_ignore_ascii_case("P") {
            continue;
        }
        let Some(&residue) = particle_residues.get(particle) else {
            continue;
        };
        let Some(residue_name) = residue_names.get(residue as usize) else {
            continue;
        };
        if !is_standard_nucleic_acid(residue_name) {
            continue;
        }
        let Some(&entity) = residue_entities.get(residue as usize) else {
            continue;
        };
        if current_entity != Some(entity) && !residues.is_empty() {
            chains.residues.push(std::mem::take(&mut residues));
            chains.phosphates.push(std::mem::take(&mut phosphates));
        }
        current_entity = Some(entity);
        residues.push(residue);
        phosphates.push(particle as u32);
    }
    if !residues.is_empty() {
        chains.residues.push(residues);
        chains.phosphates.push(phosphates);
    }
    chains
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_nucleic_acid_names() {
        assert!(is_standard_nucleic_acid("DA"));
        assert!(is_standard_nucleic_acid("u"));
        assert!(!is_standard_nucleic_acid("ALA"));
    }

    #[test]
    fn test_chains_split_on_entity() {
        // residues: 0 DA (entity 0), 1 DC (entity 0), 2 ALA (entity 0), 3 DG (entity 1)
        let residue_names = strings(&["DA", "DC", "ALA", "DG"]);
        let residue_entities = [0, 0, 0, 1];
        let particle_names = strings(&["P", "C1'", "P", "CA", "P", "P"]);
        let particle_residues = [0, 0, 1, 2, 2, 3];

        let chains = find_chains(&particle_names, &particle_residues, &residue_names, &residue_entities);
        assert_eq!(chains.residues, vec![vec![0, 1], vec![3]]);
        assert_eq!(chains.phosphates, vec![vec![0, 2], vec![5]]);
    }

    #[test]
    fn test_out_of_range_residue_ignored() {
        let chains = find_chains(&strings(&["P"]), &[7], &strings(&["DA"]), &[0]);
        assert_eq!(chains, DnaChains::default());
    }

    #[test]
    fn test_refresh_outputs() {
        let mut node = DnaSequenceNode::new();
        node.particle_names.set_value(strings(&["P", "P"]).into());
        node.particle_residues.set_value(vec![0, 1].into());
        node.residue_names.set_value(strings(&["DA", "DT"]).into());
        node.residue_entities.set_value(vec![0, 0].into());
        node.refresh();

        assert_eq!(&*node.sequence_lengths.value().unwrap(), &[2]);
        assert_eq!(&*node.sequence_particles.value().unwrap(), &[0, 1]);
        assert_eq!(node.residue_sequences.value().unwrap().len(), 1);
    }
}
