//! EntitySequenceNode: one sequence per run of residues in the same entity.

use crate::frame::keys;
use crate::pipeline::node::NodeIo;
use crate::pipeline::port::PortDescriptor;
use crate::property::Property;
use crate::types::{Array, Selection, ValueType};

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input(keys::RESIDUE_ENTITIES, ValueType::IntArray),
    PortDescriptor::output(keys::RESIDUE_SEQUENCES, ValueType::SelectionArray),
    PortDescriptor::output(keys::SEQUENCE_LENGTHS, ValueType::IntArray),
];

/// Splits residues into sequences wherever the entity index changes.
pub struct EntitySequenceNode {
    residue_entities: Property<Array<u32>>,
    residue_sequences: Property<Array<Selection>>,
    sequence_lengths: Property<Array<u32>>,
    io: NodeIo,
}

impl EntitySequenceNode {
    pub fn new() -> Self {
        let mut io = NodeIo::new();
        Self {
            residue_entities: io.input(keys::RESIDUE_ENTITIES),
            residue_sequences: io.output(keys::RESIDUE_SEQUENCES),
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
        let entities = self.residue_entities.try_value()?;
        let sequences = split_by_entity(&entities);
        self.sequence_lengths
            .set_value(sequences.iter().map(|s| s.len() as u32).collect());
        self.residue_sequences.set_value(sequences.into());
        Some(())
    }
}

impl Default for EntitySequenceNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Group consecutive residue indices that share an entity.
pub fn split_by_entity(entities: &[u32]) -> Vec<Selection> {
    let mut sequences = Vec::new();
    let mut current: Vec<u32> = Vec::new();
    let mut current_entity = None;
    for (residue, &entity) in entities.iter().enumerate() {
        if current_entity != Some(entity) && !current.is_empty() {
            sequences.push(Selection::from(std::mem::take(&mut current)));
        }
        current_entity = Some(entity);
        current.push(residue as u32);
    }
    if !current.is_empty() {
        sequences.push(Selection::from(current));
    }
    sequences
}
