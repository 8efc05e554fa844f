//! Frames: named snapshots of simulation data.
//!
//! A [`Frame`] is what a data source delivers each update. Producers on other
//! threads push frames through a [`channel`], and the pipeline applies the
//! merged result once per update cycle.

pub mod channel;

pub use channel::{frame_channel, FrameReceiver, FrameSender};

use crate::types::Value;
use std::collections::BTreeMap;

/// Well-known property names.
pub mod keys {
    /// Substring that marks a property as per-particle.
    pub const PER_PARTICLE_MARKER: &str = "particle.";

    pub const PARTICLE_POSITIONS: &str = "particle.positions";
    pub const PARTICLE_ELEMENTS: &str = "particle.elements";
    pub const PARTICLE_NAMES: &str = "particle.names";
    pub const PARTICLE_RESIDUES: &str = "particle.residues";
    pub const PARTICLE_COLORS: &str = "particle.colors";
    pub const PARTICLE_SCALES: &str = "particle.scales";
    pub const PARTICLE_WIDTHS: &str = "particle.widths";

    pub const RESIDUE_NAMES: &str = "residue.names";
    pub const RESIDUE_ENTITIES: &str = "residue.entities";
    pub const RESIDUE_SECONDARY_STRUCTURES: &str = "residue.secondarystructures";
    pub const RESIDUE_SEQUENCES: &str = "residue.sequences";

    pub const BOND_PAIRS: &str = "bond.pairs";
    pub const BOND_ORDERS: &str = "bond.orders";

    pub const SEQUENCE_LENGTHS: &str = "sequence.lengths";
    pub const SEQUENCE_PARTICLES: &str = "sequence.particles";
}

/// A set of named values delivered together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    fields: BTreeMap<String, Value>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Builder-style [`Frame::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overwrite fields present in `other`, keeping everything else.
    pub fn merge(&mut self, other: Frame) {
        self.fields.extend(other.fields);
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Frame {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut frame = Frame::new();
        for (name, value) in iter {
            frame.insert(name, value);
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Array, Vec3};

    #[test]
    fn test_merge_overwrites_and_keeps() {
        let mut base = Frame::new()
            .with(keys::PARTICLE_POSITIONS, Array::from(vec![Vec3::ZERO]))
            .with(keys::PARTICLE_ELEMENTS, Array::<u32>::from(vec![6]));
        let update = Frame::new().with(
            keys::PARTICLE_POSITIONS,
            Array::from(vec![Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO]),
        );
        base.merge(update);

        assert_eq!(base.len(), 2);
        assert_eq!(base.get(keys::PARTICLE_POSITIONS).unwrap().array_len(), Some(2));
        assert!(base.contains(keys::PARTICLE_ELEMENTS));
    }

    #[test]
    fn test_from_iter() {
        let frame: Frame = vec![("a", 1.0f32), ("b", 2.0f32)].into_iter().collect();
        assert_eq!(frame.get("b"), Some(&Value::Float(2.0)));
    }
}
