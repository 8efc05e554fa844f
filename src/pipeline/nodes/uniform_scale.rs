//! UniformScaleNode: one scale for every particle.

use crate::frame::keys;
use crate::pipeline::node::NodeIo;
use crate::pipeline::port::PortDescriptor;
use crate::property::Property;
use crate::types::{Array, ValueType, Vec3};

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input(keys::PARTICLE_POSITIONS, ValueType::Vec3Array),
    PortDescriptor::input("scale", ValueType::Float),
    PortDescriptor::output(keys::PARTICLE_SCALES, ValueType::FloatArray),
];

pub struct UniformScaleNode {
    positions: Property<Array<Vec3>>,
    scale: Property<f32>,
    scales: Property<Array<f32>>,
    io: NodeIo,
}

impl UniformScaleNode {
    pub fn new() -> Self {
        let mut io = NodeIo::new();
        Self {
            positions: io.input(keys::PARTICLE_POSITIONS),
            scale: io.input("scale"),
            scales: io.output(keys::PARTICLE_SCALES),
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
        let count = self.positions.try_value()?.len();
        let scale = self.scale.try_value()?;
        self.scales.set_value(vec![scale; count].into());
        Some(())
    }
}

impl Default for UniformScaleNode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_per_particle() {
        let mut node = UniformScaleNode::new();
        node.positions.set_value(vec![Vec3::ZERO; 3].into());
        node.scale.set_value(0.2);
        node.refresh();
        assert_eq!(&*node.scales.value().unwrap(), &[0.2, 0.2, 0.2]);

        node.scales.clear_dirty();
        node.refresh();
        assert!(!node.scales.is_dirty());
    }
}
