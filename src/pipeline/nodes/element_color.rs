//! ElementColorNode: colour particles by atomic number.

use crate::frame::keys;
use crate::pipeline::node::NodeIo;
use crate::pipeline::port::PortDescriptor;
use crate::property::Property;
use crate::types::{Array, Color, ElementColorMapping, ValueType};

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input(keys::PARTICLE_ELEMENTS, ValueType::IntArray),
    PortDescriptor::input("scheme", ValueType::ElementColorMapping),
    PortDescriptor::output(keys::PARTICLE_COLORS, ValueType::ColorArray),
];

pub struct ElementColorNode {
    elements: Property<Array<u32>>,
    scheme: Property<ElementColorMapping>,
    colors: Property<Array<Color>>,
    io: NodeIo,
}

impl ElementColorNode {
    pub fn new() -> Self {
        let mut io = NodeIo::new();
        Self {
            elements: io.input(keys::PARTICLE_ELEMENTS),
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
        let elements = self.elements.try_value()?;
        let scheme = self.scheme.try_value()?;
        self.colors
            .set_value(elements.iter().map(|&e| scheme.map(e)).collect());
        Some(())
    }
}

impl Default for ElementColorNode {
    fn default() -> Self {
        Self::new()
    }
}
