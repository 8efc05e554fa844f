//! ParticleRenderNode: the hand-off point to the renderer.
//!
//! Unlike the other nodes this one has no outputs. The render consumer pulls
//! a [`RenderFrame`] when something changed, which also acknowledges the
//! change by clearing the input dirty flags.

use crate::frame::keys;
use crate::pipeline::node::NodeIo;
use crate::pipeline::port::PortDescriptor;
use crate::property::Property;
use crate::types::{Array, BondPair, Color, ValueType, Vec3};

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input(keys::PARTICLE_POSITIONS, ValueType::Vec3Array),
    PortDescriptor::input(keys::PARTICLE_COLORS, ValueType::ColorArray),
    PortDescriptor::input(keys::PARTICLE_SCALES, ValueType::FloatArray),
    PortDescriptor::input(keys::BOND_PAIRS, ValueType::BondArray),
    PortDescriptor::input(keys::BOND_ORDERS, ValueType::IntArray),
    PortDescriptor::input("color", ValueType::Color),
    PortDescriptor::input("scale", ValueType::Float),
    PortDescriptor::input("bond.scale", ValueType::Float),
];

/// Buffers ready for drawing. Per-particle colours and scales are already
/// multiplied by the renderer-wide colour and scale.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub positions: Array<Vec3>,
    pub colors: Array<Color>,
    pub scales: Array<f32>,
    pub bonds: Array<BondPair>,
    pub bond_orders: Array<u32>,
    pub bond_scale: f32,
}

impl RenderFrame {
    pub fn particle_count(&self) -> usize {
        self.positions.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }
}

pub struct ParticleRenderNode {
    positions: Property<Array<Vec3>>,
    colors: Property<Array<Color>>,
    scales: Property<Array<f32>>,
    bonds: Property<Array<BondPair>>,
    bond_orders: Property<Array<u32>>,
    color: Property<Color>,
    scale: Property<f32>,
    bond_scale: Property<f32>,
    io: NodeIo,
}

impl ParticleRenderNode {
    pub fn new() -> Self {
        let mut io = NodeIo::new();
        Self {
            positions: io.input(keys::PARTICLE_POSITIONS),
            colors: io.input(keys::PARTICLE_COLORS),
            scales: io.input(keys::PARTICLE_SCALES),
            bonds: io.input(keys::BOND_PAIRS),
            bond_orders: io.input(keys::BOND_ORDERS),
            color: io.input("color"),
            scale: io.input("scale"),
            bond_scale: io.input("bond.scale"),
            io,
        }
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    pub fn io(&self) -> &NodeIo {
        &self.io
    }

    /// Whether there is enough input to draw anything.
    pub fn should_render(&self) -> bool {
        self.positions.try_value().is_some_and(|p| !p.is_empty())
            && self.color.has_value()
            && self.scale.has_value()
    }

    pub fn is_input_dirty(&self) -> bool {
        self.io.is_input_dirty()
    }

    /// Snapshot the buffers if any input changed since the last call.
    ///
    /// Returns `None` when nothing changed or there is nothing to draw. Either
    /// way the dirty flags are cleared.
    pub fn take_frame(&self) -> Option<RenderFrame> {
        if !self.io.is_input_dirty() {
            return None;
        }
        let frame = self.snapshot();
        self.io.clear_input_dirty();
        frame
    }

    /// Current buffers, regardless of dirty state.
    pub fn snapshot(&self) -> Option<RenderFrame> {
        if !self.should_render() {
            return None;
        }
        let positions = self.positions.try_value()?;
        let tint = self.color.try_value()?;
        let scale = self.scale.try_value()?;
        let particle_colors = self.colors.try_value();
        let particle_scales = self.scales.try_value();

        let colors = (0..positions.len())
            .map(|i| {
                let base = particle_colors
                    .as_ref()
                    .and_then(|c| c.get(i).copied())
                    .unwrap_or(Color::WHITE);
                multiply(base, tint)
            })
            .collect();
        let scales = (0..positions.len())
            .map(|i| {
                particle_scales
                    .as_ref()
                    .and_then(|s| s.get(i).copied())
                    .unwrap_or(1.0)
                    * scale
            })
            .collect();

        Some(RenderFrame {
            positions,
            colors,
            scales,
            bonds: self.bonds.try_value().unwrap_or_else(|| Array::from(Vec::new())),
            bond_orders: self
                .bond_orders
                .try_value()
                .unwrap_or_else(|| Array::from(Vec::new())),
            bond_scale: self.bond_scale.try_value().unwrap_or(scale),
        })
    }
}

impl Default for ParticleRenderNode {
    fn default() -> Self {
        Self::new()
    }
}

fn multiply(a: Color, b: Color) -> Color {
    Color::rgba(a.r * b.r, a.g * b.g, a.b * b.b, a.a * b.a)
}
