//! Port descriptors for the node system.
//!
//! Each node declares its ports via a static `PortDescriptor` array. The
//! template instantiator uses these to validate bindings.

use crate::types::ValueType;

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// Static descriptor for a node's port.
#[derive(Debug, Clone)]
pub struct PortDescriptor {
    pub name: &'static str,
    pub direction: PortDirection,
    pub value_type: ValueType,
}

impl PortDescriptor {
    pub const fn input(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            direction: PortDirection::Input,
            value_type,
        }
    }

    pub const fn output(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            direction: PortDirection::Output,
            value_type,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }
}

/// Find the port called `name` in `ports`.
pub fn find_port<'a>(ports: &'a [PortDescriptor], name: &str) -> Option<&'a PortDescriptor> {
    ports.iter().find(|p| p.name == name)
}
