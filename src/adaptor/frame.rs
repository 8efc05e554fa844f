//! Root adaptor exposing raw frame data.

use super::{DynamicPropertyProvider, PropertyTable};
use crate::error::Result;
use crate::frame::Frame;
use crate::property::AnyProperty;
use crate::types::ValueType;

/// Exposes each field of the most recent frame as a property of the same name.
///
/// Fields absent from a new frame keep their previous value, so a frame that
/// only carries positions leaves topology fields untouched.
#[derive(Default)]
pub struct FrameAdaptor {
    table: PropertyTable,
}

impl FrameAdaptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every field of `frame` into its property.
    pub fn on_new_frame(&self, frame: &Frame) {
        for (name, value) in frame.iter() {
            let applied = self
                .table
                .get_or_create(name, value.value_type())
                .and_then(|(property, _)| property.set_value(value.clone()));
            if let Err(e) = applied {
                tracing::warn!("Skipping frame field '{}': {}", name, e);
            }
        }
        tracing::trace!("Applied frame with {} fields", frame.len());
    }

    /// Undefine every property, e.g. when switching trajectories.
    pub fn reset(&self) {
        for (_, property) in self.table.list() {
            property.undefine();
        }
    }
}

impl DynamicPropertyProvider for FrameAdaptor {
    fn get_or_create_property(&self, name: &str, value_type: ValueType) -> Result<AnyProperty> {
        self.table.get_or_create(name, value_type).map(|(p, _)| p)
    }

    fn get_property(&self, name: &str) -> Option<AnyProperty> {
        self.table.get(name)
    }

    fn list_properties(&self) -> Vec<(String, AnyProperty)> {
        self.table.list()
    }
}
