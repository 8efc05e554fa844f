//! Visualisation pipelines assembled from subgraph templates.
//!
//! Data flows from frames through the root adaptor chain into subgraph
//! inputs, through nodes, and out to the render consumer.
//!
//! # Architecture
//!
//! ```text
//! [FrameAdaptor] ──► [SecondaryStructureAdaptor]? ──► [FilteredAdaptor]
//!                                                          │
//!          ┌───────────────────────────────────────────────┘
//!          ▼
//! [sequence] ──► [color] ──► [scale] ──► [width] ──► [render] ──► RenderFrame
//! ```
//!
//! # Design
//!
//! - **Enum dispatch** for built-in nodes (`BuiltinNode`), trait objects for plugins.
//! - **Templates are data**: serde documents, loaded by role and name.
//! - **Wiring happens once**: inputs are linked at build time, values then
//!   propagate through property links without further resolution.
//! - **Single update point**: frames arrive on a channel and are applied once
//!   per [`Pipeline::update`].

pub mod factory;
pub mod id;
pub mod loader;
pub mod node;
pub mod node_type;
pub mod nodes;
pub mod parse;
pub mod port;
pub mod spec;
pub mod subgraph;
pub mod template;

pub use factory::{PipelineBuilder, ROLES};
pub use id::{NodeId, SubgraphId};
pub use loader::{builtin_templates, DirectoryLoader, TemplateLoader, TemplateRegistry};
pub use node::{AnyNode, BuiltinNode, NodeFactory, NodeIo, NodePlugin};
pub use node_type::NodeType;
pub use nodes::RenderFrame;
pub use parse::{parse_literal, InputKind};
pub use port::{PortDescriptor, PortDirection};
pub use spec::SpecValue;
pub use subgraph::{Subgraph, SubgraphInput};
pub use template::{SubgraphTemplate, TemplateBuilder, TemplateInput, TemplateNode, TemplateOutput};

use crate::adaptor::{FilteredAdaptor, FrameAdaptor, PropertyTable, SecondaryStructureAdaptor};
use crate::error::VisError;
use crate::frame::{Frame, FrameReceiver};
use crate::property::AnyProperty;
use crate::types::Array;
use std::fmt;
use std::rc::Rc;

/// Build progress. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Unwired,
    Wiring,
    Ready,
}

/// Where a subgraph input got its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    /// Literal in the subgraph's own parameter map.
    LocalParameter,
    /// Literal at the root of the specification.
    RootParameter,
    /// Same-named output of an earlier subgraph.
    Output { subgraph: SubgraphId },
    /// Pipeline-level input.
    PipelineInput,
    /// The template's default value.
    Default,
    /// Property requested from an earlier subgraph's adaptor.
    Adaptor { subgraph: SubgraphId },
    /// Property requested from the root filtered adaptor.
    RootAdaptor,
    /// Nothing could be linked; the input stays undefined.
    Unresolved,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingSource::LocalParameter => write!(f, "local parameter"),
            BindingSource::RootParameter => write!(f, "root parameter"),
            BindingSource::Output { subgraph } => write!(f, "output of {}", subgraph),
            BindingSource::PipelineInput => write!(f, "pipeline input"),
            BindingSource::Default => write!(f, "default"),
            BindingSource::Adaptor { subgraph } => write!(f, "adaptor of {}", subgraph),
            BindingSource::RootAdaptor => write!(f, "root adaptor"),
            BindingSource::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// How one subgraph input was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    pub subgraph: SubgraphId,
    pub input: String,
    pub source: BindingSource,
}

/// A wired visualisation pipeline.
///
/// Built by [`PipelineBuilder`]. Owns the root adaptor chain and every
/// subgraph instance; all of it is single-threaded.
pub struct Pipeline {
    pub(crate) state: PipelineState,
    pub(crate) frame: Rc<FrameAdaptor>,
    pub(crate) secondary_structure: Option<Rc<SecondaryStructureAdaptor>>,
    pub(crate) filtered: Rc<FilteredAdaptor>,
    pub(crate) subgraphs: Vec<Subgraph>,
    pub(crate) inputs: PropertyTable,
    pub(crate) bindings: Vec<InputBinding>,
    pub(crate) diagnostics: Vec<VisError>,
}

impl Pipeline {
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub(crate) fn transition(&mut self, to: PipelineState) {
        if to <= self.state {
            return;
        }
        tracing::info!("Pipeline {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    /// Put a secondary structure adaptor between the frame and the filter.
    pub(crate) fn insert_secondary_structure_adaptor(&mut self) {
        if self.secondary_structure.is_some() {
            return;
        }
        let adaptor = Rc::new(SecondaryStructureAdaptor::new());
        adaptor.set_parent(&self.frame);
        self.filtered.set_parent(&adaptor);
        tracing::debug!("Inserted secondary structure adaptor");
        self.secondary_structure = Some(adaptor);
    }

    /// Apply a frame to the root adaptor.
    pub fn on_new_frame(&self, frame: &Frame) {
        self.frame.on_new_frame(frame);
    }

    /// Apply every pending frame, then refresh. Returns whether a frame
    /// arrived.
    pub fn update(&mut self, receiver: &FrameReceiver) -> bool {
        let frame = receiver.drain();
        if let Some(frame) = &frame {
            self.on_new_frame(frame);
        }
        self.refresh();
        frame.is_some()
    }

    /// Refresh every node, subgraph by subgraph.
    pub fn refresh(&mut self) {
        for subgraph in &mut self.subgraphs {
            subgraph.refresh();
        }
    }

    /// Buffers from the last render node, if any of its inputs changed.
    pub fn render_frame(&self) -> Option<RenderFrame> {
        self.subgraphs
            .iter()
            .rev()
            .find_map(Subgraph::render_node)?
            .take_frame()
    }

    /// The named output of the latest subgraph that has one.
    pub fn output(&self, name: &str) -> Option<&AnyProperty> {
        self.subgraphs.iter().rev().find_map(|s| s.output(name))
    }

    /// Subgraphs in instantiation order.
    pub fn subgraphs(&self) -> &[Subgraph] {
        &self.subgraphs
    }

    pub fn subgraph(&self, id: SubgraphId) -> Option<&Subgraph> {
        self.subgraphs.get(id.index())
    }

    pub fn bindings(&self) -> &[InputBinding] {
        &self.bindings
    }

    /// Problems met while resolving inputs.
    pub fn diagnostics(&self) -> &[VisError] {
        &self.diagnostics
    }

    /// A pipeline-level input declared on the builder.
    pub fn input(&self, name: &str) -> Option<AnyProperty> {
        self.inputs.get(name)
    }

    pub fn particle_filter(&self) -> Option<Array<u32>> {
        self.filtered.particle_filter().try_value()
    }

    /// Restrict per-particle data to `filter`, or lift the restriction.
    pub fn set_particle_filter(&self, filter: Option<Array<u32>>) {
        match filter {
            Some(filter) => self.filtered.particle_filter().set_value(filter),
            None => self.filtered.particle_filter().undefine(),
        }
    }

    pub fn frame_adaptor(&self) -> &Rc<FrameAdaptor> {
        &self.frame
    }

    pub fn filtered_adaptor(&self) -> &Rc<FilteredAdaptor> {
        &self.filtered
    }

    pub fn has_secondary_structure_adaptor(&self) -> bool {
        self.secondary_structure.is_some()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state)
            .field("subgraphs", &self.subgraphs)
            .field("secondary_structure", &self.secondary_structure.is_some())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
