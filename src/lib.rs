//! # visgraph: reactive visualisation pipelines
//!
//! A small reactive dataflow runtime. A declarative specification picks
//! subgraph templates by role; the resolver instantiates them, wires every
//! input to a value source, and the resulting pipeline keeps its outputs up
//! to date as frames arrive.
//!
//! ## Architecture
//!
//! - **Property**: typed reactive cells with links, dirty flags and lazy derivation
//! - **Adaptor**: providers that hand out named properties on demand, chained parent to child
//! - **Pipeline**: templates, loaders, built-in nodes and the resolver that wires them
//! - **Frame**: named data snapshots, delivered across threads through crossbeam channels
//!
//! ## Configuration
//!
//! Settings and user templates live in the platform-appropriate data
//! directory under `dev.visgraph`:
//!
//! - **Linux**: `~/.local/share/dev.visgraph/`
//! - **macOS**: `~/Library/Application Support/dev.visgraph/`
//! - **Windows**: `%APPDATA%\dev.visgraph\`
//!
//! ## Example
//!
//! ```ignore
//! use visgraph::{
//!     frame::{frame_channel, Frame},
//!     pipeline::{PipelineBuilder, SpecValue, TemplateRegistry},
//! };
//!
//! let spec = SpecValue::from_json_str(r#"{"color": "element", "scale": "uniform"}"#)?;
//! let mut pipeline = PipelineBuilder::new(TemplateRegistry::with_builtins()).build(&spec)?;
//!
//! let (sender, receiver) = frame_channel();
//! std::thread::spawn(move || sender.send(Frame::new()));
//!
//! if pipeline.update(&receiver) {
//!     if let Some(buffers) = pipeline.render_frame() {
//!         println!("{} particles", buffers.particle_count());
//!     }
//! }
//! ```

pub mod adaptor;
pub mod config;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod property;
pub mod types;

// Re-export commonly used types
pub use adaptor::{DynamicPropertyProvider, FilteredAdaptor, FrameAdaptor, ParentedAdaptor};
pub use config::VisConfig;
pub use error::{Result, VisError};
pub use frame::{frame_channel, Frame};
pub use pipeline::{Pipeline, PipelineBuilder, SpecValue, SubgraphTemplate, TemplateRegistry};
pub use property::{AnyProperty, Property};
pub use types::{Value, ValueType};
