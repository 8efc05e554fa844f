//! visgraph - pipeline inspector
//!
//! Builds a pipeline from a JSON specification and prints how it was wired:
//! the subgraphs in instantiation order, the source of every input, and any
//! diagnostics.

use anyhow::Context;
use visgraph::{
    config::{self, VisConfig},
    pipeline::{DirectoryLoader, PipelineBuilder, SpecValue, TemplateRegistry},
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(spec_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: visgraph <spec.json> [config.toml]");
        std::process::exit(2);
    };

    let config = match args.next() {
        Some(path) => VisConfig::load(&path).with_context(|| format!("loading config {}", path))?,
        None => VisConfig::load_or_default(),
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let content = std::fs::read_to_string(&spec_path)
        .with_context(|| format!("reading {}", spec_path.display()))?;
    let spec = SpecValue::from_json_str(&content)
        .with_context(|| format!("parsing {}", spec_path.display()))?;

    let directory = config
        .templates
        .resolved_directory()
        .unwrap_or_else(|| PathBuf::from(config::TEMPLATES_DIR));
    tracing::info!("User templates from {:?}", directory);

    let loader = (TemplateRegistry::with_builtins(), DirectoryLoader::new(directory));
    let pipeline = PipelineBuilder::new(loader)
        .with_config(&config)
        .build(&spec)
        .context("building pipeline")?;

    println!("Subgraphs:");
    for (index, subgraph) in pipeline.subgraphs().iter().enumerate() {
        println!(
            "  [{}] {} '{}'",
            index,
            subgraph.role().unwrap_or("-"),
            subgraph.name()
        );
    }

    println!("Bindings:");
    for binding in pipeline.bindings() {
        println!(
            "  [{}] {} <- {}",
            binding.subgraph.index(),
            binding.input,
            binding.source
        );
    }

    if pipeline.has_secondary_structure_adaptor() {
        println!("Secondary structure adaptor inserted");
    }

    if pipeline.diagnostics().is_empty() {
        println!("No diagnostics");
    } else {
        println!("Diagnostics:");
        for diagnostic in pipeline.diagnostics() {
            println!("  {}", diagnostic);
        }
    }

    Ok(())
}
