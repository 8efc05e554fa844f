//! Template loaders.
//!
//! The resolver asks a [`TemplateLoader`] for a template by role and name.
//! [`TemplateRegistry`] holds templates in memory and ships the built-in set;
//! [`DirectoryLoader`] reads `<root>/<role>/<name>.toml` (or `.json`).
//! A pair `(A, B)` is itself a loader that tries `A` first.

use crate::error::{Result, VisError};
use crate::frame::keys;
use crate::pipeline::spec::SpecValue;
use crate::pipeline::template::SubgraphTemplate;
use crate::types::ValueType;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Source of subgraph templates.
pub trait TemplateLoader {
    /// Find the template `name` for `role`, if there is one.
    fn load_template(&self, role: &str, name: &str) -> Option<SubgraphTemplate>;
}

impl<L: TemplateLoader + ?Sized> TemplateLoader for Box<L> {
    fn load_template(&self, role: &str, name: &str) -> Option<SubgraphTemplate> {
        (**self).load_template(role, name)
    }
}

impl<L: TemplateLoader + ?Sized> TemplateLoader for &L {
    fn load_template(&self, role: &str, name: &str) -> Option<SubgraphTemplate> {
        (**self).load_template(role, name)
    }
}

impl<A: TemplateLoader, B: TemplateLoader> TemplateLoader for (A, B) {
    fn load_template(&self, role: &str, name: &str) -> Option<SubgraphTemplate> {
        self.0
            .load_template(role, name)
            .or_else(|| self.1.load_template(role, name))
    }
}

fn registry_key(role: &str, name: &str) -> String {
    format!("{}/{}", role.trim(), name.trim()).to_lowercase()
}

/// In-memory templates keyed by `role/name`, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, SubgraphTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in template.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (role, name, template) in builtin_templates() {
            registry.register(role, name, template);
        }
        registry
    }

    /// Register `template` under `role/name`, replacing any previous entry.
    pub fn register(&mut self, role: &str, name: &str, template: SubgraphTemplate) {
        if self
            .templates
            .insert(registry_key(role, name), template)
            .is_some()
        {
            tracing::debug!("Replaced template {}/{}", role, name);
        }
    }

    /// Registered `role/name` keys, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateLoader for TemplateRegistry {
    fn load_template(&self, role: &str, name: &str) -> Option<SubgraphTemplate> {
        self.templates.get(&registry_key(role, name)).cloned()
    }
}

/// Reads templates from `<root>/<role>/<name>.toml` or `<name>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `template` as TOML to `<root>/<role>/<template.name>.toml`.
    pub fn save_template(&self, role: &str, template: &SubgraphTemplate) -> Result<PathBuf> {
        let dir = self.root.join(role);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.toml", template.name));
        let content = toml::to_string_pretty(template)?;
        std::fs::write(&path, content)?;
        tracing::info!("Saved template to {:?}", path);
        Ok(path)
    }

    fn read(&self, path: &Path) -> Result<SubgraphTemplate> {
        let content = std::fs::read_to_string(path)?;
        let template = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };
        Ok(template)
    }
}

impl TemplateLoader for DirectoryLoader {
    fn load_template(&self, role: &str, name: &str) -> Option<SubgraphTemplate> {
        let dir = self.root.join(role);
        for extension in ["toml", "json"] {
            let path = dir.join(format!("{}.{}", name, extension));
            if !path.is_file() {
                continue;
            }
            match self.read(&path) {
                Ok(template) => {
                    tracing::debug!("Loaded template {:?}", path);
                    return Some(template);
                }
                Err(e) => {
                    let e = VisError::Config(format!("{}: {}", path.display(), e));
                    tracing::warn!("Skipping template: {}", e);
                }
            }
        }
        None
    }
}

fn cpk_scheme() -> SpecValue {
    [
        ("H", "#ffffff"),
        ("C", "#909090"),
        ("N", "#3050f8"),
        ("O", "#ff0d0d"),
        ("P", "#ff8000"),
        ("S", "#ffff30"),
        ("default", "#ff1493"),
    ]
    .into_iter()
    .collect()
}

fn secondary_structure_scheme() -> SpecValue {
    [
        ("helix", "#ff0080"),
        ("sheet", "#ffc800"),
        ("turn", "#6080ff"),
        ("loop", "#ffffff"),
    ]
    .into_iter()
    .collect()
}

/// The templates shipped with the crate, as `(role, name, template)`.
pub fn builtin_templates() -> Vec<(&'static str, &'static str, SubgraphTemplate)> {
    vec![
        (
            "sequence",
            "entities",
            SubgraphTemplate::builder("entities")
                .input(keys::RESIDUE_ENTITIES, ValueType::IntArray)
                .node("sequence", "entity_sequence")
                .output(keys::RESIDUE_SEQUENCES, "sequence.residue.sequences")
                .output(keys::SEQUENCE_LENGTHS, "sequence.sequence.lengths")
                .build(),
        ),
        (
            "sequence",
            "dna",
            SubgraphTemplate::builder("dna")
                .input(keys::PARTICLE_NAMES, ValueType::StringArray)
                .input(keys::PARTICLE_RESIDUES, ValueType::IntArray)
                .input(keys::RESIDUE_NAMES, ValueType::StringArray)
                .input(keys::RESIDUE_ENTITIES, ValueType::IntArray)
                .node("dna", "dna_sequence")
                .output(keys::RESIDUE_SEQUENCES, "dna.residue.sequences")
                .output(keys::SEQUENCE_PARTICLES, "dna.sequence.particles")
                .output(keys::SEQUENCE_LENGTHS, "dna.sequence.lengths")
                .build(),
        ),
        (
            "color",
            "element",
            SubgraphTemplate::builder("element")
                .input(keys::PARTICLE_ELEMENTS, ValueType::IntArray)
                .input_with_default("scheme", ValueType::ElementColorMapping, cpk_scheme())
                .node("color", "element_color")
                .output(keys::PARTICLE_COLORS, "color.particle.colors")
                .build(),
        ),
        (
            "color",
            "sequence gradient",
            SubgraphTemplate::builder("sequence gradient")
                .input(keys::PARTICLE_RESIDUES, ValueType::IntArray)
                .input(keys::RESIDUE_SEQUENCES, ValueType::SelectionArray)
                .input(keys::SEQUENCE_LENGTHS, ValueType::IntArray)
                .input_with_default("gradient", ValueType::Gradient, vec!["blue", "white", "red"])
                .node("color", "sequence_gradient_color")
                .output(keys::PARTICLE_COLORS, "color.particle.colors")
                .build(),
        ),
        (
            "color",
            "secondary structure",
            SubgraphTemplate::builder("secondary structure")
                .input(keys::PARTICLE_RESIDUES, ValueType::IntArray)
                .input(keys::RESIDUE_SECONDARY_STRUCTURES, ValueType::SecondaryStructureArray)
                .input_with_default("scheme", ValueType::StringColorMapping, secondary_structure_scheme())
                .node("color", "secondary_structure_color")
                .output(keys::PARTICLE_COLORS, "color.particle.colors")
                .build(),
        ),
        (
            "scale",
            "uniform",
            SubgraphTemplate::builder("uniform")
                .input(keys::PARTICLE_POSITIONS, ValueType::Vec3Array)
                .input_with_default("scale", ValueType::Float, 1.0)
                .node("uniform", "uniform_scale")
                .output(keys::PARTICLE_SCALES, "uniform.particle.scales")
                .build(),
        ),
        (
            "width",
            "uniform",
            SubgraphTemplate::builder("uniform")
                .input(keys::PARTICLE_POSITIONS, ValueType::Vec3Array)
                .input_with_default("width", ValueType::Float, 0.2)
                .node_with_bindings("uniform", "uniform_scale", &[("scale", "width")])
                .output(keys::PARTICLE_WIDTHS, "uniform.particle.scales")
                .build(),
        ),
        (
            "render",
            "ball and stick",
            SubgraphTemplate::builder("ball and stick")
                .input(keys::PARTICLE_POSITIONS, ValueType::Vec3Array)
                .input(keys::PARTICLE_COLORS, ValueType::ColorArray)
                .input(keys::PARTICLE_SCALES, ValueType::FloatArray)
                .input(keys::BOND_PAIRS, ValueType::BondArray)
                .input(keys::BOND_ORDERS, ValueType::IntArray)
                .input_with_default("color", ValueType::Color, "white")
                .input_with_default("scale", ValueType::Float, 0.1)
                .input_with_default("bond.scale", ValueType::Float, 0.04)
                .node("render", "particle_render")
                .build(),
        ),
        (
            "render",
            "cartoon",
            SubgraphTemplate::builder("cartoon")
                .adaptor("frame")
                .input(keys::PARTICLE_RESIDUES, ValueType::IntArray)
                .input(keys::RESIDUE_SECONDARY_STRUCTURES, ValueType::SecondaryStructureArray)
                .input(keys::PARTICLE_WIDTHS, ValueType::FloatArray)
                .input_with_default("scheme", ValueType::StringColorMapping, secondary_structure_scheme())
                .input_with_default("color", ValueType::Color, "white")
                .input_with_default("scale", ValueType::Float, 1.0)
                .node("color", "secondary_structure_color")
                .node_with_bindings(
                    "render",
                    "particle_render",
                    &[
                        (keys::PARTICLE_POSITIONS, "frame.particle.positions"),
                        (keys::PARTICLE_COLORS, "color.particle.colors"),
                        (keys::PARTICLE_SCALES, keys::PARTICLE_WIDTHS),
                    ],
                )
                .build(),
        ),
    ]
}
