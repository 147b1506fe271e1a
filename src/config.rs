//! Engine configuration, persisted as TOML.
//!
//! Every field has a serde default, so a config file only needs the keys it
//! overrides:
//!
//! ```toml
//! ontology = "kg/ravd.owl"
//! output = "kg/updated.owl"
//! ancestry = "transitive"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hierarchy::AncestryMode;
use crate::store::GraphFormat;
use crate::vocab::{DEFAULT_NAMESPACE, GEOSPATIAL_NAMESPACE, Namespace, TIME_NAMESPACE};

/// Configuration for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base IRI under which classes, relations and individuals are minted.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Further namespaces whose terms are listed by the vocabulary view.
    #[serde(default = "default_extra_namespaces")]
    pub extra_namespaces: Vec<String>,
    /// Ontology loaded into the store when the engine starts.
    #[serde(default)]
    pub ontology: Option<PathBuf>,
    /// Format of `ontology`. Guessed from the extension when absent.
    #[serde(default)]
    pub ontology_format: Option<GraphFormat>,
    /// Where the whole graph is written after every assembled scene.
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Format of `output`. Guessed from the extension when absent.
    #[serde(default)]
    pub output_format: Option<GraphFormat>,
    /// On-disk oxigraph store. `None` for memory-only mode.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// How far up the class hierarchy sensor and scene rules look.
    #[serde(default)]
    pub ancestry: AncestryMode,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.into()
}
fn default_extra_namespaces() -> Vec<String> {
    vec![TIME_NAMESPACE.into(), GEOSPATIAL_NAMESPACE.into()]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            extra_namespaces: default_extra_namespaces(),
            ontology: None,
            ontology_format: None,
            output: None,
            output_format: None,
            data_dir: None,
            ancestry: AncestryMode::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<string>".into(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Check the fields that cannot be validated by deserialization alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for base in std::iter::once(&self.namespace).chain(&self.extra_namespaces) {
            if base.is_empty() {
                return Err(ConfigError::Invalid {
                    message: "namespace must not be empty".into(),
                });
            }
            // A namespace is usable if a local name appended to it is a valid IRI.
            Namespace::new(base.as_str())
                .iri("x")
                .map_err(|e| ConfigError::Invalid {
                    message: format!("namespace \"{base}\" is not a valid IRI prefix: {e}"),
                })?;
        }
        Ok(())
    }

    /// The scene namespace.
    pub fn scene_namespace(&self) -> Namespace {
        Namespace::new(self.namespace.as_str())
    }

    /// The scene namespace followed by the extra namespaces.
    pub fn namespaces(&self) -> Vec<Namespace> {
        std::iter::once(&self.namespace)
            .chain(&self.extra_namespaces)
            .map(|base| Namespace::new(base.as_str()))
            .collect()
    }

    /// Format of the ontology file: explicit, else by extension, else RDF/XML.
    pub fn ontology_format(&self) -> GraphFormat {
        resolve_format(self.ontology_format, self.ontology.as_deref())
    }

    /// Format of the output file: explicit, else by extension, else RDF/XML.
    pub fn output_format(&self) -> GraphFormat {
        resolve_format(self.output_format, self.output.as_deref())
    }
}

fn resolve_format(explicit: Option<GraphFormat>, path: Option<&Path>) -> GraphFormat {
    explicit
        .or_else(|| path.and_then(GraphFormat::from_path))
        .unwrap_or_default()
}
