//! Triple store adapter.
//!
//! The engine talks to its graph store only through the [`TripleStore`] trait:
//!
//! - [`OxigraphStore`]: in-memory or on-disk RDF store backed by oxigraph
//! - [`changeset::ChangeSet`]: buffered additions committed all-or-nothing
//! - [`changeset::StagedGraph`]: a store with pending additions layered on top
//!
//! Every node the engine emits is an IRI, so triples are `(NamedNode, NamedNode,
//! NamedNode)`; literal-valued statements already in a loaded ontology are kept
//! by the store but never surfaced through this interface.

pub mod backend;
pub mod changeset;

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use oxigraph::io::RdfFormat;
use oxigraph::model::{NamedNode, NamedNodeRef};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

pub use backend::OxigraphStore;

/// An IRI-only (subject, predicate, object) statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: NamedNode,
    pub predicate: NamedNode,
    pub object: NamedNode,
}

impl Triple {
    pub fn new(
        subject: impl Into<NamedNode>,
        predicate: impl Into<NamedNode>,
        object: impl Into<NamedNode>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// Serialization format for loading and writing graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphFormat {
    /// RDF/XML, the format of `.owl` ontology files.
    #[default]
    RdfXml,
    Turtle,
    NTriples,
}

impl GraphFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "owl" | "rdf" | "xml" => Some(Self::RdfXml),
            "ttl" => Some(Self::Turtle),
            "nt" => Some(Self::NTriples),
            _ => None,
        }
    }

    pub(crate) fn rdf_format(self) -> RdfFormat {
        match self {
            Self::RdfXml => RdfFormat::RdfXml,
            Self::Turtle => RdfFormat::Turtle,
            Self::NTriples => RdfFormat::NTriples,
        }
    }
}

impl std::fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RdfXml => write!(f, "rdfxml"),
            Self::Turtle => write!(f, "turtle"),
            Self::NTriples => write!(f, "ntriples"),
        }
    }
}

impl FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rdfxml" | "xml" | "owl" => Ok(Self::RdfXml),
            "turtle" | "ttl" => Ok(Self::Turtle),
            "ntriples" | "nt" => Ok(Self::NTriples),
            other => Err(format!(
                "unknown graph format \"{other}\" (expected rdfxml, turtle or ntriples)"
            )),
        }
    }
}

/// Interface to the persistent graph store.
///
/// Mutating methods take `&mut self`: the engine assumes a single writer.
pub trait TripleStore {
    /// Load a serialized graph into the store, returning the number of triples added.
    fn load(&mut self, path: &Path, format: GraphFormat) -> StoreResult<usize>;

    /// Whether the exact triple is present.
    fn has_triple(&self, triple: &Triple) -> StoreResult<bool>;

    /// All IRI subjects `s` with `(s, predicate, object)`.
    fn subjects_of(
        &self,
        predicate: NamedNodeRef<'_>,
        object: NamedNodeRef<'_>,
    ) -> StoreResult<HashSet<NamedNode>>;

    /// All IRI objects `o` with `(subject, predicate, o)`.
    fn objects_of(
        &self,
        subject: NamedNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> StoreResult<HashSet<NamedNode>>;

    /// All IRI `(subject, object)` pairs linked by `predicate`.
    fn pairs_for_predicate(
        &self,
        predicate: NamedNodeRef<'_>,
    ) -> StoreResult<Vec<(NamedNode, NamedNode)>>;

    /// Insert a triple. Returns `false` if it was already present.
    fn add_triple(&mut self, triple: &Triple) -> StoreResult<bool>;

    /// Remove a triple. Returns `false` if it was absent.
    fn remove_triple(&mut self, triple: &Triple) -> StoreResult<bool>;

    /// All IRI-only triples in the store.
    fn triples(&self) -> StoreResult<Vec<Triple>>;

    /// Total number of statements in the store (including literal-valued ones).
    fn len(&self) -> StoreResult<usize>;

    /// Whether the store holds no statements.
    fn is_empty(&self) -> StoreResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Write the whole graph to `path` in the given format.
    ///
    /// Replaces the file in one step: on error, whatever `path` held before
    /// is still there.
    fn serialize(&self, path: &Path, format: GraphFormat) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            GraphFormat::from_path(Path::new("kg/ravd.owl")),
            Some(GraphFormat::RdfXml)
        );
        assert_eq!(
            GraphFormat::from_path(Path::new("scene.TTL")),
            Some(GraphFormat::Turtle)
        );
        assert_eq!(
            GraphFormat::from_path(Path::new("dump.nt")),
            Some(GraphFormat::NTriples)
        );
        assert_eq!(GraphFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(GraphFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn format_parse_and_display_agree() {
        for format in [GraphFormat::RdfXml, GraphFormat::Turtle, GraphFormat::NTriples] {
            assert_eq!(format.to_string().parse::<GraphFormat>().unwrap(), format);
        }
        assert!("jsonld".parse::<GraphFormat>().is_err());
    }
}
