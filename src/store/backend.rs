//! Oxigraph-backed triple store.
//!
//! Holds the ontology and every scene committed to it. Lookups go through
//! SPARQL, insertions and removals through the quad API.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use oxigraph::model::{GraphNameRef, NamedNode, NamedNodeRef, QuadRef, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};

use super::{GraphFormat, Triple, TripleStore};

/// Triple store backed by oxigraph.
pub struct OxigraphStore {
    store: Store,
}

impl OxigraphStore {
    /// Create a new in-memory store (no persistence).
    pub fn in_memory() -> StoreResult<Self> {
        let store = Store::new().map_err(|e| StoreError::Backend {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self { store })
    }

    /// Open or create a persistent store at the given directory.
    pub fn open(path: &Path) -> StoreResult<Self> {
        std::fs::create_dir_all(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let store = Store::open(path).map_err(|e| StoreError::Backend {
            message: format!("failed to open oxigraph store at {}: {e}", path.display()),
        })?;
        Ok(Self { store })
    }

    fn quad(triple: &Triple) -> QuadRef<'_> {
        QuadRef::new(
            triple.subject.as_ref(),
            triple.predicate.as_ref(),
            triple.object.as_ref(),
            GraphNameRef::DefaultGraph,
        )
    }

    /// Run a SELECT query and keep the rows where every requested variable is
    /// bound to an IRI.
    fn select_iris(&self, sparql: &str, vars: &[&str]) -> StoreResult<Vec<Vec<NamedNode>>> {
        let results = self.store.query(sparql).map_err(|e| StoreError::Backend {
            message: format!("SPARQL query failed: {e}"),
        })?;

        let QueryResults::Solutions(solutions) = results else {
            return Err(StoreError::Backend {
                message: "expected solutions from SELECT query".into(),
            });
        };

        let mut rows = Vec::new();
        for solution in solutions {
            let solution = solution.map_err(|e| StoreError::Backend {
                message: format!("solution error: {e}"),
            })?;
            let row: Option<Vec<NamedNode>> = vars
                .iter()
                .map(|var| match solution.get(*var) {
                    Some(Term::NamedNode(node)) => Some(node.clone()),
                    _ => None,
                })
                .collect();
            if let Some(row) = row {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

/// Write `path` through a temporary file in the same directory.
///
/// The temporary file replaces `path` only after `write` succeeds and the
/// data is synced, so a failed write leaves the previous contents in place.
fn write_atomically(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<&mut File>) -> StoreResult<()>,
) -> StoreResult<()> {
    let io_error = |source: std::io::Error| StoreError::Io {
        path: path.display().to_string(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush().map_err(io_error)?;
    }
    tmp.as_file().sync_all().map_err(io_error)?;
    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

impl TripleStore for OxigraphStore {
    fn load(&mut self, path: &Path, format: GraphFormat) -> StoreResult<usize> {
        let before = self.len()?;
        let file = File::open(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.store
            .load_from_reader(format.rdf_format(), BufReader::new(file))
            .map_err(|e| StoreError::Load {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let loaded = self.len()?.saturating_sub(before);
        tracing::info!(path = %path.display(), %format, loaded, "loaded graph");
        Ok(loaded)
    }

    fn has_triple(&self, triple: &Triple) -> StoreResult<bool> {
        self.store
            .contains(Self::quad(triple))
            .map_err(|e| StoreError::Backend {
                message: format!("contains failed: {e}"),
            })
    }

    fn subjects_of(
        &self,
        predicate: NamedNodeRef<'_>,
        object: NamedNodeRef<'_>,
    ) -> StoreResult<HashSet<NamedNode>> {
        let rows = self.select_iris(
            &format!("SELECT ?s WHERE {{ ?s {predicate} {object} }}"),
            &["s"],
        )?;
        Ok(rows.into_iter().flatten().collect())
    }

    fn objects_of(
        &self,
        subject: NamedNodeRef<'_>,
        predicate: NamedNodeRef<'_>,
    ) -> StoreResult<HashSet<NamedNode>> {
        let rows = self.select_iris(
            &format!("SELECT ?o WHERE {{ {subject} {predicate} ?o }}"),
            &["o"],
        )?;
        Ok(rows.into_iter().flatten().collect())
    }

    fn pairs_for_predicate(
        &self,
        predicate: NamedNodeRef<'_>,
    ) -> StoreResult<Vec<(NamedNode, NamedNode)>> {
        let rows = self.select_iris(
            &format!("SELECT ?s ?o WHERE {{ ?s {predicate} ?o }}"),
            &["s", "o"],
        )?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let mut it = row.into_iter();
                Some((it.next()?, it.next()?))
            })
            .collect())
    }

    fn add_triple(&mut self, triple: &Triple) -> StoreResult<bool> {
        self.store
            .insert(Self::quad(triple))
            .map_err(|e| StoreError::Backend {
                message: format!("insert failed: {e}"),
            })
    }

    fn remove_triple(&mut self, triple: &Triple) -> StoreResult<bool> {
        self.store
            .remove(Self::quad(triple))
            .map_err(|e| StoreError::Backend {
                message: format!("remove failed: {e}"),
            })
    }

    fn triples(&self) -> StoreResult<Vec<Triple>> {
        let rows = self.select_iris("SELECT ?s ?p ?o WHERE { ?s ?p ?o }", &["s", "p", "o"])?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let mut it = row.into_iter();
                Some(Triple::new(it.next()?, it.next()?, it.next()?))
            })
            .collect())
    }

    fn len(&self) -> StoreResult<usize> {
        self.store.len().map_err(|e| StoreError::Backend {
            message: format!("len failed: {e}"),
        })
    }

    fn serialize(&self, path: &Path, format: GraphFormat) -> StoreResult<()> {
        write_atomically(path, |writer| {
            self.store
                .dump_graph_to_writer(GraphNameRef::DefaultGraph, format.rdf_format(), writer)
                .map_err(|e| StoreError::Serialize {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        })?;
        tracing::info!(path = %path.display(), %format, "serialized graph");
        Ok(())
    }
}

impl std::fmt::Debug for OxigraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OxigraphStore").finish()
    }
}
