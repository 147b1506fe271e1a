//! Engine facade: top-level API for scene-graph instantiation.
//!
//! The `Engine` owns the triple store, the class hierarchy cache and the
//! session state (identifier registry and sensor marks), and provides the
//! public interface for previewing and assembling scenes.

use std::path::Path;

use oxigraph::model::NamedNode;

use crate::config::EngineConfig;
use crate::error::{SceneKgResult, StoreError};
use crate::hierarchy::ClassHierarchy;
use crate::registrar::{ClassStatus, Registrar, RelationStatus};
use crate::scene::{SceneAssembler, ScenePreview, SceneReport, Session};
use crate::statement::parse_scene;
use crate::store::changeset::StagedGraph;
use crate::store::{GraphFormat, OxigraphStore, TripleStore};
use crate::vocab::{Namespace, OWL_CLASS, OWL_OBJECT_PROPERTY, RDF_TYPE, Vocabulary};

/// The scene-graph engine.
///
/// Generic over the store so tests and embedders can supply their own
/// [`TripleStore`]; defaults to [`OxigraphStore`].
pub struct Engine<S: TripleStore = OxigraphStore> {
    config: EngineConfig,
    namespace: Namespace,
    store: S,
    hierarchy: ClassHierarchy,
    session: Session,
}

impl Engine<OxigraphStore> {
    /// Create a new engine with the given configuration.
    ///
    /// Opens an on-disk store if `data_dir` is set, an in-memory one
    /// otherwise, then loads the configured ontology.
    pub fn new(config: EngineConfig) -> SceneKgResult<Self> {
        let store = match config.data_dir {
            Some(ref dir) => OxigraphStore::open(dir)?,
            None => OxigraphStore::in_memory()?,
        };
        Self::with_store(config, store)
    }
}

impl<S: TripleStore> Engine<S> {
    /// Create an engine over an existing store.
    pub fn with_store(config: EngineConfig, mut store: S) -> SceneKgResult<Self> {
        config.validate()?;

        if let Some(ref path) = config.ontology {
            let format = config.ontology_format();
            let loaded = store.load(path, format)?;
            tracing::info!(path = %path.display(), %format, triples = loaded, "loaded ontology");
        }

        let hierarchy = ClassHierarchy::load(&store)?;
        let namespace = config.scene_namespace();
        let session = Session::new(namespace.clone());
        tracing::info!(
            namespace = namespace.base(),
            ancestry = ?config.ancestry,
            session = session.registry.session_tag(),
            persistent = config.data_dir.is_some(),
            "initializing scene-kg engine"
        );

        Ok(Self {
            config,
            namespace,
            store,
            hierarchy,
            session,
        })
    }

    fn assembler(&self) -> SceneAssembler<'_, S> {
        SceneAssembler::new(
            &self.store,
            &self.namespace,
            &self.hierarchy,
            self.config.ancestry,
        )
    }

    fn registrar(&self) -> Registrar<'_> {
        Registrar::new(&self.namespace, &self.hierarchy, self.config.ancestry)
    }

    /// Classes and relations a scene description would add. Read-only.
    pub fn preview(&self, text: &str) -> SceneKgResult<ScenePreview> {
        let statements = parse_scene(text)?;
        self.assembler().preview(&statements)
    }

    /// Assemble a scene description into the graph.
    ///
    /// All-or-nothing: on any error the store and the session are left as
    /// they were. If an output path is configured the whole graph is written
    /// there once the scene is committed.
    pub fn assemble(&mut self, text: &str) -> SceneKgResult<SceneReport> {
        let statements = parse_scene(text)?;

        let mut session = self.session.clone();
        let (changes, mut report) = self.assembler().build(&statements, &mut session)?;

        let commit = changes.commit(&mut self.store)?;
        if let Some(ref path) = self.config.output {
            if let Err(e) = self.store.serialize(path, self.config.output_format()) {
                tracing::warn!(error = %e, "serialization failed, rolling back scene");
                commit.rollback(&mut self.store)?;
                return Err(e.into());
            }
        }

        report.triples = commit.triples().to_vec();
        self.session = session;
        tracing::info!(
            scene = %report.scene,
            entities = report.entities.len(),
            triples = report.triples_added(),
            "assembled scene"
        );
        Ok(report)
    }

    /// Whether `name` is declared as a class.
    pub fn class_exists(&self, name: &str) -> SceneKgResult<bool> {
        self.registrar()
            .class_exists(&StagedGraph::new(&self.store), name)
    }

    /// Whether `name` is declared as a relation.
    pub fn relation_exists(&self, name: &str) -> SceneKgResult<bool> {
        self.registrar()
            .relation_exists(&StagedGraph::new(&self.store), name)
    }

    /// Declare a class directly in the store unless it already exists.
    pub fn ensure_class(&mut self, name: &str) -> SceneKgResult<ClassStatus> {
        let (status, changes) = {
            let mut graph = StagedGraph::new(&self.store);
            let status = self.registrar().ensure_class(&mut graph, name)?;
            (status, graph.into_changes())
        };
        changes.commit(&mut self.store)?;
        Ok(status)
    }

    /// Declare a relation directly in the store unless it already exists.
    pub fn ensure_relation(&mut self, name: &str) -> SceneKgResult<RelationStatus> {
        let (status, changes) = {
            let mut graph = StagedGraph::new(&self.store);
            let status = self.registrar().ensure_relation(&mut graph, name)?;
            (status, graph.into_changes())
        };
        changes.commit(&mut self.store)?;
        Ok(status)
    }

    /// The identifier assigned to an entity token in this session, if any.
    pub fn identifier_of(&self, token: &str) -> Option<&NamedNode> {
        self.session.registry.get(token)
    }

    /// Classes and relations declared in the scene namespace and the extra
    /// namespaces.
    pub fn vocabulary(&self) -> SceneKgResult<Vocabulary> {
        let classes = self.store.subjects_of(RDF_TYPE, OWL_CLASS)?;
        let relations = self.store.subjects_of(RDF_TYPE, OWL_OBJECT_PROPERTY)?;
        Ok(Vocabulary::from_declared(
            &self.config.namespaces(),
            &classes,
            &relations,
        ))
    }

    /// Write the whole graph to the configured output, if any.
    pub fn persist(&self) -> SceneKgResult<()> {
        if let Some(ref path) = self.config.output {
            self.export_to(path, self.config.output_format())?;
        }
        Ok(())
    }

    /// Write the whole graph to `path`.
    pub fn export_to(&self, path: &Path, format: GraphFormat) -> SceneKgResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Ok(self.store.serialize(path, format)?)
    }

    /// Start a new session: fresh identifiers and sensor marks, and a
    /// hierarchy reloaded from the store.
    pub fn reset_session(&mut self) -> SceneKgResult<()> {
        self.hierarchy = ClassHierarchy::load(&self.store)?;
        self.session = Session::new(self.namespace.clone());
        tracing::info!(session = self.session.registry.session_tag(), "started new session");
        Ok(())
    }

    /// Get engine statistics.
    pub fn info(&self) -> SceneKgResult<EngineInfo> {
        let vocabulary = self.vocabulary()?;
        Ok(EngineInfo {
            namespace: self.namespace.base().to_string(),
            triple_count: self.store.len()?,
            class_count: vocabulary.classes.len(),
            relation_count: vocabulary.relations.len(),
            subclass_entries: self.hierarchy.len(),
            identifiers: self.session.registry.len(),
            sensor_marks: self.session.marks.len(),
            session_tag: self.session.registry.session_tag().to_string(),
            ancestry: format!("{:?}", self.config.ancestry).to_lowercase(),
            persistent: self.config.data_dir.is_some(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// Summary statistics about the engine.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub namespace: String,
    pub triple_count: usize,
    pub class_count: usize,
    pub relation_count: usize,
    pub subclass_entries: usize,
    pub identifiers: usize,
    pub sensor_marks: usize,
    pub session_tag: String,
    pub ancestry: String,
    pub persistent: bool,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "scene-kg engine info")?;
        writeln!(f, "  namespace:    {}", self.namespace)?;
        writeln!(f, "  triples:      {}", self.triple_count)?;
        writeln!(f, "  classes:      {}", self.class_count)?;
        writeln!(f, "  relations:    {}", self.relation_count)?;
        writeln!(f, "  subclassed:   {}", self.subclass_entries)?;
        writeln!(f, "  identifiers:  {}", self.identifiers)?;
        writeln!(f, "  sensor marks: {}", self.sensor_marks)?;
        writeln!(f, "  session:      {}", self.session_tag)?;
        writeln!(f, "  ancestry:     {}", self.ancestry)?;
        writeln!(f, "  persistent:   {}", self.persistent)?;
        Ok(())
    }
}

impl<S: TripleStore + std::fmt::Debug> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("hierarchy", &self.hierarchy.len())
            .field("session", &self.session.registry.session_tag())
            .finish()
    }
}
