//! Class and relation registrar.
//!
//! Makes sure every class and relation named in a scene is declared
//! (`owl:Class` / `owl:ObjectProperty`) before it is used. Declarations are
//! check-before-insert against the store and the pending change set, so
//! repeated calls never duplicate state.

use std::collections::HashSet;

use oxigraph::model::NamedNode;

use crate::error::SceneKgResult;
use crate::hierarchy::{AncestryMode, ClassHierarchy};
use crate::store::changeset::StagedGraph;
use crate::store::{Triple, TripleStore};
use crate::vocab::{Namespace, OWL_CLASS, OWL_OBJECT_PROPERTY, RDF_TYPE};

/// Outcome of [`Registrar::ensure_class`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassStatus {
    pub iri: NamedNode,
    /// Whether the class was declared before this call.
    pub existed: bool,
    /// The class's ancestry from the hierarchy cache.
    pub ancestry: HashSet<NamedNode>,
}

/// Outcome of [`Registrar::ensure_relation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationStatus {
    pub iri: NamedNode,
    /// Whether the relation was declared before this call.
    pub existed: bool,
}

/// Declares classes and relations on demand.
#[derive(Debug, Clone, Copy)]
pub struct Registrar<'a> {
    namespace: &'a Namespace,
    hierarchy: &'a ClassHierarchy,
    mode: AncestryMode,
}

impl<'a> Registrar<'a> {
    pub fn new(namespace: &'a Namespace, hierarchy: &'a ClassHierarchy, mode: AncestryMode) -> Self {
        Self {
            namespace,
            hierarchy,
            mode,
        }
    }

    fn class_declaration(&self, name: &str) -> SceneKgResult<Triple> {
        Ok(Triple::new(self.namespace.iri(name)?, RDF_TYPE, OWL_CLASS))
    }

    fn relation_declaration(&self, name: &str) -> SceneKgResult<Triple> {
        Ok(Triple::new(
            self.namespace.iri(name)?,
            RDF_TYPE,
            OWL_OBJECT_PROPERTY,
        ))
    }

    /// Whether `name` is declared as a class.
    pub fn class_exists<S: TripleStore + ?Sized>(
        &self,
        graph: &StagedGraph<'_, S>,
        name: &str,
    ) -> SceneKgResult<bool> {
        Ok(graph.contains(&self.class_declaration(name)?)?)
    }

    /// Whether `name` is declared as a relation.
    pub fn relation_exists<S: TripleStore + ?Sized>(
        &self,
        graph: &StagedGraph<'_, S>,
        name: &str,
    ) -> SceneKgResult<bool> {
        Ok(graph.contains(&self.relation_declaration(name)?)?)
    }

    /// Ancestry of a class IRI under the configured mode.
    pub fn ancestry(&self, class: &NamedNode) -> HashSet<NamedNode> {
        self.hierarchy.ancestors(class, self.mode)
    }

    /// Declare `name` as a class unless it already is.
    ///
    /// A class created here has no ancestry: new classes are never given a
    /// superclass by the engine.
    pub fn ensure_class<S: TripleStore + ?Sized>(
        &self,
        graph: &mut StagedGraph<'_, S>,
        name: &str,
    ) -> SceneKgResult<ClassStatus> {
        let declaration = self.class_declaration(name)?;
        let existed = !graph.add(declaration.clone())?;
        if !existed {
            tracing::info!(class = name, "added new class");
        }
        let ancestry = self.ancestry(&declaration.subject);
        Ok(ClassStatus {
            iri: declaration.subject,
            existed,
            ancestry,
        })
    }

    /// Declare `name` as a relation unless it already is.
    pub fn ensure_relation<S: TripleStore + ?Sized>(
        &self,
        graph: &mut StagedGraph<'_, S>,
        name: &str,
    ) -> SceneKgResult<RelationStatus> {
        let declaration = self.relation_declaration(name)?;
        let existed = !graph.add(declaration.clone())?;
        if !existed {
            tracing::info!(relation = name, "added new relation");
        }
        Ok(RelationStatus {
            iri: declaration.subject,
            existed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OxigraphStore;
    use crate::vocab::RDFS_SUBCLASS_OF;

    fn seeded_store(ns: &Namespace) -> OxigraphStore {
        let mut store = OxigraphStore::in_memory().unwrap();
        for class in ["Car", "FourWheeledVehicle"] {
            store
                .add_triple(&Triple::new(ns.iri(class).unwrap(), RDF_TYPE, OWL_CLASS))
                .unwrap();
        }
        store
            .add_triple(&Triple::new(
                ns.iri("Car").unwrap(),
                RDFS_SUBCLASS_OF,
                ns.iri("FourWheeledVehicle").unwrap(),
            ))
            .unwrap();
        store
            .add_triple(&Triple::new(
                ns.iri("isNextTo").unwrap(),
                RDF_TYPE,
                OWL_OBJECT_PROPERTY,
            ))
            .unwrap();
        store
    }

    #[test]
    fn existing_class_reports_ancestry() {
        let ns = Namespace::default();
        let store = seeded_store(&ns);
        let hierarchy = ClassHierarchy::load(&store).unwrap();
        let registrar = Registrar::new(&ns, &hierarchy, AncestryMode::Direct);

        let mut graph = StagedGraph::new(&store);
        let status = registrar.ensure_class(&mut graph, "Car").unwrap();
        assert!(status.existed);
        assert!(status
            .ancestry
            .contains(&ns.iri("FourWheeledVehicle").unwrap()));
        assert!(graph.changes().is_empty());
    }

    #[test]
    fn ensure_class_is_idempotent() {
        let ns = Namespace::default();
        let store = seeded_store(&ns);
        let hierarchy = ClassHierarchy::load(&store).unwrap();
        let registrar = Registrar::new(&ns, &hierarchy, AncestryMode::Direct);

        let mut graph = StagedGraph::new(&store);
        let first = registrar.ensure_class(&mut graph, "Truck").unwrap();
        let second = registrar.ensure_class(&mut graph, "Truck").unwrap();
        assert!(!first.existed);
        assert!(second.existed);
        assert!(first.ancestry.is_empty());
        assert_eq!(graph.changes().len(), 1);
        assert!(registrar.class_exists(&graph, "Truck").unwrap());
    }

    #[test]
    fn ensure_relation_is_idempotent() {
        let ns = Namespace::default();
        let store = seeded_store(&ns);
        let hierarchy = ClassHierarchy::new();
        let registrar = Registrar::new(&ns, &hierarchy, AncestryMode::Direct);

        let mut graph = StagedGraph::new(&store);
        assert!(registrar.ensure_relation(&mut graph, "isNextTo").unwrap().existed);
        assert!(!registrar.ensure_relation(&mut graph, "rides").unwrap().existed);
        assert!(registrar.ensure_relation(&mut graph, "rides").unwrap().existed);
        assert_eq!(graph.changes().len(), 1);
    }

    #[test]
    fn exists_checks_are_pure() {
        let ns = Namespace::default();
        let store = seeded_store(&ns);
        let hierarchy = ClassHierarchy::new();
        let registrar = Registrar::new(&ns, &hierarchy, AncestryMode::Direct);

        let graph = StagedGraph::new(&store);
        assert!(registrar.class_exists(&graph, "Car").unwrap());
        assert!(!registrar.class_exists(&graph, "Truck").unwrap());
        assert!(registrar.relation_exists(&graph, "isNextTo").unwrap());
        assert!(!registrar.relation_exists(&graph, "Car").unwrap());
        assert!(graph.changes().is_empty());
    }
}
