//! Class hierarchy cache built from `rdfs:subClassOf` statements.
//!
//! Loaded once per session from the store. Sensor rules and scene
//! participation look at a class's ancestry, which is either its direct
//! superclasses only ([`AncestryMode::Direct`]) or the full transitive closure
//! ([`AncestryMode::Transitive`]).

use std::collections::{HashMap, HashSet, VecDeque};

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::store::TripleStore;
use crate::vocab::RDFS_SUBCLASS_OF;

/// How far up the hierarchy ancestry lookups go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AncestryMode {
    /// Only declared direct superclasses.
    #[default]
    Direct,
    /// All superclasses, following `rdfs:subClassOf` transitively.
    Transitive,
}

/// Cached class → direct superclasses map.
#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    parents: HashMap<NamedNode, HashSet<NamedNode>>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cache from every `rdfs:subClassOf` triple in the store.
    pub fn load<S: TripleStore + ?Sized>(store: &S) -> StoreResult<Self> {
        let pairs = store.pairs_for_predicate(RDFS_SUBCLASS_OF)?;
        let hierarchy = Self::from_pairs(pairs);
        tracing::debug!(classes = hierarchy.len(), "loaded class hierarchy");
        Ok(hierarchy)
    }

    /// Build the cache from `(class, superclass)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (NamedNode, NamedNode)>) -> Self {
        let mut hierarchy = Self::new();
        for (class, parent) in pairs {
            hierarchy.insert(class, parent);
        }
        hierarchy
    }

    /// Record that `class` is a direct subclass of `parent`.
    pub fn insert(&mut self, class: NamedNode, parent: NamedNode) {
        self.parents.entry(class).or_default().insert(parent);
    }

    /// Direct superclasses of `class` (empty if none are declared).
    pub fn direct_parents(&self, class: &NamedNode) -> HashSet<NamedNode> {
        self.parents.get(class).cloned().unwrap_or_default()
    }

    /// Ancestry of `class` under the given mode. Never contains `class`
    /// itself unless the hierarchy has a cycle through it.
    pub fn ancestors(&self, class: &NamedNode, mode: AncestryMode) -> HashSet<NamedNode> {
        match mode {
            AncestryMode::Direct => self.direct_parents(class),
            AncestryMode::Transitive => self.transitive_ancestors(class),
        }
    }

    fn transitive_ancestors(&self, class: &NamedNode) -> HashSet<NamedNode> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(class);
        while let Some(current) = queue.pop_front() {
            if let Some(parents) = self.parents.get(current) {
                for parent in parents {
                    if visited.insert(parent.clone()) {
                        queue.push_back(parent);
                    }
                }
            }
        }
        visited
    }

    /// Number of classes with at least one declared superclass.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{OxigraphStore, Triple};

    fn iri(local: &str) -> NamedNode {
        NamedNode::new(format!("http://example.org/kg#{local}")).unwrap()
    }

    fn sample() -> ClassHierarchy {
        ClassHierarchy::from_pairs([
            (iri("SportsCar"), iri("Car")),
            (iri("Car"), iri("FourWheeledVehicle")),
            (iri("Car"), iri("Product")),
            (iri("FourWheeledVehicle"), iri("Vehicle")),
        ])
    }

    #[test]
    fn direct_ancestry() {
        let h = sample();
        assert_eq!(
            h.ancestors(&iri("Car"), AncestryMode::Direct),
            HashSet::from([iri("FourWheeledVehicle"), iri("Product")])
        );
        assert_eq!(
            h.ancestors(&iri("SportsCar"), AncestryMode::Direct),
            HashSet::from([iri("Car")])
        );
        assert!(h.ancestors(&iri("Unknown"), AncestryMode::Direct).is_empty());
    }

    #[test]
    fn transitive_ancestry() {
        let h = sample();
        assert_eq!(
            h.ancestors(&iri("SportsCar"), AncestryMode::Transitive),
            HashSet::from([
                iri("Car"),
                iri("FourWheeledVehicle"),
                iri("Product"),
                iri("Vehicle"),
            ])
        );
    }

    #[test]
    fn cycles_terminate() {
        let h = ClassHierarchy::from_pairs([(iri("A"), iri("B")), (iri("B"), iri("A"))]);
        assert_eq!(
            h.ancestors(&iri("A"), AncestryMode::Transitive),
            HashSet::from([iri("A"), iri("B")])
        );
    }

    #[test]
    fn loads_from_store() {
        let mut store = OxigraphStore::in_memory().unwrap();
        store
            .add_triple(&Triple::new(iri("Car"), RDFS_SUBCLASS_OF, iri("FourWheeledVehicle")))
            .unwrap();
        store
            .add_triple(&Triple::new(iri("Bicycle"), RDFS_SUBCLASS_OF, iri("TwoWheeledVehicle")))
            .unwrap();

        let h = ClassHierarchy::load(&store).unwrap();
        assert_eq!(h.len(), 2);
        assert!(h
            .direct_parents(&iri("Bicycle"))
            .contains(&iri("TwoWheeledVehicle")));
    }
}
