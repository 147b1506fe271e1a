//! Ontology vocabulary: namespaces and the well-known terms the engine emits.

use oxigraph::model::{NamedNode, NamedNodeRef};
use serde::{Deserialize, Serialize};

use crate::error::StatementError;

/// Namespace of the scene ontology.
pub const DEFAULT_NAMESPACE: &str = "http://www.semanticweb.org/ardesilva/KnowledgeGraph#";
/// OWL-Time namespace, listed alongside the scene ontology.
pub const TIME_NAMESPACE: &str = "http://www.w3.org/2006/time#";
/// GeoSPARQL namespace, listed alongside the scene ontology.
pub const GEOSPATIAL_NAMESPACE: &str = "http://www.opengis.net/ont/geosparql#";

pub const RDF_TYPE: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
pub const RDFS_SUBCLASS_OF: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2000/01/rdf-schema#subClassOf");
pub const OWL_CLASS: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");
pub const OWL_OBJECT_PROPERTY: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");
pub const OWL_NAMED_INDIVIDUAL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#NamedIndividual");

/// Class names the engine relies on, local to the scene namespace.
pub mod class {
    pub const SCENE: &str = "Scene";
    pub const TWO_WHEELED_VEHICLE: &str = "TwoWheeledVehicle";
    pub const FOUR_WHEELED_VEHICLE: &str = "FourWheeledVehicle";
    pub const PERSON: &str = "Person";
    pub const RIDER: &str = "Rider";
}

/// Relation names the engine emits, local to the scene namespace.
pub mod relation {
    pub const OBSERVES: &str = "observes";
    pub const OBSERVED_BY: &str = "observedBy";
    pub const IS_INSTALLED_ON: &str = "isInstalledOn";
    pub const HAS_SENSOR: &str = "hasSensor";
    pub const IS_A_PARTICIPANT_OF_SCENE: &str = "isAParticipantOfScene";
    pub const INCLUDES: &str = "includes";
}

/// An IRI prefix under which local names are minted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    base: String,
}

impl Namespace {
    /// Create a namespace from its base IRI (usually ending in `#` or `/`).
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// The base IRI.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Build the IRI for a local name.
    pub fn iri(&self, local: &str) -> Result<NamedNode, StatementError> {
        NamedNode::new(format!("{}{local}", self.base)).map_err(|e| StatementError::InvalidTerm {
            term: local.to_string(),
            message: e.to_string(),
        })
    }

    /// Strip the namespace from an IRI, if it belongs to it.
    pub fn local_name<'a>(&self, iri: &'a str) -> Option<&'a str> {
        iri.strip_prefix(self.base.as_str())
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

/// Classes and relations declared in the store, by local name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub classes: Vec<String>,
    pub relations: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary from declared IRIs, keeping those under any of the
    /// given namespaces. Output is sorted and de-duplicated.
    pub fn from_declared<'a>(
        namespaces: &[Namespace],
        classes: impl IntoIterator<Item = &'a NamedNode>,
        relations: impl IntoIterator<Item = &'a NamedNode>,
    ) -> Self {
        Self {
            classes: localize(namespaces, classes),
            relations: localize(namespaces, relations),
        }
    }
}

fn localize<'a>(
    namespaces: &[Namespace],
    nodes: impl IntoIterator<Item = &'a NamedNode>,
) -> Vec<String> {
    let mut names: Vec<String> = nodes
        .into_iter()
        .filter_map(|n| {
            namespaces
                .iter()
                .find_map(|ns| ns.local_name(n.as_str()))
                .map(str::to_string)
        })
        .collect();
    names.sort();
    names.dedup();
    names
}

impl std::fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Entities: {}", self.classes.join(", "))?;
        write!(f, "Relations: {}", self.relations.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iri_appends_local_name() {
        let ns = Namespace::default();
        let car = ns.iri("Car").unwrap();
        assert_eq!(car.as_str(), format!("{DEFAULT_NAMESPACE}Car"));
        assert_eq!(ns.local_name(car.as_str()), Some("Car"));
    }

    #[test]
    fn invalid_local_name_is_rejected() {
        let ns = Namespace::default();
        let err = ns.iri("Car<1>").unwrap_err();
        assert!(matches!(err, StatementError::InvalidTerm { .. }));
    }

    #[test]
    fn vocabulary_keeps_known_namespaces_only() {
        let ns = Namespace::default();
        let time = Namespace::new(TIME_NAMESPACE);
        let classes = vec![
            ns.iri("Car").unwrap(),
            time.iri("Instant").unwrap(),
            NamedNode::new("http://example.org/Other").unwrap(),
            ns.iri("Bicycle").unwrap(),
        ];
        let relations = vec![ns.iri("isNextTo").unwrap()];
        let vocab = Vocabulary::from_declared(&[ns, time], &classes, &relations);
        assert_eq!(vocab.classes, vec!["Bicycle", "Car", "Instant"]);
        assert_eq!(vocab.relations, vec!["isNextTo"]);
    }
}
