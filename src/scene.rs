//! Scene assembly: statements → staged graph changes.
//!
//! [`SceneAssembler::build`] turns parsed statements into a [`ChangeSet`]
//! without touching the store. Committing the change set and swapping in the
//! updated [`Session`] is left to the caller, so a failed assembly leaves
//! neither the store nor the session half-updated.

use std::collections::{BTreeSet, HashSet};

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::error::SceneKgResult;
use crate::hierarchy::{AncestryMode, ClassHierarchy};
use crate::registrar::Registrar;
use crate::registry::IdentifierRegistry;
use crate::sensor::{AttachedSensor, SensorAttacher, SensorMarks};
use crate::statement::{EntityName, Statement, distinct_objects, distinct_subjects};
use crate::store::changeset::{ChangeSet, StagedGraph};
use crate::store::{Triple, TripleStore};
use crate::vocab::{Namespace, OWL_NAMED_INDIVIDUAL, RDF_TYPE, class, relation};

/// Entities whose class has one of these in its ancestry take part in the scene.
pub const PARTICIPANT_ANCESTORS: [&str; 3] = [
    class::TWO_WHEELED_VEHICLE,
    class::FOUR_WHEELED_VEHICLE,
    class::PERSON,
];

/// Classes and relations a scene would add to the ontology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenePreview {
    pub new_classes: BTreeSet<String>,
    pub new_relations: BTreeSet<String>,
}

impl ScenePreview {
    pub fn is_empty(&self) -> bool {
        self.new_classes.is_empty() && self.new_relations.is_empty()
    }
}

impl std::fmt::Display for ScenePreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_empty() {
            writeln!(f, "New items to be added:")?;
            if !self.new_classes.is_empty() {
                let classes: Vec<&str> = self.new_classes.iter().map(String::as_str).collect();
                writeln!(f, "Classes: {}", classes.join(", "))?;
            }
            if !self.new_relations.is_empty() {
                let relations: Vec<&str> =
                    self.new_relations.iter().map(String::as_str).collect();
                writeln!(f, "Relations: {}", relations.join(", "))?;
            }
        }
        write!(f, "\nProceeding to create/update the scene graph.")
    }
}

/// Position in which an entity first appeared in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Subject,
    Object,
}

/// What assembly did for one distinct entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub token: String,
    pub class_name: String,
    pub iri: NamedNode,
    pub role: Role,
    /// The entity's class was declared by this scene.
    pub class_created: bool,
    /// The entity's identifier was minted by this scene.
    pub identifier_created: bool,
    /// Linked to the scene node.
    pub participant: bool,
    pub sensors: Vec<AttachedSensor>,
}

/// Result of assembling one scene description.
#[derive(Debug, Clone)]
pub struct SceneReport {
    pub scene: NamedNode,
    pub preview: ScenePreview,
    pub entities: Vec<EntityRecord>,
    /// Human-readable account of every step, in order.
    pub log: Vec<String>,
    /// Triples inserted into the store, in insertion order.
    pub triples: Vec<Triple>,
}

impl SceneReport {
    pub fn sensors(&self) -> impl Iterator<Item = &AttachedSensor> {
        self.entities.iter().flat_map(|e| e.sensors.iter())
    }

    pub fn entity(&self, token: &str) -> Option<&EntityRecord> {
        self.entities.iter().find(|e| e.token == token)
    }

    pub fn triples_added(&self) -> usize {
        self.triples.len()
    }
}

impl std::fmt::Display for SceneReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for line in &self.log {
            writeln!(f, "{line}")?;
        }
        write!(
            f,
            "Scene {}: {} entities, {} sensors, {} triples added",
            self.scene,
            self.entities.len(),
            self.sensors().count(),
            self.triples_added(),
        )
    }
}

/// Per-session state carried across scenes.
#[derive(Debug, Clone)]
pub struct Session {
    pub registry: IdentifierRegistry,
    pub marks: SensorMarks,
}

impl Session {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            registry: IdentifierRegistry::new(namespace),
            marks: SensorMarks::new(),
        }
    }

    pub fn with_registry(registry: IdentifierRegistry) -> Self {
        Self {
            registry,
            marks: SensorMarks::new(),
        }
    }
}

/// Builds scene graphs over a read-only view of the store.
pub struct SceneAssembler<'a, S: TripleStore + ?Sized> {
    store: &'a S,
    namespace: &'a Namespace,
    hierarchy: &'a ClassHierarchy,
    mode: AncestryMode,
}

impl<'a, S: TripleStore + ?Sized> SceneAssembler<'a, S> {
    pub fn new(
        store: &'a S,
        namespace: &'a Namespace,
        hierarchy: &'a ClassHierarchy,
        mode: AncestryMode,
    ) -> Self {
        Self {
            store,
            namespace,
            hierarchy,
            mode,
        }
    }

    fn registrar(&self) -> Registrar<'a> {
        Registrar::new(self.namespace, self.hierarchy, self.mode)
    }

    /// Classes and relations the statements would add. Never mutates anything.
    pub fn preview(&self, statements: &[Statement]) -> SceneKgResult<ScenePreview> {
        let registrar = self.registrar();
        let graph = StagedGraph::new(self.store);
        let mut preview = ScenePreview::default();
        for statement in statements {
            for name in [&statement.subject, &statement.object] {
                if !registrar.class_exists(&graph, name.class_name())? {
                    preview.new_classes.insert(name.class_name().to_string());
                }
            }
            if !registrar.relation_exists(&graph, &statement.predicate)? {
                preview.new_relations.insert(statement.predicate.clone());
            }
        }
        Ok(preview)
    }

    /// Stage the full scene graph for `statements`, updating `session` as
    /// identifiers are minted and sensors attached.
    pub fn build(
        &self,
        statements: &[Statement],
        session: &mut Session,
    ) -> SceneKgResult<(ChangeSet, SceneReport)> {
        let preview = self.preview(statements)?;
        let registrar = self.registrar();
        let mut graph = StagedGraph::new(self.store);
        let mut log = Vec::new();

        let scene = session.registry.mint(class::SCENE)?;
        graph.add(Triple::new(scene.clone(), RDF_TYPE, OWL_NAMED_INDIVIDUAL))?;
        graph.add(Triple::new(
            scene.clone(),
            RDF_TYPE,
            self.namespace.iri(class::SCENE)?,
        ))?;
        tracing::debug!(scene = %scene, statements = statements.len(), "assembling scene");

        let participant_classes = PARTICIPANT_ANCESTORS
            .iter()
            .map(|name| self.namespace.iri(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut placed = HashSet::new();
        let mut entities = Vec::new();
        let roles = distinct_subjects(statements)
            .into_iter()
            .map(|name| (name, Role::Subject))
            .chain(
                distinct_objects(statements)
                    .into_iter()
                    .map(|name| (name, Role::Object)),
            );
        for (name, role) in roles {
            if !placed.insert(name.as_str()) {
                continue;
            }
            let record = self.place_entity(
                &mut graph,
                session,
                &registrar,
                &participant_classes,
                &scene,
                name,
                role,
                &mut log,
            )?;
            entities.push(record);
        }

        for statement in statements {
            let rel = registrar.ensure_relation(&mut graph, &statement.predicate)?;
            if !rel.existed {
                log.push(format!("Created new relation: {}", statement.predicate));
            }
            let subject = session.registry.resolve(statement.subject.as_str())?.iri;
            let object = session.registry.resolve(statement.object.as_str())?.iri;
            graph.add(Triple::new(subject, rel.iri, object))?;
            log.push(format!("Created relation: {statement}"));
        }

        let changes = graph.into_changes();
        let report = SceneReport {
            scene,
            preview,
            entities,
            log,
            triples: changes.iter().cloned().collect(),
        };
        Ok((changes, report))
    }

    #[allow(clippy::too_many_arguments)]
    fn place_entity(
        &self,
        graph: &mut StagedGraph<'a, S>,
        session: &mut Session,
        registrar: &Registrar<'_>,
        participant_classes: &[NamedNode],
        scene: &NamedNode,
        name: &EntityName,
        role: Role,
        log: &mut Vec<String>,
    ) -> SceneKgResult<EntityRecord> {
        let class = registrar.ensure_class(graph, name.class_name())?;
        if !class.existed {
            log.push(format!("Created new class: {}", name.class_name()));
        }

        let resolved = session.registry.resolve(name.as_str())?;
        let iri = resolved.iri;
        graph.add(Triple::new(iri.clone(), RDF_TYPE, OWL_NAMED_INDIVIDUAL))?;
        graph.add(Triple::new(iri.clone(), RDF_TYPE, class.iri.clone()))?;

        let sensors = match role {
            Role::Subject => {
                let mut attacher = SensorAttacher {
                    graph: &mut *graph,
                    registry: &mut session.registry,
                    marks: &mut session.marks,
                    namespace: self.namespace,
                };
                attacher.attach(&iri, name.class_name(), &class.ancestry)?
            }
            Role::Object => Vec::new(),
        };
        for sensor in &sensors {
            log.push(format!("Attached {} to {}", sensor.kind, name));
        }

        let participant = participant_classes
            .iter()
            .any(|c| class.ancestry.contains(c));
        if participant {
            graph.add(Triple::new(
                iri.clone(),
                self.namespace.iri(relation::IS_A_PARTICIPANT_OF_SCENE)?,
                scene.clone(),
            ))?;
            graph.add(Triple::new(
                scene.clone(),
                self.namespace.iri(relation::INCLUDES)?,
                iri.clone(),
            ))?;
            log.push(format!("Created scene relation for {name}"));
        }

        Ok(EntityRecord {
            token: name.as_str().to_string(),
            class_name: name.class_name().to_string(),
            iri,
            role,
            class_created: !class.existed,
            identifier_created: resolved.created,
            participant,
            sensors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorKind;
    use crate::statement::parse_scene;
    use crate::store::OxigraphStore;
    use crate::vocab::{OWL_CLASS, OWL_OBJECT_PROPERTY, RDFS_SUBCLASS_OF};

    fn ontology(ns: &Namespace) -> OxigraphStore {
        let mut store = OxigraphStore::in_memory().unwrap();
        let subclasses = [
            ("Car", "FourWheeledVehicle"),
            ("Bicycle", "TwoWheeledVehicle"),
            ("Pedestrian", "Person"),
            ("Rider", "Person"),
        ];
        for (class, parent) in subclasses {
            for name in [class, parent] {
                store
                    .add_triple(&Triple::new(ns.iri(name).unwrap(), RDF_TYPE, OWL_CLASS))
                    .unwrap();
            }
            store
                .add_triple(&Triple::new(
                    ns.iri(class).unwrap(),
                    RDFS_SUBCLASS_OF,
                    ns.iri(parent).unwrap(),
                ))
                .unwrap();
        }
        store
            .add_triple(&Triple::new(
                ns.iri("isNextTo").unwrap(),
                RDF_TYPE,
                OWL_OBJECT_PROPERTY,
            ))
            .unwrap();
        store
    }

    fn session(ns: &Namespace) -> Session {
        Session::with_registry(IdentifierRegistry::with_session_tag(ns.clone(), "s1"))
    }

    #[test]
    fn preview_lists_unknown_terms_only() {
        let ns = Namespace::default();
        let store = ontology(&ns);
        let hierarchy = ClassHierarchy::load(&store).unwrap();
        let assembler = SceneAssembler::new(&store, &ns, &hierarchy, AncestryMode::Direct);

        let statements = parse_scene("Truck1 isNextTo Car1\nTruck1 overtakes Bus2").unwrap();
        let preview = assembler.preview(&statements).unwrap();
        assert_eq!(
            preview.new_classes,
            BTreeSet::from(["Bus".to_string(), "Truck".to_string()])
        );
        assert_eq!(preview.new_relations, BTreeSet::from(["overtakes".to_string()]));

        let before = store.len().unwrap();
        assembler.preview(&statements).unwrap();
        assert_eq!(store.len().unwrap(), before);
    }

    #[test]
    fn preview_message_matches_prompt() {
        let preview = ScenePreview {
            new_classes: BTreeSet::from(["Truck".to_string()]),
            new_relations: BTreeSet::new(),
        };
        assert_eq!(
            preview.to_string(),
            "New items to be added:\nClasses: Truck\n\nProceeding to create/update the scene graph."
        );
        assert_eq!(
            ScenePreview::default().to_string(),
            "\nProceeding to create/update the scene graph."
        );
    }

    #[test]
    fn build_stages_without_touching_store() {
        let ns = Namespace::default();
        let store = ontology(&ns);
        let hierarchy = ClassHierarchy::load(&store).unwrap();
        let assembler = SceneAssembler::new(&store, &ns, &hierarchy, AncestryMode::Direct);
        let mut session = session(&ns);

        let before = store.len().unwrap();
        let statements = parse_scene("Bicycle1 isNextTo Car1").unwrap();
        let (changes, report) = assembler.build(&statements, &mut session).unwrap();
        assert_eq!(store.len().unwrap(), before);
        assert_eq!(report.triples_added(), changes.len());
        assert!(report.triples.iter().eq(changes.iter()));

        let bike = report.entity("Bicycle1").unwrap();
        assert_eq!(bike.role, Role::Subject);
        assert!(bike.participant);
        let kinds: Vec<_> = bike.sensors.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SensorKind::Bicycle, SensorKind::Environmental]);

        let car = report.entity("Car1").unwrap();
        assert_eq!(car.role, Role::Object);
        assert!(car.participant);
        assert!(car.sensors.is_empty());

        let link = Triple::new(
            bike.iri.clone(),
            ns.iri("isNextTo").unwrap(),
            car.iri.clone(),
        );
        assert!(changes.contains(&link));
    }

    #[test]
    fn unknown_classes_are_created_but_not_participants() {
        let ns = Namespace::default();
        let store = ontology(&ns);
        let hierarchy = ClassHierarchy::load(&store).unwrap();
        let assembler = SceneAssembler::new(&store, &ns, &hierarchy, AncestryMode::Direct);
        let mut session = session(&ns);

        let statements = parse_scene("Truck1 overtakes Bus2").unwrap();
        let (changes, report) = assembler.build(&statements, &mut session).unwrap();
        for token in ["Truck1", "Bus2"] {
            let entity = report.entity(token).unwrap();
            assert!(entity.class_created);
            assert!(!entity.participant);
            assert!(entity.sensors.is_empty());
        }
        assert!(changes.contains(&Triple::new(
            ns.iri("overtakes").unwrap(),
            RDF_TYPE,
            OWL_OBJECT_PROPERTY
        )));
        assert!(report.log.contains(&"Created new class: Truck".to_string()));
        assert!(report.log.contains(&"Created new relation: overtakes".to_string()));
        assert!(report
            .log
            .contains(&"Created relation: Truck1 overtakes Bus2".to_string()));
    }

    #[test]
    fn entity_seen_as_subject_and_object_is_placed_once() {
        let ns = Namespace::default();
        let store = ontology(&ns);
        let hierarchy = ClassHierarchy::load(&store).unwrap();
        let assembler = SceneAssembler::new(&store, &ns, &hierarchy, AncestryMode::Direct);
        let mut session = session(&ns);

        let statements =
            parse_scene("Rider1 rides Bicycle1\nBicycle1 isNextTo Car1\nCar1 isNextTo Bicycle1")
                .unwrap();
        let (_, report) = assembler.build(&statements, &mut session).unwrap();
        let tokens: Vec<_> = report.entities.iter().map(|e| e.token.as_str()).collect();
        assert_eq!(tokens, vec!["Rider1", "Bicycle1", "Car1"]);

        // Car1 is a subject of the third line, so it gets a vehicle sensor.
        let car = report.entity("Car1").unwrap();
        assert_eq!(car.role, Role::Subject);
        assert!(car.sensors.iter().any(|s| s.kind == SensorKind::Vehicle));

        let rider = report.entity("Rider1").unwrap();
        let kinds: Vec<_> = rider.sensors.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SensorKind::SmartPhone]);
        assert!(rider.participant);
    }

    #[test]
    fn each_build_mints_a_new_scene() {
        let ns = Namespace::default();
        let store = ontology(&ns);
        let hierarchy = ClassHierarchy::load(&store).unwrap();
        let assembler = SceneAssembler::new(&store, &ns, &hierarchy, AncestryMode::Direct);
        let mut session = session(&ns);

        let statements = parse_scene("Car1 isNextTo Pedestrian1").unwrap();
        let (_, first) = assembler.build(&statements, &mut session).unwrap();
        let (_, second) = assembler.build(&statements, &mut session).unwrap();
        assert_ne!(first.scene, second.scene);
        assert_eq!(
            first.entity("Car1").unwrap().iri,
            second.entity("Car1").unwrap().iri
        );
        // The marks held by the session stop a second vehicle sensor.
        assert!(second.entity("Car1").unwrap().sensors.is_empty());
    }
}
