//! Export types for serializing engine results.
//!
//! These types provide plain-string representations of scene reports,
//! sensors, triples and engine statistics suitable for JSON export.

use serde::{Deserialize, Serialize};

use crate::engine::EngineInfo;
use crate::scene::{EntityRecord, Role, ScenePreview, SceneReport};
use crate::sensor::{AttachedSensor, SensorKind};
use crate::store::Triple;

/// Exported triple with full IRIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleExport {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl From<&Triple> for TripleExport {
    fn from(triple: &Triple) -> Self {
        Self {
            subject: triple.subject.as_str().to_string(),
            predicate: triple.predicate.as_str().to_string(),
            object: triple.object.as_str().to_string(),
        }
    }
}

/// Exported sensor cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorExport {
    /// Sensor kind.
    pub kind: SensorKind,
    /// Ontology class of the sensor node.
    pub class: String,
    /// Sensor node IRI.
    pub iri: String,
    /// IRIs of the observed-property nodes.
    pub properties: Vec<String>,
}

impl From<&AttachedSensor> for SensorExport {
    fn from(sensor: &AttachedSensor) -> Self {
        Self {
            kind: sensor.kind,
            class: sensor.kind.class_name().to_string(),
            iri: sensor.iri.as_str().to_string(),
            properties: sensor
                .properties
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        }
    }
}

/// Exported scene entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityExport {
    /// Token as written in the scene description.
    pub token: String,
    pub class_name: String,
    pub iri: String,
    pub role: Role,
    pub class_created: bool,
    pub identifier_created: bool,
    /// Linked to the scene node.
    pub participant: bool,
    pub sensors: Vec<SensorExport>,
}

impl From<&EntityRecord> for EntityExport {
    fn from(entity: &EntityRecord) -> Self {
        Self {
            token: entity.token.clone(),
            class_name: entity.class_name.clone(),
            iri: entity.iri.as_str().to_string(),
            role: entity.role,
            class_created: entity.class_created,
            identifier_created: entity.identifier_created,
            participant: entity.participant,
            sensors: entity.sensors.iter().map(SensorExport::from).collect(),
        }
    }
}

/// Exported preview of new ontology terms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewExport {
    pub new_classes: Vec<String>,
    pub new_relations: Vec<String>,
}

impl From<&ScenePreview> for PreviewExport {
    fn from(preview: &ScenePreview) -> Self {
        Self {
            new_classes: preview.new_classes.iter().cloned().collect(),
            new_relations: preview.new_relations.iter().cloned().collect(),
        }
    }
}

/// Exported scene report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneReportExport {
    /// Scene node IRI.
    pub scene: String,
    pub preview: PreviewExport,
    pub entities: Vec<EntityExport>,
    pub log: Vec<String>,
    pub triples_added: usize,
    /// Every triple the scene inserted.
    pub triples: Vec<TripleExport>,
}

impl From<&SceneReport> for SceneReportExport {
    fn from(report: &SceneReport) -> Self {
        Self {
            scene: report.scene.as_str().to_string(),
            preview: PreviewExport::from(&report.preview),
            entities: report.entities.iter().map(EntityExport::from).collect(),
            log: report.log.clone(),
            triples_added: report.triples_added(),
            triples: report.triples.iter().map(TripleExport::from).collect(),
        }
    }
}

/// Exported engine statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoExport {
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

impl From<&EngineInfo> for InfoExport {
    fn from(info: &EngineInfo) -> Self {
        Self {
            namespace: info.namespace.clone(),
            triple_count: info.triple_count,
            class_count: info.class_count,
            relation_count: info.relation_count,
            subclass_entries: info.subclass_entries,
            identifiers: info.identifiers,
            sensor_marks: info.sensor_marks,
            session_tag: info.session_tag.clone(),
            ancestry: info.ancestry.clone(),
            persistent: info.persistent,
        }
    }
}
