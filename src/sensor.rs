//! Sensor sub-graphs attached to scene entities.
//!
//! Which sensors an entity gets is decided by [`SENSOR_RULES`], a table keyed
//! on the entity's class and ancestry. What a sensor looks like (ontology
//! class, identifier prefix, observed properties) is decided by the
//! [`SensorKind`] table. Adding a sensor kind or rule is a data change.
//!
//! A sensor cluster is:
//!
//! ```text
//! sensor  rdf:type       owl:NamedIndividual, :<SensorClass>
//! prop_i  rdf:type       :<Property_i>
//! sensor  :observes      prop_i
//! prop_i  :observedBy    sensor
//! sensor  :isInstalledOn host      (installed sensors only)
//! host    :hasSensor     sensor
//! ```
//!
//! The sensor node and all its property nodes share one disambiguator.

use std::collections::HashSet;

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::error::SceneKgResult;
use crate::registry::IdentifierRegistry;
use crate::store::changeset::StagedGraph;
use crate::store::{Triple, TripleStore};
use crate::vocab::{Namespace, OWL_NAMED_INDIVIDUAL, RDF_TYPE, class, relation};

// ---------------------------------------------------------------------------
// Sensor kinds
// ---------------------------------------------------------------------------

/// Closed set of sensor kinds the engine can attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Bicycle,
    Vehicle,
    Environmental,
    SmartPhone,
}

/// Static description of a sensor kind.
#[derive(Debug)]
pub struct SensorProfile {
    /// Ontology class of the sensor node.
    pub class: &'static str,
    /// Prefix of the sensor node's identifier.
    pub prefix: &'static str,
    /// Ontology classes of the observed-property nodes.
    pub properties: &'static [&'static str],
}

const BICYCLE: SensorProfile = SensorProfile {
    class: "BicycleSensor",
    prefix: "BicSensor",
    properties: &[
        "Latitude",
        "Longitude",
        "BicycleBrakesCondition",
        "Speed",
        "ProximityToClosestVehicle",
        "ProximityToClosestPedestrian",
    ],
};

const VEHICLE: SensorProfile = SensorProfile {
    class: "VehicleSensor",
    prefix: "VehSensor",
    properties: &[
        "Latitude",
        "Longitude",
        "DoorLockStatus",
        "Acceleration",
        "Speed",
        "ProximityToClosestVehicle",
        "ProximityToClosestPedestrian",
    ],
};

const ENVIRONMENTAL: SensorProfile = SensorProfile {
    class: "EnvironmentalSensor",
    prefix: "EnvSensor",
    properties: &["Temperature", "Humidity", "WindSpeed", "AtmosphericPressure"],
};

const SMART_PHONE: SensorProfile = SensorProfile {
    class: "SmartPhoneSensor",
    prefix: "SmartPhoneSensor",
    properties: &["RespiratoryRate", "HeartRate"],
};

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Bicycle,
        SensorKind::Vehicle,
        SensorKind::Environmental,
        SensorKind::SmartPhone,
    ];

    pub fn profile(self) -> &'static SensorProfile {
        match self {
            SensorKind::Bicycle => &BICYCLE,
            SensorKind::Vehicle => &VEHICLE,
            SensorKind::Environmental => &ENVIRONMENTAL,
            SensorKind::SmartPhone => &SMART_PHONE,
        }
    }

    /// Ontology class name, e.g. `BicycleSensor`.
    pub fn class_name(self) -> &'static str {
        self.profile().class
    }

    pub fn properties(self) -> &'static [&'static str] {
        self.profile().properties
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.class_name())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// What an entity must satisfy for a rule to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The class's ancestry contains this class.
    Ancestor(&'static str),
    /// The class is exactly this class.
    Class(&'static str),
}

/// How a sensor is linked to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mounting {
    /// `sensor isInstalledOn host` and `host hasSensor sensor`.
    Installed,
    /// `host hasSensor sensor` only.
    Carried,
}

/// One attachment rule.
#[derive(Debug)]
pub struct SensorRule {
    pub trigger: Trigger,
    pub sensor: SensorKind,
    /// Attach at most one `sensor` of this kind per entity.
    pub once_per_entity: bool,
    /// Extra sensors created each time the rule fires.
    pub companions: &'static [SensorKind],
    pub mounting: Mounting,
}

/// Attachment rules, applied in order. Rules are not exclusive.
pub const SENSOR_RULES: &[SensorRule] = &[
    SensorRule {
        trigger: Trigger::Ancestor(class::TWO_WHEELED_VEHICLE),
        sensor: SensorKind::Bicycle,
        once_per_entity: true,
        companions: &[SensorKind::Environmental],
        mounting: Mounting::Installed,
    },
    SensorRule {
        trigger: Trigger::Class(class::RIDER),
        sensor: SensorKind::SmartPhone,
        once_per_entity: false,
        companions: &[],
        mounting: Mounting::Carried,
    },
    SensorRule {
        trigger: Trigger::Ancestor(class::FOUR_WHEELED_VEHICLE),
        sensor: SensorKind::Vehicle,
        once_per_entity: true,
        companions: &[SensorKind::Environmental],
        mounting: Mounting::Installed,
    },
];

impl SensorRule {
    /// Whether the rule fires for an entity of `class_name` with `ancestry`.
    pub fn matches(
        &self,
        namespace: &Namespace,
        class_name: &str,
        ancestry: &HashSet<NamedNode>,
    ) -> SceneKgResult<bool> {
        Ok(match self.trigger {
            Trigger::Class(name) => class_name == name,
            Trigger::Ancestor(name) => ancestry.contains(&namespace.iri(name)?),
        })
    }
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Entities that already carry a deduplicated sensor kind.
#[derive(Debug, Clone, Default)]
pub struct SensorMarks {
    marks: HashSet<(NamedNode, SensorKind)>,
}

impl SensorMarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, host: &NamedNode, kind: SensorKind) -> bool {
        self.marks.contains(&(host.clone(), kind))
    }

    /// Mark `host` as carrying `kind`. Returns `false` if it already did.
    pub fn mark(&mut self, host: &NamedNode, kind: SensorKind) -> bool {
        self.marks.insert((host.clone(), kind))
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// A sensor cluster created for a host entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedSensor {
    pub kind: SensorKind,
    pub iri: NamedNode,
    pub host: NamedNode,
    pub properties: Vec<NamedNode>,
}

/// Applies [`SENSOR_RULES`] to entities, staging the resulting clusters.
pub struct SensorAttacher<'a, 'g, S: TripleStore + ?Sized> {
    pub graph: &'a mut StagedGraph<'g, S>,
    pub registry: &'a mut IdentifierRegistry,
    pub marks: &'a mut SensorMarks,
    pub namespace: &'a Namespace,
}

impl<S: TripleStore + ?Sized> SensorAttacher<'_, '_, S> {
    /// Attach every sensor the rules call for to `host`.
    pub fn attach(
        &mut self,
        host: &NamedNode,
        class_name: &str,
        ancestry: &HashSet<NamedNode>,
    ) -> SceneKgResult<Vec<AttachedSensor>> {
        let mut attached = Vec::new();
        for rule in SENSOR_RULES {
            if !rule.matches(self.namespace, class_name, ancestry)? {
                continue;
            }
            if rule.once_per_entity && self.marks.has(host, rule.sensor) {
                tracing::debug!(host = %host, sensor = %rule.sensor, "sensor already attached");
                continue;
            }
            attached.push(self.build_cluster(rule.sensor, host, rule.mounting)?);
            if rule.once_per_entity {
                self.marks.mark(host, rule.sensor);
            }
            for &companion in rule.companions {
                attached.push(self.build_cluster(companion, host, rule.mounting)?);
            }
        }
        Ok(attached)
    }

    /// Stage one sensor cluster and link it to `host`.
    pub fn build_cluster(
        &mut self,
        kind: SensorKind,
        host: &NamedNode,
        mounting: Mounting,
    ) -> SceneKgResult<AttachedSensor> {
        let profile = kind.profile();
        let ns = self.namespace;
        let observes = ns.iri(relation::OBSERVES)?;
        let observed_by = ns.iri(relation::OBSERVED_BY)?;

        let n = self.registry.disambiguator();
        let sensor = self.registry.identifier(profile.prefix, n)?;
        self.graph
            .add(Triple::new(sensor.clone(), RDF_TYPE, OWL_NAMED_INDIVIDUAL))?;
        self.graph
            .add(Triple::new(sensor.clone(), RDF_TYPE, ns.iri(profile.class)?))?;

        let mut properties = Vec::with_capacity(profile.properties.len());
        for property in profile.properties {
            let node = self.registry.identifier(property, n)?;
            self.graph
                .add(Triple::new(node.clone(), RDF_TYPE, ns.iri(property)?))?;
            self.graph
                .add(Triple::new(sensor.clone(), observes.clone(), node.clone()))?;
            self.graph
                .add(Triple::new(node.clone(), observed_by.clone(), sensor.clone()))?;
            properties.push(node);
        }

        if mounting == Mounting::Installed {
            self.graph.add(Triple::new(
                sensor.clone(),
                ns.iri(relation::IS_INSTALLED_ON)?,
                host.clone(),
            ))?;
        }
        self.graph.add(Triple::new(
            host.clone(),
            ns.iri(relation::HAS_SENSOR)?,
            sensor.clone(),
        ))?;

        tracing::info!(sensor = %kind, host = %host, "attached sensor");
        Ok(AttachedSensor {
            kind,
            iri: sensor,
            host: host.clone(),
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OxigraphStore;

    struct Fixture {
        ns: Namespace,
        store: OxigraphStore,
        registry: IdentifierRegistry,
        marks: SensorMarks,
    }

    impl Fixture {
        fn new() -> Self {
            let ns = Namespace::default();
            Self {
                registry: IdentifierRegistry::with_session_tag(ns.clone(), "t0"),
                ns,
                store: OxigraphStore::in_memory().unwrap(),
                marks: SensorMarks::new(),
            }
        }

        fn ancestry(&self, names: &[&str]) -> HashSet<NamedNode> {
            names.iter().map(|n| self.ns.iri(n).unwrap()).collect()
        }
    }

    fn kinds(sensors: &[AttachedSensor]) -> Vec<SensorKind> {
        sensors.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn property_tables() {
        assert_eq!(SensorKind::Bicycle.properties().len(), 6);
        assert_eq!(SensorKind::Vehicle.properties().len(), 7);
        assert_eq!(SensorKind::Environmental.properties().len(), 4);
        assert_eq!(SensorKind::SmartPhone.properties(), &["RespiratoryRate", "HeartRate"]);
        for kind in SensorKind::ALL {
            assert!(kind.class_name().ends_with("Sensor"));
        }
    }

    #[test]
    fn two_wheeler_gets_bicycle_and_environmental_once() {
        let mut fx = Fixture::new();
        let ancestry = fx.ancestry(&[class::TWO_WHEELED_VEHICLE]);
        let host = fx.ns.iri("Bicycle1_t0_1").unwrap();
        let mut graph = StagedGraph::new(&fx.store);
        let mut attacher = SensorAttacher {
            graph: &mut graph,
            registry: &mut fx.registry,
            marks: &mut fx.marks,
            namespace: &fx.ns,
        };

        let first = attacher.attach(&host, "Bicycle", &ancestry).unwrap();
        assert_eq!(kinds(&first), vec![SensorKind::Bicycle, SensorKind::Environmental]);
        assert_eq!(first[0].properties.len(), 6);

        let second = attacher.attach(&host, "Bicycle", &ancestry).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn four_wheeler_gets_vehicle_sensor() {
        let mut fx = Fixture::new();
        let ancestry = fx.ancestry(&[class::FOUR_WHEELED_VEHICLE]);
        let host = fx.ns.iri("Car1_t0_1").unwrap();
        let mut graph = StagedGraph::new(&fx.store);
        let mut attacher = SensorAttacher {
            graph: &mut graph,
            registry: &mut fx.registry,
            marks: &mut fx.marks,
            namespace: &fx.ns,
        };

        let sensors = attacher.attach(&host, "Car", &ancestry).unwrap();
        assert_eq!(kinds(&sensors), vec![SensorKind::Vehicle, SensorKind::Environmental]);

        let vehicle = &sensors[0];
        let installed = Triple::new(
            vehicle.iri.clone(),
            fx.ns.iri(relation::IS_INSTALLED_ON).unwrap(),
            host.clone(),
        );
        let has_sensor = Triple::new(
            host.clone(),
            fx.ns.iri(relation::HAS_SENSOR).unwrap(),
            vehicle.iri.clone(),
        );
        assert!(graph.contains(&installed).unwrap());
        assert!(graph.contains(&has_sensor).unwrap());
    }

    #[test]
    fn no_ancestry_means_no_vehicle_sensors() {
        let mut fx = Fixture::new();
        let host = fx.ns.iri("Tree1_t0_1").unwrap();
        let mut graph = StagedGraph::new(&fx.store);
        let mut attacher = SensorAttacher {
            graph: &mut graph,
            registry: &mut fx.registry,
            marks: &mut fx.marks,
            namespace: &fx.ns,
        };

        let sensors = attacher.attach(&host, "Tree", &HashSet::new()).unwrap();
        assert!(sensors.is_empty());
        assert!(graph.changes().is_empty());
    }

    #[test]
    fn rider_gets_phone_sensor_every_time() {
        let mut fx = Fixture::new();
        let ancestry = fx.ancestry(&[class::PERSON]);
        let host = fx.ns.iri("Rider1_t0_1").unwrap();
        let mut graph = StagedGraph::new(&fx.store);
        let mut attacher = SensorAttacher {
            graph: &mut graph,
            registry: &mut fx.registry,
            marks: &mut fx.marks,
            namespace: &fx.ns,
        };

        let first = attacher.attach(&host, class::RIDER, &ancestry).unwrap();
        let second = attacher.attach(&host, class::RIDER, &ancestry).unwrap();
        assert_eq!(kinds(&first), vec![SensorKind::SmartPhone]);
        assert_eq!(kinds(&second), vec![SensorKind::SmartPhone]);
        assert_ne!(first[0].iri, second[0].iri);

        // Carried sensors are not installed on their host.
        let installed = Triple::new(
            first[0].iri.clone(),
            fx.ns.iri(relation::IS_INSTALLED_ON).unwrap(),
            host.clone(),
        );
        assert!(!graph.contains(&installed).unwrap());
    }

    #[test]
    fn cluster_is_bidirectional_and_shares_disambiguator() {
        let mut fx = Fixture::new();
        let host = fx.ns.iri("Car1_t0_1").unwrap();
        let mut graph = StagedGraph::new(&fx.store);
        let mut attacher = SensorAttacher {
            graph: &mut graph,
            registry: &mut fx.registry,
            marks: &mut fx.marks,
            namespace: &fx.ns,
        };

        let env = attacher
            .build_cluster(SensorKind::Environmental, &host, Mounting::Installed)
            .unwrap();
        let suffix = env.iri.as_str().rsplit('_').next().unwrap().to_string();
        let observes = fx.ns.iri(relation::OBSERVES).unwrap();
        let observed_by = fx.ns.iri(relation::OBSERVED_BY).unwrap();
        for property in &env.properties {
            assert!(property.as_str().ends_with(&format!("_{suffix}")));
            assert!(graph
                .contains(&Triple::new(env.iri.clone(), observes.clone(), property.clone()))
                .unwrap());
            assert!(graph
                .contains(&Triple::new(property.clone(), observed_by.clone(), env.iri.clone()))
                .unwrap());
        }
        // 2 type triples, 3 per property, 2 host links.
        assert_eq!(graph.changes().len(), 2 + 3 * 4 + 2);
    }
}
