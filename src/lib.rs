// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # scene-kg
//!
//! Ontology-backed scene-graph instantiation. Line-based
//! `Subject Predicate Object` statements describing a scene are turned into
//! a typed, de-duplicated RDF/OWL knowledge graph.
//!
//! ## Architecture
//!
//! - **Triple store** (`store`): the [`store::TripleStore`] seam, an oxigraph
//!   backend, and a buffered change set committed all-or-nothing
//! - **Identifier registry** (`registry`): entity name → stable IRI per session
//! - **Class hierarchy** (`hierarchy`): `rdfs:subClassOf` cache loaded once
//! - **Registrar** (`registrar`): check-before-insert class/relation declaration
//! - **Sensor rules** (`sensor`): hierarchy-conditioned sensor sub-graphs
//! - **Scene assembler** (`scene`): parses statements and drives the above
//!
//! ## Library usage
//!
//! ```no_run
//! use scene_kg::config::EngineConfig;
//! use scene_kg::engine::Engine;
//!
//! let mut engine = Engine::new(EngineConfig {
//!     ontology: Some("ontology.owl".into()),
//!     output: Some("updated.owl".into()),
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let preview = engine.preview("Car1 isNextTo Pedestrian1").unwrap();
//! println!("{preview}");
//!
//! let report = engine.assemble("Car1 isNextTo Pedestrian1").unwrap();
//! println!("{report}");
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod registrar;
pub mod registry;
pub mod scene;
pub mod sensor;
pub mod statement;
pub mod store;
pub mod vocab;
