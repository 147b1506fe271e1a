//! Rich diagnostic error types for the scene-kg engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the scene-kg engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum SceneKgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Statement(#[from] StatementError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Statement errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StatementError {
    #[error("no scene description provided")]
    #[diagnostic(
        code(scene_kg::statement::empty_input),
        help(
            "Supply at least one statement of the form \
             \"<Subject> <Predicate> <Object>\", e.g. \"Car1 isNextTo Pedestrian1\"."
        )
    )]
    EmptyInput,

    #[error("malformed statement on line {line_number}: \"{line}\" has {token_count} token(s), expected 3")]
    #[diagnostic(
        code(scene_kg::statement::malformed),
        help(
            "Every line must contain exactly three whitespace-separated tokens: \
             subject, predicate and object. Nothing from this scene was committed; \
             fix the line and submit the whole description again."
        )
    )]
    Malformed {
        line_number: usize,
        line: String,
        token_count: usize,
    },

    #[error("invalid term \"{term}\": {message}")]
    #[diagnostic(
        code(scene_kg::statement::invalid_term),
        help(
            "Entity tokens need at least one non-digit character (the class name), \
             and every token must form a valid IRI when appended to the namespace."
        )
    )]
    InvalidTerm { term: String, message: String },
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// The triple store could not be read, queried, or written.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("failed to load graph from {path}: {message}")]
    #[diagnostic(
        code(scene_kg::store::load),
        help(
            "Check that the ontology file exists and that its format matches \
             the configured one (rdfxml, turtle or ntriples)."
        )
    )]
    Load { path: String, message: String },

    #[error("failed to serialize graph to {path}: {message}")]
    #[diagnostic(
        code(scene_kg::store::serialize),
        help(
            "The scene was rolled back. Ensure the output directory exists \
             and is writable, then process the scene again."
        )
    )]
    Serialize { path: String, message: String },

    #[error("triple store error: {message}")]
    #[diagnostic(
        code(scene_kg::store::backend),
        help(
            "The underlying oxigraph store failed. If a data directory is configured, \
             make sure no other process holds it open."
        )
    )]
    Backend { message: String },

    #[error("I/O error on {path}")]
    #[diagnostic(
        code(scene_kg::store::io),
        help("A filesystem operation failed. Check the path and its permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(scene_kg::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(scene_kg::config::parse),
        help("Check the TOML syntax and the field names in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(scene_kg::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(scene_kg::config::invalid),
        help("Check the EngineConfig fields. {message}")
    )]
    Invalid { message: String },
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Convenience alias for functions returning scene-kg results.
pub type SceneKgResult<T> = std::result::Result<T, SceneKgError>;
