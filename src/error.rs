//! Load-time error taxonomy.
//!
//! Every variant aborts construction of the schema store or route table. None of
//! them can occur while serving requests: request-time problems are reported as
//! [`ValidationError`](crate::validator::ValidationError) lists or
//! [`Denial`](crate::security::Denial)s instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the loading and building stages.
pub type SpecResult<T> = Result<T, SpecError>;

/// Fatal error raised while loading a specification or deriving its routes.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A specification file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A specification file is not valid JSON or YAML.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The document is structurally unusable (e.g. `paths` is not an object).
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A `$ref` pointer names a location that does not exist.
    #[error("unresolved reference '{reference}' in {document}")]
    UnresolvedReference { reference: String, document: String },

    /// A `$ref` leads back into a reference that is still being resolved.
    #[error("cyclic reference '{reference}' (chain: {})", chain.join(" -> "))]
    CyclicReference {
        reference: String,
        chain: Vec<String>,
    },

    /// A `$ref` that is neither a local pointer nor a sibling file with a pointer.
    #[error("unsupported reference '{reference}': {reason}")]
    UnsupportedReference { reference: String, reason: String },

    /// Two operations produce the same method and path pattern.
    #[error("duplicate route {method} {path}")]
    DuplicateRoute { method: String, path: String },

    /// An operation has neither `x-mojo-name` nor `operationId`.
    #[error("missing route name for {method} {path}: add operationId or x-mojo-name")]
    MissingRouteName { method: String, path: String },

    /// `x-mojo-to` has a shape that cannot be turned into a handler target.
    #[error("invalid x-mojo-to on {route}: {reason}")]
    InvalidTarget { route: String, reason: String },

    /// `x-mojo-placeholder` names an unknown placeholder kind.
    #[error("invalid x-mojo-placeholder '{value}' on parameter '{parameter}' of {route}")]
    InvalidPlaceholder {
        route: String,
        parameter: String,
        value: String,
    },

    /// A security requirement names a scheme missing from the registry.
    #[error("route {route} requires unknown security scheme '{scheme}'")]
    UnknownSecurityScheme { route: String, scheme: String },

    /// A bound schema is rejected by the validator compiler.
    #[error("invalid schema for {route} ({slot}): {message}")]
    InvalidSchema {
        route: String,
        slot: String,
        message: String,
    },
}
