//! # Validator Module
//!
//! Request and response validation against the schemas bound to a route.
//!
//! Both directions share one algorithm ([`CompiledSchema::validate`]): the
//! whole instance is checked and every failure is reported, each with a JSON
//! pointer to the offending value. Nothing stops at the first error.
//!
//! - [`RequestValidator`] extracts each declared parameter from its location,
//!   coerces the raw strings to the schema's type and validates the result,
//!   then validates the body against the schema of the request's media type.
//! - [`ResponseValidator`] picks the response binding for a status code and
//!   validates the handler output against it.
//!
//! Failures are turned into the default error document by [`error_document`].

mod coerce;
mod request;
mod response;
mod schema;

pub use coerce::{coerce_parameter, CoercionError};
pub use request::{RequestValidation, RequestValidator, ValidatedInput};
pub use response::{ResponseCheck, ResponseValidator};
pub use schema::CompiledSchema;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON pointer to the offending value, `/` for the root
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn missing(path: impl Into<String>) -> Self {
        Self::new(path, "Missing property.")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The default error document: `{"errors": [{"message", "path"}], "status": N}`.
pub fn error_document(status: u16, errors: &[ValidationError]) -> Value {
    json!({ "errors": errors, "status": status })
}

/// Join a pointer prefix and a relative pointer; an empty result is the root `/`.
pub(crate) fn join_pointer(prefix: &str, suffix: &str) -> String {
    let joined = format!("{prefix}{suffix}");
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// Escape a property name for use as a JSON pointer token.
pub(crate) fn pointer_token(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_document_shape() {
        let doc = error_document(400, &[ValidationError::missing("/age")]);
        assert_eq!(
            doc,
            json!({ "errors": [{ "path": "/age", "message": "Missing property." }], "status": 400 })
        );
    }

    #[test]
    fn test_join_pointer() {
        assert_eq!(join_pointer("", ""), "/");
        assert_eq!(join_pointer("/body", ""), "/body");
        assert_eq!(join_pointer("/body", "/pets/0"), "/body/pets/0");
        assert_eq!(pointer_token("a/b~c"), "a~1b~0c");
    }
}
