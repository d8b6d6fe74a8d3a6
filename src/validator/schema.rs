use super::{join_pointer, pointer_token, ValidationError};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A schema compiled once and shared across requests.
#[derive(Clone)]
pub struct CompiledSchema {
    validator: Arc<JSONSchema>,
    source: Arc<Value>,
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("source", &self.source)
            .finish()
    }
}

impl CompiledSchema {
    /// Compile a resolved schema with draft 7 semantics.
    pub fn compile(schema: &Value) -> Result<Self, String> {
        let validator = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            validator: Arc::new(validator),
            source: Arc::new(schema.clone()),
        })
    }

    pub fn source(&self) -> &Value {
        &self.source
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Every failure of `instance`, paths prefixed with `prefix`.
    ///
    /// `required` failures point at the missing property rather than its parent.
    pub fn validate(&self, instance: &Value, prefix: &str) -> Vec<ValidationError> {
        let Err(errors) = self.validator.validate(instance) else {
            return Vec::new();
        };
        errors
            .map(|error| {
                let mut path = error.instance_path.to_string();
                let message = match &error.kind {
                    ValidationErrorKind::Required { property } => {
                        path.push('/');
                        match property.as_str() {
                            Some(name) => path.push_str(&pointer_token(name)),
                            None => path.push_str(&pointer_token(&property.to_string())),
                        }
                        "Missing property.".to_string()
                    }
                    _ => error.to_string(),
                };
                ValidationError::new(join_pointer(prefix, &path), message)
            })
            .collect()
    }
}
