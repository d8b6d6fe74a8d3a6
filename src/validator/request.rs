use super::coerce::coerce_parameter;
use super::{pointer_token, ValidationError};
use crate::server::RawRequest;
use crate::spec::{ParameterLocation, ParameterMeta, RouteMeta};
use crate::validator_cache::ValidatorCache;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Media type assumed for a body sent without `Content-Type`.
const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Coerced request values, grouped by location.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidatedInput {
    pub path: Map<String, Value>,
    pub query: Map<String, Value>,
    pub header: Map<String, Value>,
    pub cookie: Map<String, Value>,
    pub body: Option<Value>,
}

impl ValidatedInput {
    pub fn get(&self, location: ParameterLocation, name: &str) -> Option<&Value> {
        self.slot(location).get(name)
    }

    fn slot(&self, location: ParameterLocation) -> &Map<String, Value> {
        match location {
            ParameterLocation::Path => &self.path,
            ParameterLocation::Query => &self.query,
            ParameterLocation::Header => &self.header,
            ParameterLocation::Cookie => &self.cookie,
        }
    }

    fn slot_mut(&mut self, location: ParameterLocation) -> &mut Map<String, Value> {
        match location {
            ParameterLocation::Path => &mut self.path,
            ParameterLocation::Query => &mut self.query,
            ParameterLocation::Header => &mut self.header,
            ParameterLocation::Cookie => &mut self.cookie,
        }
    }
}

/// Outcome of [`RequestValidator::validate`]: the coerced input and every error found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestValidation {
    pub input: ValidatedInput,
    pub errors: Vec<ValidationError>,
    /// Set when the route's schemas could not be compiled; nothing was accepted
    pub schema_failure: bool,
}

impl RequestValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Status for the error document: 500 for an unusable route, else 400.
    pub fn status(&self) -> u16 {
        if self.schema_failure {
            500
        } else {
            400
        }
    }
}

/// Validates requests against a route's parameter and body bindings.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    cache: Arc<ValidatorCache>,
}

impl RequestValidator {
    pub fn new(cache: Arc<ValidatorCache>) -> Self {
        Self { cache }
    }

    /// Extract, coerce and validate every declared input of `route`.
    ///
    /// A value that cannot be coerced yields one error and is not validated further.
    /// A route whose schemas do not compile rejects every request.
    pub fn validate(&self, route: &RouteMeta, request: &RawRequest) -> RequestValidation {
        let validators = match self.cache.get_or_compile(route) {
            Ok(validators) => validators,
            Err(_) => {
                return RequestValidation {
                    input: ValidatedInput::default(),
                    errors: vec![ValidationError::new("/", "Invalid schema for route.")],
                    schema_failure: true,
                }
            }
        };
        let mut input = ValidatedInput::default();
        let mut errors = Vec::new();

        for (index, param) in route.parameters.iter().enumerate() {
            let pointer = format!("/{}", pointer_token(&param.name));
            let values = extract(request, param);

            if values.is_empty() {
                if let Some(default) = param.schema.get("default") {
                    input
                        .slot_mut(param.location)
                        .insert(param.name.clone(), default.clone());
                } else if param.required {
                    errors.push(ValidationError::missing(pointer));
                }
                continue;
            }

            let split = !(param.explode
                && matches!(
                    param.location,
                    ParameterLocation::Query | ParameterLocation::Cookie
                ));
            match coerce_parameter(&values, &param.schema, split) {
                Err(e) => errors.push(ValidationError::new(pointer, e.message)),
                Ok(value) => {
                    if let Some(schema) = validators.parameters.get(index).and_then(Option::as_ref) {
                        errors.extend(schema.validate(&value, &pointer));
                    }
                    input.slot_mut(param.location).insert(param.name.clone(), value);
                }
            }
        }

        input.body = request.body.clone();
        if let Some(binding) = &route.request_body {
            match &request.body {
                None if binding.required => errors.push(ValidationError::missing("/body")),
                None => {}
                Some(_) if binding.content.is_empty() => {}
                Some(body) => {
                    let media_type = request
                        .media_type()
                        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());
                    if binding.content.contains_key(&media_type) {
                        if let Some(schema) = validators.body.get(&media_type) {
                            errors.extend(schema.validate(body, "/body"));
                        }
                    } else {
                        let expected: Vec<&str> =
                            binding.content.keys().map(String::as_str).collect();
                        errors.push(ValidationError::new(
                            "/body",
                            format!("Expected {}, got {media_type}.", expected.join(", ")),
                        ));
                    }
                }
            }
        }

        if !errors.is_empty() {
            debug!(
                route = %route.name,
                error_count = errors.len(),
                errors = ?errors,
                "Request validation failed"
            );
        }
        RequestValidation {
            input,
            errors,
            schema_failure: false,
        }
    }
}

fn extract<'a>(request: &'a RawRequest, param: &ParameterMeta) -> Vec<&'a str> {
    match param.location {
        ParameterLocation::Path => request.path_param(&param.name).into_iter().collect(),
        ParameterLocation::Query => request.query_values(&param.name),
        ParameterLocation::Header => request.header_values(&param.name),
        ParameterLocation::Cookie => request.cookie_values(&param.name),
    }
}
