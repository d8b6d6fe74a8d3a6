use super::ValidationError;
use crate::server::request::media_type;
use crate::spec::{ResponseKey, RouteMeta};
use crate::validator_cache::ValidatorCache;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

const JSON: &str = "application/json";

/// Outcome of checking a handler's output.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseCheck {
    Valid { matched: ResponseKey },
    Invalid {
        matched: ResponseKey,
        errors: Vec<ValidationError>,
    },
    /// No binding for the status; the output is passed through unvalidated
    Unmatched,
}

impl ResponseCheck {
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ResponseCheck::Invalid { errors, .. } => errors,
            _ => &[],
        }
    }

    /// False only for [`ResponseCheck::Invalid`].
    pub fn is_acceptable(&self) -> bool {
        !matches!(self, ResponseCheck::Invalid { .. })
    }

    pub fn matched(&self) -> Option<ResponseKey> {
        match self {
            ResponseCheck::Valid { matched } | ResponseCheck::Invalid { matched, .. } => {
                Some(*matched)
            }
            ResponseCheck::Unmatched => None,
        }
    }
}

/// Validates handler output against the response bound to its status code.
#[derive(Debug, Clone)]
pub struct ResponseValidator {
    cache: Arc<ValidatorCache>,
}

impl ResponseValidator {
    pub fn new(cache: Arc<ValidatorCache>) -> Self {
        Self { cache }
    }

    /// Select the response by exact status, then `NXX`, then `default`.
    ///
    /// Within it, the schema for `content_type` is used, else `application/json`,
    /// else the first declared one. A response without content accepts only `null`.
    pub fn validate(
        &self,
        route: &RouteMeta,
        status: u16,
        content_type: Option<&str>,
        output: &Value,
    ) -> ResponseCheck {
        let Some((matched, meta)) = route.response_for(status) else {
            return ResponseCheck::Unmatched;
        };

        let errors = if meta.content.is_empty() {
            if output.is_null() {
                Vec::new()
            } else {
                vec![ValidationError::new("/", "Expected empty response body.")]
            }
        } else {
            let wanted = content_type.map(media_type);
            let chosen = wanted
                .filter(|mt| meta.content.contains_key(mt))
                .or_else(|| meta.content.contains_key(JSON).then(|| JSON.to_string()))
                .or_else(|| meta.content.keys().next().cloned());
            match self.cache.get_or_compile(route) {
                Ok(validators) => chosen
                    .and_then(|mt| validators.responses.get(&matched)?.get(&mt).cloned())
                    .map(|schema| schema.validate(output, ""))
                    .unwrap_or_default(),
                Err(_) => vec![ValidationError::new("/", "Invalid schema for route.")],
            }
        };

        if errors.is_empty() {
            ResponseCheck::Valid { matched }
        } else {
            warn!(
                route = %route.name,
                status = status,
                matched = %matched,
                error_count = errors.len(),
                errors = ?errors,
                "Response validation failed"
            );
            ResponseCheck::Invalid { matched, errors }
        }
    }
}
