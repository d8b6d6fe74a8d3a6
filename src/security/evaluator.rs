use super::{Cancelled, Denial, SecurityCallback, SecurityRequest};
use crate::spec::{SecurityGroup, SecurityRequirement};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Result of evaluating a route's security requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityOutcome {
    Allowed,
    Denied(Denial),
}

impl SecurityOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SecurityOutcome::Allowed)
    }
}

/// Registry of callbacks by scheme name, plus the scheme definitions they receive.
#[derive(Clone, Default)]
pub struct SecurityEvaluator {
    schemes: Arc<Map<String, Value>>,
    callbacks: HashMap<String, Arc<dyn SecurityCallback>>,
}

impl fmt::Debug for SecurityEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.callbacks.keys().collect();
        names.sort();
        f.debug_struct("SecurityEvaluator")
            .field("schemes", &self.schemes.keys().collect::<Vec<_>>())
            .field("callbacks", &names)
            .finish()
    }
}

impl SecurityEvaluator {
    /// `schemes` is the document's `securitySchemes` registry.
    pub fn new(schemes: Map<String, Value>) -> Self {
        Self {
            schemes: Arc::new(schemes),
            callbacks: HashMap::new(),
        }
    }

    /// Register the callback for `scheme`, replacing any previous one.
    pub fn register(&mut self, scheme: impl Into<String>, callback: Arc<dyn SecurityCallback>) {
        self.callbacks.insert(scheme.into(), callback);
    }

    #[must_use]
    pub fn with_callback(
        mut self,
        scheme: impl Into<String>,
        callback: Arc<dyn SecurityCallback>,
    ) -> Self {
        self.register(scheme, callback);
        self
    }

    pub fn has_callback(&self, scheme: &str) -> bool {
        self.callbacks.contains_key(scheme)
    }

    /// Evaluate `groups` in order; the first group whose requirements all pass allows.
    ///
    /// An empty list allows. Within one evaluation each (scheme, scopes) pair is
    /// checked at most once.
    ///
    /// # Errors
    ///
    /// [`Cancelled`] when `cancel` fires before a decision is reached.
    pub async fn evaluate(
        &self,
        groups: &[SecurityGroup],
        request: &SecurityRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<SecurityOutcome, Cancelled> {
        if groups.is_empty() {
            return Ok(SecurityOutcome::Allowed);
        }

        let mut memo: HashMap<&SecurityRequirement, Result<(), Denial>> = HashMap::new();
        let mut last_denial: Option<Denial> = None;

        for (index, group) in groups.iter().enumerate() {
            let mut group_passed = true;
            for requirement in group {
                let result = match memo.get(requirement) {
                    Some(cached) => cached.clone(),
                    None => {
                        let result = self.check_one(requirement, request, cancel).await?;
                        memo.insert(requirement, result.clone());
                        result
                    }
                };
                if let Err(denial) = result {
                    last_denial = Some(denial);
                    group_passed = false;
                    break;
                }
            }
            if group_passed {
                debug!(route = %request.route.name, group = index, "Security group passed");
                return Ok(SecurityOutcome::Allowed);
            }
        }

        let denial = last_denial.unwrap_or_else(|| Denial::unauthorized("Permission denied."));
        warn!(
            route = %request.route.name,
            status = denial.status,
            scheme = ?denial.scheme,
            reason = %denial.message,
            "Security requirements not met"
        );
        Ok(SecurityOutcome::Denied(denial))
    }

    async fn check_one(
        &self,
        requirement: &SecurityRequirement,
        request: &SecurityRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<Result<(), Denial>, Cancelled> {
        let name = requirement.scheme.as_str();
        let Some(callback) = self.callbacks.get(name) else {
            return Ok(Err(Denial::unauthorized(format!(
                "No security callback for {name}."
            ))
            .with_scheme(name)));
        };
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let scheme = self.schemes.get(name).unwrap_or(&Value::Null);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(scheme = name, "Security callback abandoned after cancellation");
                return Err(Cancelled);
            }
            result = callback.check(request, scheme, &requirement.scopes) => result,
        };
        debug!(scheme = name, passed = result.is_ok(), "Security callback finished");
        Ok(result.map_err(|d| d.with_scheme(name)))
    }
}
