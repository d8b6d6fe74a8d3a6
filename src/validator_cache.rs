//! # Schema Validator Cache Module
//!
//! Precompiled schema validators for every route, built once at startup.
//!
//! Compiling a JSON Schema is far more expensive than evaluating one, so every
//! parameter, request body and response schema of a route table is compiled
//! up front by [`ValidatorCache::precompile`]. The cache is immutable after
//! that and shared behind an `Arc`, so request handling never takes a lock.
//!
//! Precompiling also surfaces broken schemas as a load-time
//! [`SpecError::InvalidSchema`] instead of a failure on the first request.
//!
//! ## Cache Key Structure
//!
//! Entries are keyed by [`RouteMeta::id`] and checked against the route name,
//! so a descriptor from another table is compiled on the fly rather than
//! answered from the wrong entry.

use crate::error::{SpecError, SpecResult};
use crate::spec::{ResponseKey, RouteMeta};
use crate::validator::CompiledSchema;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Compiled schemas of one route.
#[derive(Debug, Clone, Default)]
pub struct RouteValidators {
    /// Parallel to [`RouteMeta::parameters`]
    pub parameters: Vec<Option<CompiledSchema>>,
    /// media type -> request body schema
    pub body: BTreeMap<String, CompiledSchema>,
    /// response key -> media type -> schema
    pub responses: BTreeMap<ResponseKey, BTreeMap<String, CompiledSchema>>,
}

impl RouteValidators {
    /// Compile every schema bound to `route`.
    pub fn compile(route: &RouteMeta) -> SpecResult<Self> {
        let compile = |slot: String, schema: &Value| -> SpecResult<CompiledSchema> {
            CompiledSchema::compile(schema).map_err(|message| SpecError::InvalidSchema {
                route: route.name.clone(),
                slot,
                message,
            })
        };

        let parameters = route
            .parameters
            .iter()
            .map(|p| {
                if is_empty_schema(&p.schema) {
                    return Ok(None);
                }
                compile(format!("{} parameter '{}'", p.location, p.name), &p.schema).map(Some)
            })
            .collect::<SpecResult<Vec<_>>>()?;

        let mut body = BTreeMap::new();
        if let Some(binding) = &route.request_body {
            for (media_type, schema) in &binding.content {
                body.insert(
                    media_type.clone(),
                    compile(format!("request body {media_type}"), schema)?,
                );
            }
        }

        let mut responses = BTreeMap::new();
        for (key, meta) in &route.responses {
            let mut by_media = BTreeMap::new();
            for (media_type, schema) in &meta.content {
                by_media.insert(
                    media_type.clone(),
                    compile(format!("response {key} {media_type}"), schema)?,
                );
            }
            responses.insert(*key, by_media);
        }

        Ok(Self {
            parameters,
            body,
            responses,
        })
    }

    pub fn count(&self) -> usize {
        self.parameters.iter().flatten().count()
            + self.body.len()
            + self.responses.values().map(BTreeMap::len).sum::<usize>()
    }
}

fn is_empty_schema(schema: &Value) -> bool {
    schema.as_object().is_some_and(|o| o.is_empty())
}

/// Read-only map from route to its compiled validators.
#[derive(Debug, Clone, Default)]
pub struct ValidatorCache {
    routes: HashMap<usize, (String, Arc<RouteValidators>)>,
}

impl ValidatorCache {
    /// A cache with nothing precompiled; every lookup compiles on demand.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile all schemas of `routes`. The first invalid schema aborts.
    pub fn precompile(routes: &[RouteMeta]) -> SpecResult<Self> {
        let mut cache = HashMap::with_capacity(routes.len());
        let mut compiled_count = 0;
        for route in routes {
            let validators = RouteValidators::compile(route)?;
            compiled_count += validators.count();
            cache.insert(route.id, (route.name.clone(), Arc::new(validators)));
        }
        info!(
            compiled_count = compiled_count,
            routes_count = routes.len(),
            "Precompiled schemas at startup"
        );
        Ok(Self { routes: cache })
    }

    /// Validators for `route`, if it was precompiled.
    pub fn get(&self, route: &RouteMeta) -> Option<Arc<RouteValidators>> {
        self.routes
            .get(&route.id)
            .filter(|(name, _)| *name == route.name)
            .map(|(_, v)| Arc::clone(v))
    }

    /// Validators for `route`, compiling them when the route is unknown.
    ///
    /// # Errors
    ///
    /// [`SpecError::InvalidSchema`] when one of the route's schemas does not compile.
    pub fn get_or_compile(&self, route: &RouteMeta) -> SpecResult<Arc<RouteValidators>> {
        if let Some(validators) = self.get(route) {
            return Ok(validators);
        }
        debug!(route = %route.name, "Schema validator cache miss");
        RouteValidators::compile(route).map(Arc::new).map_err(|e| {
            error!(route = %route.name, error = %e, "Failed to compile JSON Schema");
            e
        })
    }

    /// Number of routes with precompiled validators.
    pub fn size(&self) -> usize {
        self.routes.len()
    }
}
