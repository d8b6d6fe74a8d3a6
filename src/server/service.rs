//! # Service Module
//!
//! The request pipeline tying route matching, security, validation and dispatch together.
//!
//! ## Request Flow
//!
//! 1. **Route matching**: the most specific route for method and path; a miss
//!    renders the 404 error document
//! 2. **Introspection**: `OPTIONS` on a base path, or on a route path without its
//!    own `OPTIONS` operation, renders [`describe`](crate::introspect::describe)
//! 3. **Security**: the route's requirement groups (401/403 document on denial)
//! 4. **Request validation**: parameters and body (400 document)
//! 5. **Dispatch**: handler by route name or target (501 when none is registered)
//! 6. **Response validation**: handler output against the bound response (500 document)
//! 7. **Render**: the value and status go to the host's [`Render`] hook
//!
//! Every stage short-circuits. When the request's cancellation token fires while
//! a security callback or the handler is pending, nothing is rendered.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brrtbind::{OpenApi, OpenApiConfig};
//! use brrtbind::dispatcher::{handler_fn, HandlerResponse};
//! use brrtbind::server::{JsonRender, RawRequest};
//! use std::sync::Arc;
//!
//! let service = OpenApi::from_config(&OpenApiConfig::from_spec_path("openapi.yaml"))?
//!     .handler("listPets", Arc::new(handler_fn(|_req| async {
//!         HandlerResponse::json(200, serde_json::json!([]))
//!     })))
//!     .build()?;
//!
//! let rendered = service
//!     .handle(RawRequest::new(http::Method::GET, "/api/pets"), &JsonRender, &cancel)
//!     .await;
//! ```

use super::request::RawRequest;
use super::response::{Render, RENDER_TAG};
use crate::config::OpenApiConfig;
use crate::dispatcher::{Dispatcher, Handler, HandlerRequest};
use crate::error::SpecResult;
use crate::introspect::{describe, DescribeQuery};
use crate::router::Router;
use crate::security::{SecurityCallback, SecurityEvaluator, SecurityOutcome, SecurityRequest};
use crate::spec::{LoadedSpec, RouteMeta, SpecDocument};
use crate::validator::{error_document, ResponseCheck, RequestValidator, ResponseValidator, ValidationError};
use crate::validator_cache::ValidatorCache;
use http::Method;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Builder for an [`AppService`].
///
/// Holds the loaded specification until [`OpenApi::build`] compiles it.
pub struct OpenApi {
    loaded: LoadedSpec,
    security: SecurityEvaluator,
    dispatcher: Dispatcher,
}

impl OpenApi {
    pub fn new(loaded: LoadedSpec) -> Self {
        let security = SecurityEvaluator::new(loaded.store.document().security_schemes.clone());
        Self {
            loaded,
            security,
            dispatcher: Dispatcher::new(),
        }
    }

    /// Load the specification named by `config`.
    pub fn from_config(config: &OpenApiConfig) -> SpecResult<Self> {
        Ok(Self::new(config.load()?))
    }

    /// Register the security callback for scheme `name`.
    #[must_use]
    pub fn security(mut self, name: impl Into<String>, callback: Arc<dyn SecurityCallback>) -> Self {
        self.security.register(name, callback);
        self
    }

    /// Register a handler under a route name or a `controller#action` target.
    #[must_use]
    pub fn handler(mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.dispatcher.register(name, handler);
        self
    }

    pub fn routes(&self) -> &[RouteMeta] {
        &self.loaded.routes
    }

    /// Compile the route table and every schema.
    ///
    /// # Errors
    ///
    /// [`SpecError::InvalidSchema`](crate::SpecError::InvalidSchema) for a schema
    /// the validator rejects, [`SpecError::InvalidPlaceholder`](crate::SpecError::InvalidPlaceholder)
    /// for a path that cannot be compiled.
    pub fn build(self) -> SpecResult<AppService> {
        let OpenApi {
            loaded,
            security,
            dispatcher,
        } = self;

        let cache = Arc::new(ValidatorCache::precompile(&loaded.routes)?);
        let router = Router::new(loaded.routes.to_vec())?;
        let document = loaded.store.shared();

        for name in document.security_schemes.keys() {
            if !security.has_callback(name) {
                warn!(scheme = %name, "No security callback registered; requests using it are denied");
            }
        }
        let unhandled = router
            .routes()
            .filter(|r| dispatcher.resolve(r).is_none())
            .count();
        info!(
            routes_count = router.len(),
            handlers_count = dispatcher.len(),
            unhandled_routes = unhandled,
            "Service built"
        );

        Ok(AppService {
            router: Arc::new(router),
            document,
            requests: RequestValidator::new(Arc::clone(&cache)),
            responses: ResponseValidator::new(cache),
            security: Arc::new(security),
            dispatcher: Arc::new(dispatcher),
        })
    }
}

/// Compiled request pipeline. Immutable and cheap to clone.
#[derive(Debug, Clone)]
pub struct AppService {
    router: Arc<Router>,
    document: Arc<SpecDocument>,
    requests: RequestValidator,
    responses: ResponseValidator,
    security: Arc<SecurityEvaluator>,
    dispatcher: Arc<Dispatcher>,
}

impl AppService {
    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn document(&self) -> &SpecDocument {
        &self.document
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteMeta>> {
        self.router.routes()
    }

    /// Run `request` through the pipeline and render the outcome.
    ///
    /// Returns `None` when `cancel` fired before a response was produced.
    pub async fn handle<R: Render>(
        &self,
        mut request: RawRequest,
        render: &R,
        cancel: &CancellationToken,
    ) -> Option<R::Output> {
        let Some(route_match) = self.router.route(&request.method, &request.path) else {
            if let Some(description) = self.introspect(&request) {
                return Some(render.render(RENDER_TAG, description, 200));
            }
            return Some(render_errors(render, 404, "Not Found."));
        };
        let route = route_match.route;
        request.path_params = route_match.path_params;

        let outcome = self
            .security
            .evaluate(&route.security, &SecurityRequest::new(&request, &route), cancel)
            .await;
        match outcome {
            Err(_) => {
                debug!(route = %route.name, "Request cancelled during security evaluation");
                return None;
            }
            Ok(SecurityOutcome::Denied(denial)) => {
                return Some(render_errors(render, denial.status, &denial.message));
            }
            Ok(SecurityOutcome::Allowed) => {}
        }

        let validation = self.requests.validate(&route, &request);
        if !validation.is_valid() {
            let status = validation.status();
            return Some(render.render(
                RENDER_TAG,
                error_document(status, &validation.errors),
                status,
            ));
        }

        let Some(handler) = self.dispatcher.resolve(&route) else {
            warn!(route = %route.name, "No handler registered");
            return Some(render_errors(render, 501, "Not Implemented."));
        };

        let handler_request = HandlerRequest {
            route: Arc::clone(&route),
            method: request.method,
            path: request.path,
            input: validation.input,
            headers: request.headers,
        };
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(route = %route.name, "Request cancelled during handler call");
                return None;
            }
            response = handler.handle(handler_request) => response,
        };

        let check = self.responses.validate(
            &route,
            response.status,
            response.content_type.as_deref(),
            &response.body,
        );
        if let ResponseCheck::Invalid { errors, .. } = &check {
            return Some(render.render(RENDER_TAG, error_document(500, errors), 500));
        }
        Some(render.render(RENDER_TAG, response.body, response.status))
    }

    /// Description for a diagnostic `OPTIONS` request, if `request` is one.
    fn introspect(&self, request: &RawRequest) -> Option<Value> {
        if request.method != Method::OPTIONS {
            return None;
        }
        let method = request.query_param("method").map(str::to_string);
        let query = if self.router.is_base_path(&request.path) {
            DescribeQuery { method, path: None }
        } else if !self.router.match_path_any(&request.path).is_empty() {
            DescribeQuery {
                method,
                path: Some(request.path.clone()),
            }
        } else {
            return None;
        };
        debug!(path = %request.path, method = ?query.method, "Introspection request");
        Some(describe(&self.router, &self.document, &query))
    }
}

fn render_errors<R: Render>(render: &R, status: u16, message: &str) -> R::Output {
    let errors = [ValidationError::new("/", message)];
    render.render(RENDER_TAG, error_document(status, &errors), status)
}
