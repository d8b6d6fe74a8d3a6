//! # brrtbind
//!
//! **brrtbind** binds an HTTP service to an [OpenAPI](https://spec.openapis.org/oas/v3.0.3)
//! document: it loads and resolves the specification, derives a route table from it,
//! and validates every request and response against the schemas the document declares.
//!
//! ## Overview
//!
//! The crate is a core, not a server. The host HTTP stack hands over a
//! [`RawRequest`](server::RawRequest) and a rendering hook; brrtbind matches the
//! route, evaluates security, coerces and validates inputs, calls the registered
//! handler, validates its output and passes the result back for rendering.
//! Swagger 2.0 documents are accepted through a compatibility mode that
//! normalises them to the OpenAPI 3 shape at load time.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Schema store (loading, `$ref` resolution, v2 normalisation) and
//!   the route table builder
//! - **[`router`]** - Path matching with placeholder kinds and specificity ranking
//! - **[`validator`]** - Parameter coercion, request and response validation
//! - **[`validator_cache`]** - Schemas compiled once at startup
//! - **[`security`]** - Async security callbacks evaluated as OR-of-AND groups
//! - **[`introspect`]** - Read-only description of the loaded document
//! - **[`dispatcher`]** - Handlers keyed by route name or target
//! - **[`server`]** - The request pipeline and the rendering hook
//! - **[`config`]** - File and environment configuration
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`cli`]** - The `brrtbind` binary's commands
//!
//! ### Request Flow
//!
//! ```text
//! RawRequest ─► Router ─► SecurityEvaluator ─► RequestValidator ─► Dispatcher
//!                 │ 404          │ 401/403            │ 400            │ 501
//!                 ▼              ▼                    ▼                ▼
//!            OPTIONS describe                                     Handler
//!                                                                    │
//!                     Render ◄── ResponseValidator (500 on mismatch) ◄┘
//! ```
//!
//! Every refusal is rendered as the default error document:
//!
//! ```json
//! { "errors": [{ "path": "/age", "message": "Expected integer, got \"abc\"." }], "status": 400 }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brrtbind::dispatcher::{handler_fn, HandlerResponse};
//! use brrtbind::security::ApiKeyCallback;
//! use brrtbind::server::{JsonRender, RawRequest};
//! use brrtbind::{OpenApi, OpenApiConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = OpenApiConfig::from_file("brrtbind.yaml")?.with_env_overrides();
//! let service = OpenApi::from_config(&config)?
//!     .security("api_key", Arc::new(ApiKeyCallback::new("s3cret")))
//!     .handler("showPet", Arc::new(handler_fn(|req| async move {
//!         let id = req.path_param("id").cloned().unwrap_or_default();
//!         HandlerResponse::json(200, serde_json::json!({ "id": id, "name": "Rex" }))
//!     })))
//!     .build()?;
//!
//! let request = RawRequest::new(http::Method::GET, "/api/pets/7")
//!     .with_header("X-Api-Key", "s3cret");
//! let rendered = service
//!     .handle(request, &JsonRender, &CancellationToken::new())
//!     .await
//!     .expect("not cancelled");
//! assert_eq!(rendered.status, 200);
//! ```
//!
//! ## Specification Extensions
//!
//! | Extension | Where | Meaning |
//! |-----------|-------|---------|
//! | `x-mojo-name` | operation | route name, instead of `operationId` |
//! | `x-mojo-to` | operation | handler target: `"controller#action"`, a list, or a map |
//! | `x-mojo-placeholder` | path parameter | `:` standard, `#` relaxed, `*` wildcard |
//!
//! ## Logging
//!
//! All modules log through `tracing`. Binaries call
//! [`logging::init_logging`] with [`logging::LogConfig::from_env`].

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod introspect;
pub mod logging;
pub mod router;
pub mod security;
pub mod server;
pub mod spec;
pub mod validator;
pub mod validator_cache;

pub use config::{OpenApiConfig, SpecSource};
pub use dispatcher::{Dispatcher, Handler, HandlerRequest, HandlerResponse};
pub use error::{SpecError, SpecResult};
pub use router::{RouteMatch, Router};
pub use security::{Denial, SecurityCallback, SecurityEvaluator, SecurityOutcome};
pub use server::{AppService, OpenApi, RawRequest, Render};
pub use spec::{
    load_spec, load_spec_from_value, LoadedSpec, ParameterLocation, ParameterMeta, RouteMeta,
    SchemaStore, SchemaVersion, SecurityGroup, SecurityRequirement, SpecDocument,
};
pub use validator::{ValidationError, RequestValidator, ResponseCheck, ResponseValidator};
