use crate::router::ParamVec;
use crate::spec::RouteMeta;
use crate::validator::ValidatedInput;
use async_trait::async_trait;
use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// What a handler receives once security and input validation have passed.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub route: Arc<RouteMeta>,
    pub method: Method,
    pub path: String,
    /// Coerced and validated inputs
    pub input: ValidatedInput,
    pub headers: ParamVec,
}

impl HandlerRequest {
    pub fn path_param(&self, name: &str) -> Option<&Value> {
        self.input.path.get(name)
    }

    pub fn query_param(&self, name: &str) -> Option<&Value> {
        self.input.query.get(name)
    }

    pub fn body(&self) -> Option<&Value> {
        self.input.body.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
    /// Media type of `body`; `application/json` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl HandlerResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            content_type: None,
        }
    }

    /// A response without a body.
    pub fn empty(status: u16) -> Self {
        Self::json(status, Value::Null)
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Host implementation of one route.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: HandlerRequest) -> HandlerResponse;
}

/// Handler built from an async closure. See [`handler_fn`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(HandlerRequest) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResponse> + Send,
{
    async fn handle(&self, request: HandlerRequest) -> HandlerResponse {
        (self.0)(request).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(HandlerRequest) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResponse> + Send,
{
    FnHandler(f)
}

/// Handlers keyed by route name.
///
/// A route whose name has no handler falls back to the `controller#action`
/// string of its `x-mojo-to` target.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("Dispatcher").field("handlers", &names).finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        let name = name.into();
        debug!(handler = %name, "Handler registered");
        self.handlers.insert(name, handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler for `route`, by name first and then by target.
    pub fn resolve(&self, route: &RouteMeta) -> Option<Arc<dyn Handler>> {
        if let Some(handler) = self.handlers.get(&route.name) {
            return Some(Arc::clone(handler));
        }
        let target = route.target.as_ref()?;
        let key = format!(
            "{}#{}",
            target.controller().unwrap_or_default(),
            target.action().unwrap_or_default()
        );
        self.handlers.get(&key).map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{load_spec_from_value, BuildOptions, StoreOptions};
    use serde_json::json;

    fn routes() -> Vec<RouteMeta> {
        load_spec_from_value(
            json!({
                "openapi": "3.0.3",
                "paths": {
                    "/pets": {
                        "get": { "operationId": "listPets", "x-mojo-to": "pet#list", "responses": {} },
                        "post": { "operationId": "addPet", "responses": {} }
                    }
                }
            }),
            None,
            &StoreOptions::default(),
            &BuildOptions::default(),
        )
        .unwrap()
        .routes
        .to_vec()
    }

    fn ok() -> Arc<dyn Handler> {
        Arc::new(handler_fn(|_req| async { HandlerResponse::empty(204) }))
    }

    #[test]
    fn test_resolve_by_name_then_target() {
        let routes = routes();
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.resolve(&routes[0]).is_none());

        dispatcher.register("pet#list", ok());
        assert!(dispatcher.resolve(&routes[0]).is_some());
        assert!(dispatcher.resolve(&routes[1]).is_none());

        dispatcher.register("addPet", ok());
        assert!(dispatcher.resolve(&routes[1]).is_some());
        assert_eq!(dispatcher.len(), 2);
    }

    #[tokio::test]
    async fn test_handler_fn_is_called() {
        let route = Arc::new(routes().remove(0));
        let handler = handler_fn(|req: HandlerRequest| async move {
            HandlerResponse::json(200, json!({ "route": req.route.name }))
        });
        let response = handler
            .handle(HandlerRequest {
                route,
                method: Method::GET,
                path: "/pets".to_string(),
                input: ValidatedInput::default(),
                headers: ParamVec::new(),
            })
            .await;
        assert_eq!(response, HandlerResponse::json(200, json!({ "route": "listPets" })));
        assert!(response.content_type.is_none());
    }
}
