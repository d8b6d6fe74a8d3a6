//! Read-only introspection of the loaded specification.
//!
//! Experimental: the shape of the returned JSON may change between releases.

use crate::router::Router;
use crate::spec::{RouteMeta, SpecDocument};
use serde_json::{json, Value};
use std::sync::Arc;

/// Filters for [`describe`]. With neither set the whole resolved document is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeQuery {
    /// HTTP method, case-insensitive
    pub method: Option<String>,
    /// A concrete request path or a path pattern as written in the table
    pub path: Option<String>,
}

impl DescribeQuery {
    pub fn method(method: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            path: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.method.is_none() && self.path.is_none()
    }
}

/// Describe the specification, or the routes selected by `query`.
///
/// Filtered results have the shape `{"routes": [{name, method, path, operationId, operation}]}`.
pub fn describe(router: &Router, doc: &SpecDocument, query: &DescribeQuery) -> Value {
    if query.is_empty() {
        return doc.resolved.clone();
    }

    let candidates: Vec<Arc<RouteMeta>> = match query.path.as_deref() {
        Some(path) => {
            let mut found = router.match_path_any(path);
            for route in router.routes() {
                if route.path.as_str() == path && !found.iter().any(|r| r.id == route.id) {
                    found.push(Arc::clone(route));
                }
            }
            found.sort_by_key(|r| r.id);
            found
        }
        None => router.routes().cloned().collect(),
    };

    let routes: Vec<Value> = candidates
        .iter()
        .filter(|route| {
            query
                .method
                .as_deref()
                .map_or(true, |m| route.method.as_str().eq_ignore_ascii_case(m))
        })
        .map(|route| summary(route))
        .collect();
    json!({ "routes": routes })
}

fn summary(route: &RouteMeta) -> Value {
    json!({
        "name": route.name,
        "method": route.method.as_str(),
        "path": route.path.as_str(),
        "operationId": route.operation_id,
        "target": route.target.as_ref().map(|t| t.to_json()),
        "operation": route.operation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{load_spec_from_value, BuildOptions, StoreOptions};

    fn fixture() -> (Router, SpecDocument) {
        let loaded = load_spec_from_value(
            json!({
                "openapi": "3.0.3",
                "info": { "title": "Pets", "version": "1" },
                "servers": [{ "url": "/api" }],
                "paths": {
                    "/pets": {
                        "get": { "operationId": "listPets", "responses": {} },
                        "post": { "operationId": "addPet", "responses": {} }
                    },
                    "/pets/{id}": {
                        "get": { "operationId": "showPet", "responses": {} }
                    }
                }
            }),
            None,
            &StoreOptions::default(),
            &BuildOptions::default(),
        )
        .unwrap();
        let router = Router::new(loaded.routes.to_vec()).unwrap();
        (router, loaded.store.document().clone())
    }

    #[test]
    fn test_describe_without_filter_returns_document() {
        let (router, doc) = fixture();
        let out = describe(&router, &doc, &DescribeQuery::default());
        assert_eq!(out["info"]["title"], "Pets");
        assert!(out["components"]["schemas"]["DefaultResponse"].is_object());
    }

    #[test]
    fn test_describe_filters_by_method() {
        let (router, doc) = fixture();
        let out = describe(&router, &doc, &DescribeQuery::method("get"));
        let names: Vec<&str> = out["routes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["listPets", "showPet"]);
    }

    #[test]
    fn test_describe_filters_by_path() {
        let (router, doc) = fixture();
        let query = DescribeQuery {
            method: None,
            path: Some("/api/pets/7".to_string()),
        };
        let out = describe(&router, &doc, &query);
        assert_eq!(out["routes"].as_array().unwrap().len(), 1);
        assert_eq!(out["routes"][0]["path"], "/api/pets/{id}");
    }
}
