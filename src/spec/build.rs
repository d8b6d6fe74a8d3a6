use super::store::{parse_security, SpecDocument};
use super::types::{
    HandlerTarget, ParameterLocation, ParameterMeta, PathPattern, PlaceholderKind,
    RequestBodyMeta, ResponseKey, ResponseMeta, Responses, RouteMeta, SecurityGroup, METHODS,
};
use crate::error::{SpecError, SpecResult};
use http::Method;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// Options for [`build_routes`].
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Prepended to every route name as `<prefix>.<name>`
    pub route_name_prefix: Option<String>,
}

/// Derive the route table from a loaded document.
///
/// One [`RouteMeta`] is produced per base path, path item and method, in
/// document order. The first problem found aborts the whole build, so callers
/// never see a partial table.
///
/// # Errors
///
/// * [`SpecError::MissingRouteName`] when an operation has neither `x-mojo-name` nor `operationId`
/// * [`SpecError::DuplicateRoute`] when two operations share method and path shape
/// * [`SpecError::InvalidTarget`] / [`SpecError::InvalidPlaceholder`] for malformed extensions
/// * [`SpecError::UnknownSecurityScheme`] when a requirement names an undeclared scheme
pub fn build_routes(doc: &SpecDocument, options: &BuildOptions) -> SpecResult<Vec<RouteMeta>> {
    let mut routes: Vec<RouteMeta> = Vec::new();
    let mut seen: HashSet<(Method, String)> = HashSet::new();

    for base_path in &doc.base_paths {
        for (spec_path, item) in &doc.paths {
            let item = item.as_object().ok_or_else(|| {
                SpecError::InvalidDocument(format!("path item '{spec_path}' must be an object"))
            })?;
            let item_params = item.get("parameters");

            for (method_key, operation) in item {
                if !METHODS.contains(&method_key.as_str()) {
                    continue;
                }
                let method = parse_method(method_key)?;
                let route = build_route(
                    doc,
                    options,
                    routes.len(),
                    base_path,
                    spec_path,
                    method,
                    item_params,
                    operation,
                )?;

                if !seen.insert((route.method.clone(), route.path.normalized())) {
                    return Err(SpecError::DuplicateRoute {
                        method: route.method.to_string(),
                        path: route.path.to_string(),
                    });
                }
                debug!(
                    route = %route.name,
                    method = %route.method,
                    path = %route.path,
                    "Route registered"
                );
                routes.push(route);
            }
        }
    }

    info!(
        routes_count = routes.len(),
        base_paths = ?doc.base_paths,
        "Route table built"
    );
    Ok(routes)
}

fn parse_method(key: &str) -> SpecResult<Method> {
    Method::from_bytes(key.to_ascii_uppercase().as_bytes())
        .map_err(|_| SpecError::InvalidDocument(format!("unknown method '{key}'")))
}

#[allow(clippy::too_many_arguments)]
fn build_route(
    doc: &SpecDocument,
    options: &BuildOptions,
    id: usize,
    base_path: &str,
    spec_path: &str,
    method: Method,
    item_params: Option<&Value>,
    operation: &Value,
) -> SpecResult<RouteMeta> {
    let op = operation.as_object().ok_or_else(|| {
        SpecError::InvalidDocument(format!("operation {method} {spec_path} must be an object"))
    })?;

    let full_path = join_path(base_path, spec_path);
    let name = route_name(op, options, &method, &full_path)?;
    let operation_id = op
        .get("operationId")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut path = PathPattern::parse(&full_path);
    let parameters = merge_parameters(item_params, op.get("parameters"), &name)?;
    for param in &parameters {
        if let Some(kind) = param.placeholder {
            path.set_kind(&param.name, kind);
        }
    }

    let target = match op.get("x-mojo-to") {
        Some(value) => Some(parse_target(value, &name)?),
        None => None,
    };

    let security = match op.get("security") {
        Some(value) => parse_security(value)?,
        None => doc.security.clone(),
    };
    check_security(&security, doc, &name)?;

    Ok(RouteMeta {
        id,
        method,
        base_path: base_path.to_string(),
        spec_path: spec_path.to_string(),
        path,
        name,
        operation_id,
        target,
        parameters,
        request_body: op.get("requestBody").and_then(request_body),
        responses: responses(op.get("responses")),
        security,
        operation: operation.clone(),
    })
}

fn join_path(base_path: &str, spec_path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    match (base.is_empty(), spec_path) {
        (true, p) => p.to_string(),
        (false, "/" | "") => base.to_string(),
        (false, p) => format!("{base}{p}"),
    }
}

fn route_name(
    op: &Map<String, Value>,
    options: &BuildOptions,
    method: &Method,
    path: &str,
) -> SpecResult<String> {
    let name = op
        .get("x-mojo-name")
        .and_then(Value::as_str)
        .or_else(|| op.get("operationId").and_then(Value::as_str))
        .filter(|n| !n.is_empty())
        .ok_or_else(|| SpecError::MissingRouteName {
            method: method.to_string(),
            path: path.to_string(),
        })?;
    Ok(match options.route_name_prefix.as_deref() {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}.{name}"),
        _ => name.to_string(),
    })
}

/// Operation parameters replace path item parameters with the same name and location.
fn merge_parameters(
    item_params: Option<&Value>,
    op_params: Option<&Value>,
    route: &str,
) -> SpecResult<Vec<ParameterMeta>> {
    let mut out: Vec<ParameterMeta> = Vec::new();
    for list in [item_params, op_params].into_iter().flatten() {
        let list = list.as_array().ok_or_else(|| {
            SpecError::InvalidDocument(format!("parameters of {route} must be a list"))
        })?;
        for raw in list {
            let param = parameter(raw, route)?;
            match out
                .iter_mut()
                .find(|p| p.name == param.name && p.location == param.location)
            {
                Some(existing) => *existing = param,
                None => out.push(param),
            }
        }
    }
    Ok(out)
}

fn parameter(raw: &Value, route: &str) -> SpecResult<ParameterMeta> {
    let invalid = |why: &str| SpecError::InvalidDocument(format!("parameter of {route} {why}"));
    let name = raw
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("has no name"))?;
    let location = raw
        .get("in")
        .and_then(Value::as_str)
        .and_then(ParameterLocation::parse)
        .ok_or_else(|| invalid(&format!("'{name}' has an unknown location")))?;

    let placeholder = match raw.get("x-mojo-placeholder") {
        None => None,
        Some(value) => {
            let kind = value
                .as_str()
                .and_then(PlaceholderKind::parse)
                .ok_or_else(|| SpecError::InvalidPlaceholder {
                    route: route.to_string(),
                    parameter: name.to_string(),
                    value: value.as_str().map_or_else(|| value.to_string(), str::to_string),
                })?;
            (location == ParameterLocation::Path).then_some(kind)
        }
    };

    // form style (query, cookie) explodes by default
    let explode = raw.get("explode").and_then(Value::as_bool).unwrap_or(matches!(
        location,
        ParameterLocation::Query | ParameterLocation::Cookie
    ));

    Ok(ParameterMeta {
        name: name.to_string(),
        location,
        required: location == ParameterLocation::Path
            || raw.get("required").and_then(Value::as_bool).unwrap_or(false),
        schema: raw
            .get("schema")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new())),
        placeholder,
        explode,
    })
}

fn content_schemas(content: Option<&Value>) -> BTreeMap<String, Value> {
    content
        .and_then(Value::as_object)
        .map(|media| {
            media
                .iter()
                .map(|(mt, obj)| {
                    let schema = obj
                        .get("schema")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Map::new()));
                    (mt.to_ascii_lowercase(), schema)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn request_body(body: &Value) -> Option<RequestBodyMeta> {
    let body = body.as_object()?;
    Some(RequestBodyMeta {
        content: content_schemas(body.get("content")),
        required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn responses(value: Option<&Value>) -> Responses {
    let mut out = Responses::new();
    for (key, response) in value.and_then(Value::as_object).into_iter().flatten() {
        match ResponseKey::parse(key) {
            Some(parsed) => {
                out.insert(
                    parsed,
                    ResponseMeta {
                        content: content_schemas(response.get("content")),
                    },
                );
            }
            None => warn!(key = %key, "Ignoring unrecognised response key"),
        }
    }
    out
}

/// Parse `x-mojo-to`: a `controller#action` string, an object, or a list whose
/// first element is the base and whose remaining objects merge over it.
pub fn parse_target(value: &Value, route: &str) -> SpecResult<HandlerTarget> {
    let invalid = |reason: &str| SpecError::InvalidTarget {
        route: route.to_string(),
        reason: reason.to_string(),
    };
    let base = |value: &Value| -> SpecResult<HandlerTarget> {
        match value {
            Value::String(s) => HandlerTarget::parse(s)
                .ok_or_else(|| invalid("expected 'controller#action' with a '#' separator")),
            Value::Object(map) => Ok(HandlerTarget::Map(map.clone())),
            _ => Err(invalid("target must be a string, an object or a list")),
        }
    };

    match value {
        Value::Array(items) => {
            let (first, rest) = items
                .split_first()
                .ok_or_else(|| invalid("target list is empty"))?;
            let mut target = base(first)?;
            for extra in rest {
                let extra = extra
                    .as_object()
                    .ok_or_else(|| invalid("list elements after the first must be objects"))?;
                target = target.merge(extra);
            }
            Ok(target)
        }
        other => base(other),
    }
}

fn check_security(groups: &[SecurityGroup], doc: &SpecDocument, route: &str) -> SpecResult<()> {
    for requirement in groups.iter().flatten() {
        if !doc.security_schemes.contains_key(&requirement.scheme) {
            return Err(SpecError::UnknownSecurityScheme {
                route: route.to_string(),
                scheme: requirement.scheme.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "/pets"), "/pets");
        assert_eq!(join_path("/api", "/pets"), "/api/pets");
        assert_eq!(join_path("/api/", "/pets"), "/api/pets");
        assert_eq!(join_path("/api", "/"), "/api");
    }

    #[test]
    fn test_parse_target_shapes() {
        let t = parse_target(&json!("pet#list"), "r").unwrap();
        assert_eq!(t.controller(), Some("pet"));

        let t = parse_target(&json!({"cb": "x"}), "r").unwrap();
        assert_eq!(t.to_json(), json!({"cb": "x"}));

        let t = parse_target(&json!(["pet#list", {"a": 1}, {"a": 2, "action": "all"}]), "r").unwrap();
        assert_eq!(t.to_json(), json!({"controller": "pet", "action": "all", "a": 2}));
    }

    #[test]
    fn test_parse_target_rejects_bad_shapes() {
        for bad in [json!("petlist"), json!(42), json!([]), json!(["pet#list", "x#y"])] {
            let err = parse_target(&bad, "r").unwrap_err();
            assert!(matches!(err, SpecError::InvalidTarget { .. }), "{bad}");
        }
    }

    #[test]
    fn test_operation_parameter_overrides_path_item() {
        let item = json!([{ "name": "limit", "in": "query", "schema": { "type": "string" } }]);
        let op = json!([
            { "name": "limit", "in": "query", "schema": { "type": "integer" } },
            { "name": "limit", "in": "header", "schema": { "type": "string" } }
        ]);
        let params = merge_parameters(Some(&item), Some(&op), "r").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].schema["type"], "integer");
        assert!(params[0].explode);
        assert!(!params[1].explode);
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let raw = json!({ "name": "id", "in": "path", "x-mojo-placeholder": "?" });
        let err = parameter(&raw, "r").unwrap_err();
        assert!(matches!(err, SpecError::InvalidPlaceholder { .. }));
    }
}
