use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// HTTP methods an operation can be declared under, in OpenAPI key form.
pub const METHODS: [&str; 8] = [
    "get", "post", "put", "delete", "patch", "head", "options", "trace",
];

/// Specification dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Swagger 2.0 (`swagger: "2.0"`)
    V2,
    /// OpenAPI 3.x (`openapi: 3.x.y`)
    #[default]
    V3,
}

impl SchemaVersion {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v2" | "2" | "2.0" => Some(SchemaVersion::V2),
            "v3" | "3" => Some(SchemaVersion::V3),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::V2 => write!(f, "v2"),
            SchemaVersion::V3 => write!(f, "v3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Greediness of a path placeholder.
///
/// Ordered from narrowest to widest, which is also the order used to rank
/// competing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PlaceholderKind {
    /// One segment, no `/` and no `.`
    #[default]
    Standard,
    /// One segment, no `/`
    Relaxed,
    /// Everything that remains, `/` included
    Wildcard,
}

impl PlaceholderKind {
    /// Parse an `x-mojo-placeholder` value. Accepts both the symbol and the word.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ":" | "standard" => Some(PlaceholderKind::Standard),
            "#" | "relaxed" => Some(PlaceholderKind::Relaxed),
            "*" | "wildcard" => Some(PlaceholderKind::Wildcard),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            PlaceholderKind::Standard => ':',
            PlaceholderKind::Relaxed => '#',
            PlaceholderKind::Wildcard => '*',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Literal(String),
    Placeholder { name: String, kind: PlaceholderKind },
}

/// A route path split into literal segments and placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<PathSegment>,
}

impl PathPattern {
    /// Split `path` on `/`. A segment wrapped in `{}` becomes a standard placeholder.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                match segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                {
                    Some(name) if !name.is_empty() => PathSegment::Placeholder {
                        name: name.to_string(),
                        kind: PlaceholderKind::Standard,
                    },
                    _ => PathSegment::Literal(segment.to_string()),
                }
            })
            .collect();
        let raw = if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        };
        Self { raw, segments }
    }

    /// The path as written, placeholders in `{name}` form.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn placeholders(&self) -> impl Iterator<Item = (&str, PlaceholderKind)> {
        self.segments.iter().filter_map(|s| match s {
            PathSegment::Placeholder { name, kind } => Some((name.as_str(), *kind)),
            PathSegment::Literal(_) => None,
        })
    }

    /// Change the kind of the placeholder called `name`. Returns false when absent.
    pub fn set_kind(&mut self, name: &str, new_kind: PlaceholderKind) -> bool {
        let mut found = false;
        for segment in &mut self.segments {
            if let PathSegment::Placeholder { name: n, kind } = segment {
                if n == name {
                    *kind = new_kind;
                    found = true;
                }
            }
        }
        found
    }

    /// Identity used for duplicate detection: placeholder names are dropped, kinds kept.
    pub fn normalized(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            out.push('/');
            match segment {
                PathSegment::Literal(l) => out.push_str(l),
                PathSegment::Placeholder { kind, .. } => {
                    out.push('{');
                    out.push(kind.symbol());
                    out.push('}');
                }
            }
        }
        out
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Value,
    /// `x-mojo-placeholder` override, path parameters only
    pub placeholder: Option<PlaceholderKind>,
    /// Arrays arrive as repeated keys when true, comma separated otherwise
    pub explode: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodyMeta {
    /// media type -> schema
    pub content: BTreeMap<String, Value>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseMeta {
    /// media type -> schema; empty for responses without a body
    pub content: BTreeMap<String, Value>,
}

/// Key of an operation's `responses` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResponseKey {
    Status(u16),
    /// `2XX` style range, holding the leading digit
    Range(u16),
    Default,
}

impl ResponseKey {
    pub fn parse(s: &str) -> Option<Self> {
        if s == "default" {
            return Some(ResponseKey::Default);
        }
        let bytes = s.as_bytes();
        if bytes.len() == 3 && bytes[1].eq_ignore_ascii_case(&b'x') && bytes[2].eq_ignore_ascii_case(&b'x') {
            return match bytes[0] {
                b'1'..=b'5' => Some(ResponseKey::Range(u16::from(bytes[0] - b'0'))),
                _ => None,
            };
        }
        match s.parse::<u16>() {
            Ok(code) if (100..=599).contains(&code) => Some(ResponseKey::Status(code)),
            _ => None,
        }
    }

    pub fn matches(&self, status: u16) -> bool {
        match self {
            ResponseKey::Status(code) => *code == status,
            ResponseKey::Range(digit) => status / 100 == *digit,
            ResponseKey::Default => true,
        }
    }
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseKey::Status(code) => write!(f, "{code}"),
            ResponseKey::Range(digit) => write!(f, "{digit}XX"),
            ResponseKey::Default => write!(f, "default"),
        }
    }
}

pub type Responses = BTreeMap<ResponseKey, ResponseMeta>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SecurityRequirement {
    pub scheme: String,
    pub scopes: Vec<String>,
}

/// All requirements of a group must pass.
pub type SecurityGroup = Vec<SecurityRequirement>;

/// Where a matched route should be dispatched, as declared by `x-mojo-to`.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerTarget {
    /// `controller#action`; either half may be empty
    Endpoint {
        controller: Option<String>,
        action: Option<String>,
    },
    /// Structured target passed through verbatim
    Map(Map<String, Value>),
}

impl HandlerTarget {
    /// Parse `controller#action`. A string without `#` is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let (controller, action) = s.split_once('#')?;
        let non_empty = |v: &str| (!v.is_empty()).then(|| v.to_string());
        let (controller, action) = (non_empty(controller), non_empty(action));
        if controller.is_none() && action.is_none() {
            return None;
        }
        Some(HandlerTarget::Endpoint { controller, action })
    }

    pub fn into_map(self) -> Map<String, Value> {
        match self {
            HandlerTarget::Map(map) => map,
            HandlerTarget::Endpoint { controller, action } => {
                let mut map = Map::new();
                if let Some(c) = controller {
                    map.insert("controller".to_string(), Value::String(c));
                }
                if let Some(a) = action {
                    map.insert("action".to_string(), Value::String(a));
                }
                map
            }
        }
    }

    /// Merge `extra` over this target; keys in `extra` win.
    pub fn merge(self, extra: &Map<String, Value>) -> HandlerTarget {
        let mut map = self.into_map();
        for (key, value) in extra {
            map.insert(key.clone(), value.clone());
        }
        HandlerTarget::Map(map)
    }

    pub fn controller(&self) -> Option<&str> {
        match self {
            HandlerTarget::Endpoint { controller, .. } => controller.as_deref(),
            HandlerTarget::Map(map) => map.get("controller").and_then(Value::as_str),
        }
    }

    pub fn action(&self) -> Option<&str> {
        match self {
            HandlerTarget::Endpoint { action, .. } => action.as_deref(),
            HandlerTarget::Map(map) => map.get("action").and_then(Value::as_str),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.clone().into_map())
    }
}

/// Route descriptor derived from one server base path, path item and method.
#[derive(Debug, Clone)]
pub struct RouteMeta {
    /// Position in the route table; also keys the validator cache
    pub id: usize,
    pub method: Method,
    pub base_path: String,
    /// Path item key as written in the document
    pub spec_path: String,
    /// Base path joined with the path item key
    pub path: PathPattern,
    pub name: String,
    pub operation_id: Option<String>,
    pub target: Option<HandlerTarget>,
    pub parameters: Vec<ParameterMeta>,
    pub request_body: Option<RequestBodyMeta>,
    pub responses: Responses,
    /// Alternatives, evaluated in order
    pub security: Vec<SecurityGroup>,
    /// The resolved operation object
    pub operation: Value,
}

impl RouteMeta {
    /// Response binding for `status`: exact code, then range, then `default`.
    pub fn response_for(&self, status: u16) -> Option<(ResponseKey, &ResponseMeta)> {
        let candidates = [
            ResponseKey::Status(status),
            ResponseKey::Range(status / 100),
            ResponseKey::Default,
        ];
        candidates
            .into_iter()
            .find_map(|key| self.responses.get(&key).map(|meta| (key, meta)))
    }

    pub fn parameter(&self, location: ParameterLocation, name: &str) -> Option<&ParameterMeta> {
        self.parameters
            .iter()
            .find(|p| p.location == location && p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_pattern_parse() {
        let p = PathPattern::parse("/api/pets/{id}/toys");
        assert_eq!(p.segments().len(), 4);
        assert_eq!(p.placeholders().collect::<Vec<_>>(), vec![("id", PlaceholderKind::Standard)]);
        assert_eq!(p.normalized(), "/api/pets/{:}/toys");
    }

    #[test]
    fn test_normalized_ignores_names_keeps_kinds() {
        let a = PathPattern::parse("/pets/{id}");
        let mut b = PathPattern::parse("/pets/{petId}");
        assert_eq!(a.normalized(), b.normalized());
        assert!(b.set_kind("petId", PlaceholderKind::Wildcard));
        assert_ne!(a.normalized(), b.normalized());
    }

    #[test]
    fn test_response_key_parse() {
        assert_eq!(ResponseKey::parse("200"), Some(ResponseKey::Status(200)));
        assert_eq!(ResponseKey::parse("4XX"), Some(ResponseKey::Range(4)));
        assert_eq!(ResponseKey::parse("5xx"), Some(ResponseKey::Range(5)));
        assert_eq!(ResponseKey::parse("default"), Some(ResponseKey::Default));
        assert_eq!(ResponseKey::parse("x-extension"), None);
        assert_eq!(ResponseKey::parse("999"), None);
    }

    #[test]
    fn test_handler_target_parse() {
        assert_eq!(
            HandlerTarget::parse("pet#list"),
            Some(HandlerTarget::Endpoint {
                controller: Some("pet".into()),
                action: Some("list".into())
            })
        );
        assert_eq!(
            HandlerTarget::parse("#list"),
            Some(HandlerTarget::Endpoint {
                controller: None,
                action: Some("list".into())
            })
        );
        assert_eq!(HandlerTarget::parse("list"), None);
        assert_eq!(HandlerTarget::parse("#"), None);
    }

    #[test]
    fn test_handler_target_merge_last_key_wins() {
        let base = HandlerTarget::parse("pet#list").unwrap();
        let extra = json!({"action": "index", "format": "json"});
        let merged = base.merge(extra.as_object().unwrap());
        assert_eq!(merged.controller(), Some("pet"));
        assert_eq!(merged.action(), Some("index"));
        assert_eq!(merged.to_json()["format"], "json");
    }
}
