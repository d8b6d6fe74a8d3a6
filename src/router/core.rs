use crate::error::{SpecError, SpecResult};
use crate::spec::{PathSegment, PlaceholderKind, RouteMeta};
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::{debug, info};

/// Maximum number of path parameters stored inline before spilling to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Name/value pairs captured from a request. Names are shared with the route table.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of matching a request path to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteMeta>,
    /// Decoded placeholder values, in path order
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Last value captured for `name`.
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Ranking key; larger is more specific.
type Specificity = (usize, Reverse<usize>, Reverse<usize>, Reverse<usize>);

#[derive(Debug, Clone)]
struct CompiledRoute {
    regex: Regex,
    param_names: Vec<Arc<str>>,
    specificity: Specificity,
    meta: Arc<RouteMeta>,
}

/// Immutable route table with a regex per descriptor.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<CompiledRoute>,
    base_paths: Vec<String>,
}

impl Router {
    /// Compile every route. Fails only when a literal segment cannot form a regex.
    pub fn new(routes: Vec<RouteMeta>) -> SpecResult<Self> {
        let mut base_paths: Vec<String> = Vec::new();
        let mut compiled = Vec::with_capacity(routes.len());
        for route in routes {
            if !base_paths.contains(&route.base_path) {
                base_paths.push(route.base_path.clone());
            }
            let (regex, param_names) = Self::path_to_regex(route.path.segments())?;
            compiled.push(CompiledRoute {
                regex,
                param_names,
                specificity: specificity(route.path.segments(), route.id),
                meta: Arc::new(route),
            });
        }

        let routes_summary: Vec<String> = compiled
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.meta.method, r.meta.path))
            .collect();
        info!(
            routes_count = compiled.len(),
            base_paths = ?base_paths,
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Ok(Self {
            routes: compiled,
            base_paths,
        })
    }

    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteMeta>> {
        self.routes.iter().map(|r| &r.meta)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Distinct base paths, in declaration order.
    pub fn base_paths(&self) -> &[String] {
        &self.base_paths
    }

    /// True when `path` names one of the base paths (`/` for the root).
    pub fn is_base_path(&self, path: &str) -> bool {
        let path = trim_path(path);
        self.base_paths
            .iter()
            .any(|b| (b.is_empty() && path == "/") || b == path)
    }

    /// Most specific route for `method` and `path`.
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let found = self.best_match(path, |r| r.meta.method == *method);
        match &found {
            Some(m) => debug!(
                method = %method,
                path = %path,
                route = %m.route.name,
                path_params = ?m.path_params,
                "Route matched"
            ),
            None => debug!(method = %method, path = %path, "No route matched"),
        }
        found
    }

    /// Every route whose path matches, whatever its method.
    pub fn match_path_any(&self, path: &str) -> Vec<Arc<RouteMeta>> {
        let path = trim_path(path);
        self.routes
            .iter()
            .filter(|r| r.regex.is_match(path))
            .map(|r| Arc::clone(&r.meta))
            .collect()
    }

    fn best_match(&self, path: &str, accept: impl Fn(&CompiledRoute) -> bool) -> Option<RouteMatch> {
        let path = trim_path(path);
        let mut best: Option<(&CompiledRoute, regex::Captures<'_>)> = None;
        for route in self.routes.iter().filter(|r| accept(r)) {
            let Some(caps) = route.regex.captures(path) else {
                continue;
            };
            if best
                .as_ref()
                .map_or(true, |(b, _)| route.specificity > b.specificity)
            {
                best = Some((route, caps));
            }
        }

        best.map(|(route, caps)| {
            let path_params = route
                .param_names
                .iter()
                .zip(caps.iter().skip(1))
                .filter_map(|(name, cap)| {
                    let raw = cap?.as_str();
                    let value = urlencoding::decode(raw)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| raw.to_string());
                    Some((Arc::clone(name), value))
                })
                .collect();
            RouteMatch {
                route: Arc::clone(&route.meta),
                path_params,
            }
        })
    }

    /// Convert path segments to an anchored regex and the ordered placeholder names.
    pub(crate) fn path_to_regex(segments: &[PathSegment]) -> SpecResult<(Regex, Vec<Arc<str>>)> {
        let mut pattern = String::with_capacity(segments.len() * 12 + 2);
        pattern.push('^');
        let mut param_names = Vec::new();

        for segment in segments {
            pattern.push('/');
            match segment {
                PathSegment::Literal(literal) => pattern.push_str(&regex::escape(literal)),
                PathSegment::Placeholder { name, kind } => {
                    pattern.push_str(match kind {
                        PlaceholderKind::Standard => "([^/.]+)",
                        PlaceholderKind::Relaxed => "([^/]+)",
                        PlaceholderKind::Wildcard => "(.+)",
                    });
                    param_names.push(Arc::from(name.as_str()));
                }
            }
        }
        if segments.is_empty() {
            pattern.push('/');
        }
        pattern.push('$');

        let regex = Regex::new(&pattern)
            .map_err(|e| SpecError::InvalidDocument(format!("bad path pattern {pattern}: {e}")))?;
        Ok((regex, param_names))
    }
}

fn specificity(segments: &[PathSegment], id: usize) -> Specificity {
    let (mut literals, mut relaxed, mut wildcards) = (0, 0, 0);
    for segment in segments {
        match segment {
            PathSegment::Literal(_) => literals += 1,
            PathSegment::Placeholder { kind, .. } => match kind {
                PlaceholderKind::Standard => {}
                PlaceholderKind::Relaxed => relaxed += 1,
                PlaceholderKind::Wildcard => wildcards += 1,
            },
        }
    }
    (literals, Reverse(wildcards), Reverse(relaxed), Reverse(id))
}

fn trim_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
