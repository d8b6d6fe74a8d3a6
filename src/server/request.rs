use crate::router::ParamVec;
use http::Method;
use serde_json::Value;
use std::sync::Arc;

/// An inbound request as handed over by the host HTTP server.
///
/// Query, header and cookie values keep every occurrence in arrival order.
/// Header names are stored lower-cased.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    pub query: ParamVec,
    pub headers: ParamVec,
    /// Parsed from `Cookie` headers
    pub cookies: ParamVec,
    /// Filled in by the router once a route matched
    pub path_params: ParamVec,
    /// `Content-Type` as sent; `None` for requests without one
    pub content_type: Option<String>,
    /// Parsed body, if any
    pub body: Option<Value>,
}

impl RawRequest {
    /// Split `target` into path and query string.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query_params(query)),
            None => (target, ParamVec::new()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            headers: ParamVec::new(),
            cookies: ParamVec::new(),
            path_params: ParamVec::new(),
            content_type: None,
            body: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((Arc::from(name), value.into()));
        self
    }

    /// Add a header. `Cookie` and `Content-Type` are also parsed into their own fields.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match name.as_str() {
            "cookie" => self.cookies.extend(parse_cookies(&value)),
            "content-type" => self.content_type = Some(value.clone()),
            _ => {}
        }
        self.headers.push((Arc::from(name.as_str()), value));
        self
    }

    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        if self.content_type.is_none() {
            self.content_type = Some("application/json".to_string());
        }
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_body(mut self, content_type: &str, body: Value) -> Self {
        self.content_type = Some(content_type.to_string());
        self.body = Some(body);
        self
    }

    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_first(&self.headers, |k| k.eq_ignore_ascii_case(name))
    }

    /// Every value of a header, case-insensitive.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        find_all(&self.headers, |k| k.eq_ignore_ascii_case(name))
    }

    /// Last occurrence of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        find_all(&self.query, |k| k == name).pop()
    }

    pub fn query_values(&self, name: &str) -> Vec<&str> {
        find_all(&self.query, |k| k == name)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        find_first(&self.cookies, |k| k == name)
    }

    pub fn cookie_values(&self, name: &str) -> Vec<&str> {
        find_all(&self.cookies, |k| k == name)
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        find_all(&self.path_params, |k| k == name).pop()
    }

    /// Media type without parameters, lower-cased.
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(media_type)
    }
}

fn find_first<'a>(params: &'a ParamVec, matches: impl Fn(&str) -> bool) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| matches(k.as_ref()))
        .map(|(_, v)| v.as_str())
}

fn find_all<'a>(params: &'a ParamVec, matches: impl Fn(&str) -> bool) -> Vec<&'a str> {
    params
        .iter()
        .filter(|(k, _)| matches(k.as_ref()))
        .map(|(_, v)| v.as_str())
        .collect()
}

/// Strip parameters from a `Content-Type` value and lower-case it.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Parse a `Cookie` header value into name/value pairs.
pub fn parse_cookies(header: &str) -> ParamVec {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=').unwrap_or((pair.trim(), ""));
            if name.is_empty() {
                return None;
            }
            Some((Arc::from(name.trim()), value.trim().to_string()))
        })
        .collect()
}

/// Parse a query string (without the leading `?`), percent-decoding names and values.
pub fn parse_query_params(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies("a=b; c=d;flag");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[1].1, "d");
        assert_eq!(cookies[2].0.as_ref(), "flag");
    }

    #[test]
    fn test_new_splits_query() {
        let req = RawRequest::new(Method::GET, "/api/pets?age=5&tag=a&tag=b%20c");
        assert_eq!(req.path, "/api/pets");
        assert_eq!(req.query_param("age"), Some("5"));
        assert_eq!(req.query_values("tag"), vec!["a", "b c"]);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let req = RawRequest::new(Method::POST, "/")
            .with_header("X-Api-Key", "secret")
            .with_header("Content-Type", "Application/JSON; charset=utf-8")
            .with_header("Cookie", "session=abc");
        assert_eq!(req.header("x-api-key"), Some("secret"));
        assert_eq!(req.media_type().as_deref(), Some("application/json"));
        assert_eq!(req.cookie("session"), Some("abc"));
    }
}
