use super::{Denial, SecurityCallback, SecurityRequest};
use async_trait::async_trait;
use serde_json::Value;

/// Checks an `apiKey` scheme's credential against a fixed set of keys.
///
/// The credential is read from wherever the scheme declares it: `in: header`,
/// `in: query` or `in: cookie`, under the scheme's `name`.
#[derive(Debug, Clone)]
pub struct ApiKeyCallback {
    keys: Vec<String>,
}

impl ApiKeyCallback {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            keys: vec![key.into()],
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    fn extract<'a>(request: &SecurityRequest<'a>, scheme: &Value) -> Result<Option<&'a str>, Denial> {
        if scheme.get("type").and_then(Value::as_str) != Some("apiKey") {
            return Err(Denial::unauthorized("Scheme is not an apiKey scheme."));
        }
        let name = scheme
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Denial::unauthorized("apiKey scheme has no name."))?;
        Ok(match scheme.get("in").and_then(Value::as_str) {
            Some("header") => request.get_header(name),
            Some("query") => request.get_query(name),
            Some("cookie") => request.get_cookie(name),
            _ => return Err(Denial::unauthorized("apiKey scheme has no valid location.")),
        })
    }
}

#[async_trait]
impl SecurityCallback for ApiKeyCallback {
    async fn check(
        &self,
        request: &SecurityRequest<'_>,
        scheme: &Value,
        _scopes: &[String],
    ) -> Result<(), Denial> {
        match Self::extract(request, scheme)? {
            None => Err(Denial::unauthorized("Missing API key.")),
            Some(key) if self.keys.iter().any(|k| k == key) => Ok(()),
            Some(_) => Err(Denial::unauthorized("Invalid API key.")),
        }
    }
}
