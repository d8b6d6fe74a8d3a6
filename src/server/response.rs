use serde_json::Value;

/// Tag passed to every [`Render::render`] call.
pub const RENDER_TAG: &str = "openapi";

/// Rendering hook supplied by the host.
///
/// The host owns content negotiation and serialization; the pipeline only hands
/// over the value and its status.
pub trait Render {
    type Output;

    fn render(&self, tag: &str, value: Value, status: u16) -> Self::Output;
}

/// Output of [`JsonRender`].
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub tag: String,
    pub status: u16,
    pub body: Value,
}

impl Rendered {
    pub fn reason(&self) -> &'static str {
        status_reason(self.status)
    }

    /// JSON bytes of the body; an empty body for `null`.
    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.body {
            Value::Null => Vec::new(),
            other => other.to_string().into_bytes(),
        }
    }
}

/// Renders to a [`Rendered`] value, for hosts that serialize JSON themselves and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRender;

impl Render for JsonRender {
    type Output = Rendered;

    fn render(&self, tag: &str, value: Value, status: u16) -> Rendered {
        Rendered {
            tag: tag.to_string(),
            status,
            body: value,
        }
    }
}

pub fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(501), "Not Implemented");
    }

    #[test]
    fn test_json_render() {
        let out = JsonRender.render(RENDER_TAG, json!({ "ok": true }), 201);
        assert_eq!(out.tag, "openapi");
        assert_eq!(out.reason(), "Created");
        assert_eq!(out.to_bytes(), br#"{"ok":true}"#.to_vec());
    }
}
