pub mod request;
pub mod response;
pub mod service;

pub use request::{media_type, parse_cookies, parse_query_params, RawRequest};
pub use response::{status_reason, JsonRender, Render, Rendered, RENDER_TAG};
pub use service::{AppService, OpenApi};
