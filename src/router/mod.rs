//! # Router Module
//!
//! Reference path matcher over the route descriptors produced by
//! [`build_routes`](crate::spec::build_routes).
//!
//! Hosts with their own router can skip this module and match on
//! [`RouteMeta::path`](crate::spec::RouteMeta) directly. Everything downstream
//! only needs the matched descriptor and the captured path parameters.
//!
//! ## Matching
//!
//! Each descriptor's path pattern is compiled to an anchored regex once, at
//! construction. Placeholder kinds map to:
//!
//! | Kind | Matches |
//! |------|---------|
//! | standard | one segment without `/` or `.` |
//! | relaxed | one segment without `/` |
//! | wildcard | the rest of the path, `/` included |
//!
//! When several routes match, the most specific wins: more literal segments
//! first, then fewer wildcard and relaxed placeholders. Remaining ties go to
//! the route declared first.
//!
//! ## Example
//!
//! ```rust,ignore
//! use brrtbind::router::Router;
//! use brrtbind::spec::{load_spec, BuildOptions, StoreOptions};
//!
//! let loaded = load_spec("openapi.yaml", &StoreOptions::default(), &BuildOptions::default())?;
//! let router = Router::new(loaded.routes.to_vec())?;
//! if let Some(m) = router.route(&http::Method::GET, "/api/pets/7") {
//!     println!("{} {:?}", m.route.name, m.path_params);
//! }
//! ```

mod core;

pub use self::core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
