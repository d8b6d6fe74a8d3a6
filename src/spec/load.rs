use super::build::{build_routes, BuildOptions};
use super::store::{SchemaStore, StoreOptions};
use super::types::RouteMeta;
use crate::error::SpecResult;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A schema store together with the routes derived from it.
///
/// The two are always built as a pair; rebuilding means loading a new one.
#[derive(Debug, Clone)]
pub struct LoadedSpec {
    pub store: SchemaStore,
    pub routes: Arc<Vec<RouteMeta>>,
}

/// Load a JSON or YAML specification file and build its route table.
pub fn load_spec(
    path: impl AsRef<Path>,
    store_options: &StoreOptions,
    build_options: &BuildOptions,
) -> SpecResult<LoadedSpec> {
    let store = SchemaStore::load(path, store_options)?;
    let routes = build_routes(store.document(), build_options)?;
    Ok(LoadedSpec {
        store,
        routes: Arc::new(routes),
    })
}

/// Same as [`load_spec`] for a document already in memory.
pub fn load_spec_from_value(
    value: Value,
    base_dir: Option<PathBuf>,
    store_options: &StoreOptions,
    build_options: &BuildOptions,
) -> SpecResult<LoadedSpec> {
    let store = SchemaStore::from_value(value, base_dir, store_options)?;
    let routes = build_routes(store.document(), build_options)?;
    Ok(LoadedSpec {
        store,
        routes: Arc::new(routes),
    })
}
