//! # Configuration Module
//!
//! The configuration surface of a binding: which specification to load and how
//! to derive routes from it.
//!
//! ```yaml
//! spec: openapi.yaml          # path (relative to this file) or an inline document
//! schema_version: v3          # v2 or v3; detected from the document when omitted
//! route_name_prefix: petstore # route names become petstore.<name>
//! default_response_name: DefaultResponse
//! default_response_codes: [400, 401, 404, 500, 501]
//! ```
//!
//! ## Environment Variables
//!
//! Applied by [`OpenApiConfig::with_env_overrides`]:
//!
//! - `BRRTBIND_SPEC` replaces `spec` with a path
//! - `BRRTBIND_SCHEMA_VERSION` replaces `schema_version`
//! - `BRRTBIND_ROUTE_NAME_PREFIX` replaces `route_name_prefix`
//!
//! Security callbacks are code, not configuration; they are registered on the
//! [`OpenApi`](crate::server::OpenApi) builder.

use crate::error::{SpecError, SpecResult};
use crate::spec::{
    load_spec, load_spec_from_value, BuildOptions, LoadedSpec, SchemaVersion, StoreOptions,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Where the specification comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecSource {
    Path(PathBuf),
    Inline(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiConfig {
    pub spec: SpecSource,
    #[serde(default)]
    pub schema_version: Option<SchemaVersion>,
    #[serde(default)]
    pub route_name_prefix: Option<String>,
    #[serde(default = "default_response_codes")]
    pub default_response_codes: BTreeSet<u16>,
    #[serde(default = "default_response_name")]
    pub default_response_name: String,
    /// Directory relative paths resolve against; the config file's directory
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

fn default_response_codes() -> BTreeSet<u16> {
    StoreOptions::default().default_response_codes
}

fn default_response_name() -> String {
    StoreOptions::default().default_response_name
}

impl OpenApiConfig {
    /// Configuration with defaults for everything but the source.
    pub fn new(spec: SpecSource) -> Self {
        Self {
            spec,
            schema_version: None,
            route_name_prefix: None,
            default_response_codes: default_response_codes(),
            default_response_name: default_response_name(),
            base_dir: None,
        }
    }

    pub fn from_spec_path(path: impl Into<PathBuf>) -> Self {
        Self::new(SpecSource::Path(path.into()))
    }

    /// Read a YAML (or JSON) configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> SpecResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_yaml::from_str(&content).map_err(|e| SpecError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Apply `BRRTBIND_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(spec) = lookup("BRRTBIND_SPEC").filter(|s| !s.is_empty()) {
            self.spec = SpecSource::Path(PathBuf::from(spec));
            self.base_dir = None;
        }
        if let Some(version) = lookup("BRRTBIND_SCHEMA_VERSION") {
            match SchemaVersion::parse(&version) {
                Some(v) => self.schema_version = Some(v),
                None => warn!(value = %version, "Ignoring invalid BRRTBIND_SCHEMA_VERSION"),
            }
        }
        if let Some(prefix) = lookup("BRRTBIND_ROUTE_NAME_PREFIX") {
            self.route_name_prefix = Some(prefix).filter(|p| !p.is_empty());
        }
        self
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            schema_version: self.schema_version,
            default_response_name: self.default_response_name.clone(),
            default_response_codes: self.default_response_codes.clone(),
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            route_name_prefix: self.route_name_prefix.clone(),
        }
    }

    /// Path of the specification file, resolved against `base_dir`.
    pub fn spec_path(&self) -> Option<PathBuf> {
        match &self.spec {
            SpecSource::Path(p) if p.is_relative() => Some(
                self.base_dir
                    .as_ref()
                    .map_or_else(|| p.clone(), |dir| dir.join(p)),
            ),
            SpecSource::Path(p) => Some(p.clone()),
            SpecSource::Inline(_) => None,
        }
    }

    /// Load the specification and build its route table.
    pub fn load(&self) -> SpecResult<LoadedSpec> {
        match (&self.spec, self.spec_path()) {
            (_, Some(path)) => load_spec(path, &self.store_options(), &self.build_options()),
            (SpecSource::Inline(doc), None) => load_spec_from_value(
                doc.clone(),
                self.base_dir.clone(),
                &self.store_options(),
                &self.build_options(),
            ),
            (SpecSource::Path(_), None) => Err(SpecError::InvalidDocument(
                "no specification path configured".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_yaml_with_defaults() {
        let config: OpenApiConfig = serde_yaml::from_str("spec: openapi.yaml\n").unwrap();
        assert_eq!(config.spec, SpecSource::Path(PathBuf::from("openapi.yaml")));
        assert_eq!(config.default_response_name, "DefaultResponse");
        assert_eq!(
            config.default_response_codes.into_iter().collect::<Vec<_>>(),
            vec![400, 401, 404, 500, 501]
        );
    }

    #[test]
    fn test_inline_spec() {
        let yaml = "spec:\n  openapi: 3.0.3\n  paths: {}\nschema_version: v3\nroute_name_prefix: pets\n";
        let config: OpenApiConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(config.spec, SpecSource::Inline(ref v) if v["openapi"] == json!("3.0.3")));
        assert_eq!(config.schema_version, Some(SchemaVersion::V3));
        assert_eq!(config.build_options().route_name_prefix.as_deref(), Some("pets"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BRRTBIND_SPEC", "/srv/api.json"),
            ("BRRTBIND_SCHEMA_VERSION", "v2"),
            ("BRRTBIND_ROUTE_NAME_PREFIX", "admin"),
        ]
        .into_iter()
        .collect();
        let config = OpenApiConfig::from_spec_path("openapi.yaml")
            .with_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.spec_path(), Some(PathBuf::from("/srv/api.json")));
        assert_eq!(config.schema_version, Some(SchemaVersion::V2));
        assert_eq!(config.route_name_prefix.as_deref(), Some("admin"));
    }

    #[test]
    fn test_relative_spec_path_uses_base_dir() {
        let mut config = OpenApiConfig::from_spec_path("api/openapi.yaml");
        config.base_dir = Some(PathBuf::from("/etc/brrtbind"));
        assert_eq!(
            config.spec_path(),
            Some(PathBuf::from("/etc/brrtbind/api/openapi.yaml"))
        );
    }
}
