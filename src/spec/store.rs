//! Schema store: loads a specification, resolves every `$ref` and injects the
//! default error response.
//!
//! Resolution happens once, before any route is built. Local pointers resolve
//! against the document they appear in; `file.json#/pointer` loads a file next
//! to the referring document and resolves its own references relative to it.
//! The resolved document contains no `$ref` nodes.

use super::types::{SchemaVersion, SecurityGroup, SecurityRequirement, METHODS};
use crate::error::{SpecError, SpecResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Id of the root document inside the resolver.
const ROOT_DOCUMENT: &str = "";

/// Keys holding literal JSON values that must not be searched for references.
const LITERAL_KEYS: [&str; 4] = ["example", "enum", "default", "const"];

/// Keys whose object value maps user-chosen names to schemas or other objects.
/// A name in such a map is never a keyword, so `default` there is a property.
const NAME_MAP_KEYS: [&str; 14] = [
    "properties",
    "patternProperties",
    "definitions",
    "schemas",
    "paths",
    "responses",
    "parameters",
    "requestBodies",
    "securitySchemes",
    "headers",
    "content",
    "examples",
    "links",
    "callbacks",
];

/// How to treat the keys of an object met during a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keys {
    /// Keywords: literal keys hold data, not schemas
    Keywords,
    /// Names chosen by the document author
    Names,
}

impl Keys {
    fn literal(self, key: &str) -> bool {
        self == Keys::Keywords && LITERAL_KEYS.contains(&key)
    }

    fn child(self, key: &str) -> Keys {
        if self == Keys::Keywords && NAME_MAP_KEYS.contains(&key) {
            Keys::Names
        } else {
            Keys::Keywords
        }
    }
}

static SERVER_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\{([^}]+)\}").expect("valid server variable regex")
});

/// Options controlling how a document is loaded.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Expected dialect. Documents declaring the other one are rejected.
    pub schema_version: Option<SchemaVersion>,
    pub default_response_name: String,
    pub default_response_codes: BTreeSet<u16>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            schema_version: None,
            default_response_name: "DefaultResponse".to_string(),
            default_response_codes: [400, 401, 404, 500, 501].into_iter().collect(),
        }
    }
}

/// Parsed and resolved specification. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecDocument {
    pub version: SchemaVersion,
    /// Value of the `openapi` or `swagger` key
    pub version_tag: String,
    pub info: Value,
    /// Base path prefixes derived from `servers` (or `basePath`), in document order
    pub base_paths: Vec<String>,
    pub paths: Map<String, Value>,
    pub schemas: Map<String, Value>,
    pub security_schemes: Map<String, Value>,
    /// Document level `security`, used by operations without their own
    pub security: Vec<SecurityGroup>,
    /// The whole resolved document, as served by introspection
    pub resolved: Value,
}

/// Owner of a loaded [`SpecDocument`].
#[derive(Debug, Clone)]
pub struct SchemaStore {
    document: Arc<SpecDocument>,
}

impl SchemaStore {
    /// Load a JSON or YAML file. Sibling file references resolve relative to it.
    pub fn load(path: impl AsRef<Path>, options: &StoreOptions) -> SpecResult<Self> {
        let path = path.as_ref();
        let root = read_document(path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_value(root, Some(base_dir), options)
    }

    /// Load an in-memory document. Without `base_dir`, file references are rejected.
    pub fn from_value(
        root: Value,
        base_dir: Option<PathBuf>,
        options: &StoreOptions,
    ) -> SpecResult<Self> {
        if !root.is_object() {
            return Err(SpecError::InvalidDocument(
                "specification root must be an object".to_string(),
            ));
        }
        let (version, version_tag) = detect_version(&root, options.schema_version)?;

        let mut resolver = Resolver::new(root, base_dir);
        let mut resolved = resolver.resolve_root()?;
        debug!(
            documents = resolver.documents.len(),
            references = resolver.resolved.len(),
            "References resolved"
        );

        if version == SchemaVersion::V2 {
            resolved = normalize_v2(resolved);
        }
        normalize_schemas(&mut resolved, Keys::Keywords);
        inject_default_response(
            &mut resolved,
            &options.default_response_name,
            &options.default_response_codes,
        )?;

        let document = extract_document(resolved, version, version_tag)?;
        info!(
            version = %document.version,
            paths_count = document.paths.len(),
            schemas_count = document.schemas.len(),
            base_paths = ?document.base_paths,
            "Specification loaded"
        );
        Ok(Self {
            document: Arc::new(document),
        })
    }

    pub fn document(&self) -> &SpecDocument {
        &self.document
    }

    pub fn shared(&self) -> Arc<SpecDocument> {
        Arc::clone(&self.document)
    }

    /// A component schema by name.
    pub fn schema(&self, name: &str) -> Option<&Value> {
        self.document.schemas.get(name)
    }
}

/// Schema injected as the error document for 4xx/5xx responses.
pub fn default_response_schema() -> Value {
    json!({
        "type": "object",
        "required": ["errors"],
        "properties": {
            "errors": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["message"],
                    "properties": {
                        "message": { "type": "string" },
                        "path": { "type": "string" }
                    }
                }
            },
            "status": { "type": "integer" }
        }
    })
}

fn read_document(path: &Path) -> SpecResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| SpecError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn detect_version(
    root: &Value,
    expected: Option<SchemaVersion>,
) -> SpecResult<(SchemaVersion, String)> {
    let detected = if let Some(tag) = root.get("openapi").and_then(Value::as_str) {
        Some((SchemaVersion::V3, tag.to_string()))
    } else {
        root.get("swagger")
            .and_then(Value::as_str)
            .map(|tag| (SchemaVersion::V2, tag.to_string()))
    };
    match (detected, expected) {
        (Some((version, tag)), Some(want)) if version != want => {
            Err(SpecError::InvalidDocument(format!(
                "document declares {version} ({tag}) but {want} was configured"
            )))
        }
        (Some(found), _) => Ok(found),
        (None, Some(want)) => Ok((want, String::new())),
        (None, None) => Ok((SchemaVersion::V3, String::new())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RefKey {
    document: String,
    pointer: String,
}

impl RefKey {
    fn display(&self) -> String {
        format!("{}#{}", self.document, self.pointer)
    }
}

struct Resolver {
    base_dir: Option<PathBuf>,
    documents: HashMap<String, Arc<Value>>,
    resolved: HashMap<RefKey, Value>,
    /// References currently being resolved, innermost last
    visiting: Vec<RefKey>,
}

impl Resolver {
    fn new(root: Value, base_dir: Option<PathBuf>) -> Self {
        let mut documents = HashMap::new();
        documents.insert(ROOT_DOCUMENT.to_string(), Arc::new(root));
        Self {
            base_dir,
            documents,
            resolved: HashMap::new(),
            visiting: Vec::new(),
        }
    }

    fn resolve_root(&mut self) -> SpecResult<Value> {
        let root = self.document(ROOT_DOCUMENT)?;
        self.resolve_value(&root, ROOT_DOCUMENT, Keys::Keywords)
    }

    fn resolve_value(&mut self, value: &Value, document: &str, keys: Keys) -> SpecResult<Value> {
        match value {
            Value::Object(map) => {
                if keys == Keys::Keywords {
                    if let Some(Value::String(reference)) = map.get("$ref") {
                        return self.resolve_ref(reference, document);
                    }
                }
                let mut out = Map::with_capacity(map.len());
                for (key, child) in map {
                    let child = if keys.literal(key) {
                        child.clone()
                    } else {
                        self.resolve_value(child, document, keys.child(key))?
                    };
                    out.insert(key.clone(), child);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(item, document, Keys::Keywords))
                .collect::<SpecResult<Vec<_>>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_ref(&mut self, reference: &str, document: &str) -> SpecResult<Value> {
        let key = self.parse_reference(reference, document)?;
        if let Some(done) = self.resolved.get(&key) {
            return Ok(done.clone());
        }
        if self.visiting.contains(&key) {
            let mut chain: Vec<String> = self.visiting.iter().map(RefKey::display).collect();
            chain.push(key.display());
            return Err(SpecError::CyclicReference {
                reference: reference.to_string(),
                chain,
            });
        }

        let target_doc = self.document(&key.document)?;
        let target = target_doc
            .pointer(&key.pointer)
            .ok_or_else(|| SpecError::UnresolvedReference {
                reference: reference.to_string(),
                document: display_document(document),
            })?;

        self.visiting.push(key.clone());
        let result = self.resolve_value(target, &key.document, Keys::Keywords);
        self.visiting.pop();
        let result = result?;

        self.resolved.insert(key, result.clone());
        Ok(result)
    }

    fn parse_reference(&self, reference: &str, document: &str) -> SpecResult<RefKey> {
        let unsupported = |reason: &str| SpecError::UnsupportedReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        let (file, fragment) = reference
            .split_once('#')
            .ok_or_else(|| unsupported("file references must include a JSON pointer"))?;
        let pointer = urlencoding::decode(fragment)
            .map_err(|_| unsupported("pointer is not valid UTF-8"))?
            .into_owned();
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(unsupported("pointer must start with '/'"));
        }

        if file.is_empty() {
            return Ok(RefKey {
                document: document.to_string(),
                pointer,
            });
        }

        if file.contains("://") {
            return Err(unsupported("remote references are not supported"));
        }
        let file_path = Path::new(file);
        if file_path.is_absolute() {
            return Err(unsupported("absolute file paths are not supported"));
        }
        if file_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(unsupported(
                "file references must stay inside the specification directory",
            ));
        }
        if self.base_dir.is_none() {
            return Err(unsupported(
                "file references need a document loaded from a file",
            ));
        }

        let parent = Path::new(document).parent().unwrap_or(Path::new(""));
        let joined: Vec<String> = parent
            .join(file_path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Ok(RefKey {
            document: joined.join("/"),
            pointer,
        })
    }

    fn document(&mut self, id: &str) -> SpecResult<Arc<Value>> {
        if let Some(doc) = self.documents.get(id) {
            return Ok(Arc::clone(doc));
        }
        let base = self
            .base_dir
            .as_ref()
            .ok_or_else(|| SpecError::UnsupportedReference {
                reference: id.to_string(),
                reason: "file references need a document loaded from a file".to_string(),
            })?;
        let path = base.join(id);
        debug!(document = %path.display(), "Loading referenced document");
        let doc = Arc::new(read_document(&path)?);
        self.documents.insert(id.to_string(), Arc::clone(&doc));
        Ok(doc)
    }
}

fn display_document(id: &str) -> String {
    if id == ROOT_DOCUMENT {
        "root document".to_string()
    } else {
        id.to_string()
    }
}

/// Rewrite a resolved Swagger 2.0 document into the OpenAPI 3 layout used downstream.
fn normalize_v2(mut doc: Value) -> Value {
    let Some(root) = doc.as_object_mut() else {
        return doc;
    };
    let media_list = |v: Option<&Value>| -> Option<Vec<String>> {
        v.and_then(Value::as_array).map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
    };
    let global_consumes =
        media_list(root.get("consumes")).unwrap_or_else(|| vec!["application/json".to_string()]);
    let global_produces =
        media_list(root.get("produces")).unwrap_or_else(|| vec!["application/json".to_string()]);

    let mut components = Map::new();
    if let Some(definitions) = root.remove("definitions") {
        components.insert("schemas".to_string(), definitions);
    }
    if let Some(security) = root.remove("securityDefinitions") {
        components.insert("securitySchemes".to_string(), security);
    }
    root.insert("components".to_string(), Value::Object(components));

    if let Some(base_path) = root.remove("basePath") {
        root.insert("servers".to_string(), json!([{ "url": base_path }]));
    }

    if let Some(Value::Object(paths)) = root.get_mut("paths") {
        for item in paths.values_mut() {
            let Some(item) = item.as_object_mut() else {
                continue;
            };
            let path_params = item.get("parameters").cloned();
            if let Some(Value::Array(params)) = item.get_mut("parameters") {
                params.retain(|p| !is_v2_body_param(p));
                params.iter_mut().for_each(v2_param_to_v3);
            }
            for (key, op) in item.iter_mut() {
                if !METHODS.contains(&key.as_str()) {
                    continue;
                }
                let Some(op) = op.as_object_mut() else {
                    continue;
                };
                let consumes = media_list(op.get("consumes")).unwrap_or_else(|| global_consumes.clone());
                let produces = media_list(op.get("produces")).unwrap_or_else(|| global_produces.clone());

                let mut all_params: Vec<Value> = path_params
                    .as_ref()
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                if let Some(Value::Array(own)) = op.get("parameters") {
                    all_params.extend(own.iter().cloned());
                }
                if let Some(body) = v2_request_body(&all_params, &consumes) {
                    op.insert("requestBody".to_string(), body);
                }
                if let Some(Value::Array(params)) = op.get_mut("parameters") {
                    params.retain(|p| !is_v2_body_param(p));
                    params.iter_mut().for_each(v2_param_to_v3);
                }
                if let Some(Value::Object(responses)) = op.get_mut("responses") {
                    for response in responses.values_mut() {
                        let Some(response) = response.as_object_mut() else {
                            continue;
                        };
                        if let Some(schema) = response.remove("schema") {
                            let content: Map<String, Value> = produces
                                .iter()
                                .map(|mt| (mt.clone(), json!({ "schema": schema.clone() })))
                                .collect();
                            response.insert("content".to_string(), Value::Object(content));
                        }
                    }
                }
            }
        }
    }
    doc
}

fn is_v2_body_param(param: &Value) -> bool {
    matches!(
        param.get("in").and_then(Value::as_str),
        Some("body") | Some("formData")
    )
}

/// Move v2 inline type keys into a `schema` object.
fn v2_param_to_v3(param: &mut Value) {
    const SCHEMA_KEYS: [&str; 14] = [
        "type", "format", "items", "enum", "default", "minimum", "maximum",
        "exclusiveMinimum", "exclusiveMaximum", "pattern", "minLength", "maxLength",
        "minItems", "maxItems",
    ];
    let Some(obj) = param.as_object_mut() else {
        return;
    };
    if obj.contains_key("schema") {
        return;
    }
    let mut schema = Map::new();
    for key in SCHEMA_KEYS {
        if let Some(v) = obj.remove(key) {
            schema.insert(key.to_string(), v);
        }
    }
    // v2 arrays default to csv, one comma separated occurrence
    match obj.remove("collectionFormat") {
        Some(format) => {
            obj.insert("explode".to_string(), Value::Bool(format == "multi"));
        }
        None if schema.get("type").and_then(Value::as_str) == Some("array") => {
            obj.insert("explode".to_string(), Value::Bool(false));
        }
        None => {}
    }
    obj.insert("schema".to_string(), Value::Object(schema));
}

fn v2_request_body(params: &[Value], consumes: &[String]) -> Option<Value> {
    if let Some(body) = params
        .iter()
        .find(|p| p.get("in").and_then(Value::as_str) == Some("body"))
    {
        let schema = body.get("schema").cloned().unwrap_or_else(|| json!({}));
        let content: Map<String, Value> = consumes
            .iter()
            .map(|mt| (mt.clone(), json!({ "schema": schema.clone() })))
            .collect();
        return Some(json!({
            "required": body.get("required").and_then(Value::as_bool).unwrap_or(false),
            "content": content,
        }));
    }

    let form: Vec<&Value> = params
        .iter()
        .filter(|p| p.get("in").and_then(Value::as_str) == Some("formData"))
        .collect();
    if form.is_empty() {
        return None;
    }
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in form {
        let Some(name) = field.get("name").and_then(Value::as_str) else {
            continue;
        };
        let mut field = field.clone();
        v2_param_to_v3(&mut field);
        properties.insert(name.to_string(), field["schema"].clone());
        if field.get("required").and_then(Value::as_bool).unwrap_or(false) {
            required.push(Value::String(name.to_string()));
        }
    }
    let schema = json!({ "type": "object", "properties": properties, "required": required });
    let mut content = Map::new();
    for mt in ["application/x-www-form-urlencoded", "multipart/form-data"] {
        if consumes.iter().any(|c| c == mt) || mt == "application/x-www-form-urlencoded" {
            content.insert(mt.to_string(), json!({ "schema": schema.clone() }));
        }
    }
    Some(json!({ "required": !required.is_empty(), "content": content }))
}

/// Rewrite OpenAPI 3.0 schema dialect into the draft 7 form the validator compiles.
///
/// `nullable: true` becomes a type union with `null`, and `null` joins any `enum`.
/// Boolean `exclusiveMinimum`/`exclusiveMaximum` fold into the numeric form.
fn normalize_schemas(value: &mut Value, keys: Keys) {
    match value {
        Value::Object(map) => {
            if keys == Keys::Keywords {
                normalize_nullable(map);
                normalize_exclusive(map, "minimum", "exclusiveMinimum");
                normalize_exclusive(map, "maximum", "exclusiveMaximum");
            }
            for (key, child) in map.iter_mut() {
                if !keys.literal(key) {
                    normalize_schemas(child, keys.child(key));
                }
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| normalize_schemas(item, Keys::Keywords)),
        _ => {}
    }
}

fn normalize_nullable(map: &mut Map<String, Value>) {
    if map.get("nullable") != Some(&Value::Bool(true)) {
        return;
    }
    let null = Value::String("null".to_string());
    match map.get_mut("type") {
        Some(Value::String(ty)) => {
            let ty = Value::String(std::mem::take(ty));
            map.insert("type".to_string(), Value::Array(vec![ty, null]));
        }
        Some(Value::Array(types)) if !types.contains(&null) => types.push(null),
        _ => {}
    }
    if let Some(Value::Array(values)) = map.get_mut("enum") {
        if !values.contains(&Value::Null) {
            values.push(Value::Null);
        }
    }
    map.remove("nullable");
}

/// `{minimum: m, exclusiveMinimum: true}` becomes `{exclusiveMinimum: m}`.
fn normalize_exclusive(map: &mut Map<String, Value>, bound: &str, exclusive: &str) {
    let Some(Value::Bool(flag)) = map.get(exclusive) else {
        return;
    };
    let flag = *flag;
    map.remove(exclusive);
    if flag {
        if let Some(limit) = map.remove(bound) {
            map.insert(exclusive.to_string(), limit);
        }
    }
}

fn inject_default_response(
    doc: &mut Value,
    name: &str,
    codes: &BTreeSet<u16>,
) -> SpecResult<()> {
    let root = doc
        .as_object_mut()
        .ok_or_else(|| SpecError::InvalidDocument("root must be an object".to_string()))?;

    let components = root
        .entry("components")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| SpecError::InvalidDocument("components must be an object".to_string()))?;
    let schemas = components
        .entry("schemas")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            SpecError::InvalidDocument("components.schemas must be an object".to_string())
        })?;
    let schema = schemas
        .entry(name)
        .or_insert_with(default_response_schema)
        .clone();

    if codes.is_empty() {
        return Ok(());
    }
    let Some(Value::Object(paths)) = root.get_mut("paths") else {
        return Ok(());
    };
    let mut injected = 0usize;
    for item in paths.values_mut() {
        let Some(item) = item.as_object_mut() else {
            continue;
        };
        for (key, op) in item.iter_mut() {
            if !METHODS.contains(&key.as_str()) {
                continue;
            }
            let Some(op) = op.as_object_mut() else {
                continue;
            };
            let Some(responses) = op
                .entry("responses")
                .or_insert_with(|| Value::Object(Map::new()))
                .as_object_mut()
            else {
                continue;
            };
            for code in codes {
                let code = code.to_string();
                if !responses.contains_key(&code) {
                    responses.insert(
                        code,
                        json!({
                            "description": "Default response.",
                            "content": { "application/json": { "schema": schema.clone() } }
                        }),
                    );
                    injected += 1;
                }
            }
        }
    }
    debug!(name = name, injected = injected, "Default responses injected");
    Ok(())
}

fn extract_document(
    resolved: Value,
    version: SchemaVersion,
    version_tag: String,
) -> SpecResult<SpecDocument> {
    let object_at = |value: Option<&Value>, what: &str| -> SpecResult<Map<String, Value>> {
        match value {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(SpecError::InvalidDocument(format!("{what} must be an object"))),
        }
    };

    let paths = object_at(resolved.get("paths"), "paths")?;
    let schemas = object_at(resolved.pointer("/components/schemas"), "components.schemas")?;
    let security_schemes = object_at(
        resolved.pointer("/components/securitySchemes"),
        "components.securitySchemes",
    )?;
    let security = match resolved.get("security") {
        Some(value) => parse_security(value)?,
        None => Vec::new(),
    };

    Ok(SpecDocument {
        version,
        version_tag,
        info: resolved.get("info").cloned().unwrap_or(Value::Null),
        base_paths: base_paths(resolved.get("servers")),
        paths,
        schemas,
        security_schemes,
        security,
        resolved,
    })
}

/// Parse an OpenAPI security requirement list into OR-of-AND groups.
pub fn parse_security(value: &Value) -> SpecResult<Vec<SecurityGroup>> {
    let list = value.as_array().ok_or_else(|| {
        SpecError::InvalidDocument("security must be a list of requirement objects".to_string())
    })?;
    list.iter()
        .map(|group| {
            let group = group.as_object().ok_or_else(|| {
                SpecError::InvalidDocument("security requirement must be an object".to_string())
            })?;
            Ok(group
                .iter()
                .map(|(scheme, scopes)| SecurityRequirement {
                    scheme: scheme.clone(),
                    scopes: scopes
                        .as_array()
                        .map(|s| s.iter().filter_map(Value::as_str).map(str::to_string).collect())
                        .unwrap_or_default(),
                })
                .collect())
        })
        .collect()
}

/// Base path of every server entry, variables replaced by their defaults.
fn base_paths(servers: Option<&Value>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for server in servers.and_then(Value::as_array).into_iter().flatten() {
        let Some(url) = server.get("url").and_then(Value::as_str) else {
            continue;
        };
        let variables = server.get("variables");
        let url = SERVER_VARIABLE.replace_all(url, |caps: &regex::Captures<'_>| {
            variables
                .and_then(|v| v.get(&caps[1]))
                .and_then(|v| v.get("default"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        });
        let path = url::Url::parse(&url)
            .or_else(|_| url::Url::parse(&format!("http://localhost{url}")))
            .map(|u| u.path().trim_end_matches('/').to_string())
            .unwrap_or_default();
        if !out.contains(&path) {
            out.push(path);
        }
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}
