#![allow(dead_code)]

use brrtbind::spec::{load_spec_from_value, BuildOptions, LoadedSpec, StoreOptions};
use serde_json::{json, Value};

/// Pet store used across the integration suites.
pub fn pets_spec() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": { "title": "Pet Store", "version": "1.0.0" },
        "servers": [{ "url": "/api" }],
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" },
                        "tag": { "type": "string", "nullable": true }
                    }
                },
                "PetList": {
                    "type": "object",
                    "required": ["pets"],
                    "properties": {
                        "pets": { "type": "array", "items": { "$ref": "#/components/schemas/Pet" } }
                    }
                }
            },
            "securitySchemes": {
                "api_key": { "type": "apiKey", "in": "header", "name": "X-Api-Key" },
                "session": { "type": "apiKey", "in": "cookie", "name": "session" }
            }
        },
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "parameters": [
                        { "name": "age", "in": "query", "schema": { "type": "integer" } },
                        { "name": "limit", "in": "query", "schema": { "type": "integer", "default": 20, "maximum": 100 } },
                        { "name": "tags", "in": "query", "schema": { "type": "array", "items": { "type": "string" } } }
                    ],
                    "responses": {
                        "200": {
                            "description": "pets",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/PetList" } } }
                        }
                    }
                },
                "post": {
                    "operationId": "addPet",
                    "x-mojo-to": "pet#add",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
                    },
                    "responses": {
                        "201": {
                            "description": "created",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
                        }
                    }
                }
            },
            "/pets/{id}": {
                "parameters": [
                    { "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } }
                ],
                "get": {
                    "operationId": "showPet",
                    "responses": {
                        "200": {
                            "description": "pet",
                            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } }
                        }
                    }
                },
                "delete": {
                    "operationId": "deletePet",
                    "security": [{ "api_key": [] }, { "session": [] }],
                    "responses": { "204": { "description": "deleted" } }
                }
            }
        }
    })
}

pub fn load(doc: Value) -> LoadedSpec {
    load_spec_from_value(doc, None, &StoreOptions::default(), &BuildOptions::default())
        .expect("spec should load")
}

pub fn load_pets() -> LoadedSpec {
    load(pets_spec())
}

pub mod temp_files {
    use std::path::Path;

    /// Write `content` to `name` inside `dir`, creating parent directories.
    pub fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}
