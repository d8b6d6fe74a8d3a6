//! Unit tests for CLI commands

use crate::cli::{run_with, Cli, Commands};
use crate::spec::SchemaVersion;
use clap::Parser;
use std::io::Write;

const PETS: &str = r#"
openapi: 3.0.3
info: { title: Pets, version: "1" }
servers: [{ url: /api }]
paths:
  /pets:
    get:
      operationId: listPets
      x-mojo-to: pet#list
      responses:
        "200": { description: ok }
  /pets/{id}:
    get:
      operationId: showPet
      parameters:
        - { name: id, in: path, required: true, schema: { type: integer } }
      responses:
        "200": { description: ok }
"#;

fn spec_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn run(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(args)?;
    let mut out = Vec::new();
    run_with(cli, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn test_describe_command_with_filters() {
    let cli = Cli::try_parse_from([
        "brrtbind",
        "describe",
        "--spec",
        "test.yaml",
        "--method",
        "get",
        "--path",
        "/api/pets",
        "--schema-version",
        "v3",
    ])
    .unwrap();

    match cli.command {
        Commands::Describe {
            source,
            method,
            path,
        } => {
            assert_eq!(source.spec.to_string_lossy(), "test.yaml");
            assert_eq!(source.schema_version, Some(SchemaVersion::V3));
            assert_eq!(method.as_deref(), Some("get"));
            assert_eq!(path.as_deref(), Some("/api/pets"));
        }
        _ => panic!("Expected Describe command"),
    }
}

#[test]
fn test_invalid_schema_version_is_rejected() {
    let cli = Cli::try_parse_from([
        "brrtbind",
        "check",
        "--spec",
        "test.yaml",
        "--schema-version",
        "v4",
    ]);
    assert!(cli.is_err());
}

#[test]
fn test_routes_lists_every_route() {
    let file = spec_file(PETS);
    let path = file.path().to_string_lossy().to_string();
    let out = run(&["brrtbind", "routes", "--spec", &path]).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("/api/pets") && lines[0].contains("listPets"));
    assert!(lines[0].contains("pet"));
    assert!(lines[1].contains("/api/pets/{id}"));
}

#[test]
fn test_routes_with_prefix() {
    let file = spec_file(PETS);
    let path = file.path().to_string_lossy().to_string();
    let out = run(&[
        "brrtbind",
        "routes",
        "--spec",
        &path,
        "--route-name-prefix",
        "zoo",
    ])
    .unwrap();
    assert!(out.contains("zoo.listPets"));
}

#[test]
fn test_describe_outputs_json() {
    let file = spec_file(PETS);
    let path = file.path().to_string_lossy().to_string();
    let out = run(&["brrtbind", "describe", "--spec", &path, "--path", "/api/pets/3"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["routes"][0]["name"], "showPet");
}

#[test]
fn test_check_reports_success_and_failure() {
    let file = spec_file(PETS);
    let path = file.path().to_string_lossy().to_string();
    let out = run(&["brrtbind", "check", "--spec", &path]).unwrap();
    assert!(out.contains("2 routes"));

    let broken = spec_file(&PETS.replace("operationId: showPet\n", "x-unused: 1\n"));
    let path = broken.path().to_string_lossy().to_string();
    let err = run(&["brrtbind", "check", "--spec", &path]).unwrap_err();
    assert!(format!("{err:#}").contains("failed to load"));
}
