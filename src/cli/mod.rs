//! # CLI Module
//!
//! Command-line access to the binding core, for checking a specification
//! before a host service loads it.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the route table, one route per line in declaration order:
//!
//! ```bash
//! brrtbind routes --spec openapi.yaml
//! ```
//!
//! ### `describe`
//!
//! Print the introspection document, optionally filtered:
//!
//! ```bash
//! brrtbind describe --spec openapi.yaml --method get --path /api/pets/7
//! ```
//!
//! ### `check`
//!
//! Load the specification, build the route table and compile every schema.
//! Exits non-zero on the first error:
//!
//! ```bash
//! brrtbind check --spec openapi.yaml --schema-version v3
//! ```
//!
//! Every command accepts `--schema-version` and `--route-name-prefix`; `--spec`,
//! `--schema-version` and `--route-name-prefix` also read `BRRTBIND_SPEC`,
//! `BRRTBIND_SCHEMA_VERSION` and `BRRTBIND_ROUTE_NAME_PREFIX`.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, run_with, Cli, Commands, SpecArgs};
