use crate::config::OpenApiConfig;
use crate::introspect::{describe, DescribeQuery};
use crate::router::Router;
use crate::server::OpenApi;
use crate::spec::{LoadedSpec, SchemaVersion};
use crate::validator_cache::ValidatorCache;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

/// Command-line interface for brrtbind
#[derive(Parser, Debug)]
#[command(name = "brrtbind")]
#[command(about = "Inspect and check OpenAPI route bindings", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the specification comes from and how routes are derived from it.
#[derive(Args, Debug, Clone)]
pub struct SpecArgs {
    /// Path to the OpenAPI specification file (YAML or JSON)
    #[arg(short, long, env = "BRRTBIND_SPEC")]
    pub spec: PathBuf,

    /// Expected dialect (v2 or v3); detected from the document when omitted
    #[arg(long, env = "BRRTBIND_SCHEMA_VERSION", value_parser = parse_schema_version)]
    pub schema_version: Option<SchemaVersion>,

    /// Prefix joined to every route name with a dot
    #[arg(long, env = "BRRTBIND_ROUTE_NAME_PREFIX")]
    pub route_name_prefix: Option<String>,
}

impl SpecArgs {
    fn config(&self) -> OpenApiConfig {
        let mut config = OpenApiConfig::from_spec_path(&self.spec);
        config.schema_version = self.schema_version;
        config.route_name_prefix = self.route_name_prefix.clone();
        config
    }

    fn load(&self) -> anyhow::Result<LoadedSpec> {
        self.config()
            .load()
            .with_context(|| format!("failed to load {}", self.spec.display()))
    }
}

fn parse_schema_version(s: &str) -> Result<SchemaVersion, String> {
    SchemaVersion::parse(s).ok_or_else(|| format!("invalid schema version '{s}', expected v2 or v3"))
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the route table
    Routes {
        #[command(flatten)]
        source: SpecArgs,
    },
    /// Print the resolved document, or the routes selected by --method and --path
    Describe {
        #[command(flatten)]
        source: SpecArgs,

        /// HTTP method filter, case-insensitive
        #[arg(short, long)]
        method: Option<String>,

        /// Request path or path pattern filter
        #[arg(short, long)]
        path: Option<String>,
    },
    /// Load the specification and compile every schema
    Check {
        #[command(flatten)]
        source: SpecArgs,
    },
}

/// Execute the CLI command, writing to stdout.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with(cli, &mut out)
}

/// Execute the CLI command, writing to `out`.
pub fn run_with(cli: Cli, out: &mut impl Write) -> anyhow::Result<()> {
    match cli.command {
        Commands::Routes { source } => {
            let loaded = source.load()?;
            for route in loaded.routes.iter() {
                let target = route
                    .target
                    .as_ref()
                    .map(|t| t.to_json().to_string())
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    out,
                    "{:<8} {:<40} {:<32} {}",
                    route.method.as_str(),
                    route.path.as_str(),
                    route.name,
                    target
                )?;
            }
            Ok(())
        }
        Commands::Describe {
            source,
            method,
            path,
        } => {
            let loaded = source.load()?;
            let router = Router::new(loaded.routes.to_vec())
                .context("failed to compile route table")?;
            let description = describe(
                &router,
                loaded.store.document(),
                &DescribeQuery { method, path },
            );
            serde_json::to_writer_pretty(&mut *out, &description)?;
            writeln!(out)?;
            Ok(())
        }
        Commands::Check { source } => {
            let loaded = source.load()?;
            let compiled = ValidatorCache::precompile(&loaded.routes)
                .context("schema compilation failed")?;
            let routes_count = loaded.routes.len();
            OpenApi::new(loaded)
                .build()
                .context("failed to build route table")?;
            writeln!(
                out,
                "{}: {} routes, {} compiled",
                source.spec.display(),
                routes_count,
                compiled.size()
            )?;
            Ok(())
        }
    }
}
