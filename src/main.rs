use std::{collections::BTreeSet, path::Path, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use routeforge::{
    ClassRegistry, InMemoryClassRegistry, InMemoryRouteStore, Provisioner, Route, RouteMerger,
    RouteStore, RouteValidator,
    config::{
        loader::{SAMPLE_DOCUMENT, load_document},
        models::RouteDocument,
    },
    core::translator::TranslationReport,
    tracing_setup,
};
use tracing::Instrument;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Compile and validate every route in a document
    Validate {
        /// Route document to validate
        #[clap(short, long, default_value = "routes.yaml")]
        config: String,
    },
    /// Translate route directives into structured primitives
    Translate {
        /// Route document to translate
        #[clap(short, long, default_value = "routes.yaml")]
        config: String,
        /// Print the translation as JSON
        #[clap(long)]
        json: bool,
    },
    /// Merge every route in a document into one
    Merge {
        /// Route document to merge
        #[clap(short, long, default_value = "routes.yaml")]
        config: String,
        /// Print the merged route as JSON
        #[clap(long)]
        json: bool,
    },
    /// Provision routes into an in-memory store
    Provision {
        /// Route document to provision
        #[clap(short, long, default_value = "routes.yaml")]
        config: String,
    },
    /// Initialize a new route document
    Init {
        /// Output path for the new document
        #[clap(short, long, default_value = "routes.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Commands::Validate { config } => validate_command(&config).await,
        Commands::Translate { config, json } => translate_command(&config, json).await,
        Commands::Merge { config, json } => merge_command(&config, json).await,
        Commands::Provision { config } => provision_command(&config).await,
        Commands::Init { config } => init_command(&config).await,
    }
}

/// Load a document and initialize logging from its settings.
fn load(config_path: &str) -> Result<RouteDocument> {
    if !Path::new(config_path).exists() {
        eprintln!("❌ Error: Route document '{config_path}' not found");
        std::process::exit(1);
    }

    let document = match load_document(config_path) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("❌ Route document parsing failed:");
            eprintln!("   {e:#}");
            std::process::exit(1);
        }
    };

    tracing_setup::init_tracing(&document.settings.logging)
        .map_err(|e| eyre!("Failed to initialize tracing: {e}"))?;
    Ok(document)
}

/// Compile the document, exiting on the first configuration error.
fn compile(document: &RouteDocument) -> Vec<Route> {
    match document.compile() {
        Ok(routes) => routes,
        Err(e) => {
            eprintln!("❌ Route construction failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    }
}

async fn validate_command(config_path: &str) -> Result<()> {
    println!("🔍 Validating route document: {config_path}");
    let document = load(config_path)?;
    let span = tracing_setup::command_span("validate", config_path);
    let _guard = span.enter();

    let routes = compile(&document);
    span.record("routes", routes.len());
    println!("✅ Route construction: OK ({} routes)", routes.len());

    let mut failures = 0;
    for route in &routes {
        match RouteValidator::validate(route) {
            Ok(()) => {
                println!();
                println!("{route}");
            }
            Err(e) => {
                failures += 1;
                eprintln!("❌ {}/{}: {e}", route.namespace, route.name);
            }
        }
    }

    println!();
    if failures > 0 {
        eprintln!("❌ {failures} of {} routes failed validation", routes.len());
        std::process::exit(1);
    }
    println!("🎉 All routes are valid!");
    Ok(())
}

async fn translate_command(config_path: &str, json: bool) -> Result<()> {
    let document = load(config_path)?;
    let span = tracing_setup::command_span("translate", config_path);
    let _guard = span.enter();

    let routes = compile(&document);
    span.record("routes", routes.len());

    let report = TranslationReport::new(&routes, &document.settings.deprecated_classes);

    if json {
        let output =
            serde_json::to_string_pretty(&report).context("Failed to serialize translation")?;
        println!("{output}");
        return Ok(());
    }

    println!("📚 Directive table {}", report.directive_table_version);
    println!();
    for route in &report.routes {
        println!("📋 {}/{}", route.namespace, route.name);
        if route.entries.is_empty() {
            println!("   (no directives)");
        }
        for entry in &route.entries {
            println!(
                "   • [{}] {} => {}",
                entry.family, entry.directive_key, entry.rendered_params
            );
        }
        for advisory in &route.advisories {
            println!("   ⚠️  {}", advisory.message);
        }
        println!();
    }
    Ok(())
}

async fn merge_command(config_path: &str, json: bool) -> Result<()> {
    let document = load(config_path)?;
    let span = tracing_setup::command_span("merge", config_path);
    let _guard = span.enter();

    let routes = compile(&document);
    span.record("routes", routes.len());

    let merged = RouteMerger::merge(&routes).context("Failed to merge routes")?;

    if json {
        let output =
            serde_json::to_string_pretty(&merged).context("Failed to serialize merged route")?;
        println!("{output}");
    } else {
        println!("🔀 Merged {} routes", routes.len());
        println!();
        println!("{merged}");
    }

    if let Err(e) = RouteValidator::validate(&merged) {
        eprintln!("⚠️  Merged route does not pass validation: {e}");
    }
    Ok(())
}

async fn provision_command(config_path: &str) -> Result<()> {
    let document = load(config_path)?;
    let span = tracing_setup::command_span("provision", config_path);

    let routes = compile(&document);
    span.record("routes", routes.len());

    let failures = provision_all(&document, &routes).instrument(span).await?;
    if failures > 0 {
        eprintln!("❌ {failures} of {} routes were not provisioned", routes.len());
        std::process::exit(1);
    }
    Ok(())
}

/// Ensure the class, submit every route and print what the store holds.
async fn provision_all(document: &RouteDocument, routes: &[Route]) -> Result<usize> {
    let registry = InMemoryClassRegistry::new();
    registry
        .ensure_class(&document.settings.legacy_class, &document.settings.controller)
        .await
        .with_context(|| format!("Failed to ensure class {}", document.settings.legacy_class))?;
    println!(
        "✅ Class '{}' ready (controller: {})",
        document.settings.legacy_class, document.settings.controller
    );

    let store: Arc<dyn RouteStore> = Arc::new(InMemoryRouteStore::new());
    let provisioner = Provisioner::new(store.clone());

    let mut failures = 0;
    for route in routes {
        match provisioner.provision(route).await {
            Ok(created) => println!("✅ Provisioned {}/{}", created.namespace, created.name),
            Err(e) => {
                failures += 1;
                eprintln!("❌ {}/{}: {e}", route.namespace, route.name);
            }
        }
    }

    let namespaces: BTreeSet<&str> = routes.iter().map(|r| r.namespace.as_str()).collect();
    println!();
    println!("📋 Stored routes:");
    for namespace in namespaces {
        for route in store
            .list(namespace)
            .await
            .with_context(|| format!("Failed to list routes in {namespace}"))?
        {
            println!("   • {}/{} -> {}", route.namespace, route.name, route.host());
        }
    }
    Ok(failures)
}

/// Initialize a new route document
async fn init_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("❌ Error: Route document '{config_path}' already exists");
        std::process::exit(1);
    }

    tokio::fs::write(path, SAMPLE_DOCUMENT)
        .await
        .context("Failed to write route document")?;
    println!("✅ Created sample route document at: {config_path}");
    println!("   Run 'routeforge translate --config {config_path}' to see its directives");
    Ok(())
}
