//! `nav-router` command line.
//!
//! Loads a TOML route configuration and exercises the router against an
//! in-memory history:
//!
//! ```text
//! nav-router --config routes.toml routes
//! nav-router --config routes.toml resolve /users/3?tab=posts --from /users
//! nav-router --config routes.toml navigate /users /users/3 /missing
//! ```
//!
//! Component names referenced by the file are bound to placeholder views
//! so any file that loads can be inspected.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;

use nav_router::config::load_config;
use nav_router::config::schema::{ComponentRef, RouteConfig};
use nav_router::navigation::{ComponentDef, ComponentRegistry, MemoryHistory, UrlFormat, ViewComponent};
use nav_router::observability::logging::init_logging;
use nav_router::{Router, RouterConfig};

#[derive(Parser)]
#[command(name = "nav-router")]
#[command(about = "Inspect and exercise a client-side route configuration", long_about = None)]
struct Cli {
    /// Route configuration (TOML); an empty table when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dump the compiled route table
    Routes,
    /// Resolve a target without navigating
    Resolve {
        target: String,
        /// Resolve relative to this location
        #[arg(long)]
        from: Option<String>,
    },
    /// Run navigations in order and print each outcome
    Navigate {
        #[arg(required = true)]
        targets: Vec<String>,
    },
}

#[derive(Debug)]
struct Placeholder;

impl ViewComponent for Placeholder {}

/// Bind every component name in the tree to a placeholder view.
fn placeholder_registry(routes: &[RouteConfig], registry: &mut ComponentRegistry) {
    for route in routes {
        let refs = route.component.iter().chain(route.components.values());
        for component in refs {
            if let ComponentRef::Named(name) = component {
                registry.register(name.clone(), ComponentDef::ready(Placeholder));
            }
        }
        placeholder_registry(&route.children, registry);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    init_logging(&config.observability.log_filter);

    let mut registry = ComponentRegistry::new();
    placeholder_registry(&config.routes, &mut registry);
    let history = Arc::new(MemoryHistory::new(UrlFormat::new(config.mode, &config.base).href("/")));
    let router = Router::builder(config)
        .registry(registry)
        .history(history.clone())
        .build()?;

    for warning in router.warnings() {
        eprintln!("warning: {}", warning);
    }

    match cli.command {
        Commands::Routes => {
            let table = router.matcher().table();
            let routes: Vec<_> = table
                .path_list()
                .iter()
                .filter_map(|path| table.by_path(path))
                .map(|record| {
                    json!({
                        "path": record.path,
                        "name": record.name,
                        "alias_of": record.match_as,
                        "redirect": record.redirect.is_some(),
                        "params": record.pattern.keys().iter().map(|k| k.name.param_key()).collect::<Vec<_>>(),
                        "views": record.components().into_iter().map(|(slot, _)| slot).collect::<Vec<_>>(),
                        "meta": record.meta,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&routes)?);
        }
        Commands::Resolve { target, from } => {
            let current = from.map(|from| router.match_location(from));
            let resolved = router.resolve(target, current.as_deref(), false);
            let out = json!({
                "href": resolved.href,
                "route": resolved.route.summary(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Navigate { targets } => {
            if let Err(failure) = router.start().await {
                eprintln!("initial navigation: {}", failure);
            }
            for target in targets {
                let out = match router.push(target.as_str()).await {
                    Ok(route) => json!({ "target": target, "committed": route.summary() }),
                    Err(failure) => json!({
                        "target": target,
                        "failure": failure.kind(),
                        "reason": failure.to_string(),
                    }),
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            let (entries, index) = history.entries();
            println!("{}", serde_json::to_string_pretty(&json!({ "history": entries, "index": index }))?);
        }
    }

    Ok(())
}
