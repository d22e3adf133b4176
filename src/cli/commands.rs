use crate::{
    config::AppConfig,
    controller::{Controller, Payload},
    error::ActionError,
    dispatcher::{Dispatcher, Request},
    hot_reload::watch_routes,
    runtime_config::RuntimeConfig,
    server::{AppService, HttpServer, ServerHandle},
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use minijinja::{context, Environment};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line interface for Switchyard
#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Switchyard web framework CLI", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the built-in demo application
    Serve {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address; overrides `server.addr`
        #[arg(short, long)]
        addr: Option<String>,

        /// Reload routes when the configuration file changes
        #[arg(short, long, default_value_t = false)]
        watch: bool,
    },
    /// Print what a path becomes after the configured route rewrites
    Rewrite {
        /// YAML configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Request path to rewrite
        path: String,
    },
}

/// Execute the parsed command.
///
/// # Errors
///
/// Configuration, bind and rewrite failures.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Serve {
            config,
            addr,
            watch,
        } => serve(config.as_ref(), addr.as_deref(), *watch),
        Commands::Rewrite { config, path } => {
            let cfg = AppConfig::load(config)?;
            let table = cfg.route_table()?;
            let rewritten = table.apply(path, &Request::get(path))?;
            println!("{rewritten}");
            Ok(())
        }
    }
}

const ERROR_PAGE: &str = "<h1>Error</h1><p>{{ message }}</p>";

/// Controllers mounted by `switchyard serve`.
///
/// `/` greets; anything else is a 404 rendered by `ErrorController` when
/// `dispatch.error_path` is `/error`.
#[must_use]
pub fn demo_controllers() -> Vec<Controller> {
    vec![
        Controller::builder("MainController")
            .action_with_arity("index", 0, Some(0), |_| Ok(Payload::from("Hello, World!")))
            .build(),
        Controller::builder("ErrorController")
            .map("/error")
            .action("index", |ctx| {
                let message = ctx.failure.map_or("unknown error", |f| f.message.as_str());
                error_page(message).map(Payload::Text)
            })
            .build(),
    ]
}

/// The message usually quotes the request path, so it is HTML-escaped.
fn error_page(message: &str) -> Result<String, ActionError> {
    let mut env = Environment::new();
    env.add_template("error.html", ERROR_PAGE)
        .map_err(|e| ActionError::new(e.to_string()))?;
    env.get_template("error.html")
        .and_then(|tmpl| tmpl.render(context! { message }))
        .map_err(|e| ActionError::new(e.to_string()))
}

fn serve(config: Option<&PathBuf>, addr: Option<&str>, watch: bool) -> anyhow::Result<()> {
    let cfg = match config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    RuntimeConfig::from_env().apply();

    let registry = Arc::new(cfg.registry());
    for controller in demo_controllers() {
        registry.register(controller);
    }
    registry.resolve_mount_table();

    let dispatcher = Arc::new(
        Dispatcher::new(cfg.route_table()?, Arc::clone(&registry))
            .with_config(cfg.dispatch_config()),
    );

    // Dropping the watcher stops reloading; keep it for the server's lifetime.
    let _watcher = match (watch, config) {
        (true, Some(path)) => Some(watch_routes(path, Arc::clone(&dispatcher))?),
        (true, None) => {
            tracing::warn!("--watch needs --config; hot reload disabled");
            None
        }
        _ => None,
    };

    let service = AppService::new(dispatcher)
        .with_tidy(cfg.server.tidy)
        .with_benchmark(cfg.server.benchmark);
    let addr = addr.unwrap_or(cfg.server.addr.as_str());
    let handle = HttpServer(service)
        .start(addr)
        .with_context(|| format!("failed to bind {addr}"))?;

    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> anyhow::Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))
}
