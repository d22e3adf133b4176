//! # Hot Reload Module
//!
//! Watches the YAML configuration file and swaps the dispatcher's route table
//! when the `routes` section changes, without restarting the server.
//!
//! ```rust,ignore
//! use switchyard::hot_reload::watch_routes;
//!
//! let watcher = watch_routes("config.yaml", dispatcher.clone())?;
//! // Reloading stops when `watcher` is dropped.
//! ```
//!
//! If the edited file fails to parse or a rule fails to compile, the error is
//! logged and the previous table stays in effect. Only routes are reloaded;
//! server and dispatch settings need a restart.
//!
//! A reload replaces the whole table, so rules added in code (rewrite
//! functions in particular) are gone after the first change unless they are
//! re-added with [`watch_routes_with`]:
//!
//! ```rust,ignore
//! let watcher = watch_routes_with("config.yaml", dispatcher.clone(), |routes| {
//!     routes.rewrite("legacy", |path, _| path.strip_prefix("/old").map(str::to_string));
//! })?;
//! ```

use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::route::RouteTable;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Watch `config_path` and replace the route table of `dispatcher` on change.
///
/// The new table holds the file's rules only.
///
/// # Errors
///
/// Returns the watcher's error if the path cannot be watched.
pub fn watch_routes<P>(
    config_path: P,
    dispatcher: Arc<Dispatcher>,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
{
    watch_routes_with(config_path, dispatcher, |_| {})
}

/// Like [`watch_routes`], but `extend` runs on every freshly loaded table
/// before it is installed, after the file's rules.
///
/// # Errors
///
/// Returns the watcher's error if the path cannot be watched.
pub fn watch_routes_with<P, F>(
    config_path: P,
    dispatcher: Arc<Dispatcher>,
    extend: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: Fn(&mut RouteTable) + Send + Sync + 'static,
{
    let path: PathBuf = config_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    reload_with(&watch_path, &dispatcher, &extend);
                }
            }
            Err(e) => warn!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    info!(path = %path.display(), "hot-reload: watching configuration");
    Ok(watcher)
}

/// Re-read the file and swap the table. Returns whether a new table was installed.
pub fn reload(path: &Path, dispatcher: &Dispatcher) -> bool {
    reload_with(path, dispatcher, &|_: &mut RouteTable| {})
}

/// [`reload`], running `extend` on the loaded table before installing it.
pub fn reload_with(
    path: &Path,
    dispatcher: &Dispatcher,
    extend: &dyn Fn(&mut RouteTable),
) -> bool {
    match AppConfig::load(path).and_then(|cfg| cfg.route_table()) {
        Ok(mut table) => {
            let from_file = table.len();
            extend(&mut table);
            info!(
                path = %path.display(),
                routes = table.len(),
                from_file,
                "hot-reload: applying route updates"
            );
            dispatcher.replace_routes(table);
            true
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "hot-reload: keeping previous routes"
            );
            false
        }
    }
}
