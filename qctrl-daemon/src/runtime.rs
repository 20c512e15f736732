//! Daemon runtime: wires the watcher, guard, and HTTP server together.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{broadcast, RwLock};
use tracing::info;

use qctrl_store::OrderStore;
use qctrl_sync::ReconcileSummary;

use crate::api::{build_router, AppState};
use crate::config::Config;
use crate::error::{io_err, DaemonError};
use crate::guard::{guard_task, sync_trigger, TriggerSource};
use crate::paths::SETTLE_DELAY;
use crate::status::RuntimeStatus;
use crate::watcher::watcher_task;

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(config: Config) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the daemon runtime.
pub async fn run(config: Config) -> Result<(), DaemonError> {
    let pool = qctrl_store::connect(&config.db_path()).await?;
    let store = OrderStore::new(pool);

    let status = Arc::new(RwLock::new(RuntimeStatus::new(unix_seconds_now())));
    let (trigger, trigger_rx) = sync_trigger();
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    // Cold start reconciles without waiting for an edit.
    trigger.signal(TriggerSource::Startup);

    let watcher_handle = {
        let shutdown = shutdown_tx.clone();
        let watch_dir = config.watch_dir();
        let trigger = trigger.clone();
        tokio::spawn(async move {
            let result = watcher_task(watch_dir, trigger, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let guard_handle = {
        let shutdown = shutdown_tx.clone();
        let store = store.clone();
        let watch_path = config.watch_path();
        let status = status.clone();
        tokio::spawn(async move {
            let result = guard_task(
                store,
                watch_path,
                trigger_rx,
                status,
                SETTLE_DELAY,
                shutdown.subscribe(),
            )
            .await;
            let _ = shutdown.send(());
            result
        })
    };

    let http_handle = {
        let shutdown = shutdown_tx.clone();
        let state = AppState {
            store,
            trigger,
            status,
            api_token: config.api_token.clone(),
        };
        let bind = config.bind;
        tokio::spawn(async move {
            let result = serve_http(bind, state, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Runtime(format!(
                            "ctrl-c handler failed: {err}"
                        ))),
                    }
                }
            }
        })
    };

    let (watcher_result, guard_result, http_result, signal_result) =
        tokio::join!(watcher_handle, guard_handle, http_handle, signal_handle);

    handle_join("watcher", watcher_result)?;
    handle_join("guard", guard_result)?;
    handle_join("http_server", http_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

async fn serve_http(
    bind: std::net::SocketAddr,
    state: AppState,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| DaemonError::Runtime(format!("bind {bind} failed: {err}")))?;
    info!(%bind, "http api listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|err| DaemonError::Runtime(format!("http server failed: {err}")))
}

/// One reconciliation pass against the database at `db_path`, outside the
/// daemon. Backs `qctrl import`.
pub fn import_blocking(db_path: &Path, file: &Path) -> Result<ReconcileSummary, DaemonError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(async {
        let pool = qctrl_store::connect(db_path).await?;
        let store = OrderStore::new(pool);
        Ok(qctrl_sync::run_pass(&store, file).await?)
    })
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Runtime(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

pub(crate) fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
