#![forbid(unsafe_code)]

use bookshelf_core::{init_logging, BookStore};
use bookshelf_web::{build_router, AppState, ServerConfig};
use log::{info, warn};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
                return;
            }
            _ => warn!("event=server_signal module=web status=error fallback=ctrl_c"),
        }
    }
    let _ = tokio::signal::ctrl_c().await;
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let config = ServerConfig::from_env()?;
    let log_dir = config
        .log_dir
        .to_str()
        .ok_or_else(|| format!("log dir `{}` is not valid UTF-8", config.log_dir.display()))?;
    init_logging(&config.log_level, log_dir).map_err(|err| err.to_string())?;

    let store = BookStore::open(&config.db_path).map_err(|err| {
        format!(
            "failed to open database `{}`: {err}",
            config.db_path.display()
        )
    })?;
    let book_count = store
        .with_service(|service| service.count_books())
        .map_err(|err| format!("failed to read catalog: {err}"))?;
    let store = Arc::new(store);

    let app = build_router(AppState::new(Arc::clone(&store)));
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|err| format!("bind {} failed: {err}", config.bind_addr))?;
    info!(
        "event=server_start module=web status=ok bind={} db_path={} books={book_count}",
        config.bind_addr,
        config.db_path.display()
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await;
    info!("event=server_stop module=web status=ok");

    match Arc::try_unwrap(store) {
        Ok(store) => store
            .close()
            .map_err(|err| format!("failed to close database: {err}"))?,
        Err(_) => warn!("event=db_close module=db status=skipped reason=store_still_shared"),
    }

    served.map_err(|err| format!("server failed: {err}"))
}
