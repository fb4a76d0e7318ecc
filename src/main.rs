// Futarchy ledger - HTTP entry point
//
// Serves the ledger over axum, ticks the slot clock on a timer and saves
// the ledger to disk on shutdown.

use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use futarchy_ledger::app_state::{lock, AppState, SharedState};
use futarchy_ledger::config::Config;
use futarchy_ledger::routes::{build_router, ENDPOINTS};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("futarchy_ledger=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    info!(?config, "starting futarchy ledger");

    let state: SharedState = AppState::shared(config.clone());
    let shutdown_state = state.clone();

    if config.slot_ms > 0 {
        tokio::spawn(run_slot_clock(state.clone(), config.slot_ms));
    }

    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, "failed to bind: {}", e);
            return;
        }
    };

    info!("listening on http://{}", config.bind_addr);
    for (method, path, description) in ENDPOINTS {
        info!("   {:<5} {:<32} {}", method, path, description);
    }

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {}", e);
    }

    info!("shutdown signal received, saving state");
    let app_state = lock(&shutdown_state);
    if app_state.config.persist {
        match app_state.save_to_disk() {
            Ok(()) => info!(slot = app_state.ledger.slot, "state saved"),
            Err(e) => error!("failed to save state: {}", e),
        }
    }
}

/// Advance the ledger one slot per tick
async fn run_slot_clock(state: SharedState, slot_ms: u64) {
    let mut interval = tokio::time::interval(Duration::from_millis(slot_ms));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        lock(&state).ledger.advance_slots(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
