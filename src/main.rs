//! Pomodoro Server - timer engine, session ledger and device bridge
//!
//! This is the main entry point for the pomodoro-server application.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use pomodoro_server::{
    api::create_router,
    config::Config,
    device::DeviceBridge,
    state::{AppState, IntervalConfig, TerminalBell},
    storage::FileStore,
    tasks::{alarm_bell_task, device_listener_task, remote_config_task, timer_driver_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodoro_server={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pomodoro-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, data_dir={}",
          config.host, config.port, config.data_dir.display());

    let initial = IntervalConfig::new(config.work_minutes)
        .context("invalid --work-minutes")?;

    let store = FileStore::open(&config.data_dir)
        .with_context(|| format!("failed to open data directory {}", config.data_dir.display()))?;
    info!("Session store: {}", store.path().display());

    // Create application state
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        Arc::new(store),
        initial,
        Arc::new(TerminalBell),
        DeviceBridge::new(config.device.clone()),
    )?);

    // Start the background tasks
    tokio::spawn(timer_driver_task(Arc::clone(&state)));
    tokio::spawn(alarm_bell_task(Arc::clone(&state), config.alarm_repeat()));

    if let Some(url) = config.remote_config_url.clone() {
        tokio::spawn(remote_config_task(Arc::clone(&state), url, config.poll_interval()));
    }
    if let Some(device) = &config.device {
        info!("Device link: {}", device.display());
        tokio::spawn(device_listener_task(Arc::clone(&state)));
    }

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /config            - Current work/break lengths");
    info!("  POST /config            - Set work length {{\"workMinutes\": n}}");
    info!("  GET  /timer             - Countdown state");
    info!("  POST /timer/start|stop|reset");
    info!("  POST /alarm/acknowledge - Silence the alarm");
    info!("  GET  /stats             - Totals and recent sessions");
    info!("  DELETE /stats           - Clear statistics");
    info!("  POST /device/start      - Send START to the device");
    info!("  GET  /events            - Timer event stream");
    info!("  GET  /health            - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            result.context("server error")?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
