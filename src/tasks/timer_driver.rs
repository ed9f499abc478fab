//! 1 Hz driver for the timer engine

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::state::AppState;

/// Background task that keeps the countdown in step with the wall clock.
///
/// Missed ticks are skipped rather than replayed; the engine works out how
/// much time passed from the system clock, which keeps counting while the
/// host is suspended.
pub async fn timer_driver_task(state: Arc<AppState>) {
    info!("Starting timer driver task");

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        state.engine.sync(SystemTime::now());
    }
}
