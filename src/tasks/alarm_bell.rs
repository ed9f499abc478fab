//! Alarm reminder task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval_at, Instant};
use tracing::info;

use crate::state::AppState;

/// Re-rings an unacknowledged alarm every `every`
pub async fn alarm_bell_task(state: Arc<AppState>, every: Duration) {
    info!("Starting alarm bell task (repeat every {}s)", every.as_secs());

    let mut ticker = interval_at(Instant::now() + every, every);
    loop {
        ticker.tick().await;
        state.alarm.remind();
    }
}
