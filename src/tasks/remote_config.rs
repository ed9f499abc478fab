//! Remote configuration polling task

use std::{sync::Arc, time::Duration};
use anyhow::{anyhow, Context};
use serde_json::Value;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::state::{interval_config::parse_work_minutes, AppState};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Background task that pulls the work length from a remote backend.
///
/// A failed fetch or a rejected value keeps the last known good config; the
/// next attempt happens on the regular schedule.
pub async fn remote_config_task(state: Arc<AppState>, url: String, every: Duration) {
    info!("Starting remote config poller: {} every {}s", url, every.as_secs());

    let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to build HTTP client, remote config disabled: {}", e);
            return;
        }
    };

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let work_minutes = match fetch_work_minutes(&client, &url).await {
            Ok(minutes) => minutes,
            Err(e) => {
                warn!("Remote config fetch failed, keeping current config: {:#}", e);
                continue;
            }
        };

        if work_minutes == state.config.current().work_minutes() {
            debug!("Remote config unchanged ({}min)", work_minutes);
            continue;
        }

        if let Err(e) = state.set_work_minutes(work_minutes) {
            warn!("Remote config rejected, keeping current config: {}", e);
        }
    }
}

/// Fetch `url` and pull the work length out of the body. Accepts both
/// `workMinutes` and the older `workTime` field name.
pub async fn fetch_work_minutes(client: &reqwest::Client, url: &str) -> anyhow::Result<u32> {
    let body: Value = client
        .get(url)
        .send()
        .await
        .context("request failed")?
        .error_for_status()
        .context("remote returned an error status")?
        .json()
        .await
        .context("response is not JSON")?;

    extract_work_minutes(&body)
}

fn extract_work_minutes(body: &Value) -> anyhow::Result<u32> {
    let raw = body
        .get("workMinutes")
        .or_else(|| body.get("workTime"))
        .ok_or_else(|| anyhow!("response has no workMinutes field"))?;
    Ok(parse_work_minutes(raw)?)
}
