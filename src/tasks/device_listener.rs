//! Device listener background task

use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{device::DeviceCommand, state::AppState};

const REOPEN_DELAY: Duration = Duration::from_secs(5);

/// Background task that reads commands from the device link.
///
/// Link failures stay inside this task: it logs them and reopens the device
/// after a fixed delay.
pub async fn device_listener_task(state: Arc<AppState>) {
    info!("Starting device listener task");

    loop {
        match state.device.lines().await {
            Ok(mut lines) => loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => match line.parse::<DeviceCommand>() {
                        Ok(command) => {
                            debug!("Device sent {}", command);
                            state.handle_device_command(&command);
                        }
                        Err(e) => warn!("Ignoring device line: {}", e),
                    },
                    Ok(None) => {
                        debug!("Device link closed");
                        break;
                    }
                    Err(e) => {
                        warn!("Device read failed: {}", e);
                        break;
                    }
                }
            },
            Err(e) => warn!("Device link unavailable: {}", e),
        }

        sleep(REOPEN_DELAY).await;
    }
}
