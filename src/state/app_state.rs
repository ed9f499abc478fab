//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{
    AlarmNotifier, AlertSink, ConfigStore, IntervalConfig, LedgerTotals, SessionLedger,
    TimerEngine, TimerSnapshot,
};
use crate::{
    device::{DeviceBridge, DeviceCommand},
    error::{ConfigError, LinkError, PersistenceError},
    storage::KeyValueStore,
};

/// Application state shared by the HTTP handlers and background tasks
#[derive(Debug)]
pub struct AppState {
    /// Work/break lengths
    pub config: Arc<ConfigStore>,
    /// Completed sessions and totals
    pub ledger: Arc<SessionLedger>,
    /// Phase-change alert
    pub alarm: Arc<AlarmNotifier>,
    /// The one countdown
    pub engine: Arc<TimerEngine>,
    /// Serial link to the external device
    pub device: DeviceBridge,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Load the ledger from `store` and wire up a stopped engine
    pub fn new(
        port: u16,
        host: String,
        store: Arc<dyn KeyValueStore>,
        initial: IntervalConfig,
        sink: Arc<dyn AlertSink>,
        device: DeviceBridge,
    ) -> Result<Self, PersistenceError> {
        let config = Arc::new(ConfigStore::new(initial));
        let ledger = Arc::new(SessionLedger::open(store)?);
        let alarm = Arc::new(AlarmNotifier::new(sink));
        let engine = Arc::new(TimerEngine::new(&config, Arc::clone(&ledger), Arc::clone(&alarm)));

        Ok(Self {
            config,
            ledger,
            alarm,
            engine,
            device,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        })
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    pub fn start_timer(&self) -> TimerSnapshot {
        self.record_action("start");
        self.engine.start()
    }

    pub fn stop_timer(&self) -> TimerSnapshot {
        self.record_action("stop");
        self.engine.stop()
    }

    pub fn reset_timer(&self) -> TimerSnapshot {
        self.record_action("reset");
        self.engine.reset()
    }

    /// Silence the alarm without touching the countdown
    pub fn acknowledge_alarm(&self) -> bool {
        self.record_action("acknowledge");
        self.alarm.acknowledge()
    }

    /// Change the work length; the engine picks the change up on its next operation
    pub fn set_work_minutes(&self, work_minutes: u32) -> Result<IntervalConfig, ConfigError> {
        let config = self.config.set_work_minutes(work_minutes)?;
        self.record_action("configure");
        Ok(config)
    }

    pub fn clear_stats(&self) -> Result<LedgerTotals, PersistenceError> {
        self.ledger.clear()?;
        self.record_action("clear-stats");
        Ok(self.ledger.totals())
    }

    /// Send the current config to the device as a START line
    pub async fn send_start_to_device(&self) -> Result<DeviceCommand, LinkError> {
        let command = DeviceCommand::start(&self.config.current());
        self.device.send(&command).await?;
        self.record_action("device-start");
        Ok(command)
    }

    /// Act on a command received from the device
    pub fn handle_device_command(&self, command: &DeviceCommand) -> TimerSnapshot {
        match command {
            DeviceCommand::Start { work_minutes, .. } => {
                let config = self.config.replace(IntervalConfig::clamped(*work_minutes));
                info!("Device requested start with {}min work", config.work_minutes());
                self.record_action("device-command");
                self.engine.start()
            }
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
