//! The single authoritative countdown
//!
//! The engine owns the [`TimerState`], reads interval lengths from the
//! [`ConfigStore`], records finished work intervals in the [`SessionLedger`]
//! and raises the [`AlarmNotifier`] on every phase change. Every change to the
//! countdown happens under one lock, so once `stop()` returns no tick can touch
//! it. Ledger writes and notifications run after the lock is released.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, SystemTime},
};

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info};

use super::{
    AlarmNotifier, ConfigStore, IntervalConfig, SessionLedger, TimerEvent, TimerSnapshot,
    TimerState, Transition,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
struct EngineInner {
    state: TimerState,
    config: IntervalConfig,
    config_rx: watch::Receiver<IntervalConfig>,
    /// Wall-clock instant up to which elapsed time has been applied
    anchor: Option<SystemTime>,
}

#[derive(Debug)]
pub struct TimerEngine {
    inner: Mutex<EngineInner>,
    ledger: Arc<SessionLedger>,
    alarm: Arc<AlarmNotifier>,
    events_tx: broadcast::Sender<TimerEvent>,
}

impl TimerEngine {
    /// Create a stopped engine at the start of a work interval
    pub fn new(config: &ConfigStore, ledger: Arc<SessionLedger>, alarm: Arc<AlarmNotifier>) -> Self {
        let config_rx = config.subscribe();
        let current = *config_rx.borrow();
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Mutex::new(EngineInner {
                state: TimerState::new(&current),
                config: current,
                config_rx,
                anchor: None,
            }),
            ledger,
            alarm,
            events_tx,
        }
    }

    /// Lock the state and fold in any configuration change made since the last
    /// operation. A stopped countdown is refilled with the new length; a
    /// running one keeps its remaining time until the phase ends or is reset.
    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if inner.config_rx.has_changed().unwrap_or(false) {
            let config = *inner.config_rx.borrow_and_update();
            inner.config = config;
            if inner.state.is_running {
                debug!("Config changed while running, keeping remaining time");
            } else {
                inner.state.refill(&config);
                debug!(
                    "Config changed while stopped, countdown reset to {}s",
                    inner.state.remaining_seconds
                );
            }
        }
        inner
    }

    /// Begin counting down. Starting also silences an active alarm.
    pub fn start(&self) -> TimerSnapshot {
        self.start_at(SystemTime::now())
    }

    pub fn start_at(&self, now: SystemTime) -> TimerSnapshot {
        let mut inner = self.lock();
        self.alarm.acknowledge();

        if !inner.state.is_running {
            inner.state.is_running = true;
            inner.anchor = Some(now);
            info!(
                "Timer started: {} phase, {}s remaining",
                inner.state.mode.as_str(),
                inner.state.remaining_seconds
            );
        }
        self.snapshot_of(&inner)
    }

    /// Pause the countdown, keeping the remaining time
    pub fn stop(&self) -> TimerSnapshot {
        let mut inner = self.lock();

        if inner.state.is_running {
            inner.state.is_running = false;
            inner.anchor = None;
            info!(
                "Timer stopped: {} phase, {}s remaining",
                inner.state.mode.as_str(),
                inner.state.remaining_seconds
            );
        }
        self.snapshot_of(&inner)
    }

    /// Stop and refill the current phase. The phase itself is kept.
    pub fn reset(&self) -> TimerSnapshot {
        let mut inner = self.lock();
        self.alarm.acknowledge();

        let config = inner.config;
        inner.state.is_running = false;
        inner.anchor = None;
        inner.state.refill(&config);
        info!(
            "Timer reset: {} phase, {}s remaining",
            inner.state.mode.as_str(),
            inner.state.remaining_seconds
        );
        self.snapshot_of(&inner)
    }

    /// Apply one second. Ignored while stopped.
    pub fn tick(&self) -> TimerSnapshot {
        let mut inner = self.lock();
        let mut transitions = Vec::new();

        if inner.state.is_running {
            let config = inner.config;
            if let Some(anchor) = inner.anchor.as_mut() {
                *anchor += Duration::from_secs(1);
            }
            transitions.extend(inner.state.tick(&config));
        }
        let snapshot = self.snapshot_of(&inner);
        drop(inner);

        self.publish(&transitions, snapshot)
    }

    /// Catch the countdown up with wall-clock time.
    ///
    /// Whole seconds elapsed since the anchor are applied in one step, crossing
    /// each phase boundary exactly once, so a resume after a long host suspend
    /// does not replay every missed second.
    pub fn sync(&self, now: SystemTime) -> TimerSnapshot {
        let mut inner = self.lock();
        let mut transitions = Vec::new();

        if inner.state.is_running {
            let anchor = *inner.anchor.get_or_insert(now);
            let elapsed = match now.duration_since(anchor) {
                Ok(elapsed) => elapsed.as_secs(),
                Err(_) => {
                    // Clock moved backwards; count from here.
                    inner.anchor = Some(now);
                    0
                }
            };

            if elapsed > 0 {
                let config = inner.config;
                inner.anchor = Some(anchor + Duration::from_secs(elapsed));
                if elapsed > 1 {
                    debug!("Catching up {}s of elapsed time", elapsed);
                }
                transitions = inner.state.advance(elapsed, &config);
            }
        }
        let snapshot = self.snapshot_of(&inner);
        drop(inner);

        self.publish(&transitions, snapshot)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let inner = self.lock();
        self.snapshot_of(&inner)
    }

    /// Receive every event the engine publishes from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events_tx.subscribe()
    }

    fn snapshot_of(&self, inner: &EngineInner) -> TimerSnapshot {
        TimerSnapshot::new(&inner.state, &inner.config, self.alarm.is_active())
    }

    /// Record and announce transitions taken under the lock. Must be called
    /// without holding it; `snapshot` gets the resulting alarm state.
    fn publish(&self, transitions: &[Transition], mut snapshot: TimerSnapshot) -> TimerSnapshot {
        if transitions.is_empty() {
            return snapshot;
        }

        for transition in transitions {
            if transition.completes_work() {
                info!("Work interval of {}min completed", transition.work_minutes);
                if let Err(e) = self.ledger.append(transition.work_minutes) {
                    error!("Failed to record completed session: {}", e);
                }
                self.emit(TimerEvent::WorkCompleted {
                    work_minutes: transition.work_minutes,
                });
            }

            let changed = TimerEvent::PhaseChanged {
                from: transition.from,
                to: transition.to,
            };
            self.alarm.handle_event(&changed);
            self.emit(changed);
        }

        snapshot.alarm_active = self.alarm.is_active();
        snapshot
    }

    fn emit(&self, event: TimerEvent) {
        // No subscribers is the normal case when nobody is watching.
        if self.events_tx.send(event).is_err() {
            debug!("No event subscribers");
        }
    }
}
