//! State management module
//!
//! This module contains the timer core: interval configuration, the session
//! ledger, the alarm and the countdown engine, plus the shared application state.

pub mod alarm;
pub mod app_state;
pub mod interval_config;
pub mod session_ledger;
pub mod timer_engine;
pub mod timer_state;

// Re-export main types
pub use alarm::{AlarmNotifier, AlertSink, TerminalBell};
pub use app_state::AppState;
pub use interval_config::{ConfigStore, IntervalConfig, MIN_WORK_MINUTES};
pub use session_ledger::{LedgerTotals, RecentHistory, SessionLedger, SessionRecord};
pub use timer_engine::TimerEngine;
pub use timer_state::{Phase, TimerEvent, TimerSnapshot, TimerState, Transition};
