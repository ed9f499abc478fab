//! Pomodoro Server - a work/break interval timer service
//!
//! This library provides the timer engine and session accounting, the HTTP
//! relay for interval configuration, and the serial bridge to an external
//! timer device.

pub mod api;
pub mod config;
pub mod device;
pub mod error;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{ConfigError, LinkError, PersistenceError};
pub use state::{AppState, TimerEngine};
pub use utils::signals::shutdown_signal;
