//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod alarm_bell;
pub mod device_listener;
pub mod remote_config;
pub mod timer_driver;

// Re-export main functions
pub use alarm_bell::alarm_bell_task;
pub use device_listener::device_listener_task;
pub use remote_config::remote_config_task;
pub use timer_driver::timer_driver_task;
