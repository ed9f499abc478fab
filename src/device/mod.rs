//! Point-to-point link to the external timer device

pub mod bridge;
pub mod command;

pub use bridge::DeviceBridge;
pub use command::DeviceCommand;
