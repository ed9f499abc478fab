//! Line protocol spoken with the external device
//!
//! One command per line, ASCII, newline-terminated:
//!
//! ```text
//! START:<workMinutes>:<breakMinutes>
//! ```

use std::{fmt, str::FromStr};

use crate::{
    error::LinkError,
    state::{IntervalConfig, MIN_WORK_MINUTES},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Start { work_minutes: u32, break_minutes: u32 },
}

impl DeviceCommand {
    pub fn start(config: &IntervalConfig) -> Self {
        Self::Start {
            work_minutes: config.work_minutes(),
            break_minutes: config.break_minutes(),
        }
    }

    /// Wire form, including the trailing newline
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::Start {
                work_minutes,
                break_minutes,
            } => write!(f, "START:{}:{}", work_minutes, break_minutes),
        }
    }
}

impl FromStr for DeviceCommand {
    type Err = LinkError;

    /// Parse one line. The work length is raised to the floor on the way in.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let malformed = || LinkError::Malformed(line.to_string());
        let trimmed = line.trim_end_matches(['\r', '\n']);

        let mut parts = trimmed.split(':');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("START"), Some(work), Some(brk), None) => {
                let work_minutes: u32 = work.parse().map_err(|_| malformed())?;
                let break_minutes: u32 = brk.parse().map_err(|_| malformed())?;
                Ok(Self::Start {
                    work_minutes: work_minutes.max(MIN_WORK_MINUTES),
                    break_minutes,
                })
            }
            _ => Err(malformed()),
        }
    }
}
