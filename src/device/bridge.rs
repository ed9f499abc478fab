//! Serial device link
//!
//! The device node (e.g. `/dev/ttyUSB0`) is opened as a plain file; line
//! settings such as the baud rate are expected to be configured on the host.

use std::path::{Path, PathBuf};

use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
};
use tracing::{debug, info};

use super::DeviceCommand;
use crate::error::LinkError;

#[derive(Debug, Clone, Default)]
pub struct DeviceBridge {
    path: Option<PathBuf>,
}

impl DeviceBridge {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// A bridge with no device behind it; every send fails with `NotConfigured`
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configured_path(&self) -> Result<&Path, LinkError> {
        self.path.as_deref().ok_or(LinkError::NotConfigured)
    }

    /// Write one command line to the device
    pub async fn send(&self, command: &DeviceCommand) -> Result<(), LinkError> {
        let path = self.configured_path()?;
        let unavailable = |source| LinkError::Unavailable {
            path: path.to_path_buf(),
            source,
        };

        let mut port = OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(unavailable)?;
        port.write_all(command.encode().as_bytes())
            .await
            .map_err(unavailable)?;
        port.flush().await.map_err(unavailable)?;

        info!("Sent {} to {}", command, path.display());
        Ok(())
    }

    /// Open the device for reading, one line at a time
    pub async fn lines(&self) -> Result<Lines<BufReader<File>>, LinkError> {
        let path = self.configured_path()?;
        let port = File::open(path)
            .await
            .map_err(|source| LinkError::Unavailable {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Listening on {}", path.display());
        Ok(BufReader::new(port).lines())
    }
}
