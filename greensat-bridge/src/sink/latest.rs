//! Single-slot latest-value file

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::ReadingSink;
use crate::error::SinkError;
use crate::reading::Reading;

/// JSON file holding only the most recent reading
///
/// Each write goes to a sibling `.tmp` file which is then renamed over the
/// target, so a reader sees the previous value or the new one, never half of
/// either.
#[derive(Debug, Clone)]
pub struct LatestValueFile {
    path: PathBuf,
    staging: PathBuf,
}

impl LatestValueFile {
    /// Slot at `path`; nothing touches the disk until the first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");
        Self {
            path,
            staging: PathBuf::from(staging),
        }
    }

    /// Target file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current value; `None` before the first write
    pub async fn read(&self) -> Result<Option<Reading>, SinkError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ReadingSink for LatestValueFile {
    async fn write(&mut self, reading: &Reading) -> Result<(), SinkError> {
        let bytes = serde_json::to_vec(reading)?;
        tokio::fs::write(&self.staging, &bytes).await?;
        tokio::fs::rename(&self.staging, &self.path).await?;
        Ok(())
    }
}
