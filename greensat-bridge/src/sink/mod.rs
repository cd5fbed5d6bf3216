//! Persistence sinks
//!
//! ## Policies
//!
//! | Policy       | Backend             | Keeps history | Write                    |
//! |--------------|---------------------|---------------|--------------------------|
//! | Append       | [`HistoryStore`]    | yes           | one `INSERT` per reading |
//! | Latest value | [`LatestValueFile`] | no            | temp file + rename       |
//!
//! Both report failure through [`SinkError`]; the ingestion loop logs it and
//! moves on. Nothing is retried.

mod history;
mod latest;

pub use history::{DailySummary, HistoryStore, TimeBounds};
pub use latest::LatestValueFile;

use async_trait::async_trait;
use log::info;

use crate::config::SinkSelector;
use crate::error::SinkError;
use crate::reading::Reading;

/// Destination for parsed readings
#[async_trait]
pub trait ReadingSink: Send {
    /// Persist one reading
    async fn write(&mut self, reading: &Reading) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: ReadingSink + ?Sized> ReadingSink for Box<T> {
    async fn write(&mut self, reading: &Reading) -> Result<(), SinkError> {
        (**self).write(reading).await
    }
}

/// The configured backend
pub enum AnySink {
    /// SQLite history
    History(HistoryStore),
    /// Latest-value JSON file
    Latest(LatestValueFile),
}

impl AnySink {
    /// Open whichever backend the config selects
    pub async fn open(selector: &SinkSelector) -> Result<Self, SinkError> {
        match selector {
            SinkSelector::History { database_url } => {
                info!("appending readings to {}", database_url);
                Ok(Self::History(HistoryStore::open(database_url).await?))
            }
            SinkSelector::Latest { path } => {
                info!("writing latest reading to {}", path.display());
                Ok(Self::Latest(LatestValueFile::new(path)))
            }
        }
    }
}

#[async_trait]
impl ReadingSink for AnySink {
    async fn write(&mut self, reading: &Reading) -> Result<(), SinkError> {
        match self {
            Self::History(store) => store.write(reading).await,
            Self::Latest(file) => file.write(reading).await,
        }
    }
}
