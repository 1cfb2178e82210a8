pub mod wakatime;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::model::DurationRecord;

pub use wakatime::WakaTimeSource;

/// What the tracking API had for one day.
///
/// A failed request is an `Err` from [`DurationSource::fetch_day`], never `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum DayFetch {
    Records(Vec<DurationRecord>),
    Empty,
}

impl DayFetch {
    pub fn from_records(records: Vec<DurationRecord>) -> Self {
        if records.is_empty() {
            DayFetch::Empty
        } else {
            DayFetch::Records(records)
        }
    }
}

/// A source of per-day duration records.
#[async_trait]
pub trait DurationSource: Send + Sync {
    async fn fetch_day(&self, day: NaiveDate) -> Result<DayFetch>;
}
