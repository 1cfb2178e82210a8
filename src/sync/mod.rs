pub mod rate_limit;
pub mod syncer;

use chrono::NaiveDate;
use serde::Serialize;

use crate::date_util::DEFAULT_LOOKBACK_DAYS;
use crate::error::Error;

/// Options controlling a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Boundary day; never fetched. Defaults to the local calendar day.
    pub today: Option<NaiveDate>,
    /// Lookback used when the aggregate has no high-water-mark.
    pub days: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            today: None,
            days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl SyncOptions {
    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Report returned after a sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub location: Option<String>,
    pub created_location: bool,
    pub status: SyncStatus,
    pub days_walked: u32,
    pub days_with_data: u32,
    pub days_failed: u32,
    pub entries_added: u64,
    pub high_water_mark: Option<NaiveDate>,
    pub error: Option<String>,
}

impl SyncReport {
    /// Report for a run that aborted before the aggregate was saved.
    pub fn failed(location: Option<String>, error: &Error) -> Self {
        Self {
            location,
            created_location: false,
            status: SyncStatus::Failed,
            days_walked: 0,
            days_with_data: 0,
            days_failed: 0,
            entries_added: 0,
            high_water_mark: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    Success,
    Failed,
}

/// Callbacks for reporting walk progress to the user.
pub trait SyncProgress: Send + Sync {
    fn on_day_start(&self, _day: NaiveDate, _index: usize, _total: usize) {}
    fn on_day_fetched(&self, _day: NaiveDate, _entries: usize) {}
    fn on_day_failed(&self, _day: NaiveDate, _error: &Error) {}
    fn on_saved(&self, _location: &str) {}
}

/// Progress reporter that ignores every event.
pub struct NoopProgress;

impl SyncProgress for NoopProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_today_override() {
        let day = NaiveDate::from_ymd_opt(2019, 7, 3).unwrap();
        let options = SyncOptions {
            today: Some(day),
            ..Default::default()
        };
        assert_eq!(options.today(), day);
        assert_eq!(options.days, 15);
    }

    #[test]
    fn test_failed_report() {
        let err = Error::StoreLoad("boom".into());
        let report = SyncReport::failed(Some("abc".into()), &err);
        assert!(!report.is_success());
        assert_eq!(report.error.as_deref(), Some("Failed to load aggregate: boom"));
    }
}
