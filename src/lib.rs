pub mod config;
pub mod date_util;
pub mod error;
pub mod model;
pub mod source;
pub mod storage;
pub mod sync;
pub mod url;

pub use config::{Config, ConfigFile};
pub use error::{Error, Result};
pub use model::{format_seconds, Aggregate, DurationRecord, Entry, ProjectTotal};
pub use source::{DayFetch, DurationSource, WakaTimeSource};
pub use storage::{AggregateStore, GistStore, LoadedAggregate, MemoryStore};
pub use sync::{NoopProgress, SyncOptions, SyncProgress, SyncReport, SyncStatus};
pub use crate::url::resolve_gist_id;

use sync::syncer;

/// Main entry point: WakaTime durations in, Gist-backed project log out.
pub struct WakaLog {
    config: Config,
    client: reqwest::Client,
}

impl WakaLog {
    pub fn new(config: Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("wakalog/", env!("CARGO_PKG_VERSION")))
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one synchronisation against the configured Gist.
    ///
    /// Storage failures come back as a `Failed` report rather than an `Err`,
    /// carrying the Gist id when one was created before the failure.
    pub async fn sync(&self, options: &SyncOptions, progress: &dyn SyncProgress) -> SyncReport {
        let source = WakaTimeSource::new(self.client.clone(), &self.config);
        let mut store = GistStore::new(self.client.clone(), &self.config);

        match syncer::sync_durations(&source, &mut store, options, progress).await {
            Ok(report) => report,
            Err(e) => {
                log::error!("Sync failed: {e}");
                let created = store.gist_id().is_some() && self.config.gist_id.is_none();
                let mut report = SyncReport::failed(store.gist_id().map(String::from), &e);
                report.created_location = created;
                report
            }
        }
    }

    /// Load the aggregate from the configured Gist without modifying it.
    pub async fn status(&self) -> Result<Aggregate> {
        if self.config.gist_id.is_none() {
            return Err(Error::Config(
                "no Gist configured. Run: wakalog sync (or wakalog config set gist_id <ID>)".into(),
            ));
        }
        let mut store = GistStore::new(self.client.clone(), &self.config);
        Ok(store.load().await?.aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(gist_id: Option<&str>) -> Config {
        let gist_id = gist_id.map(String::from);
        Config::from_lookup(move |key| match key {
            "GIST_ID" => gist_id.clone(),
            "WAKATIME_USERNAME" | "WAKATIME_API_KEY" | "GITHUB_USERNAME" | "GITHUB_PASSWORD" => {
                Some("x".to_string())
            }
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_status_requires_gist() {
        let dw = WakaLog::new(config(None)).unwrap();
        assert!(matches!(dw.status().await, Err(Error::Config(_))));
    }

    #[test]
    fn test_new_keeps_config() {
        let dw = WakaLog::new(config(Some("abc123"))).unwrap();
        assert_eq!(dw.config().gist_id.as_deref(), Some("abc123"));
    }
}
