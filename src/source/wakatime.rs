//! WakaTime durations endpoint.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::date_util::format_day;
use crate::error::{Error, Result};
use crate::model::DurationRecord;
use crate::source::{DayFetch, DurationSource};
use crate::sync::rate_limit::send_with_retry;

#[derive(Debug, Deserialize)]
struct DurationsResponse {
    #[serde(default)]
    data: Option<Vec<DurationRecord>>,
}

pub struct WakaTimeSource {
    client: Client,
    base_url: String,
    user: String,
    auth_header: String,
}

impl WakaTimeSource {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.wakatime_base_url.trim_end_matches('/').to_string(),
            user: config.wakatime_user.clone(),
            auth_header: auth_header(&config.wakatime_api_key),
        }
    }

    /// `GET {base}/{user}/durations?date=YYYY-MM-DD`
    pub fn durations_url(&self, day: NaiveDate) -> String {
        format!(
            "{}/{}/durations?date={}",
            self.base_url,
            self.user,
            format_day(day)
        )
    }
}

/// WakaTime takes the bare API key, base64-encoded, as a Basic credential.
fn auth_header(api_key: &str) -> String {
    format!("Basic {}", BASE64_STANDARD.encode(api_key))
}

/// Parse a durations response body. `data` absent, null or empty all mean
/// the day has nothing recorded.
pub fn parse_durations(body: &str) -> Result<DayFetch> {
    let response: DurationsResponse = serde_json::from_str(body)?;
    Ok(DayFetch::from_records(response.data.unwrap_or_default()))
}

#[async_trait]
impl DurationSource for WakaTimeSource {
    async fn fetch_day(&self, day: NaiveDate) -> Result<DayFetch> {
        let url = self.durations_url(day);
        log::debug!("GET {url}");

        let response = send_with_retry!(self
            .client
            .get(&url)
            .header(AUTHORIZATION, &self.auth_header))
        .map_err(|e| Error::Fetch {
            date: day,
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::Fetch {
            date: day,
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(Error::Fetch {
                date: day,
                message: format!("API error ({status}): {body}"),
            });
        }

        parse_durations(&body).map_err(|e| Error::Fetch {
            date: day,
            message: e.to_string(),
        })
    }
}
