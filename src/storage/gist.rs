//! GitHub Gist backed [`AggregateStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::Aggregate;
use crate::storage::{AggregateStore, LoadedAggregate};
use crate::sync::rate_limit::send_with_retry;

pub const GIST_FILENAME: &str = "wakalogger.json";
pub const GIST_DESCRIPTION: &str = "WakaLogger logs";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct CreatedGist {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

/// Where the log file's text has to come from.
#[derive(Debug, PartialEq)]
enum FileContent {
    Inline(String),
    /// GitHub truncates large files in the API response; the full text is at `raw_url`.
    Raw(String),
}

pub struct GistStore {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    gist_id: Option<String>,
}

impl GistStore {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.gists_url.trim_end_matches('/').to_string(),
            username: config.github_username.clone(),
            password: config.github_password.clone(),
            gist_id: config.gist_id.clone(),
        }
    }

    pub fn gist_id(&self) -> Option<&str> {
        self.gist_id.as_deref()
    }

    fn gist_url(&self, id: &str) -> String {
        format!("{}/{id}", self.base_url)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, GITHUB_ACCEPT)
    }

    async fn create(&self, seed: &Aggregate) -> Result<String> {
        let body = create_body(&serde_json::to_string_pretty(seed)?);
        log::info!("Creating storage Gist at {}", self.base_url);

        let response = send_with_retry!(self
            .request(reqwest::Method::POST, &self.base_url)
            .json(&body))
        .map_err(|e| Error::StoreCreate(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::StoreCreate(format!("API error ({status}): {text}")));
        }
        let created: CreatedGist = response
            .json()
            .await
            .map_err(|e| Error::StoreCreate(e.to_string()))?;
        Ok(created.id)
    }

    async fn read(&self, id: &str) -> Result<Aggregate> {
        let url = self.gist_url(id);
        let response = send_with_retry!(self.request(reqwest::Method::GET, &url))
            .map_err(|e| Error::StoreLoad(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::StoreLoad(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::StoreLoad(format!("API error ({status}): {text}")));
        }

        let content = match file_content(&text)? {
            FileContent::Inline(content) => content,
            FileContent::Raw(raw_url) => {
                log::debug!("{GIST_FILENAME} is truncated, fetching {raw_url}");
                // raw_url may name any host, so it is fetched without credentials.
                let raw = send_with_retry!(self.client.get(&raw_url))
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| Error::StoreLoad(e.to_string()))?;
                raw.text()
                    .await
                    .map_err(|e| Error::StoreLoad(e.to_string()))?
            }
        };
        parse_aggregate(&content)
    }
}

/// Body for `POST /gists`.
fn create_body(content: &str) -> Value {
    json!({
        "description": GIST_DESCRIPTION,
        "public": false,
        "files": { GIST_FILENAME: { "content": content } },
    })
}

/// Body for `PATCH /gists/{id}`.
fn update_body(content: &str) -> Value {
    json!({
        "files": { GIST_FILENAME: { "content": content } },
    })
}

fn file_content(gist_json: &str) -> Result<FileContent> {
    let gist: GistResponse =
        serde_json::from_str(gist_json).map_err(|e| Error::StoreLoad(e.to_string()))?;
    let file = gist
        .files
        .get(GIST_FILENAME)
        .ok_or_else(|| Error::StoreLoad(format!("Gist has no {GIST_FILENAME} file")))?;

    match (&file.content, file.truncated, &file.raw_url) {
        (_, true, Some(raw_url)) => Ok(FileContent::Raw(raw_url.clone())),
        (Some(content), _, _) => Ok(FileContent::Inline(content.clone())),
        _ => Err(Error::StoreLoad(format!("{GIST_FILENAME} has no content"))),
    }
}

/// The file content is itself JSON; blank content counts as the empty seed.
fn parse_aggregate(content: &str) -> Result<Aggregate> {
    if content.trim().is_empty() {
        return Ok(Aggregate::default());
    }
    serde_json::from_str(content).map_err(|e| Error::StoreLoad(format!("{GIST_FILENAME}: {e}")))
}

#[async_trait]
impl AggregateStore for GistStore {
    async fn load(&mut self) -> Result<LoadedAggregate> {
        if let Some(id) = self.gist_id.clone() {
            let aggregate = self.read(&id).await?;
            return Ok(LoadedAggregate {
                location: id,
                created: false,
                aggregate,
            });
        }

        let aggregate = Aggregate::default();
        let id = self.create(&aggregate).await?;
        log::info!("Created storage Gist {id}");
        self.gist_id = Some(id.clone());
        Ok(LoadedAggregate {
            location: id,
            created: true,
            aggregate,
        })
    }

    async fn save(&self, aggregate: &Aggregate) -> Result<()> {
        let id = self
            .gist_id
            .as_deref()
            .ok_or_else(|| Error::StoreSave("no Gist to save to".into()))?;
        let body = update_body(&serde_json::to_string_pretty(aggregate)?);
        let url = self.gist_url(id);

        let response = send_with_retry!(self
            .request(reqwest::Method::PATCH, &url)
            .json(&body))
        .map_err(|e| Error::StoreSave(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::StoreSave(format!("API error ({status}): {text}")));
        }
        Ok(())
    }
}
