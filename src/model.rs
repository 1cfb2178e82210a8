use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::date_util::default_start;

/// One duration as returned by the tracking API for a single day.
///
/// Missing or `null` fields fall back to their defaults so that one odd
/// record cannot fail the whole day.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DurationRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub project: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: f64,
}

/// Project name WakaTime itself uses for time outside any project.
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// One persisted duration slice under a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub created_at: String,
    pub duration: f64,
    pub time: f64,
}

impl From<DurationRecord> for Entry {
    fn from(r: DurationRecord) -> Self {
        Self {
            created_at: r.created_at,
            duration: r.duration,
            time: r.time,
        }
    }
}

/// The persisted project log plus the date through which it is complete.
///
/// Both fields tolerate absence so that the seed document `{}` loads cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "day_option"
    )]
    pub high_water_mark: Option<NaiveDate>,
    #[serde(default)]
    pub projects: BTreeMap<String, Vec<Entry>>,
}

impl Aggregate {
    /// The day the next walk starts from. Falls back to `today - lookback_days`
    /// whenever the mark is missing, including after an accidental reset of
    /// the stored document, which re-walks that window.
    pub fn resume_from(&self, today: NaiveDate, lookback_days: u32) -> NaiveDate {
        self.high_water_mark
            .unwrap_or_else(|| default_start(today, lookback_days))
    }

    /// Append a day's records under their projects, in fetch order.
    /// Returns how many entries were added.
    pub fn merge_day(&mut self, records: Vec<DurationRecord>) -> usize {
        let added = records.len();
        for record in records {
            let project = match record.project.trim() {
                "" => UNKNOWN_PROJECT.to_string(),
                name => name.to_string(),
            };
            self.projects.entry(project).or_default().push(record.into());
        }
        added
    }

    /// Entry count and summed seconds per project, sorted by project name.
    pub fn project_totals(&self) -> Vec<ProjectTotal> {
        self.projects
            .iter()
            .map(|(project, entries)| ProjectTotal {
                project: project.clone(),
                entries: entries.len(),
                seconds: entries.iter().map(|e| e.duration).sum(),
            })
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.projects.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectTotal {
    pub project: String,
    pub entries: usize,
    pub seconds: f64,
}

/// Render seconds as `"3h 07m"`.
pub fn format_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    format!("{hours}h {minutes:02}m")
}

mod day_option {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::date_util::{format_day, parse_day};

    pub fn serialize<S: Serializer>(day: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match day {
            Some(d) => s.serialize_str(&format_day(*d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_day(s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}
