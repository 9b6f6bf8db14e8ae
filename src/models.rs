// src/models.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Giant Bomb ids are numbers, but older payloads and user input use strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        ItemId::Number(value)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        match value.parse::<u64>() {
            Ok(n) => ItemId::Number(n),
            Err(_) => ItemId::Text(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub image: Option<ImageSet>,
    #[serde(default)]
    pub logo: Option<ImageSet>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: ItemId,
    #[serde(default)]
    pub guid: Option<String>,
    pub name: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default)]
    pub deck: Option<String>,
    #[serde(default)]
    pub low_url: Option<String>,
    #[serde(default)]
    pub high_url: Option<String>,
    #[serde(default)]
    pub hd_url: Option<String>,
    #[serde(default)]
    pub image: Option<ImageSet>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `publish_date` comes as "YYYY-MM-DD HH:MM:SS"; only the day matters here.
impl Video {
    pub fn publish_day(&self) -> Option<NaiveDate> {
        self.publish_date
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
    }
}

pub(crate) fn non_empty(url: &Option<String>) -> Option<&str> {
    url.as_deref().map(str::trim).filter(|u| !u.is_empty())
}

impl ImageSet {
    pub fn url(&self) -> Option<&str> {
        non_empty(&self.original_url)
    }
}

/// Raw API envelope. A missing `results` means there is nothing (more) to read.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub results: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub number_of_total_results: Option<u64>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DownloadStatus {
    Success,
    Skipped,
    Failed,
}
