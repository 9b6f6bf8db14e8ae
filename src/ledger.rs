// src/ledger.rs

//! Record of finished downloads, one `downloaded.json` per target directory.
//!
//! The file is the only thing that stops a rerun from fetching the same asset
//! twice, so it is rewritten after every change.

use crate::{constants, error::AppResult, models::ItemId};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

/// Suffix separator used by the legacy list format, e.g. `"202_image"`.
const LEGACY_DELIMITER: char = '_';
/// Key the old format used for the show poster, before it had an id of its own.
const LEGACY_POSTER_KEY: &str = "poster";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Video,
    Image,
    Logo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub video: bool,
    #[serde(default)]
    pub image: bool,
    #[serde(default)]
    pub logo: bool,
    /// URL each unfinished download was started from. A partial file is only
    /// resumed from the same URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pending: BTreeMap<ResourceKind, String>,
}

impl LedgerEntry {
    pub fn has(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Video => self.video,
            ResourceKind::Image => self.image,
            ResourceKind::Logo => self.logo,
        }
    }

    fn set(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Video => self.video = true,
            ResourceKind::Image => self.image = true,
            ResourceKind::Logo => self.logo = true,
        }
    }
}

/// Every shape the ledger file has had, told apart by shape alone.
#[derive(Deserialize)]
#[serde(untagged)]
enum LedgerFile {
    Structured(BTreeMap<String, LedgerEntry>),
    /// `[101, "202_image"]`
    LegacyList(Vec<LegacyKey>),
    /// `{"101": true}`, the very first format
    LegacyFlags(BTreeMap<String, bool>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyKey {
    Number(u64),
    Text(String),
}

impl LegacyKey {
    fn into_parts(self) -> (String, ResourceKind) {
        match self {
            LegacyKey::Number(n) => (n.to_string(), ResourceKind::Video),
            LegacyKey::Text(text) if text == LEGACY_POSTER_KEY => (text, ResourceKind::Image),
            LegacyKey::Text(text) => match text.split_once(LEGACY_DELIMITER) {
                Some((id, _suffix)) if !id.is_empty() => (id.to_string(), ResourceKind::Image),
                _ => (text, ResourceKind::Video),
            },
        }
    }
}

fn upgrade(keys: impl IntoIterator<Item = LegacyKey>) -> BTreeMap<String, LedgerEntry> {
    let mut entries: BTreeMap<String, LedgerEntry> = BTreeMap::new();
    for key in keys {
        let (id, kind) = key.into_parts();
        entries.entry(id).or_default().set(kind);
    }
    entries
}

#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    /// Opens the ledger in `directory`, upgrading or creating the file as needed.
    pub fn load(directory: &Path) -> AppResult<Self> {
        let path = directory.join(constants::LEDGER_FILE_NAME);
        if !path.is_file() {
            info!("No ledger at '{}', starting a new one", path.display());
            let ledger = Self {
                path,
                entries: BTreeMap::new(),
            };
            ledger.persist()?;
            return Ok(ledger);
        }

        let content = fs::read_to_string(&path)?;
        let (entries, upgraded) = match serde_json::from_str::<LedgerFile>(&content)? {
            LedgerFile::Structured(entries) => (entries, false),
            LedgerFile::LegacyList(keys) => (upgrade(keys), true),
            LedgerFile::LegacyFlags(flags) => (
                upgrade(
                    flags
                        .into_iter()
                        .filter(|(_, done)| *done)
                        .map(|(key, _)| LegacyKey::Text(key)),
                ),
                true,
            ),
        };

        let ledger = Self { path, entries };
        if upgraded {
            info!(
                "Upgraded legacy ledger '{}' ({} entries)",
                ledger.path.display(),
                ledger.entries.len()
            );
            ledger.persist()?;
        }
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&self, id: &ItemId) -> Option<&LedgerEntry> {
        self.entries.get(&id.to_string())
    }

    pub fn is_downloaded(&self, id: &ItemId, kind: ResourceKind) -> bool {
        self.entry(id).is_some_and(|e| e.has(kind))
    }

    /// URL an unfinished download of `(id, kind)` was started from.
    pub fn pending_url(&self, id: &ItemId, kind: ResourceKind) -> Option<&str> {
        self.entry(id)
            .and_then(|e| e.pending.get(&kind))
            .map(String::as_str)
    }

    /// Records that `(id, kind)` is being fetched from `url`, before any byte is written.
    pub fn mark_started(&mut self, id: &ItemId, kind: ResourceKind, url: &str) -> AppResult<()> {
        let entry = self.entries.entry(id.to_string()).or_default();
        if entry.pending.get(&kind).map(String::as_str) == Some(url) {
            return Ok(());
        }
        entry.pending.insert(kind, url.to_string());
        debug!("Ledger: {} {:?} started from a new URL", id, kind);
        self.persist()
    }

    /// Marks `(id, kind)` as done and writes the ledger before returning.
    pub fn mark_downloaded(&mut self, id: &ItemId, kind: ResourceKind, name: &str) -> AppResult<()> {
        let entry = self.entries.entry(id.to_string()).or_default();
        entry.set(kind);
        entry.pending.remove(&kind);
        if !name.is_empty() {
            entry.name = name.to_string();
        }
        debug!("Ledger: {} marked {:?}", id, kind);
        self.persist()
    }

    /// Moves a poster recorded by the old format onto `show_key`.
    /// Returns whether there was one.
    pub fn claim_legacy_poster(&mut self, show_key: &ItemId) -> AppResult<bool> {
        let Some(legacy) = self.entries.remove(LEGACY_POSTER_KEY) else {
            return Ok(false);
        };
        debug!("Ledger: legacy poster entry moved to {}", show_key);
        let entry = self.entries.entry(show_key.to_string()).or_default();
        if legacy.has(ResourceKind::Image) {
            entry.set(ResourceKind::Image);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> AppResult<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.entries)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_text_keys() {
        assert_eq!(
            LegacyKey::Text("202_image".into()).into_parts(),
            ("202".to_string(), ResourceKind::Image)
        );
        assert_eq!(
            LegacyKey::Text("poster".into()).into_parts(),
            ("poster".to_string(), ResourceKind::Image)
        );
        assert_eq!(
            LegacyKey::Text("2300-9782".into()).into_parts(),
            ("2300-9782".to_string(), ResourceKind::Video)
        );
        assert_eq!(
            LegacyKey::Number(7).into_parts(),
            ("7".to_string(), ResourceKind::Video)
        );
    }

    #[test]
    fn test_upgrade_merges_duplicate_ids() {
        let entries = upgrade([
            LegacyKey::Number(5),
            LegacyKey::Text("5_image".into()),
            LegacyKey::Number(5),
        ]);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries["5"],
            LedgerEntry {
                name: String::new(),
                video: true,
                image: true,
                logo: false,
                pending: BTreeMap::new(),
            }
        );
    }
}
