// src/sidecar.rs

use crate::{constants, error::AppResult, models::Video};
use log::debug;
use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// Writes the raw API object of a video next to its file, as `<stem>.json`.
pub fn write_metadata(directory: &Path, file_stem: &str, video: &Video) -> AppResult<PathBuf> {
    let path = directory.join(format!("{}.json", file_stem));
    let json = serde_json::to_string_pretty(video)?;
    fs::write(&path, json)?;
    debug!("Wrote metadata sidecar '{}'", path.display());
    Ok(path)
}

/// `mp3tag.txt` export, rebuilt from scratch on every run.
pub struct Mp3tagExport {
    path: PathBuf,
}

impl Mp3tagExport {
    pub fn create(directory: &Path) -> AppResult<Self> {
        let path = directory.join(constants::MP3TAG_FILE_NAME);
        File::create(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One `;`-separated line: filename, title, show, year, deck.
    pub fn add_video(&self, filename: &str, video: &Video, show_title: &str) -> AppResult<()> {
        let year = video.publish_day().map(|d| d.format("%Y").to_string()).unwrap_or_default();
        let fields = [
            filename,
            video.name.as_str(),
            show_title,
            year.as_str(),
            video.deck.as_deref().unwrap_or_default(),
        ];
        let line = fields
            .iter()
            .map(|f| f.replace([';', '\n', '\r'], " "))
            .collect::<Vec<_>>()
            .join(";");
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
