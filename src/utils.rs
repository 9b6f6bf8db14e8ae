// src/utils.rs

use crate::{constants, models::Video};
use regex::Regex;
use std::{
    ffi::OsStr,
    path::Path,
    sync::LazyLock,
};
use url::Url;

static ILLEGAL_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|\x00-\x1f]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn sanitize_filename(name: &str) -> String {
    let original_name = name.trim();
    if original_name.is_empty() {
        return "unknown".to_string();
    }

    let stem = Path::new(original_name)
        .file_stem()
        .unwrap_or_else(|| OsStr::new(original_name))
        .to_string_lossy()
        .to_uppercase();
    let windows_reserved = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];

    let mut name = if windows_reserved.contains(&stem.as_ref()) {
        format!("_{}", original_name)
    } else {
        original_name.to_string()
    };

    name = ILLEGAL_CHARS_RE.replace_all(&name, "_").into_owned();
    name = WHITESPACE_RE.replace_all(&name, " ").trim().to_string();
    name = name
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string();
    if name.is_empty() {
        return "unnamed".to_string();
    }

    if name.len() > constants::MAX_FILENAME_BYTES {
        if let (Some(stem_part), Some(ext)) =
            (Path::new(&name).file_stem(), Path::new(&name).extension())
        {
            let stem_part_str = stem_part.to_string_lossy();
            let ext_str = format!(".{}", ext.to_string_lossy());
            let max_stem_bytes = constants::MAX_FILENAME_BYTES.saturating_sub(ext_str.len());
            let truncated_stem = safe_truncate_utf8(&stem_part_str, max_stem_bytes);
            name = format!("{}{}", truncated_stem, ext_str);
        } else {
            name = safe_truncate_utf8(&name, constants::MAX_FILENAME_BYTES).to_string();
        }
    }
    name
}

fn safe_truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut i = max_bytes;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    &s[..i]
}

/// Extension of the file a URL points at, with the leading dot ("" when there is none).
pub fn extension_from_url(url: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or_default().to_string());
    Path::new(&path)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// "YYYY-MM-DD - Name", the stem every file of a video shares.
pub fn video_file_stem(video: &Video) -> String {
    let day = video.publish_date.get(..10).unwrap_or(&video.publish_date);
    if day.is_empty() {
        video.name.clone()
    } else {
        format!("{} - {}", day, video.name)
    }
}

pub fn video_filename(video: &Video, url: &str) -> String {
    sanitize_filename(&format!("{}{}", video_file_stem(video), extension_from_url(url)))
}

pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 {
        text.to_string()
    } else {
        format!("{}...", &text[..end_pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("2014-05-14 - Quick Look: Foo/Bar?"),
            "2014-05-14 - Quick Look_ Foo_Bar_"
        );
        assert_eq!(sanitize_filename(" . my file. "), "my file");
        assert_eq!(sanitize_filename("a  b   c"), "a b c");
        assert_eq!(sanitize_filename("CON.mp4"), "_CON.mp4");
        assert_eq!(sanitize_filename(""), "unknown");
        assert_eq!(sanitize_filename("..."), "unnamed");

        let very_long_name = format!("{}.mp4", "é".repeat(300));
        let truncated = sanitize_filename(&very_long_name);
        assert!(truncated.len() <= constants::MAX_FILENAME_BYTES);
        assert!(truncated.ends_with(".mp4"));
    }

    #[test]
    fn test_extension_from_url() {
        assert_eq!(extension_from_url("https://cdn/a/foo_4000.mp4?x=1"), ".mp4");
        assert_eq!(extension_from_url("https://cdn/a/poster.jpg"), ".jpg");
        assert_eq!(extension_from_url("https://cdn/a/noext"), "");
        assert_eq!(extension_from_url("not a url/file.png?x"), ".png");
    }

    #[test]
    fn test_video_filename() {
        let video: Video = serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Quick Look: Titanfall",
            "publish_date": "2014-03-11 12:00:00",
        }))
        .unwrap();
        assert_eq!(
            video_filename(&video, "https://cdn/x_8000.mp4?api_key=k"),
            "2014-03-11 - Quick Look_ Titanfall.mp4"
        );
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghijkl", 8), "abcde...");
    }
}
