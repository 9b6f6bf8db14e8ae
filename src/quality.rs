// src/quality.rs

use crate::{
    cli::Quality,
    client::ExistenceProbe,
    constants::HIGHEST_BITRATE,
    models::{Video, non_empty},
};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// Bitrate markers in hd file names that can be swapped for the unlisted maximum.
static BITRATE_PATTERNS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"_\d{4}\.mp4$").unwrap(),
            format!("_{}.mp4", HIGHEST_BITRATE),
        ),
        (
            Regex::new(r"_\d{4}k\.mp4$").unwrap(),
            format!("_{}k.mp4", HIGHEST_BITRATE),
        ),
    ]
});

/// Best listed URL for `quality`, falling back to lower tiers.
pub fn select_url(video: &Video, quality: Quality) -> Option<&str> {
    let hd = matches!(quality, Quality::Hd | Quality::Highest)
        .then(|| non_empty(&video.hd_url))
        .flatten();
    let high = (quality != Quality::Low)
        .then(|| non_empty(&video.high_url))
        .flatten();
    hd.or(high).or_else(|| non_empty(&video.low_url))
}

/// Higher-bitrate variants of an hd URL, in probe order. Patterns that leave the
/// URL unchanged produce no candidate.
pub fn highest_candidates(hd_url: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    for (pattern, replacement) in BITRATE_PATTERNS.iter() {
        let candidate = pattern.replace(hd_url, replacement.as_str());
        if candidate != hd_url && !candidates.iter().any(|c| c == &candidate) {
            candidates.push(candidate.into_owned());
        }
    }
    candidates
}

/// Picks the URL to download, probing for the unlisted maximum bitrate when
/// `quality` is `Highest` and the pick is the hd file.
pub async fn resolve_url(
    video: &Video,
    quality: Quality,
    probe: &dyn ExistenceProbe,
) -> Option<String> {
    let selected = select_url(video, quality)?;
    if quality != Quality::Highest || non_empty(&video.hd_url) != Some(selected) {
        return Some(selected.to_string());
    }
    for candidate in highest_candidates(selected) {
        debug!("Checking whether a {} bitrate file exists", HIGHEST_BITRATE);
        if probe.probe_exists(&candidate).await {
            debug!("Found the {} bitrate file, downloading that", HIGHEST_BITRATE);
            return Some(candidate);
        }
    }
    Some(selected.to_string())
}
