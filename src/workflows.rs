// src/workflows.rs

use crate::{
    DownloadJobContext,
    client::ApiClient,
    constants,
    downloader::readable_filesize,
    error::{AppError, AppResult},
    ledger::{Ledger, ResourceKind},
    models::{DownloadStatus, ImageSet, ItemId, Show, Video},
    quality,
    sidecar::{self, Mp3tagExport},
    ui::{self, TransferBar},
    utils,
};
use log::{debug, error, info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// One file to fetch, plus what to record in the ledger once it is on disk.
struct Asset<'a> {
    key: &'a ItemId,
    kind: ResourceKind,
    /// Shown to the user and stored as the ledger entry's name.
    name: &'a str,
    url: &'a str,
    target: PathBuf,
}

/// Downloads every video of a show into `<dir>/<show title>/`.
pub async fn run_show(context: &DownloadJobContext, title: &str) -> AppResult<()> {
    let Some(show) = context.catalog.find_show(title).await? else {
        return Err(AppError::UserInputError(format!(
            "Show '{}' not found. Check the spelling on the Giant Bomb website.",
            title
        )));
    };
    info!("Resolved show '{}' to id {}", show.title, show.id);
    ui::print_header(&format!("Show: {}", show.title));

    let show_dir = context.args.dir.join(utils::sanitize_filename(&show.title));
    fs::create_dir_all(&show_dir)?;
    let mut ledger = Ledger::load(&show_dir)?;
    debug!("Using ledger '{}'", ledger.path().display());

    download_show_art(context, &mut ledger, &show, &show_dir).await;

    let videos = match context.catalog.show_videos(&show).await {
        Ok(videos) => videos,
        Err(e) => {
            error!("Listing videos of '{}' failed: {}", show.title, e);
            ui::error(&format!("Could not list the videos of {}: {}", show.title, e));
            context.manager.print_report(&show.title);
            return Err(e);
        }
    };
    ui::info(&format!("{} videos found", videos.len()));

    let mp3tag = if context.args.mp3tag {
        Some(Mp3tagExport::create(&show_dir)?)
    } else {
        None
    };

    for video in &videos {
        if context.is_cancelled() {
            break;
        }
        process_video(context, &mut ledger, video, &show_dir, Some((&show, mp3tag.as_ref()))).await;
    }

    context.manager.print_report(&show.title);
    if context.is_cancelled() {
        return Err(AppError::UserInterrupt);
    }
    Ok(())
}

/// Downloads a single video by id into `--dir`.
pub async fn run_video(context: &DownloadJobContext, id: &str) -> AppResult<()> {
    let Some(video) = context.catalog.video_by_id(id).await? else {
        return Err(AppError::UserInputError(format!("Video '{}' not found", id)));
    };
    ui::print_header(&format!("Video: {}", video.name));

    let dir = context.args.dir.clone();
    let mut ledger = Ledger::load(&dir)?;
    process_video(context, &mut ledger, &video, &dir, None).await;

    context.manager.print_report(&video.name);
    if context.is_cancelled() {
        return Err(AppError::UserInterrupt);
    }
    Ok(())
}

async fn download_show_art(
    context: &DownloadJobContext,
    ledger: &mut Ledger,
    show: &Show,
    show_dir: &Path,
) {
    let key = ItemId::Text(format!("show-{}", show.id));
    match ledger.claim_legacy_poster(&key) {
        Ok(true) => info!("Adopted the poster recorded by an older ledger for '{}'", show.title),
        Ok(false) => {}
        Err(e) => warn!("Could not move the legacy poster entry: {}", e),
    }
    let art = [
        (&show.image, ResourceKind::Image, constants::POSTER_STEM),
        (&show.logo, ResourceKind::Logo, constants::LOGO_STEM),
    ];
    for (image, kind, stem) in art {
        if context.is_cancelled() {
            return;
        }
        let Some(url) = image.as_ref().and_then(ImageSet::url) else {
            debug!("Show '{}' has no {} image", show.title, stem);
            continue;
        };
        let filename = format!("{}{}", stem, utils::extension_from_url(url));
        let name = format!("{} {}", show.title, stem);
        fetch_asset(
            context,
            ledger,
            Asset {
                key: &key,
                kind,
                name: &name,
                url,
                target: show_dir.join(filename),
            },
        )
        .await;
    }
}

async fn process_video(
    context: &DownloadJobContext,
    ledger: &mut Ledger,
    video: &Video,
    directory: &Path,
    show: Option<(&Show, Option<&Mp3tagExport>)>,
) {
    let args = &context.args;
    if let Some(reason) = date_filter_reason(video, args.from_date, args.to_date) {
        ui::skip(&video.name, &reason);
        context.manager.record_skip(&video.name, &reason);
        return;
    }

    let Some(listed_url) = quality::select_url(video, args.quality) else {
        let reason = format!("no URL found for quality {} or lower", args.quality);
        ui::skip(&video.name, &reason);
        context.manager.record_skip(&video.name, &reason);
        return;
    };
    // Named after the listed URL so that a probed upgrade keeps the same file name.
    let filename = utils::video_filename(video, listed_url);
    let file_stem = utils::video_file_stem(video);

    let status = if ledger.is_downloaded(&video.id, ResourceKind::Video) {
        ui::skip(&video.name, "already downloaded");
        context.manager.record_skip(&video.name, "already downloaded");
        DownloadStatus::Skipped
    } else {
        let probe: &ApiClient = context.catalog.client();
        let url = quality::resolve_url(video, args.quality, probe)
            .await
            .unwrap_or_else(|| listed_url.to_string());
        let status = fetch_asset(
            context,
            ledger,
            Asset {
                key: &video.id,
                kind: ResourceKind::Video,
                name: &video.name,
                url: &url,
                target: directory.join(&filename),
            },
        )
        .await;
        if status == DownloadStatus::Success && !args.no_metadata {
            let stem = utils::sanitize_filename(&file_stem);
            if let Err(e) = sidecar::write_metadata(directory, &stem, video) {
                warn!("Metadata sidecar for '{}' failed: {}", video.name, e);
                ui::warn(&format!("Could not write metadata for {}: {}", video.name, e));
            }
        }
        status
    };

    if status != DownloadStatus::Failed
        && let Some((show, Some(export))) = show
        && let Err(e) = export.add_video(&filename, video, &show.title)
    {
        warn!("mp3tag line for '{}' failed: {}", video.name, e);
    }

    if args.video_images
        && !context.is_cancelled()
        && let Some(image_url) = video.image.as_ref().and_then(ImageSet::url)
    {
        let image_name = format!("{} image", video.name);
        let image_file = utils::sanitize_filename(&format!(
            "{}{}",
            file_stem,
            utils::extension_from_url(image_url)
        ));
        fetch_asset(
            context,
            ledger,
            Asset {
                key: &video.id,
                kind: ResourceKind::Image,
                name: &image_name,
                url: image_url,
                target: directory.join(image_file),
            },
        )
        .await;
    }
}

/// Why `video` falls outside the `--from-date`/`--to-date` window, if it does.
/// Videos without a readable publish date are never filtered out.
fn date_filter_reason(
    video: &Video,
    from: Option<chrono::NaiveDate>,
    to: Option<chrono::NaiveDate>,
) -> Option<String> {
    let day = video.publish_day()?;
    if let Some(from) = from
        && day < from
    {
        return Some(format!("published on {} (--from-date: {})", day, from));
    }
    if let Some(to) = to
        && day > to
    {
        return Some(format!("published on {} (--to-date: {})", day, to));
    }
    None
}

/// Skips, resumes or downloads one asset and records the outcome.
async fn fetch_asset(
    context: &DownloadJobContext,
    ledger: &mut Ledger,
    asset: Asset<'_>,
) -> DownloadStatus {
    let filename = asset
        .target
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    if ledger.is_downloaded(asset.key, asset.kind) {
        ui::skip(asset.name, "already downloaded");
        context.manager.record_skip(asset.name, "already downloaded");
        return DownloadStatus::Skipped;
    }

    // A file on disk is only a partial of this URL if the ledger says it was started from it.
    let on_disk = fs::metadata(&asset.target)
        .ok()
        .map(|m| m.len())
        .filter(|len| *len > 0);
    let resume_from = match on_disk {
        Some(offset) if ledger.pending_url(asset.key, asset.kind) == Some(asset.url) => {
            ui::info(&format!(
                "Resuming {} from {}",
                filename,
                readable_filesize(offset)
            ));
            Some(offset)
        }
        Some(offset) => {
            warn!(
                "'{}' holds {} bytes not started from {}, downloading it again",
                asset.target.display(),
                offset,
                asset.url
            );
            ui::warn(&format!(
                "{} does not match the file being downloaded, starting over",
                filename
            ));
            // Stale bytes must not be taken for a partial of the new URL.
            if let Err(e) = fs::remove_file(&asset.target) {
                error!("Could not remove '{}': {}", asset.target.display(), e);
                context
                    .manager
                    .record_failure(asset.name, "stale partial file could not be removed");
                return DownloadStatus::Failed;
            }
            None
        }
        None => None,
    };

    if let Err(e) = ledger.mark_started(asset.key, asset.kind, asset.url) {
        error!("Could not update ledger '{}': {}", ledger.path().display(), e);
        ui::error(&format!("Could not update {}: {}", ledger.path().display(), e));
        context
            .manager
            .record_failure(asset.name, "ledger could not be written");
        return DownloadStatus::Failed;
    }

    ui::download_start(asset.name, &filename);
    let bar = TransferBar::new();
    let ok = context
        .downloader
        .download(asset.url, &asset.target, resume_from, |progress| {
            bar.update(progress)
        })
        .await;

    if !ok {
        bar.abandon();
        let reason = if context.is_cancelled() {
            "interrupted"
        } else {
            "download failed"
        };
        context.manager.record_failure(asset.name, reason);
        return DownloadStatus::Failed;
    }
    bar.finish();

    if let Err(e) = ledger.mark_downloaded(asset.key, asset.kind, asset.name) {
        error!("Could not update ledger '{}': {}", ledger.path().display(), e);
        ui::error(&format!("Could not update {}: {}", ledger.path().display(), e));
        context
            .manager
            .record_failure(asset.name, "ledger could not be written");
        return DownloadStatus::Failed;
    }
    context.manager.record_success();
    DownloadStatus::Success
}
