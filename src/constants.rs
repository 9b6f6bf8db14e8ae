// src/constants.rs

pub const UI_WIDTH: usize = 72;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = "app.log";
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const API_KEY_ENV: &str = "GB_API_KEY";
pub const USER_AGENT: &str = concat!(clap::crate_name!(), "/", clap::crate_version!());

pub const LEDGER_FILE_NAME: &str = "downloaded.json";
pub const MP3TAG_FILE_NAME: &str = "mp3tag.txt";
pub const POSTER_STEM: &str = "poster";
pub const LOGO_STEM: &str = "logo";

pub mod api {
    pub const DEFAULT_BASE_URL: &str = "https://www.giantbomb.com/api/";
    pub const API_KEY_PARAM: &str = "api_key";
    pub const API_KEY_PAGE: &str = "https://www.giantbomb.com/api/";
    pub const FORMAT_PARAM: (&str, &str) = ("format", "json");
    /// Giant Bomb allows one request per second; the extra 100ms is headroom.
    pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 1100;
    pub const DEFAULT_PAGE_LIMIT: u32 = 100;
    pub const DEFAULT_MAX_PAGES: u32 = 100;
    pub const SORT_BY_PUBLISH_DATE: &str = "publish_date:asc";

    pub mod endpoints {
        pub const SHOWS: &str = "video_shows";
        pub const VIDEOS: &str = "videos";
        pub const VIDEO: &str = "video";
    }
}

pub const HIGHEST_BITRATE: &str = "8000";

pub const HELP_API_KEY: &str = "Personal Giant Bomb API key, retrieved from https://www.giantbomb.com/api/";
