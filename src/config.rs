// src/config.rs

pub mod api_key;

use self::api_key::load_or_create_external_config;
use crate::{constants, error::AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub base_url: Option<String>,
    pub request_interval_ms: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PagingConfig {
    pub page_limit: Option<u32>,
    pub max_pages: Option<u32>,
}

/// Shape of `~/.gb-show-dl/config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub paging: PagingConfig,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        Self {
            api_key: None,
            network: NetworkConfig {
                base_url: Some(constants::api::DEFAULT_BASE_URL.into()),
                request_interval_ms: Some(constants::api::DEFAULT_REQUEST_INTERVAL_MS),
                connect_timeout_secs: Some(10),
                timeout_secs: Some(60),
                max_retries: Some(2),
            },
            paging: PagingConfig {
                page_limit: Some(constants::api::DEFAULT_PAGE_LIMIT),
                max_pages: Some(constants::api::DEFAULT_MAX_PAGES),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_interval: Duration,
    pub connect_timeout: Duration,
    /// Per-read timeout; a whole video transfer can take far longer than this.
    pub read_timeout: Duration,
    pub max_retries: u32,
    pub page_limit: u32,
    pub max_pages: u32,
}

impl AppConfig {
    pub fn new() -> AppResult<Self> {
        Ok(Self::from_external(load_or_create_external_config()?))
    }

    pub fn from_external(external: ExternalConfig) -> Self {
        let network = external.network;
        let paging = external.paging;
        let mut base_url = network
            .base_url
            .unwrap_or_else(|| constants::api::DEFAULT_BASE_URL.into());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            user_agent: constants::USER_AGENT.into(),
            request_interval: Duration::from_millis(
                network
                    .request_interval_ms
                    .unwrap_or(constants::api::DEFAULT_REQUEST_INTERVAL_MS),
            ),
            connect_timeout: Duration::from_secs(network.connect_timeout_secs.unwrap_or(10)),
            read_timeout: Duration::from_secs(network.timeout_secs.unwrap_or(60)),
            max_retries: network.max_retries.unwrap_or(2),
            page_limit: paging
                .page_limit
                .unwrap_or(constants::api::DEFAULT_PAGE_LIMIT)
                .max(1),
            max_pages: paging
                .max_pages
                .unwrap_or(constants::api::DEFAULT_MAX_PAGES)
                .max(1),
        }
    }

    /// Points the client at another host; used for staging servers and tests.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        if !self.base_url.ends_with('/') {
            self.base_url.push('/');
        }
        self
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1/api/".to_string(),
            user_agent: "test-agent/1.0".to_string(),
            request_interval: Duration::ZERO,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(15),
            max_retries: 0,
            page_limit: 100,
            max_pages: 5,
        }
    }
}
