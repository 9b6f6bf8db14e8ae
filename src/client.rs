// src/client.rs

pub mod rate_limit;

pub use self::rate_limit::{Clock, RateLimiter, TokioClock};

use crate::{
    config::AppConfig,
    constants::api::{API_KEY_PARAM, FORMAT_PARAM},
    error::*,
    models::Envelope,
};
use async_trait::async_trait;
use http::Extensions;
use log::debug;
use reqwest::{Request, Response, header};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next, RequestBuilder};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Middleware that runs every attempt, retries included, through the shared limiter.
struct Throttle {
    limiter: Arc<RateLimiter>,
}

#[async_trait]
impl Middleware for Throttle {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        self.limiter.acquire().await;
        debug!("{} {}", req.method(), redact(req.url()));
        next.run(req, extensions).await
    }
}

/// Checks whether a remote resource exists.
#[async_trait]
pub trait ExistenceProbe: Send + Sync {
    async fn probe_exists(&self, url: &str) -> bool;
}

#[derive(Clone)]
pub struct ApiClient {
    client: ClientWithMiddleware,
    config: Arc<AppConfig>,
    api_key: String,
}

impl ApiClient {
    pub fn new(config: Arc<AppConfig>, api_key: impl Into<String>) -> AppResult<Self> {
        let limiter = Arc::new(RateLimiter::new(config.request_interval));
        Self::with_limiter(config, api_key, limiter)
    }

    pub fn with_limiter(
        config: Arc<AppConfig>,
        api_key: impl Into<String>,
        limiter: Arc<RateLimiter>,
    ) -> AppResult<Self> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let inner = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()?;
        debug!(
            "API client: {:?} between requests, up to {} retries",
            limiter.interval(),
            config.max_retries
        );
        // Every retried attempt passes through the throttle again.
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .with(Throttle { limiter })
            .build();

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, String)]) -> AppResult<Url> {
        let mut url = Url::parse(&self.config.base_url)?.join(&format!("{}/", endpoint))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair(API_KEY_PARAM, &self.api_key);
            query.append_pair(FORMAT_PARAM.0, FORMAT_PARAM.1);
        }
        Ok(url)
    }

    fn asset_url(&self, url: &str) -> AppResult<Url> {
        let mut url = Url::parse(url)?;
        url.query_pairs_mut().append_pair(API_KEY_PARAM, &self.api_key);
        Ok(url)
    }

    /// GETs one page of an endpoint and decodes its envelope.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> AppResult<Envelope<T>> {
        let url = self.endpoint_url(endpoint, params)?;
        let res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Request {
                message: api_error(&body).unwrap_or_else(|| summarize_body(&body, status)),
                status: status.as_u16(),
            });
        }
        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|source| AppError::ApiParseFailed {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// Builds the GET for an asset, optionally asking for the bytes from `resume_from` on.
    pub fn asset_request(&self, url: &str, resume_from: Option<u64>) -> AppResult<RequestBuilder> {
        let mut request = self.client.get(self.asset_url(url)?);
        if let Some(offset) = resume_from {
            request = request.header(header::RANGE, format!("bytes={}-", offset));
        }
        Ok(request)
    }
}

#[async_trait]
impl ExistenceProbe for ApiClient {
    /// HEAD request that never fails: anything but a success status is `false`.
    async fn probe_exists(&self, url: &str) -> bool {
        let Ok(url) = self.asset_url(url) else {
            return false;
        };
        match self.client.head(url).send().await {
            Ok(res) => res.status().is_success(),
            Err(e) => {
                debug!("Existence probe failed: {}", e);
                false
            }
        }
    }
}

/// The `error` text of a JSON envelope, unless it is the API's "OK".
fn api_error(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<serde::de::IgnoredAny>>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("OK"))
}

fn summarize_body(body: &str, status: reqwest::StatusCode) -> String {
    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body.chars().take(200).collect()
    }
}

/// Drops the API key from a URL before it is logged.
pub(crate) fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != API_KEY_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(kept);
    }
    clean.to_string()
}
