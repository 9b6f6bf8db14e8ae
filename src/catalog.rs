// src/catalog.rs

use crate::{
    client::ApiClient,
    constants::api::{SORT_BY_PUBLISH_DATE, endpoints},
    error::{AppError, AppResult},
    models::{Show, Video},
};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{future::Future, ops::ControlFlow, sync::Arc};

/// Giant Bomb resources built on top of the paged API client.
#[derive(Clone)]
pub struct Catalog {
    client: Arc<ApiClient>,
}

impl Catalog {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    fn page_params(&self, page: u32) -> Vec<(&'static str, String)> {
        let limit = self.client.config().page_limit;
        vec![
            ("offset", (u64::from(page) * u64::from(limit)).to_string()),
            ("limit", limit.to_string()),
        ]
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> AppResult<Option<Vec<T>>> {
        let envelope = self.client.fetch_page::<Vec<T>>(endpoint, params).await?;
        if let Some(total) = envelope.number_of_total_results {
            debug!("'{}' reports {} results in total", endpoint, total);
        }
        Ok(envelope.results)
    }

    /// Looks a show up by title, ignoring case. `None` when no page has it.
    pub async fn find_show(&self, title: &str) -> AppResult<Option<Show>> {
        let wanted = title.to_lowercase();
        let mut found = None;
        walk_pages(
            self.client.config().max_pages,
            |page| {
                if page > 0 {
                    debug!("Paging through shows, page {}", page);
                }
                let params = self.page_params(page);
                async move { self.fetch_list::<Show>(endpoints::SHOWS, &params).await }
            },
            |shows| match shows.into_iter().find(|s| s.title.to_lowercase() == wanted) {
                Some(show) => {
                    found = Some(show);
                    ControlFlow::Break(())
                }
                None => ControlFlow::Continue(()),
            },
        )
        .await?;
        Ok(found)
    }

    /// Every video of a show, oldest first, in the order the API returns them.
    pub async fn show_videos(&self, show: &Show) -> AppResult<Vec<Video>> {
        let filter = format!("video_show:{}", show.id);
        let mut videos = Vec::new();
        walk_pages(
            self.client.config().max_pages,
            |page| {
                if page > 0 {
                    debug!("Paging through videos, page {}", page);
                }
                let mut params = self.page_params(page);
                params.push(("sort", SORT_BY_PUBLISH_DATE.to_string()));
                params.push(("filter", filter.clone()));
                async move { self.fetch_list::<Video>(endpoints::VIDEOS, &params).await }
            },
            |page| {
                videos.extend(page);
                ControlFlow::Continue(())
            },
        )
        .await?;
        info!("Found {} videos for show '{}'", videos.len(), show.title);
        Ok(videos)
    }

    /// A single video. A 404, or an empty `results`, is `None` rather than an error.
    pub async fn video_by_id(&self, id: &str) -> AppResult<Option<Video>> {
        let endpoint = format!("{}/{}", endpoints::VIDEO, id.trim());
        let envelope = match self.client.fetch_page::<Value>(&endpoint, &[]).await {
            Ok(envelope) => envelope,
            Err(AppError::Request { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        match envelope.results {
            Some(value @ Value::Object(_)) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| AppError::ApiParseFailed { endpoint, source }),
            _ => Ok(None),
        }
    }
}

/// Requests pages 0, 1, 2, ... until one comes back empty (or without
/// `results`), `visit` breaks, or `max_pages` have been requested.
/// Returns how many pages were requested.
pub async fn walk_pages<T, F, Fut, V>(max_pages: u32, mut fetch: F, mut visit: V) -> AppResult<u32>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AppResult<Option<Vec<T>>>>,
    V: FnMut(Vec<T>) -> ControlFlow<()>,
{
    let mut page = 0;
    loop {
        if page >= max_pages {
            debug!("Stopped paging at the ceiling of {} pages", max_pages);
            break;
        }
        let items = fetch(page).await?;
        page += 1;
        match items {
            Some(items) if !items.is_empty() => {
                if visit(items).is_break() {
                    break;
                }
            }
            _ => break,
        }
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_stops_on_first_empty_page() {
        let calls = Cell::new(0);
        let mut seen = Vec::new();
        let pages = walk_pages(
            10,
            |page| {
                calls.set(calls.get() + 1);
                async move {
                    Ok::<_, AppError>(Some(match page {
                        0 => vec![1, 2],
                        1 => vec![3, 4],
                        _ => vec![],
                    }))
                }
            },
            |items| {
                seen.extend(items);
                ControlFlow::Continue(())
            },
        )
        .await
        .unwrap();
        assert_eq!(pages, 3);
        assert_eq!(calls.get(), 3);
        assert_eq!(seen, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_ceiling_bounds_endless_results() {
        let pages = walk_pages(
            4,
            |_| async { Ok::<_, AppError>(Some(vec![0u8])) },
            |_| ControlFlow::Continue(()),
        )
        .await
        .unwrap();
        assert_eq!(pages, 4);
    }

    #[tokio::test]
    async fn test_missing_results_ends_paging() {
        let pages = walk_pages(
            4,
            |_| async { Ok::<_, AppError>(None::<Vec<u8>>) },
            |_| ControlFlow::Continue(()),
        )
        .await
        .unwrap();
        assert_eq!(pages, 1);
    }

    #[tokio::test]
    async fn test_errors_abort_paging() {
        let result = walk_pages(
            4,
            |page| async move {
                if page == 1 {
                    Err(AppError::Request {
                        message: "boom".into(),
                        status: 500,
                    })
                } else {
                    Ok(Some(vec![page]))
                }
            },
            |_| ControlFlow::Continue(()),
        )
        .await;
        assert!(matches!(result, Err(AppError::Request { status: 500, .. })));
    }
}
