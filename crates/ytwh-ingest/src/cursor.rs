//! Cursor-based pagination over a [`ContentApi`] listing
//!
//! A [`PageCursor`] turns a request template into a lazy stream of item
//! batches. The stream follows `nextPageToken` until the API stops returning
//! one, ends after the first failed page, and can be restarted from the first
//! page by calling [`PageCursor::fetch_all`] again.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde_json::Value;
use std::time::Duration;

use crate::client::{ContentApi, ListPage, ListRequest};
use crate::error::{FetchCause, FetchFailure};

/// Fetch one page, bounded by `timeout`
pub async fn fetch_page(
    api: &dyn ContentApi,
    request: &ListRequest,
    timeout: Duration,
    page_index: usize,
) -> Result<ListPage, FetchFailure> {
    match tokio::time::timeout(timeout, api.list(request)).await {
        Ok(Ok(page)) => Ok(page),
        Ok(Err(e)) => Err(FetchFailure::new(request.resource, page_index, FetchCause::Api(e))),
        Err(_) => Err(FetchFailure::new(
            request.resource,
            page_index,
            FetchCause::Timeout(timeout),
        )),
    }
}

enum CursorState {
    Start,
    Next { page_index: usize, token: String },
    Done,
}

pub struct PageCursor<'a> {
    api: &'a dyn ContentApi,
    template: ListRequest,
    timeout: Duration,
}

impl<'a> PageCursor<'a> {
    pub fn new(api: &'a dyn ContentApi, template: ListRequest, timeout: Duration) -> Self {
        Self {
            api,
            template,
            timeout,
        }
    }

    /// Stream every page of the listing, starting from the first one.
    ///
    /// An empty continuation token counts as absent.
    pub fn fetch_all(&self) -> BoxStream<'a, Result<Vec<Value>, FetchFailure>> {
        let api = self.api;
        let template = self.template.clone();
        let timeout = self.timeout;

        stream::try_unfold(CursorState::Start, move |state| {
            let template = template.clone();
            async move {
                let (page_index, token) = match state {
                    CursorState::Start => (0, None),
                    CursorState::Next { page_index, token } => (page_index, Some(token)),
                    CursorState::Done => return Ok(None),
                };

                let page = fetch_page(api, &template.at_page(token), timeout, page_index).await?;

                let next = match page.next_page_token.filter(|t| !t.is_empty()) {
                    Some(token) => CursorState::Next {
                        page_index: page_index + 1,
                        token,
                    },
                    None => CursorState::Done,
                };

                Ok(Some((page.items, next)))
            }
        })
        .boxed()
    }

    /// Drain the whole listing into one ordered vector
    pub async fn collect_items(&self) -> Result<Vec<Value>, FetchFailure> {
        self.fetch_all()
            .try_fold(Vec::new(), |mut items, batch| async move {
                items.extend(batch);
                Ok(items)
            })
            .await
    }
}
