//! Background driver for progressive page loads.
//!
//! Walks a paginated listing from offset 0 in fixed-size steps, publishing
//! each page through a [`LoadHandle`]. The first page is published as soon
//! as it arrives so the UI can render while the rest of the set streams in.

use std::future::Future;

use crate::client::{ApiResult, Page};

use super::list::{LoadHandle, LoadOutcome};

/// Rows requested per backend call. Listings larger than this stream in as
/// multiple batches.
pub const FETCH_PAGE_SIZE: usize = 100;

/// Spawn [`run_page_loader`] on the runtime.
pub fn spawn_page_loader<T, F, Fut>(label: &'static str, handle: LoadHandle<T>, fetch: F)
where
    T: Send + 'static,
    F: Fn(usize) -> Fut + Send + 'static,
    Fut: Future<Output = ApiResult<Page<T>>> + Send + 'static,
{
    tokio::spawn(run_page_loader(label, handle, fetch));
}

/// Fetch every page of a listing and publish it through `handle`.
///
/// Failure semantics: a failed first page finishes as `Failed` with nothing
/// published; a failure after that finishes as `Partial` and the prefix
/// already published stays. There are no retries. A walk whose handle goes
/// stale stops fetching at the next page boundary.
pub async fn run_page_loader<T, F, Fut>(label: &'static str, handle: LoadHandle<T>, fetch: F)
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    if !handle.is_live() {
        return;
    }

    let first = match fetch(0).await {
        Ok(page) => page,
        Err(e) => {
            log::warn!("{} load failed on first page: {}", label, e);
            handle.finish(LoadOutcome::Failed);
            return;
        }
    };

    let total = first.total_entries;
    let first_len = first.results.len();
    handle.first_batch(first.results, total);
    log::debug!("{}: first batch {} of {}", label, first_len, total);

    if first_len == 0 {
        handle.finish(LoadOutcome::Complete);
        return;
    }

    let mut offset = FETCH_PAGE_SIZE;
    while offset < total {
        if !handle.is_live() {
            log::debug!("{} load superseded at offset {}, stopping", label, offset);
            return;
        }
        match fetch(offset).await {
            Ok(page) => {
                if page.results.is_empty() {
                    break;
                }
                handle.more_items(page.results);
                offset += FETCH_PAGE_SIZE;
            }
            Err(e) => {
                log::warn!("{} load failed at offset {}: {}", label, offset, e);
                handle.finish(LoadOutcome::Partial);
                return;
            }
        }
    }

    handle.finish(LoadOutcome::Complete);
}
