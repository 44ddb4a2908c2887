//! Exhaustive walking of paged API listings.

use super::api::{ApiFailure, ApiResult};
use compact_str::CompactString;

/// One fetched page of items plus the opaque cursor for the page after it.
///
/// For GitHub's REST API the cursor is the absolute `rel="next"` URL from the
/// `Link` response header; other platforms may use whatever token their
/// pagination scheme hands back. `None` signals the final page.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<CompactString>,
}

/// Everything gathered before a page walk stopped.
///
/// Partial results collected before a failing page are always preserved and
/// returned alongside the failure, never discarded. Callers decide whether a
/// partial listing is acceptable.
#[derive(Debug)]
pub struct PageResult<T> {
    pub collected: Vec<T>,
    pub failure: Option<ApiFailure>,
}

impl<T> PageResult<T> {
    /// Returns `true` when the walk reached the final page without error.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Walk a paged listing to exhaustion.
///
/// Repeatedly invokes `fetch` with the next-page cursor, starting from
/// `first`, until the platform returns no further cursor or a fetch fails.
/// Items are concatenated in platform-returned order. On failure the walk
/// stops immediately; there are no retries at this layer, retry policy is a
/// collaborator concern.
pub async fn paginate<T, F, Fut>(first: Option<CompactString>, mut fetch: F) -> PageResult<T>
where
    F: FnMut(Option<CompactString>) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    let mut collected = Vec::new();
    let mut cursor = first;

    loop {
        match fetch(cursor.take()).await {
            ApiResult::Success(mut page) => {
                collected.append(&mut page.items);
                match page.next {
                    Some(next) => cursor = Some(next),
                    None => return PageResult { collected, failure: None },
                }
            }
            other => {
                return PageResult {
                    collected,
                    failure: other.failure(),
                };
            }
        }
    }
}
