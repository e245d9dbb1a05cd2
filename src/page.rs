//! Pagination primitives.

use futures::stream::{self, Stream, TryStreamExt};
use std::future::Future;

use crate::{Error, Result};

/// One page of listing results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in store order
    pub items: Vec<T>,
    /// Cursor for the next page; `None` when the listing is exhausted.
    ///
    /// A cursor is only valid for a subsequent call with the same filters it
    /// was produced under.
    pub cursor: Option<String>,
}

enum Walk {
    Start,
    Cursor(String),
    Done,
}

/// Flatten a page-fetching function into a lazy stream of items.
///
/// `fetch` is called with `None` first and then with each returned cursor
/// until a page comes back without one. Pages are fetched on demand as the
/// stream is polled.
///
/// ```no_run
/// # use bucketkv::{paginate, Bucket, KeyQuery, Result};
/// # use futures::TryStreamExt;
/// # async fn example(bucket: Bucket<String>) -> Result<()> {
/// let keys: Vec<String> = paginate(|cursor| {
///     let bucket = bucket.clone();
///     async move { bucket.keys(&KeyQuery { cursor, ..Default::default() }).await }
/// })
/// .try_collect()
/// .await?;
/// # Ok(())
/// # }
/// ```
pub fn paginate<T, F, Fut>(fetch: F) -> impl Stream<Item = Result<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    stream::try_unfold((Walk::Start, fetch), |(walk, mut fetch)| async move {
        let cursor = match walk {
            Walk::Start => None,
            Walk::Cursor(cursor) => Some(cursor),
            Walk::Done => return Ok::<_, Error>(None),
        };
        let page = fetch(cursor).await?;
        let next = match page.cursor {
            Some(cursor) => Walk::Cursor(cursor),
            None => Walk::Done,
        };
        let items = stream::iter(page.items.into_iter().map(Ok::<T, Error>));
        Ok(Some((items, (next, fetch))))
    })
    .try_flatten()
}
