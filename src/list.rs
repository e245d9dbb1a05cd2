//! Listing engine over the store's bounded pages.
//!
//! The store only filters by prefix natively; suffix filtering happens here,
//! client-side. Because the filter can discard keys, one logical page may
//! take several native fetches: the engine keeps fetching until the limit is
//! met or the store is exhausted, and hands back the store's own
//! continuation token from the point it stopped, so resuming reproduces the
//! remaining sequence with no gaps or duplicates. Every native fetch asks
//! for exactly the number of keys still needed, which keeps the token
//! aligned with the last key actually examined.

use crate::page::Page;
use crate::store::ObjectStore;
use crate::{Error, Result};

/// Page size used when a query carries no explicit limit.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Filters and bounds for one listing call.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Only keys starting with this prefix (store-side filter)
    pub prefix: Option<String>,
    /// Only keys ending with this suffix (client-side filter)
    pub suffix: Option<String>,
    /// Opaque cursor from a previous page; filters must match
    pub cursor: Option<String>,
    /// Maximum number of keys to return; defaults to [`DEFAULT_PAGE_SIZE`]
    pub limit: Option<usize>,
}

/// Fetch one logical page of keys matching the query.
///
/// Keys come back in the store's native lexicographic order. An exhausted
/// listing (or one matching nothing) yields an empty page with no cursor.
pub(crate) async fn list_page(store: &dyn ObjectStore, query: &ListQuery) -> Result<Page<String>> {
    let limit = match query.limit {
        Some(0) => return Err(Error::InvalidInput("listing limit must be positive".to_string())),
        Some(limit) => limit,
        None => DEFAULT_PAGE_SIZE,
    };

    let mut items = Vec::new();
    let mut token = query.cursor.clone();
    loop {
        let wanted = limit - items.len();
        let listing = store
            .list(query.prefix.as_deref(), token.as_deref(), wanted)
            .await?;
        match &query.suffix {
            Some(suffix) => {
                items.extend(listing.keys.into_iter().filter(|key| key.ends_with(suffix)));
            }
            None => items.extend(listing.keys),
        }
        token = listing.next_token;
        if token.is_none() || items.len() >= limit {
            break;
        }
    }

    Ok(Page { items, cursor: token })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ObjectStore};
    use bytes::Bytes;

    async fn seeded(keys: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for key in keys {
            store.put(key, Bytes::from("x"), "text/plain").await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_empty_store_yields_single_empty_page() {
        let store = seeded(&[]).await;
        let page = list_page(&store, &ListQuery::default()).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn test_limit_and_resume() {
        let store = seeded(&["a", "b", "c", "d", "e"]).await;

        let first = list_page(
            &store,
            &ListQuery { limit: Some(3), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(first.items, vec!["a", "b", "c"]);
        let cursor = first.cursor.clone();
        assert!(cursor.is_some());

        let second = list_page(
            &store,
            &ListQuery { cursor, ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(second.items, vec!["d", "e"]);
        assert!(second.cursor.is_none());
    }

    #[tokio::test]
    async fn test_suffix_filter_spans_native_pages() {
        // Suffix filtering discards keys, so a logical page of one match may
        // consume several native fetches; the cursor must still resume at
        // the right place.
        let store = seeded(&["a.bin", "b.txt", "c.bin", "d.txt", "e.bin"]).await;

        let query = ListQuery {
            suffix: Some(".bin".to_string()),
            limit: Some(1),
            ..Default::default()
        };
        let first = list_page(&store, &query).await.unwrap();
        assert_eq!(first.items, vec!["a.bin"]);

        let second = list_page(
            &store,
            &ListQuery { cursor: first.cursor, ..query.clone() },
        )
        .await
        .unwrap();
        assert_eq!(second.items, vec!["c.bin"]);

        let third = list_page(
            &store,
            &ListQuery { cursor: second.cursor, ..query },
        )
        .await
        .unwrap();
        assert_eq!(third.items, vec!["e.bin"]);
        assert!(third.cursor.is_none());
    }

    #[tokio::test]
    async fn test_zero_limit_rejected() {
        let store = seeded(&["a"]).await;
        let err = list_page(
            &store,
            &ListQuery { limit: Some(0), ..Default::default() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
