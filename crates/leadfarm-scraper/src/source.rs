//! The listing-source abstraction the navigator crawls against.
//!
//! [`DirectoryClient`](crate::client::DirectoryClient) is the production
//! implementation; tests drive the navigator with in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use leadfarm_core::ContactKind;

use crate::error::SourceError;

/// Position in a result list, in whichever navigation mode the session uses.
///
/// `Page` is a 1-based page number; `Offset` is a 0-based item offset for
/// sources that serve a continuously scrolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    Page(u32),
    Offset(u32),
}

impl Cursor {
    /// Starting cursor for page-number navigation.
    #[must_use]
    pub fn first_page() -> Self {
        Cursor::Page(1)
    }

    /// Starting cursor for scroll navigation.
    #[must_use]
    pub fn scroll_start() -> Self {
        Cursor::Offset(0)
    }
}

/// Opaque reference to one listing, sufficient to fetch its detail record.
///
/// The `id` is the source's own listing identifier and is what session-level
/// deduplication keys on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingHandle {
    pub id: String,
}

impl ListingHandle {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One window of search results.
///
/// `next_cursor` is `None` when the source signals exhaustion (page-number
/// navigation only; scroll sources never report one and rely on the
/// navigator's stall detection instead).
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub handles: Vec<ListingHandle>,
    pub next_cursor: Option<Cursor>,
}

/// One contact row from a listing detail record, still unclassified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEntry {
    pub kind: ContactKind,
    pub value: String,
}

impl ContactEntry {
    #[must_use]
    pub fn phone(value: impl Into<String>) -> Self {
        Self {
            kind: ContactKind::Phone,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn link(value: impl Into<String>) -> Self {
        Self {
            kind: ContactKind::Link,
            value: value.into(),
        }
    }
}

/// Full detail record for one listing, as served by the source.
#[derive(Debug, Clone)]
pub struct ListingDetail {
    pub name: String,
    pub contacts: Vec<ContactEntry>,
    /// Canonical listing URL, when the source exposes one.
    pub url: Option<String>,
}

/// A search-and-detail listing source the navigator can crawl.
///
/// `search_page` serves one window of handles at `cursor`; `fetch_detail`
/// resolves a single handle to its full record. Implementations own their
/// transport concerns (retry, rate-limit handling, pacing).
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one window of search results for `query` in `region`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the window cannot be fetched or parsed.
    async fn search_page(
        &self,
        query: &str,
        region: &str,
        cursor: Cursor,
    ) -> Result<SearchPage, SourceError>;

    /// Fetch the detail record behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the record cannot be fetched or parsed.
    async fn fetch_detail(&self, handle: &ListingHandle) -> Result<ListingDetail, SourceError>;
}
