//! Result-list traversal with duplicate tracking and termination detection.
//!
//! Directory search results misbehave in two distinct ways. Page-number
//! sources keep serving the last page for any out-of-range page number, so
//! "no new listings" is the only reliable end signal. Scroll sources return
//! a sliding window that can get stuck re-serving the same items, so the
//! navigator counts consecutive windows that contribute nothing and gives up
//! after a threshold. A hard iteration ceiling backstops both modes.

use std::collections::HashSet;

use crate::error::SourceError;
use crate::source::{Cursor, ListingHandle, ListingSource};

/// Why a traversal ended.
///
/// All three are normal outcomes, not errors; the orchestrator records the
/// label in the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source reported exhaustion, or a page contributed nothing new.
    Done,
    /// Scroll windows stopped contributing new listings.
    Stalled,
    /// The hard iteration ceiling was hit before the source ran out.
    IterationLimit,
}

impl StopReason {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            StopReason::Done => "done",
            StopReason::Stalled => "stalled",
            StopReason::IterationLimit => "iteration limit",
        }
    }
}

/// Traversal tuning knobs.
#[derive(Debug, Clone, Copy)]
pub struct NavigatorConfig {
    /// Consecutive zero-new scroll windows tolerated before stopping.
    pub stall_threshold: u32,
    /// Hard ceiling on search-page fetches per session.
    pub max_iterations: u32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            stall_threshold: 10,
            max_iterations: 500,
        }
    }
}

/// Stateful walker over one `(query, region)` search session.
///
/// Feed it any [`ListingSource`] and call [`next_batch`](Self::next_batch)
/// until it yields `None`. Every handle id is reported at most once per
/// session, whatever the source re-serves.
pub struct Navigator<'a, S: ListingSource + ?Sized> {
    source: &'a S,
    query: &'a str,
    region: &'a str,
    cursor: Cursor,
    config: NavigatorConfig,
    seen: HashSet<String>,
    stalls: u32,
    iterations: u32,
    stop: Option<StopReason>,
}

impl<'a, S: ListingSource + ?Sized> Navigator<'a, S> {
    /// Start a traversal at `cursor` (the crawl start, or a checkpointed
    /// position when resuming).
    pub fn new(
        source: &'a S,
        query: &'a str,
        region: &'a str,
        cursor: Cursor,
        config: NavigatorConfig,
    ) -> Self {
        Self {
            source,
            query,
            region,
            cursor,
            config,
            seen: HashSet::new(),
            stalls: 0,
            iterations: 0,
            stop: None,
        }
    }

    /// Fetch result windows until one contributes handles not yet seen this
    /// session, and return those.
    ///
    /// Returns `Ok(None)` once the traversal has ended; the cause is then
    /// available from [`stop_reason`](Self::stop_reason). Subsequent calls
    /// keep returning `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the underlying source fails. The
    /// navigator keeps its position, so the caller may retry or abandon the
    /// session as it sees fit.
    pub async fn next_batch(&mut self) -> Result<Option<Vec<ListingHandle>>, SourceError> {
        loop {
            if self.stop.is_some() {
                return Ok(None);
            }
            if self.iterations >= self.config.max_iterations {
                tracing::warn!(
                    region = self.region,
                    query = self.query,
                    max_iterations = self.config.max_iterations,
                    "iteration ceiling reached before the source ran out"
                );
                self.stop = Some(StopReason::IterationLimit);
                return Ok(None);
            }

            let page = self
                .source
                .search_page(self.query, self.region, self.cursor)
                .await?;
            self.iterations += 1;
            let fetched = page.handles.len();

            let fresh: Vec<ListingHandle> = page
                .handles
                .into_iter()
                .filter(|handle| self.seen.insert(handle.id.clone()))
                .collect();
            tracing::debug!(
                region = self.region,
                query = self.query,
                cursor = ?self.cursor,
                fetched,
                fresh = fresh.len(),
                "fetched search window"
            );

            match self.cursor {
                Cursor::Page(_) => {
                    // Out-of-range pages echo earlier content, so a page with
                    // nothing new means the listing ran out.
                    if fresh.is_empty() {
                        self.stop = Some(StopReason::Done);
                        return Ok(None);
                    }
                    match page.next_cursor {
                        Some(next) => self.cursor = next,
                        None => self.stop = Some(StopReason::Done),
                    }
                    return Ok(Some(fresh));
                }
                Cursor::Offset(offset) => {
                    // Scroll windows advance by however many items the source
                    // actually served, not by a fixed page size.
                    let step = u32::try_from(fetched).unwrap_or(u32::MAX);
                    self.cursor = Cursor::Offset(offset.saturating_add(step));
                    if fresh.is_empty() {
                        self.stalls += 1;
                        if self.stalls >= self.config.stall_threshold {
                            self.stop = Some(StopReason::Stalled);
                            return Ok(None);
                        }
                        continue;
                    }
                    self.stalls = 0;
                    return Ok(Some(fresh));
                }
            }
        }
    }

    /// Current position, suitable for checkpointing between batches.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Search-page fetches performed so far.
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Why the traversal stopped, once it has.
    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::source::{ContactEntry, ListingDetail, SearchPage};

    /// Serves a fixed script of pages; out-of-script requests echo the last
    /// page, which is how real page-number sources behave.
    struct ScriptedSource {
        pages: Vec<SearchPage>,
        calls: AtomicU32,
        cursors: Mutex<Vec<Cursor>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<SearchPage>) -> Self {
            Self {
                pages,
                calls: AtomicU32::new(0),
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ListingSource for ScriptedSource {
        async fn search_page(
            &self,
            _query: &str,
            _region: &str,
            cursor: Cursor,
        ) -> Result<SearchPage, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.cursors.lock().unwrap().push(cursor);
            let idx = n.min(self.pages.len() - 1);
            Ok(self.pages[idx].clone())
        }

        async fn fetch_detail(&self, handle: &ListingHandle) -> Result<ListingDetail, SourceError> {
            Ok(ListingDetail {
                name: format!("listing {}", handle.id),
                contacts: vec![ContactEntry::phone("+79991234567")],
                url: None,
            })
        }
    }

    /// Mints a fresh handle on every call, so only the iteration ceiling can
    /// stop a traversal.
    struct CountingSource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ListingSource for CountingSource {
        async fn search_page(
            &self,
            _query: &str,
            _region: &str,
            cursor: Cursor,
        ) -> Result<SearchPage, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let next = match cursor {
                Cursor::Page(p) => Some(Cursor::Page(p + 1)),
                Cursor::Offset(_) => None,
            };
            Ok(SearchPage {
                handles: vec![ListingHandle::new(format!("h{n}"))],
                next_cursor: next,
            })
        }

        async fn fetch_detail(&self, _handle: &ListingHandle) -> Result<ListingDetail, SourceError> {
            unreachable!("traversal tests never fetch details")
        }
    }

    fn page(ids: &[&str], next: Option<Cursor>) -> SearchPage {
        SearchPage {
            handles: ids.iter().copied().map(ListingHandle::new).collect(),
            next_cursor: next,
        }
    }

    fn ids(handles: &[ListingHandle]) -> Vec<&str> {
        handles.iter().map(|h| h.id.as_str()).collect()
    }

    #[tokio::test]
    async fn paged_traversal_walks_until_source_reports_exhaustion() {
        let source = ScriptedSource::new(vec![
            page(&["a", "b"], Some(Cursor::Page(2))),
            page(&["c"], None),
        ]);
        let mut nav = Navigator::new(
            &source,
            "ремонт",
            "krasnodar",
            Cursor::first_page(),
            NavigatorConfig::default(),
        );

        let first = nav.next_batch().await.unwrap().unwrap();
        assert_eq!(ids(&first), vec!["a", "b"]);
        let second = nav.next_batch().await.unwrap().unwrap();
        assert_eq!(ids(&second), vec!["c"]);
        assert!(nav.next_batch().await.unwrap().is_none());

        assert_eq!(nav.stop_reason(), Some(StopReason::Done));
        assert_eq!(nav.iterations(), 2);
        let cursors = source.cursors.lock().unwrap();
        assert_eq!(*cursors, vec![Cursor::Page(1), Cursor::Page(2)]);
    }

    #[tokio::test]
    async fn empty_first_page_ends_immediately() {
        let source = ScriptedSource::new(vec![page(&[], Some(Cursor::Page(2)))]);
        let mut nav = Navigator::new(
            &source,
            "ремонт",
            "krasnodar",
            Cursor::first_page(),
            NavigatorConfig::default(),
        );

        assert!(nav.next_batch().await.unwrap().is_none());
        assert_eq!(nav.stop_reason(), Some(StopReason::Done));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn page_of_repeats_counts_as_exhaustion() {
        // Page 2 echoes page 1 in full, the classic out-of-range echo.
        let source = ScriptedSource::new(vec![
            page(&["a", "b"], Some(Cursor::Page(2))),
            page(&["a", "b"], Some(Cursor::Page(3))),
        ]);
        let mut nav = Navigator::new(
            &source,
            "ремонт",
            "krasnodar",
            Cursor::first_page(),
            NavigatorConfig::default(),
        );

        let first = nav.next_batch().await.unwrap().unwrap();
        assert_eq!(ids(&first), vec!["a", "b"]);
        assert!(nav.next_batch().await.unwrap().is_none());
        assert_eq!(nav.stop_reason(), Some(StopReason::Done));
    }

    #[tokio::test]
    async fn repeated_handles_within_a_page_are_reported_once() {
        let source = ScriptedSource::new(vec![page(&["a", "a", "b"], None)]);
        let mut nav = Navigator::new(
            &source,
            "ремонт",
            "krasnodar",
            Cursor::first_page(),
            NavigatorConfig::default(),
        );

        let batch = nav.next_batch().await.unwrap().unwrap();
        assert_eq!(ids(&batch), vec!["a", "b"]);
        assert!(nav.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stuck_scroll_window_stalls_out() {
        let source = ScriptedSource::new(vec![page(&["a"], None)]);
        let config = NavigatorConfig {
            stall_threshold: 10,
            ..NavigatorConfig::default()
        };
        let mut nav = Navigator::new(&source, "ремонт", "krasnodar", Cursor::scroll_start(), config);

        let batch = nav.next_batch().await.unwrap().unwrap();
        assert_eq!(ids(&batch), vec!["a"]);
        assert!(nav.next_batch().await.unwrap().is_none());

        assert_eq!(nav.stop_reason(), Some(StopReason::Stalled));
        // One productive window plus exactly threshold-many stalled ones.
        assert_eq!(source.calls.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn scroll_cursor_advances_by_served_window_size() {
        let source = ScriptedSource::new(vec![
            page(&["a", "b", "c"], None),
            page(&["d", "e"], None),
        ]);
        let config = NavigatorConfig {
            stall_threshold: 1,
            ..NavigatorConfig::default()
        };
        let mut nav = Navigator::new(&source, "ремонт", "krasnodar", Cursor::scroll_start(), config);

        nav.next_batch().await.unwrap().unwrap();
        assert_eq!(nav.cursor(), Cursor::Offset(3));
        nav.next_batch().await.unwrap().unwrap();
        assert_eq!(nav.cursor(), Cursor::Offset(5));
    }

    #[tokio::test]
    async fn fresh_handles_reset_the_stall_counter() {
        // Two echoes of "x" would stall at threshold 2 were the counter not
        // reset by the "y" window between them.
        let source = ScriptedSource::new(vec![
            page(&["x"], None),
            page(&["x"], None),
            page(&["y"], None),
            page(&["y"], None),
            page(&["y"], None),
        ]);
        let config = NavigatorConfig {
            stall_threshold: 2,
            ..NavigatorConfig::default()
        };
        let mut nav = Navigator::new(&source, "ремонт", "krasnodar", Cursor::scroll_start(), config);

        let first = nav.next_batch().await.unwrap().unwrap();
        assert_eq!(ids(&first), vec!["x"]);
        let second = nav.next_batch().await.unwrap().unwrap();
        assert_eq!(ids(&second), vec!["y"]);
        assert!(nav.next_batch().await.unwrap().is_none());
        assert_eq!(nav.stop_reason(), Some(StopReason::Stalled));
    }

    #[tokio::test]
    async fn iteration_ceiling_stops_an_endless_source() {
        let source = CountingSource {
            calls: AtomicU32::new(0),
        };
        let config = NavigatorConfig {
            max_iterations: 5,
            ..NavigatorConfig::default()
        };
        let mut nav = Navigator::new(&source, "ремонт", "krasnodar", Cursor::first_page(), config);

        let mut batches = 0;
        while nav.next_batch().await.unwrap().is_some() {
            batches += 1;
        }

        assert_eq!(batches, 5);
        assert_eq!(nav.stop_reason(), Some(StopReason::IterationLimit));
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn traversal_resumes_from_a_checkpointed_cursor() {
        let source = ScriptedSource::new(vec![page(&["g"], None)]);
        let mut nav = Navigator::new(
            &source,
            "ремонт",
            "krasnodar",
            Cursor::Page(7),
            NavigatorConfig::default(),
        );

        nav.next_batch().await.unwrap().unwrap();
        let cursors = source.cursors.lock().unwrap();
        assert_eq!(*cursors, vec![Cursor::Page(7)]);
    }
}
