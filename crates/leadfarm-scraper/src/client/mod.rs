//! HTTP client for the directory's public JSON search API.

mod payload;

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;

use crate::error::SourceError;
use crate::retry::retry_with_backoff;
use crate::source::{Cursor, ListingDetail, ListingHandle, ListingSource, SearchPage};

use payload::{contact_entries, DetailPayload, SearchPayload};

/// HTTP client for a city-directory JSON API.
///
/// Speaks two endpoints: `GET <base>/search` for result windows and
/// `GET <base>/items/<id>` for listing detail records. Handles rate limiting
/// (429), not-found (404), and other non-2xx responses as typed errors.
///
/// Transient errors (429, network failures, 5xx) are automatically retried
/// with exponential backoff up to `max_retries` additional attempts.
#[derive(Debug)]
pub struct DirectoryClient {
    client: Client,
    /// Origin of the directory API, e.g. `https://catalog.example.com`.
    origin: String,
    page_size: u32,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

impl DirectoryClient {
    /// Creates a `DirectoryClient` with configured timeout, `User-Agent`, and
    /// retry policy.
    ///
    /// `max_retries` is the number of additional attempts after the first
    /// failure for retriable errors (429, network errors, 5xx). Set to `0` to
    /// disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidBaseUrl`] if `base_url` does not parse as
    /// an absolute URL with a host, or [`SourceError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        page_size: u32,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, SourceError> {
        let parsed =
            reqwest::Url::parse(base_url.trim()).map_err(|e| SourceError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: e.to_string(),
            })?;
        let host = parsed.host_str().ok_or_else(|| SourceError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: "missing host".to_owned(),
        })?;
        let origin = match parsed.port() {
            Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
            None => format!("{}://{host}", parsed.scheme()),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            origin,
            page_size,
            max_retries,
            backoff_base_secs,
        })
    }

    fn search_url(&self, query: &str, region: &str, cursor: Cursor) -> String {
        let q = utf8_percent_encode(query, NON_ALPHANUMERIC).to_string();
        let r = utf8_percent_encode(region, NON_ALPHANUMERIC).to_string();
        let mut url = format!(
            "{origin}/search?q={q}&region={r}&page_size={page_size}",
            origin = self.origin,
            page_size = self.page_size,
        );
        match cursor {
            Cursor::Page(page) => {
                url.push_str(&format!("&page={page}"));
            }
            Cursor::Offset(offset) => {
                url.push_str(&format!("&offset={offset}"));
            }
        }
        url
    }

    fn detail_url(&self, listing_id: &str) -> String {
        let id = utf8_percent_encode(listing_id, NON_ALPHANUMERIC).to_string();
        format!("{}/items/{id}", self.origin)
    }

    /// GET `url` and deserialize the JSON body, with automatic retry on
    /// transient errors.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        context: String,
    ) -> Result<T, SourceError> {
        let max_retries = self.max_retries;
        let backoff_base_secs = self.backoff_base_secs;

        retry_with_backoff(max_retries, backoff_base_secs, || {
            let url = url.clone();
            let context = context.clone();
            async move {
                let response = self.client.get(&url).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);

                    return Err(SourceError::RateLimited {
                        domain: domain_of(&url),
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(SourceError::NotFound { url });
                }

                if !status.is_success() {
                    return Err(SourceError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<T>(&body).map_err(|e| SourceError::Deserialize {
                    context,
                    source: e,
                })
            }
        })
        .await
    }
}

#[async_trait]
impl ListingSource for DirectoryClient {
    async fn search_page(
        &self,
        query: &str,
        region: &str,
        cursor: Cursor,
    ) -> Result<SearchPage, SourceError> {
        let url = self.search_url(query, region, cursor);
        let context = format!("search page for \"{query}\" in {region}");
        let page: SearchPayload = self.get_json(url, context).await?;

        let handles = page
            .items
            .into_iter()
            .map(|item| ListingHandle::new(item.id))
            .collect();
        let next_cursor = match cursor {
            Cursor::Page(_) => page.next_page.map(Cursor::Page),
            // Scroll responses carry no cursor; the navigator advances the
            // offset itself and relies on stall detection for termination.
            Cursor::Offset(_) => None,
        };

        Ok(SearchPage {
            handles,
            next_cursor,
        })
    }

    async fn fetch_detail(&self, handle: &ListingHandle) -> Result<ListingDetail, SourceError> {
        let url = self.detail_url(&handle.id);
        let context = format!("listing detail {}", handle.id);
        let detail: DetailPayload = self.get_json(url, context).await?;

        // Listing ids sometimes carry an internal suffix after an underscore;
        // only the leading part identifies the firm.
        let firm_id = handle.id.split('_').next().unwrap_or(&handle.id);
        let canonical = detail
            .url
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map_or_else(
                || format!("{}/firm/{firm_id}", self.origin),
                |raw| canonical_listing_url(raw, &self.origin),
            );

        let contacts = contact_entries(&detail);

        Ok(ListingDetail {
            name: detail.name.trim().to_owned(),
            contacts,
            url: Some(canonical),
        })
    }
}

/// Normalize a listing URL to its stable `firm/<id>` form.
///
/// Query strings and fragments never survive. When the URL carries a
/// `firm/<digits>` segment the path collapses to exactly that segment, so the
/// same business reached through differently decorated search links keys
/// identically. URLs without a firm segment are kept as-is minus decorations.
#[must_use]
pub fn canonical_listing_url(raw: &str, fallback_origin: &str) -> String {
    let bare = raw.split(['?', '#']).next().unwrap_or(raw).trim();

    let re = regex::Regex::new(r"firm/(\d+)").expect("valid regex");
    if let Some(caps) = re.captures(bare) {
        let id = &caps[1];
        let origin = origin_of(bare).unwrap_or_else(|| fallback_origin.to_owned());
        return format!("{origin}/firm/{id}");
    }

    bare.trim_end_matches('/').to_owned()
}

fn origin_of(url: &str) -> Option<String> {
    let scheme_split = url.find("://")?;
    let scheme = &url[..scheme_split];
    let remainder = &url[(scheme_split + 3)..];
    let host_end = remainder.find('/').unwrap_or(remainder.len());
    let host = &remainder[..host_end];
    if host.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}"))
}

fn domain_of(url: &str) -> String {
    let rest = url.split("://").nth(1).unwrap_or(url);
    let host = rest.split('/').next().unwrap_or(rest);
    host.split(':').next().unwrap_or(host).to_owned()
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
