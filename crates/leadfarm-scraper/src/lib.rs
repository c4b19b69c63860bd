pub mod checkpoint;
pub mod client;
pub mod error;
pub mod extract;
pub mod navigator;
mod retry;
pub mod source;
pub mod text;

pub use checkpoint::{load_checkpoint, save_checkpoint, session_slug, CrawlCheckpoint};
pub use client::{canonical_listing_url, DirectoryClient};
pub use error::{CheckpointError, SourceError};
pub use extract::{extract_lead, Rejection};
pub use navigator::{Navigator, NavigatorConfig, StopReason};
pub use source::{ContactEntry, Cursor, ListingDetail, ListingHandle, ListingSource, SearchPage};
pub use text::{parse_text_dump, phone_candidates};
