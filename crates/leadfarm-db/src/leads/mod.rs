//! Database operations for the `leads` table.

mod read;
mod types;
mod write;

pub use read::{count_leads, existing_identity_keys, existing_phones};
pub use types::{LeadRow, NewLead};
pub use write::insert_leads;
