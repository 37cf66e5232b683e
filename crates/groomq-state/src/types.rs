//! Domain types for the groomq waiting-list store.
//!
//! These types represent the persisted state of waiting lists and their
//! entries. All types are serializable to/from JSON for storage in redb
//! tables and for API responses.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Unique identifier for a waiting list.
pub type ListId = u64;

/// Unique identifier for a waiting-list entry.
pub type EntryId = u64;

// ── Waiting list ──────────────────────────────────────────────────

/// A waiting list for a single calendar date. At most one list exists
/// per date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitingList {
    pub id: ListId,
    pub date: NaiveDate,
}

impl WaitingList {
    /// Build the key for the date index.
    pub fn date_key(&self) -> String {
        date_key(self.date)
    }
}

/// Date-index key for a calendar date (`YYYY-MM-DD`).
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ── Entry ─────────────────────────────────────────────────────────

/// An entry in a waiting list's queue.
///
/// `position` is the 1-based rank within the owning list. For a list with
/// N entries the positions are exactly `{1..N}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitingListEntry {
    pub id: EntryId,
    pub waiting_list_id: ListId,
    /// Owner display name. At least one of owner/puppy name is present.
    pub owner_name: Option<String>,
    /// Puppy display name.
    pub puppy_name: Option<String>,
    pub service_required: String,
    /// Informational arrival timestamp; not used for ordering.
    pub arrival_time: DateTime<Utc>,
    pub position: u32,
    pub status: EntryStatus,
    /// Stamped by the store at insert, immutable afterwards.
    pub created_at: DateTime<Utc>,
}

/// Processing status of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Waiting,
    Completed,
}

// ── Entry creation ────────────────────────────────────────────────

/// Caller-supplied fields for a new entry. Position, status and
/// timestamps are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntry {
    pub owner_name: Option<String>,
    pub puppy_name: Option<String>,
    pub service_required: String,
    pub arrival_time: DateTime<Utc>,
}

impl NewEntry {
    /// Validate the caller-supplied fields: at least one of the display
    /// names must be non-blank, and the service text is required.
    pub fn validate(&self) -> StoreResult<()> {
        if !present(&self.owner_name) && !present(&self.puppy_name) {
            return Err(StoreError::InvalidInput(
                "at least one of owner_name or puppy_name is required".to_string(),
            ));
        }
        if self.service_required.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "service_required must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

// ── Filtering ─────────────────────────────────────────────────────

/// Filter for entry queries. `date` takes precedence over `list_id`;
/// both fail with `NotFound` when they name a missing list.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub list_id: Option<ListId>,
    pub date: Option<NaiveDate>,
    pub status: Option<EntryStatus>,
    /// Case-insensitive substring matched against owner, puppy and
    /// service text.
    pub query: Option<String>,
}
