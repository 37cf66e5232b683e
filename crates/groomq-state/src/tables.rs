//! redb table definitions for the groomq waiting-list store.
//!
//! Record tables use `u64` ids as keys and JSON-serialized domain types as
//! `&[u8]` values. The date index maps `YYYY-MM-DD` keys to list ids, so
//! lexicographic iteration order is calendar order.

use redb::TableDefinition;

/// Waiting lists keyed by list id.
pub const LISTS: TableDefinition<u64, &[u8]> = TableDefinition::new("lists");

/// Unique date index: `YYYY-MM-DD` → list id.
pub const LISTS_BY_DATE: TableDefinition<&str, u64> = TableDefinition::new("lists_by_date");

/// Entries keyed by entry id.
pub const ENTRIES: TableDefinition<u64, &[u8]> = TableDefinition::new("entries");

/// Id counters (`next_list_id`, `next_entry_id`).
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Meta key for the next list id to assign.
pub const NEXT_LIST_ID: &str = "next_list_id";

/// Meta key for the next entry id to assign.
pub const NEXT_ENTRY_ID: &str = "next_entry_id";
