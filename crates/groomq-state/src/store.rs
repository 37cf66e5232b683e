//! QueueStore — redb-backed persistence for groomq.
//!
//! Provides typed CRUD over waiting lists and entries, plus the position
//! manager that keeps each list's entry positions dense (`{1..N}`, 1-based,
//! no duplicates). All values are JSON-serialized into redb's `&[u8]` value
//! columns. The store supports both on-disk and in-memory backends (the
//! latter for testing).
//!
//! Every position-mutating operation (insert, move, remove) runs inside a
//! single redb write transaction. redb serializes write transactions, so
//! the read-shift-write sequence can never interleave with another mutator,
//! and an error at any step rolls the whole operation back.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Thread-safe waiting-list store backed by redb.
#[derive(Clone)]
pub struct QueueStore {
    db: Arc<Database>,
}

impl QueueStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "queue store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory queue store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(LISTS).map_err(map_err!(Table))?;
        txn.open_table(LISTS_BY_DATE).map_err(map_err!(Table))?;
        txn.open_table(ENTRIES).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Lists ──────────────────────────────────────────────────────

    /// Create a waiting list for a date. Fails with `Conflict` if a list
    /// already exists for that exact date; the date index is checked inside
    /// the same write transaction, so a racing create cannot succeed twice.
    pub fn create_list(&self, date: NaiveDate) -> StoreResult<WaitingList> {
        let key = date_key(date);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let list = {
            let mut by_date = txn.open_table(LISTS_BY_DATE).map_err(map_err!(Table))?;
            if by_date.get(key.as_str()).map_err(map_err!(Read))?.is_some() {
                return Err(StoreError::Conflict(format!(
                    "a waiting list already exists for date {key}"
                )));
            }

            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let id = meta
                .get(NEXT_LIST_ID)
                .map_err(map_err!(Read))?
                .map(|g| g.value())
                .unwrap_or(1);
            meta.insert(NEXT_LIST_ID, id + 1).map_err(map_err!(Write))?;

            let list = WaitingList { id, date };
            let value = serde_json::to_vec(&list).map_err(map_err!(Serialize))?;
            let mut lists = txn.open_table(LISTS).map_err(map_err!(Table))?;
            lists.insert(id, value.as_slice()).map_err(map_err!(Write))?;
            by_date.insert(key.as_str(), id).map_err(map_err!(Write))?;
            list
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = list.id, date = %key, "waiting list created");
        Ok(list)
    }

    /// Get a waiting list by id.
    pub fn get_list(&self, id: ListId) -> StoreResult<Option<WaitingList>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let lists = txn.open_table(LISTS).map_err(map_err!(Table))?;
        match lists.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let list: WaitingList =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(list))
            }
            None => Ok(None),
        }
    }

    /// Get the waiting list for a calendar date, if one exists.
    pub fn get_list_by_date(&self, date: NaiveDate) -> StoreResult<Option<WaitingList>> {
        let key = date_key(date);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let by_date = txn.open_table(LISTS_BY_DATE).map_err(map_err!(Table))?;
        let id = match by_date.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => guard.value(),
            None => return Ok(None),
        };
        let lists = txn.open_table(LISTS).map_err(map_err!(Table))?;
        match lists.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let list: WaitingList =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(list))
            }
            None => Err(StoreError::Read(format!(
                "date index points at missing list {id}"
            ))),
        }
    }

    /// All waiting lists within a calendar month, date ascending.
    pub fn lists_for_month(&self, year: i32, month: u32) -> StoreResult<Vec<WaitingList>> {
        let prefix = format!("{year:04}-{month:02}-");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let by_date = txn.open_table(LISTS_BY_DATE).map_err(map_err!(Table))?;
        // Index keys iterate lexicographically, which for `YYYY-MM-DD` keys
        // is calendar order.
        let mut ids = Vec::new();
        for item in by_date.iter().map_err(map_err!(Read))? {
            let (key, value) = item.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                ids.push(value.value());
            }
        }
        let lists = txn.open_table(LISTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for id in ids {
            match lists.get(id).map_err(map_err!(Read))? {
                Some(guard) => {
                    let list: WaitingList =
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                    results.push(list);
                }
                None => {
                    return Err(StoreError::Read(format!(
                        "date index points at missing list {id}"
                    )));
                }
            }
        }
        Ok(results)
    }

    /// Resolve the target list for a new entry: an explicit id wins;
    /// otherwise the arrival timestamp is normalized to its UTC calendar
    /// date and looked up. Never auto-creates a list. Read-only.
    pub fn resolve_list_for_entry(
        &self,
        explicit: Option<ListId>,
        arrival_time: DateTime<Utc>,
    ) -> StoreResult<WaitingList> {
        if let Some(id) = explicit {
            return self
                .get_list(id)?
                .ok_or_else(|| StoreError::NotFound(format!("waiting list {id} not found")));
        }
        let date = arrival_time.date_naive();
        self.get_list_by_date(date)?.ok_or_else(|| {
            StoreError::NotFound(format!(
                "no waiting list for date {}; create a waiting list first",
                date_key(date)
            ))
        })
    }

    // ── Entry position manager ─────────────────────────────────────

    /// Insert an entry into a list's queue.
    ///
    /// Without a desired position the entry appends at `max + 1`. An
    /// explicit position must satisfy `1 <= p <= max + 1` (`Conflict`
    /// otherwise) and shifts every entry at `position >= p` right by one
    /// before the new row lands at `p`. The list lookup, the shift and the
    /// insert share one write transaction.
    pub fn insert_entry(
        &self,
        list_id: ListId,
        new: NewEntry,
        desired_position: Option<u32>,
    ) -> StoreResult<WaitingListEntry> {
        new.validate()?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let entry = {
            let lists = txn.open_table(LISTS).map_err(map_err!(Table))?;
            if lists.get(list_id).map_err(map_err!(Read))?.is_none() {
                return Err(StoreError::NotFound(format!(
                    "waiting list {list_id} not found"
                )));
            }

            let mut entries = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
            let rows = entries_of_list(&entries, list_id)?;
            let max = rows.iter().map(|e| e.position).max().unwrap_or(0);
            let position = match desired_position {
                None => max + 1,
                Some(p) if (1..=max + 1).contains(&p) => p,
                Some(_) => {
                    return Err(StoreError::Conflict(format!(
                        "position must be between 1 and {}",
                        max + 1
                    )));
                }
            };

            for mut row in rows {
                if row.position >= position {
                    row.position += 1;
                    let value = serde_json::to_vec(&row).map_err(map_err!(Serialize))?;
                    entries.insert(row.id, value.as_slice()).map_err(map_err!(Write))?;
                }
            }

            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let id = meta
                .get(NEXT_ENTRY_ID)
                .map_err(map_err!(Read))?
                .map(|g| g.value())
                .unwrap_or(1);
            meta.insert(NEXT_ENTRY_ID, id + 1).map_err(map_err!(Write))?;

            let entry = WaitingListEntry {
                id,
                waiting_list_id: list_id,
                owner_name: new.owner_name,
                puppy_name: new.puppy_name,
                service_required: new.service_required,
                arrival_time: new.arrival_time,
                position,
                status: EntryStatus::Waiting,
                created_at: Utc::now(),
            };
            let value = serde_json::to_vec(&entry).map_err(map_err!(Serialize))?;
            entries.insert(entry.id, value.as_slice()).map_err(map_err!(Write))?;
            entry
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = entry.id, list = list_id, position = entry.position, "entry inserted");
        Ok(entry)
    }

    /// Move an entry to a new position within its list.
    ///
    /// Moving to the current position is a successful no-op. The new
    /// position must satisfy `1 <= p <= N` (`Conflict` otherwise). Moving
    /// earlier shifts `[new, old)` right; moving later shifts `(old, new]`
    /// left; the half-open bounds keep the moved entry out of its own shift.
    pub fn move_entry(&self, entry_id: EntryId, new_position: u32) -> StoreResult<WaitingListEntry> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let moved = {
            let mut entries = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
            let mut target: WaitingListEntry = {
                match entries.get(entry_id).map_err(map_err!(Read))? {
                    Some(guard) => {
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                    }
                    None => {
                        return Err(StoreError::NotFound(format!("entry {entry_id} not found")));
                    }
                }
            };
            let old_position = target.position;
            if new_position == old_position {
                // No writes yet; the dropped transaction aborts cleanly.
                return Ok(target);
            }

            let rows = entries_of_list(&entries, target.waiting_list_id)?;
            let total = rows.len() as u32;
            if new_position < 1 || new_position > total {
                return Err(StoreError::Conflict(format!(
                    "position must be between 1 and {total}"
                )));
            }

            for mut row in rows {
                if row.id == target.id {
                    continue;
                }
                let shifted = if new_position < old_position {
                    (new_position..old_position)
                        .contains(&row.position)
                        .then(|| row.position + 1)
                } else {
                    (old_position + 1..=new_position)
                        .contains(&row.position)
                        .then(|| row.position - 1)
                };
                if let Some(position) = shifted {
                    row.position = position;
                    let value = serde_json::to_vec(&row).map_err(map_err!(Serialize))?;
                    entries.insert(row.id, value.as_slice()).map_err(map_err!(Write))?;
                }
            }

            target.position = new_position;
            let value = serde_json::to_vec(&target).map_err(map_err!(Serialize))?;
            entries.insert(target.id, value.as_slice()).map_err(map_err!(Write))?;
            target
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = moved.id, position = moved.position, "entry moved");
        Ok(moved)
    }

    /// Remove an entry and close the gap it leaves: every remaining entry
    /// of the same list above the removed position shifts down by one.
    /// Returns the removed entry.
    pub fn remove_entry(&self, entry_id: EntryId) -> StoreResult<WaitingListEntry> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let removed = {
            let mut entries = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
            let removed: WaitingListEntry = {
                match entries.remove(entry_id).map_err(map_err!(Write))? {
                    Some(guard) => {
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                    }
                    None => {
                        return Err(StoreError::NotFound(format!("entry {entry_id} not found")));
                    }
                }
            };

            for mut row in entries_of_list(&entries, removed.waiting_list_id)? {
                if row.position > removed.position {
                    row.position -= 1;
                    let value = serde_json::to_vec(&row).map_err(map_err!(Serialize))?;
                    entries.insert(row.id, value.as_slice()).map_err(map_err!(Write))?;
                }
            }
            removed
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = removed.id, list = removed.waiting_list_id, "entry removed");
        Ok(removed)
    }

    /// Update an entry's status. Returns the updated entry.
    pub fn set_entry_status(
        &self,
        entry_id: EntryId,
        status: EntryStatus,
    ) -> StoreResult<WaitingListEntry> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated = {
            let mut entries = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
            let mut entry: WaitingListEntry = {
                match entries.get(entry_id).map_err(map_err!(Read))? {
                    Some(guard) => {
                        serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                    }
                    None => {
                        return Err(StoreError::NotFound(format!("entry {entry_id} not found")));
                    }
                }
            };
            entry.status = status;
            let value = serde_json::to_vec(&entry).map_err(map_err!(Serialize))?;
            entries.insert(entry.id, value.as_slice()).map_err(map_err!(Write))?;
            entry
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = updated.id, status = ?updated.status, "entry status updated");
        Ok(updated)
    }

    /// All entries of a list, position ascending.
    pub fn entries_for_list(&self, list_id: ListId) -> StoreResult<Vec<WaitingListEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let entries = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
        let mut rows = entries_of_list(&entries, list_id)?;
        rows.sort_by_key(|e| e.position);
        Ok(rows)
    }

    // ── Search ─────────────────────────────────────────────────────

    /// Filter entries. An optional query matches case-insensitively as a
    /// substring over owner, puppy and service text; `date` (precedence)
    /// or `list_id` restrict to one list and fail `NotFound` when that
    /// list is absent. Results are ordered list date descending, position
    /// ascending.
    pub fn search_entries(&self, filter: &EntryFilter) -> StoreResult<Vec<WaitingListEntry>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;

        let restrict = if let Some(date) = filter.date {
            let key = date_key(date);
            let by_date = txn.open_table(LISTS_BY_DATE).map_err(map_err!(Table))?;
            match by_date.get(key.as_str()).map_err(map_err!(Read))? {
                Some(guard) => Some(guard.value()),
                None => {
                    return Err(StoreError::NotFound(format!(
                        "no waiting list found for date {key}"
                    )));
                }
            }
        } else if let Some(id) = filter.list_id {
            let lists = txn.open_table(LISTS).map_err(map_err!(Table))?;
            if lists.get(id).map_err(map_err!(Read))?.is_none() {
                return Err(StoreError::NotFound(format!("waiting list {id} not found")));
            }
            Some(id)
        } else {
            None
        };

        let lists = txn.open_table(LISTS).map_err(map_err!(Table))?;
        let mut dates: HashMap<ListId, NaiveDate> = HashMap::new();
        for item in lists.iter().map_err(map_err!(Read))? {
            let (_, value) = item.map_err(map_err!(Read))?;
            let list: WaitingList =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            dates.insert(list.id, list.date);
        }

        let needle = filter
            .query
            .as_deref()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());

        let entries = txn.open_table(ENTRIES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for item in entries.iter().map_err(map_err!(Read))? {
            let (_, value) = item.map_err(map_err!(Read))?;
            let entry: WaitingListEntry =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if restrict.is_some_and(|id| entry.waiting_list_id != id) {
                continue;
            }
            if filter.status.is_some_and(|s| entry.status != s) {
                continue;
            }
            if let Some(needle) = &needle {
                if !matches_text(&entry, needle) {
                    continue;
                }
            }
            results.push(entry);
        }

        results.sort_by(|a, b| {
            let date_a = dates.get(&a.waiting_list_id);
            let date_b = dates.get(&b.waiting_list_id);
            date_b
                .cmp(&date_a)
                .then_with(|| a.position.cmp(&b.position))
        });
        Ok(results)
    }
}

/// Collect all entries belonging to a list, in table order.
fn entries_of_list(
    table: &impl ReadableTable<u64, &'static [u8]>,
    list_id: ListId,
) -> StoreResult<Vec<WaitingListEntry>> {
    let mut rows = Vec::new();
    for item in table.iter().map_err(map_err!(Read))? {
        let (_, value) = item.map_err(map_err!(Read))?;
        let entry: WaitingListEntry =
            serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
        if entry.waiting_list_id == list_id {
            rows.push(entry);
        }
    }
    Ok(rows)
}

/// Case-insensitive substring match over the entry's text fields.
/// `needle` is already lowercased.
fn matches_text(entry: &WaitingListEntry, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);
    entry.owner_name.as_deref().is_some_and(contains)
        || entry.puppy_name.as_deref().is_some_and(contains)
        || contains(&entry.service_required)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> QueueStore {
        QueueStore::open_in_memory().unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn arrival(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn puppy(name: &str) -> NewEntry {
        NewEntry {
            owner_name: None,
            puppy_name: Some(name.to_string()),
            service_required: "Grooming".to_string(),
            arrival_time: arrival("2024-03-20T10:00:00Z"),
        }
    }

    /// Create a list for 2024-03-20 and append one entry per name.
    fn seeded_list(store: &QueueStore, names: &[&str]) -> ListId {
        let list = store.create_list(day("2024-03-20")).unwrap();
        for name in names {
            store.insert_entry(list.id, puppy(name), None).unwrap();
        }
        list.id
    }

    fn names_in_order(store: &QueueStore, list_id: ListId) -> Vec<String> {
        store
            .entries_for_list(list_id)
            .unwrap()
            .into_iter()
            .map(|e| e.puppy_name.unwrap())
            .collect()
    }

    fn id_of(store: &QueueStore, list_id: ListId, name: &str) -> EntryId {
        store
            .entries_for_list(list_id)
            .unwrap()
            .into_iter()
            .find(|e| e.puppy_name.as_deref() == Some(name))
            .unwrap()
            .id
    }

    fn assert_dense(store: &QueueStore, list_id: ListId) {
        let entries = store.entries_for_list(list_id).unwrap();
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.position, i as u32 + 1, "gap at index {i}");
        }
    }

    // ── List creation & lookup ─────────────────────────────────────

    #[test]
    fn create_list_and_get_by_date() {
        let store = test_store();
        let list = store.create_list(day("2024-03-20")).unwrap();

        let found = store.get_list_by_date(day("2024-03-20")).unwrap();
        assert_eq!(found, Some(list));
    }

    #[test]
    fn create_list_duplicate_date_conflicts() {
        let store = test_store();
        store.create_list(day("2024-03-20")).unwrap();

        let err = store.create_list(day("2024-03-20")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        // A different date is still fine.
        store.create_list(day("2024-03-21")).unwrap();
    }

    #[test]
    fn get_list_by_id() {
        let store = test_store();
        let list = store.create_list(day("2024-03-20")).unwrap();

        assert_eq!(store.get_list(list.id).unwrap(), Some(list));
        assert!(store.get_list(999).unwrap().is_none());
    }

    #[test]
    fn list_ids_are_sequential() {
        let store = test_store();
        let a = store.create_list(day("2024-03-20")).unwrap();
        let b = store.create_list(day("2024-03-21")).unwrap();
        assert_eq!(b.id, a.id + 1);
    }

    #[test]
    fn lists_for_month_filters_and_orders() {
        let store = test_store();
        store.create_list(day("2024-03-15")).unwrap();
        store.create_list(day("2024-02-28")).unwrap();
        store.create_list(day("2024-03-01")).unwrap();
        store.create_list(day("2024-04-01")).unwrap();

        let march = store.lists_for_month(2024, 3).unwrap();
        let dates: Vec<NaiveDate> = march.iter().map(|l| l.date).collect();
        assert_eq!(dates, vec![day("2024-03-01"), day("2024-03-15")]);
    }

    #[test]
    fn lists_for_month_empty() {
        let store = test_store();
        assert!(store.lists_for_month(2024, 7).unwrap().is_empty());
    }

    // ── List resolution ────────────────────────────────────────────

    #[test]
    fn resolve_explicit_id_wins_over_date() {
        let store = test_store();
        let list = store.create_list(day("2024-03-20")).unwrap();

        // Arrival date has no list, but the explicit id resolves anyway.
        let resolved = store
            .resolve_list_for_entry(Some(list.id), arrival("2024-12-01T09:00:00Z"))
            .unwrap();
        assert_eq!(resolved.id, list.id);
    }

    #[test]
    fn resolve_explicit_id_missing() {
        let store = test_store();
        let err = store
            .resolve_list_for_entry(Some(42), arrival("2024-03-20T09:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn resolve_by_arrival_date_discards_time_of_day() {
        let store = test_store();
        let list = store.create_list(day("2024-03-20")).unwrap();

        let resolved = store
            .resolve_list_for_entry(None, arrival("2024-03-20T23:59:59Z"))
            .unwrap();
        assert_eq!(resolved.id, list.id);
    }

    #[test]
    fn resolve_never_auto_creates() {
        let store = test_store();
        let err = store
            .resolve_list_for_entry(None, arrival("2024-03-20T09:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(store.get_list_by_date(day("2024-03-20")).unwrap().is_none());
    }

    // ── Insert ─────────────────────────────────────────────────────

    #[test]
    fn insert_appends_at_next_position() {
        let store = test_store();
        let list = store.create_list(day("2024-03-20")).unwrap();

        let first = store.insert_entry(list.id, puppy("Max"), None).unwrap();
        let second = store.insert_entry(list.id, puppy("Bella"), None).unwrap();

        assert_eq!(first.position, 1);
        assert_eq!(second.position, 2);
        assert_eq!(first.status, EntryStatus::Waiting);
        assert_dense(&store, list.id);
    }

    #[test]
    fn insert_at_position_shifts_right() {
        let store = test_store();
        let list_id = seeded_list(&store, &["Max", "Bella", "Rocky"]);

        let inserted = store
            .insert_entry(list_id, puppy("Luna"), Some(2))
            .unwrap();

        assert_eq!(inserted.position, 2);
        assert_eq!(
            names_in_order(&store, list_id),
            vec!["Max", "Luna", "Bella", "Rocky"]
        );
        assert_dense(&store, list_id);
    }

    #[test]
    fn insert_at_front_and_end() {
        let store = test_store();
        let list_id = seeded_list(&store, &["Max", "Bella"]);

        store.insert_entry(list_id, puppy("Luna"), Some(1)).unwrap();
        store.insert_entry(list_id, puppy("Rocky"), Some(4)).unwrap();

        assert_eq!(
            names_in_order(&store, list_id),
            vec!["Luna", "Max", "Bella", "Rocky"]
        );
        assert_dense(&store, list_id);
    }

    #[test]
    fn insert_position_out_of_range_conflicts() {
        let store = test_store();
        let list_id = seeded_list(&store, &["Max", "Bella"]);

        for bad in [0, 4] {
            let err = store
                .insert_entry(list_id, puppy("Luna"), Some(bad))
                .unwrap_err();
            assert!(matches!(err, StoreError::Conflict(_)), "position {bad}");
        }
        // The failed inserts left no trace.
        assert_eq!(names_in_order(&store, list_id), vec!["Max", "Bella"]);
        assert_dense(&store, list_id);
    }

    #[test]
    fn insert_into_missing_list_not_found() {
        let store = test_store();
        let err = store.insert_entry(7, puppy("Max"), None).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn insert_requires_owner_or_puppy_name() {
        let store = test_store();
        let list = store.create_list(day("2024-03-20")).unwrap();

        let nameless = NewEntry {
            owner_name: None,
            puppy_name: None,
            service_required: "Grooming".to_string(),
            arrival_time: arrival("2024-03-20T10:00:00Z"),
        };
        let err = store.insert_entry(list.id, nameless, None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
        assert!(store.entries_for_list(list.id).unwrap().is_empty());
    }

    #[test]
    fn entry_ids_are_sequential() {
        let store = test_store();
        let list = store.create_list(day("2024-03-20")).unwrap();
        let a = store.insert_entry(list.id, puppy("Max"), None).unwrap();
        let b = store.insert_entry(list.id, puppy("Bella"), None).unwrap();
        assert_eq!(b.id, a.id + 1);
    }

    // ── Move ───────────────────────────────────────────────────────

    #[test]
    fn move_to_same_position_is_noop() {
        let store = test_store();
        let list_id = seeded_list(&store, &["Max", "Bella", "Rocky"]);
        let bella = id_of(&store, list_id, "Bella");

        let before = store.entries_for_list(list_id).unwrap();
        let moved = store.move_entry(bella, 2).unwrap();

        assert_eq!(moved.position, 2);
        assert_eq!(store.entries_for_list(list_id).unwrap(), before);
    }

    #[test]
    fn move_earlier_shifts_range_right() {
        let store = test_store();
        // A=1, B=2, C=3
        let list_id = seeded_list(&store, &["A", "B", "C"]);
        let c = id_of(&store, list_id, "C");

        let moved = store.move_entry(c, 1).unwrap();

        // C=1, A=2, B=3
        assert_eq!(moved.position, 1);
        assert_eq!(names_in_order(&store, list_id), vec!["C", "A", "B"]);
        assert_dense(&store, list_id);
    }

    #[test]
    fn move_later_shifts_range_left() {
        let store = test_store();
        let list_id = seeded_list(&store, &["A", "B", "C"]);
        let c = id_of(&store, list_id, "C");
        let a = id_of(&store, list_id, "A");

        store.move_entry(c, 1).unwrap();
        // From C=1, A=2, B=3: move A to 3.
        let moved = store.move_entry(a, 3).unwrap();

        // C=1, B=2, A=3
        assert_eq!(moved.position, 3);
        assert_eq!(names_in_order(&store, list_id), vec!["C", "B", "A"]);
        assert_dense(&store, list_id);
    }

    #[test]
    fn move_out_of_range_conflicts() {
        let store = test_store();
        let list_id = seeded_list(&store, &["A", "B", "C"]);
        let b = id_of(&store, list_id, "B");

        for bad in [0, 4] {
            let err = store.move_entry(b, bad).unwrap_err();
            assert!(matches!(err, StoreError::Conflict(_)), "position {bad}");
        }
        assert_eq!(names_in_order(&store, list_id), vec!["A", "B", "C"]);
    }

    #[test]
    fn move_missing_entry_not_found() {
        let store = test_store();
        let err = store.move_entry(99, 1).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn move_does_not_touch_other_lists() {
        let store = test_store();
        let list_a = seeded_list(&store, &["A", "B", "C"]);
        let other = store.create_list(day("2024-03-21")).unwrap();
        store.insert_entry(other.id, puppy("X"), None).unwrap();
        store.insert_entry(other.id, puppy("Y"), None).unwrap();

        let c = id_of(&store, list_a, "C");
        store.move_entry(c, 1).unwrap();

        assert_eq!(names_in_order(&store, other.id), vec!["X", "Y"]);
    }

    // ── Remove ─────────────────────────────────────────────────────

    #[test]
    fn remove_compacts_positions() {
        let store = test_store();
        // A=1, B=2, C=3
        let list_id = seeded_list(&store, &["A", "B", "C"]);
        let b = id_of(&store, list_id, "B");

        let removed = store.remove_entry(b).unwrap();

        assert_eq!(removed.puppy_name.as_deref(), Some("B"));
        // A=1, C=2
        assert_eq!(names_in_order(&store, list_id), vec!["A", "C"]);
        assert_dense(&store, list_id);
    }

    #[test]
    fn remove_last_entry_leaves_empty_list() {
        let store = test_store();
        let list_id = seeded_list(&store, &["A"]);
        let a = id_of(&store, list_id, "A");

        store.remove_entry(a).unwrap();
        assert!(store.entries_for_list(list_id).unwrap().is_empty());
    }

    #[test]
    fn remove_missing_entry_not_found() {
        let store = test_store();
        let err = store.remove_entry(5).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn remove_does_not_touch_other_lists() {
        let store = test_store();
        let list_a = seeded_list(&store, &["A", "B"]);
        let other = store.create_list(day("2024-03-21")).unwrap();
        store.insert_entry(other.id, puppy("X"), None).unwrap();
        store.insert_entry(other.id, puppy("Y"), None).unwrap();

        let a = id_of(&store, list_a, "A");
        store.remove_entry(a).unwrap();

        let others = store.entries_for_list(other.id).unwrap();
        assert_eq!(others[0].position, 1);
        assert_eq!(others[1].position, 2);
    }

    // ── Status ─────────────────────────────────────────────────────

    #[test]
    fn set_status_updates_only_status() {
        let store = test_store();
        let list_id = seeded_list(&store, &["Max", "Bella"]);
        let max = id_of(&store, list_id, "Max");

        let updated = store.set_entry_status(max, EntryStatus::Completed).unwrap();

        assert_eq!(updated.status, EntryStatus::Completed);
        assert_eq!(updated.position, 1);
        assert_dense(&store, list_id);
    }

    #[test]
    fn set_status_missing_entry_not_found() {
        let store = test_store();
        let err = store
            .set_entry_status(3, EntryStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    // ── Invariant under mixed sequences ────────────────────────────

    #[test]
    fn positions_stay_dense_after_mixed_mutations() {
        let store = test_store();
        let list_id = seeded_list(&store, &["A", "B", "C", "D"]);

        store
            .insert_entry(list_id, puppy("E"), Some(3))
            .unwrap();
        assert_dense(&store, list_id);

        let d = id_of(&store, list_id, "D");
        store.move_entry(d, 1).unwrap();
        assert_dense(&store, list_id);

        let b = id_of(&store, list_id, "B");
        store.remove_entry(b).unwrap();
        assert_dense(&store, list_id);

        store.insert_entry(list_id, puppy("F"), None).unwrap();
        assert_dense(&store, list_id);

        let entries = store.entries_for_list(list_id).unwrap();
        assert_eq!(entries.len(), 5);
    }

    // ── Search ─────────────────────────────────────────────────────

    #[test]
    fn search_is_case_insensitive() {
        let store = test_store();
        seeded_list(&store, &["Max", "Bella"]);

        let filter = EntryFilter {
            query: Some("max".to_string()),
            ..Default::default()
        };
        let hits = store.search_entries(&filter).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].puppy_name.as_deref(), Some("Max"));

        let filter = EntryFilter {
            query: Some("MAX".to_string()),
            ..Default::default()
        };
        assert_eq!(store.search_entries(&filter).unwrap().len(), 1);
    }

    #[test]
    fn search_matches_owner_and_service() {
        let store = test_store();
        let list = store.create_list(day("2024-03-20")).unwrap();
        let entry = NewEntry {
            owner_name: Some("John Doe".to_string()),
            puppy_name: None,
            service_required: "Full Grooming".to_string(),
            arrival_time: arrival("2024-03-20T10:00:00Z"),
        };
        store.insert_entry(list.id, entry, None).unwrap();

        for query in ["john", "full groom"] {
            let filter = EntryFilter {
                query: Some(query.to_string()),
                ..Default::default()
            };
            assert_eq!(store.search_entries(&filter).unwrap().len(), 1, "{query}");
        }
    }

    #[test]
    fn search_restricts_to_list_and_status() {
        let store = test_store();
        let list_a = seeded_list(&store, &["Max", "Bella"]);
        let other = store.create_list(day("2024-03-21")).unwrap();
        store.insert_entry(other.id, puppy("Maximus"), None).unwrap();

        let filter = EntryFilter {
            list_id: Some(list_a),
            query: Some("max".to_string()),
            ..Default::default()
        };
        let hits = store.search_entries(&filter).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].waiting_list_id, list_a);

        let max = id_of(&store, list_a, "Max");
        store.set_entry_status(max, EntryStatus::Completed).unwrap();
        let filter = EntryFilter {
            status: Some(EntryStatus::Waiting),
            ..Default::default()
        };
        let waiting = store.search_entries(&filter).unwrap();
        assert!(waiting.iter().all(|e| e.status == EntryStatus::Waiting));
        assert_eq!(waiting.len(), 2);
    }

    #[test]
    fn search_by_date_resolves_list() {
        let store = test_store();
        seeded_list(&store, &["Max"]);
        store.create_list(day("2024-03-21")).unwrap();

        let filter = EntryFilter {
            date: Some(day("2024-03-20")),
            ..Default::default()
        };
        assert_eq!(store.search_entries(&filter).unwrap().len(), 1);

        let filter = EntryFilter {
            date: Some(day("2024-07-01")),
            ..Default::default()
        };
        let err = store.search_entries(&filter).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn search_orders_by_date_desc_then_position() {
        let store = test_store();
        let early = store.create_list(day("2024-03-20")).unwrap();
        let late = store.create_list(day("2024-03-21")).unwrap();
        store.insert_entry(early.id, puppy("A"), None).unwrap();
        store.insert_entry(early.id, puppy("B"), None).unwrap();
        store.insert_entry(late.id, puppy("C"), None).unwrap();
        store.insert_entry(late.id, puppy("D"), None).unwrap();

        let hits = store.search_entries(&EntryFilter::default()).unwrap();
        let names: Vec<&str> = hits.iter().filter_map(|e| e.puppy_name.as_deref()).collect();
        assert_eq!(names, vec!["C", "D", "A", "B"]);
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = QueueStore::open(&db_path).unwrap();
            let list = store.create_list(day("2024-03-20")).unwrap();
            store.insert_entry(list.id, puppy("Max"), None).unwrap();
        }

        // Reopen the same database file.
        let store = QueueStore::open(&db_path).unwrap();
        let list = store.get_list_by_date(day("2024-03-20")).unwrap().unwrap();
        let entries = store.entries_for_list(list.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].puppy_name.as_deref(), Some("Max"));

        // Id counters resume past persisted rows.
        let next = store.create_list(day("2024-03-21")).unwrap();
        assert!(next.id > list.id);
    }

    // ── Edge cases ─────────────────────────────────────────────────

    #[test]
    fn empty_store_operations() {
        let store = test_store();

        assert!(store.get_list(1).unwrap().is_none());
        assert!(store.get_list_by_date(day("2024-03-20")).unwrap().is_none());
        assert!(store.lists_for_month(2024, 3).unwrap().is_empty());
        assert!(store.entries_for_list(1).unwrap().is_empty());
        assert!(
            store
                .search_entries(&EntryFilter::default())
                .unwrap()
                .is_empty()
        );
    }
}
