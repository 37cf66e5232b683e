//! groomq-state — embedded waiting-list store for groomq.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for waiting lists and their ordered entries.
//!
//! # Architecture
//!
//! Domain types are JSON-serialized into redb's `&[u8]` value columns. A
//! separate `lists_by_date` index (`YYYY-MM-DD` → list id) enforces the
//! one-list-per-date rule and backs date and month lookups.
//!
//! Within a list, entry `position` values always form a dense 1-based
//! sequence `{1..N}`. Every mutation that touches positions (insert, move,
//! remove) runs as a single redb write transaction; redb serializes write
//! transactions, so no reader or concurrent mutator can observe a duplicate
//! or gapped position.
//!
//! The `QueueStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::QueueStore;
pub use types::*;
