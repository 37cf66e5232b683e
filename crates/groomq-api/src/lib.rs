//! groomq-api — REST API for groomq.
//!
//! Provides axum route handlers for managing waiting lists and their
//! ordered entries.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/waiting-lists` | Create a waiting list for a date |
//! | GET | `/waiting-lists/date/:date` | Get a list with its entries |
//! | GET | `/waiting-lists/month/:month` | List all lists in a month |
//! | POST | `/entries` | Create an entry (appends or inserts at a position) |
//! | GET | `/entries` | List entries, filtered by list/date/status/query |
//! | PUT | `/entries/:id/status` | Update an entry's status |
//! | PUT | `/entries/:id/position` | Move an entry within its list |
//! | DELETE | `/entries/:id` | Remove an entry (positions compact) |
//! | GET | `/search` | Text search across all entries |

pub mod handlers;

use axum::Router;
use axum::routing::{delete, get, post, put};
use groomq_state::QueueStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: QueueStore,
}

/// Build the complete API router.
pub fn build_router(store: QueueStore) -> Router {
    let state = ApiState { store };

    Router::new()
        .route("/waiting-lists", post(handlers::create_waiting_list))
        .route("/waiting-lists/date/{date}", get(handlers::get_waiting_list_by_date))
        .route("/waiting-lists/month/{month}", get(handlers::get_waiting_lists_by_month))
        .route("/entries", get(handlers::list_entries).post(handlers::create_entry))
        .route("/entries/{id}/status", put(handlers::update_entry_status))
        .route("/entries/{id}/position", put(handlers::update_entry_position))
        .route("/entries/{id}", delete(handlers::delete_entry))
        .route("/search", get(handlers::search))
        .with_state(state)
}
