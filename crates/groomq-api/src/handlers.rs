//! REST API handlers.
//!
//! Each handler validates its input, reads/writes via `QueueStore` and
//! returns JSON responses. Domain errors keep their message; storage
//! failures are logged and reported as an opaque internal error.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use groomq_state::{
    EntryFilter, EntryId, EntryStatus, ListId, NewEntry, StoreError, WaitingListEntry,
};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// Map a store error to its HTTP response. Domain errors pass their
/// message through; anything else is logged and reported opaquely.
fn store_error(err: StoreError) -> Response {
    let status = match &err {
        StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if err.is_internal() {
        tracing::error!(error = %err, "store operation failed");
        return error_response("internal error", status).into_response();
    }
    error_response(&err.to_string(), status).into_response()
}

fn parse_date(raw: &str) -> Result<NaiveDate, Response> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        error_response(
            "invalid date format, expected YYYY-MM-DD",
            StatusCode::BAD_REQUEST,
        )
        .into_response()
    })
}

fn parse_month(raw: &str) -> Option<(i32, u32)> {
    let (year, month) = raw.split_once('-')?;
    if year.len() != 4 || month.len() != 2 {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

// ── Waiting lists ──────────────────────────────────────────────

/// Waiting list plus its current entry count.
#[derive(serde::Serialize)]
pub struct ListSummary {
    pub id: ListId,
    pub date: NaiveDate,
    pub entry_count: usize,
}

/// Waiting list with its full queue, position ascending.
#[derive(serde::Serialize)]
pub struct ListWithEntries {
    pub id: ListId,
    pub date: NaiveDate,
    pub entries: Vec<WaitingListEntry>,
}

/// Lists for one calendar month, date ascending.
#[derive(serde::Serialize)]
pub struct MonthlyLists {
    pub month: String,
    pub waiting_lists: Vec<ListSummary>,
}

/// Create request body.
#[derive(Deserialize)]
pub struct CreateListRequest {
    pub date: String,
}

/// POST /waiting-lists
pub async fn create_waiting_list(
    State(state): State<ApiState>,
    Json(req): Json<CreateListRequest>,
) -> impl IntoResponse {
    let date = match parse_date(&req.date) {
        Ok(date) => date,
        Err(resp) => return resp,
    };
    match state.store.create_list(date) {
        Ok(list) => (
            StatusCode::CREATED,
            ApiResponse::ok(ListSummary {
                id: list.id,
                date: list.date,
                entry_count: 0,
            }),
        )
            .into_response(),
        Err(e) => store_error(e),
    }
}

/// GET /waiting-lists/date/:date
pub async fn get_waiting_list_by_date(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> impl IntoResponse {
    let date = match parse_date(&date) {
        Ok(date) => date,
        Err(resp) => return resp,
    };
    let list = match state.store.get_list_by_date(date) {
        Ok(Some(list)) => list,
        Ok(None) => {
            return error_response(
                &format!("no waiting list found for date {date}"),
                StatusCode::NOT_FOUND,
            )
            .into_response();
        }
        Err(e) => return store_error(e),
    };
    match state.store.entries_for_list(list.id) {
        Ok(entries) => ApiResponse::ok(ListWithEntries {
            id: list.id,
            date: list.date,
            entries,
        })
        .into_response(),
        Err(e) => store_error(e),
    }
}

/// GET /waiting-lists/month/:month
pub async fn get_waiting_lists_by_month(
    State(state): State<ApiState>,
    Path(month): Path<String>,
) -> impl IntoResponse {
    let Some((year, month_num)) = parse_month(&month) else {
        return error_response(
            "invalid month format, expected YYYY-MM",
            StatusCode::BAD_REQUEST,
        )
        .into_response();
    };
    let lists = match state.store.lists_for_month(year, month_num) {
        Ok(lists) => lists,
        Err(e) => return store_error(e),
    };
    let mut summaries = Vec::with_capacity(lists.len());
    for list in lists {
        match state.store.entries_for_list(list.id) {
            Ok(entries) => summaries.push(ListSummary {
                id: list.id,
                date: list.date,
                entry_count: entries.len(),
            }),
            Err(e) => return store_error(e),
        }
    }
    ApiResponse::ok(MonthlyLists {
        month,
        waiting_lists: summaries,
    })
    .into_response()
}

// ── Entries ────────────────────────────────────────────────────

/// Create request body. Without `waiting_list_id` the target list is
/// resolved from the arrival date; without `position` the entry appends.
#[derive(Deserialize)]
pub struct CreateEntryRequest {
    pub owner_name: Option<String>,
    pub puppy_name: Option<String>,
    pub service_required: String,
    pub arrival_time: DateTime<Utc>,
    pub waiting_list_id: Option<ListId>,
    pub position: Option<u32>,
}

/// POST /entries
pub async fn create_entry(
    State(state): State<ApiState>,
    Json(req): Json<CreateEntryRequest>,
) -> impl IntoResponse {
    let list = match state
        .store
        .resolve_list_for_entry(req.waiting_list_id, req.arrival_time)
    {
        Ok(list) => list,
        Err(e) => return store_error(e),
    };
    let new = NewEntry {
        owner_name: req.owner_name,
        puppy_name: req.puppy_name,
        service_required: req.service_required,
        arrival_time: req.arrival_time,
    };
    match state.store.insert_entry(list.id, new, req.position) {
        Ok(entry) => (StatusCode::CREATED, ApiResponse::ok(entry)).into_response(),
        Err(e) => store_error(e),
    }
}

/// Query parameters for GET /entries.
#[derive(Deserialize)]
pub struct EntriesQuery {
    pub list_id: Option<ListId>,
    pub date: Option<String>,
    pub status: Option<EntryStatus>,
    pub q: Option<String>,
}

/// GET /entries
pub async fn list_entries(
    State(state): State<ApiState>,
    Query(params): Query<EntriesQuery>,
) -> impl IntoResponse {
    let date = match params.date.as_deref() {
        Some(raw) => match parse_date(raw) {
            Ok(date) => Some(date),
            Err(resp) => return resp,
        },
        None => None,
    };
    let filter = EntryFilter {
        list_id: params.list_id,
        date,
        status: params.status,
        query: params.q,
    };
    match state.store.search_entries(&filter) {
        Ok(entries) => ApiResponse::ok(entries).into_response(),
        Err(e) => store_error(e),
    }
}

/// Status update body.
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: EntryStatus,
}

/// PUT /entries/:id/status
pub async fn update_entry_status(
    State(state): State<ApiState>,
    Path(id): Path<EntryId>,
    Json(req): Json<UpdateStatusRequest>,
) -> impl IntoResponse {
    match state.store.set_entry_status(id, req.status) {
        Ok(entry) => ApiResponse::ok(entry).into_response(),
        Err(e) => store_error(e),
    }
}

/// Position update body.
#[derive(Deserialize)]
pub struct UpdatePositionRequest {
    pub position: u32,
}

/// PUT /entries/:id/position
pub async fn update_entry_position(
    State(state): State<ApiState>,
    Path(id): Path<EntryId>,
    Json(req): Json<UpdatePositionRequest>,
) -> impl IntoResponse {
    match state.store.move_entry(id, req.position) {
        Ok(entry) => ApiResponse::ok(entry).into_response(),
        Err(e) => store_error(e),
    }
}

/// DELETE /entries/:id
pub async fn delete_entry(
    State(state): State<ApiState>,
    Path(id): Path<EntryId>,
) -> impl IntoResponse {
    match state.store.remove_entry(id) {
        Ok(entry) => ApiResponse::ok(entry).into_response(),
        Err(e) => store_error(e),
    }
}

// ── Search ─────────────────────────────────────────────────────

/// Query parameters for GET /search.
#[derive(Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// GET /search
pub async fn search(
    State(state): State<ApiState>,
    Query(params): Query<SearchQuery>,
) -> impl IntoResponse {
    let query = params.query.unwrap_or_default();
    if query.trim().is_empty() {
        return ApiResponse::ok(Vec::<WaitingListEntry>::new()).into_response();
    }
    let filter = EntryFilter {
        query: Some(query),
        ..Default::default()
    };
    match state.store.search_entries(&filter) {
        Ok(entries) => ApiResponse::ok(entries).into_response(),
        Err(e) => store_error(e),
    }
}
