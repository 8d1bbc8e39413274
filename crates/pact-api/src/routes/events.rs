//! # Notification Feed
//!
//! Clients poll `GET /v1/events?since=N` with the last sequence they have
//! seen; the response carries every newer notification in order.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use pact_ledger::{EscrowEvent, EventRecord};

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

/// One notification as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventView {
    /// Position in the log, from 1.
    pub sequence: u64,
    pub emitted_at: DateTime<Utc>,
    /// Event name, e.g. `PurchaseConfirmed`.
    pub name: String,
    /// Order the event concerns.
    pub order_id: u64,
    /// Human-readable rendering, e.g. `BuyerRefunded(1, 2)`.
    pub summary: String,
    /// The event payload, tagged by `type`.
    #[schema(value_type = Object)]
    pub event: EscrowEvent,
}

impl From<&EventRecord> for EventView {
    fn from(record: &EventRecord) -> Self {
        Self {
            sequence: record.sequence,
            emitted_at: record.emitted_at,
            name: record.event.name().to_string(),
            order_id: record.event.order_id().get(),
            summary: record.event.to_string(),
            event: record.event.clone(),
        }
    }
}

/// Query parameters for the feed.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EventsQuery {
    /// Return only events with a greater sequence. Defaults to 0 (all).
    #[serde(default)]
    pub since: u64,
}

/// Feed response.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventsResponse {
    /// Sequence of the newest event in the log; 0 when empty.
    pub last_sequence: u64,
    pub events: Vec<EventView>,
}

/// Build the events router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/events", get(list_events))
}

/// GET /v1/events — Notifications after a sequence number.
#[utoipa::path(
    get,
    path = "/v1/events",
    params(EventsQuery),
    responses(
        (status = 200, description = "Notifications, oldest first", body = EventsResponse),
        (status = 400, description = "Malformed query", body = crate::error::ErrorBody),
    ),
    tag = "events"
)]
async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Json<EventsResponse>, AppError> {
    let query = extract_query(query)?;
    let ledger = state.ledger.lock();
    Ok(Json(EventsResponse {
        last_sequence: ledger.last_event_sequence(),
        events: ledger
            .events_since(query.since)
            .iter()
            .map(EventView::from)
            .collect(),
    }))
}
