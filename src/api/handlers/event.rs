//! Event-scoped batch operations on bookings.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::CompleteBookingsResponse;
use crate::app_state::AppState;
use crate::domain::{EventId, Identity};
use crate::error::{BookingError, ErrorResponse};

/// `POST /events/:id/complete-bookings` — Flip confirmed bookings to
/// completed. Admin only; intended for the post-event scheduler.
///
/// # Errors
///
/// Returns [`BookingError::Forbidden`] for non-admin callers.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/complete-bookings",
    tag = "Events",
    summary = "Complete an event's bookings (admin)",
    description = "Transitions every CONFIRMED booking for the event to COMPLETED and returns the count. Invoked by an external scheduler after the event ends.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Completion summary", body = CompleteBookingsResponse),
        (status = 403, description = "Requires the admin role", body = ErrorResponse),
    )
)]
pub async fn complete_bookings(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let event_id = EventId::from_uuid(id);
    let completed = state
        .booking_service
        .complete_bookings(event_id, &identity)
        .await?;
    Ok(Json(CompleteBookingsResponse {
        event_id,
        completed,
    }))
}

/// Event batch-operation routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events/{id}/complete-bookings", post(complete_bookings))
}
