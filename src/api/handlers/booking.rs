//! Booking endpoint handlers: create, list, get, update, cancel,
//! feedback, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    BookingFilterQuery, BookingListResponse, BookingResponse, CreateBookingRequest,
    FeedbackRequest, UpdateBookingRequest,
};
use crate::app_state::AppState;
use crate::domain::{BookingId, BookingPatch, EventId, Identity};
use crate::error::{BookingError, ErrorResponse};

/// `POST /bookings` — Create a booking against a published event.
///
/// # Errors
///
/// Returns [`BookingError`] on unknown events, closed booking windows,
/// duplicates, or exhausted capacity.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "Create a booking",
    description = "Books the requested quantity of tickets against a published event. The booking is confirmed immediately and priced at the event's per-ticket price times quantity.",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Past event, zero quantity, or capacity exceeded", body = ErrorResponse),
        (status = 404, description = "Event not found or unpublished", body = ErrorResponse),
        (status = 409, description = "User already has a booking for this event", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let booking = state
        .booking_service
        .create_booking(&identity, EventId::from_uuid(req.event_id), req.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// `GET /bookings` — List all bookings with optional filters. Admin only.
///
/// # Errors
///
/// Returns [`BookingError::Forbidden`] for non-admin callers.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "List all bookings (admin)",
    description = "Returns every booking, optionally filtered by status and event.",
    params(
        ("status" = Option<String>, Query, description = "Status filter (PENDING, CONFIRMED, CANCELLED, COMPLETED)"),
        ("event_id" = Option<uuid::Uuid>, Query, description = "Event filter"),
    ),
    responses(
        (status = 200, description = "Booking list", body = BookingListResponse),
        (status = 403, description = "Requires the admin role", body = ErrorResponse),
    )
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<BookingFilterQuery>,
) -> Result<impl IntoResponse, BookingError> {
    let bookings = state
        .booking_service
        .list_bookings(&identity, &query.into_filter())
        .await?;
    Ok(Json(BookingListResponse::from_bookings(bookings)))
}

/// `GET /bookings/my` — List the requester's own bookings.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/my",
    tag = "Bookings",
    summary = "List my bookings",
    description = "Returns the requester's bookings, optionally filtered by status and event.",
    params(
        ("status" = Option<String>, Query, description = "Status filter (PENDING, CONFIRMED, CANCELLED, COMPLETED)"),
        ("event_id" = Option<uuid::Uuid>, Query, description = "Event filter"),
    ),
    responses(
        (status = 200, description = "Booking list", body = BookingListResponse),
    )
)]
pub async fn list_my_bookings(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<BookingFilterQuery>,
) -> impl IntoResponse {
    let bookings = state
        .booking_service
        .list_my_bookings(&identity, &query.into_filter())
        .await;
    Json(BookingListResponse::from_bookings(bookings))
}

/// `GET /bookings/:id` — Get one booking. Owner or admin.
///
/// # Errors
///
/// Returns [`BookingError`] if the booking is absent or the caller is
/// neither owner nor admin.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Get a booking",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Booking details", body = BookingResponse),
        (status = 403, description = "Booking belongs to another user", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let booking = state
        .booking_service
        .get_booking(BookingId::from_uuid(id), &identity)
        .await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// `PATCH /bookings/:id` — Update status and/or quantity. Owner or admin.
///
/// # Errors
///
/// Returns [`BookingError`] on authorization failure, closed booking
/// windows, capacity overflow, or a disallowed status transition.
#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Update a booking",
    description = "Patches status and/or quantity. A quantity increase or a revival into an active status re-runs the capacity and duplicate checks; any quantity change reprices the booking. COMPLETED is reachable only through the event-level batch operation.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Updated booking", body = BookingResponse),
        (status = 400, description = "Past event, zero quantity, capacity exceeded, or disallowed status transition", body = ErrorResponse),
        (status = 403, description = "Booking belongs to another user", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Revival would duplicate the owner's active booking", body = ErrorResponse),
    )
)]
pub async fn update_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let patch = BookingPatch {
        status: req.status,
        quantity: req.quantity,
    };
    let booking = state
        .booking_service
        .update_booking(BookingId::from_uuid(id), patch, &identity)
        .await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// `POST /bookings/:id/cancel` — Cancel before event start. Owner or admin.
///
/// # Errors
///
/// Returns [`BookingError`] on authorization failure, repeat
/// cancellation, or a closed cancellation window.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    summary = "Cancel a booking",
    description = "Sets the booking to CANCELLED and stamps the cancellation date. The cancellation window closes at event start.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Cancelled booking", body = BookingResponse),
        (status = 400, description = "Already cancelled or event started", body = ErrorResponse),
        (status = 403, description = "Booking belongs to another user", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    let booking = state
        .booking_service
        .cancel_booking(BookingId::from_uuid(id), &identity)
        .await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// `POST /bookings/:id/feedback` — Attach feedback to a completed
/// booking. Strictly owner-only.
///
/// # Errors
///
/// Returns [`BookingError`] for non-owners (including admins), bookings
/// not yet completed, or repeat submissions.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/feedback",
    tag = "Bookings",
    summary = "Submit feedback",
    description = "Attaches write-once feedback and a 1-5 rating to a completed booking. Only the booking owner may submit; admins are rejected.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Booking with feedback", body = BookingResponse),
        (status = 400, description = "Booking not completed, bad rating, or feedback already submitted", body = ErrorResponse),
        (status = 403, description = "Caller is not the booking owner", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn submit_feedback(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, BookingError> {
    let booking = state
        .booking_service
        .submit_feedback(BookingId::from_uuid(id), req.feedback, req.rating, &identity)
        .await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// `DELETE /bookings/:id` — Hard-delete a booking. Admin only.
///
/// # Errors
///
/// Returns [`BookingError`] for non-admin callers or absent bookings.
#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Delete a booking (admin)",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 403, description = "Requires the admin role", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn delete_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, BookingError> {
    state
        .booking_service
        .delete_booking(BookingId::from_uuid(id), &identity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/my", get(list_my_bookings))
        .route(
            "/bookings/{id}",
            get(get_booking)
                .patch(update_booking)
                .delete(delete_booking),
        )
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/feedback", post(submit_feedback))
}
