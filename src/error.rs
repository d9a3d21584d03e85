//! Booking error types with HTTP status code mapping.
//!
//! [`BookingError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{BookingId, EventId, UserId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4005,
///     "message": "capacity exceeded: requested 2 seats, 1 available",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`BookingError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                  |
/// |-----------|----------------------|------------------------------|
/// | 1000–1999 | Validation / Auth    | 400 / 401 / 403              |
/// | 2000–2999 | Not Found / Conflict | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server               | 500 Internal Server Error    |
/// | 4000–4999 | Business Rule        | 400 Bad Request              |
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No usable identity was supplied by the upstream auth layer.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Caller is neither the owner nor allowed by role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Event is absent or not published.
    #[error("event not found or not published: {0}")]
    EventNotFound(EventId),

    /// Booking with the given ID was not found.
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    /// The user already holds a non-cancelled booking for the event.
    #[error("user {user_id} already has a booking for event {event_id}")]
    DuplicateBooking {
        /// The user holding the existing booking.
        user_id: UserId,
        /// The event already booked.
        event_id: EventId,
    },

    /// The event's start date has passed; the operation window is closed.
    #[error("event {0} has already started")]
    EventStarted(EventId),

    /// The booking is already cancelled.
    #[error("booking {0} is already cancelled")]
    AlreadyCancelled(BookingId),

    /// Feedback submitted before the booking was completed.
    #[error("feedback is only accepted for completed bookings: {0}")]
    FeedbackNotOpen(BookingId),

    /// Feedback may be submitted only once.
    #[error("feedback already submitted for booking {0}")]
    FeedbackAlreadySubmitted(BookingId),

    /// Admitting the requested quantity would exceed event capacity.
    #[error("capacity exceeded: requested {requested} seats, {available} available")]
    CapacityExceeded {
        /// Seats requested by the caller.
        requested: u32,
        /// Seats still available under the ceiling.
        available: u32,
    },

    /// Persistence layer failure (audit log).
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Unauthenticated(_) => 1101,
            Self::Forbidden(_) => 1102,
            Self::EventNotFound(_) => 2001,
            Self::BookingNotFound(_) => 2002,
            Self::DuplicateBooking { .. } => 2101,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
            Self::EventStarted(_) => 4001,
            Self::AlreadyCancelled(_) => 4002,
            Self::FeedbackNotOpen(_) => 4003,
            Self::FeedbackAlreadySubmitted(_) => 4004,
            Self::CapacityExceeded { .. } => 4005,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::EventStarted(_)
            | Self::AlreadyCancelled(_)
            | Self::FeedbackNotOpen(_)
            | Self::FeedbackAlreadySubmitted(_)
            | Self::CapacityExceeded { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::EventNotFound(_) | Self::BookingNotFound(_) => StatusCode::NOT_FOUND,
            Self::DuplicateBooking { .. } => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
