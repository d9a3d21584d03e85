//! Booking-related DTOs for create, update, cancel, feedback, and list
//! operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Booking, BookingFilter, BookingId, BookingStatus, EventId, UserId};

/// Request body for `POST /bookings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Target event UUID.
    pub event_id: uuid::Uuid,
    /// Number of tickets. Defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Request body for `PATCH /bookings/:id`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookingRequest {
    /// New status, if changing.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub status: Option<BookingStatus>,
    /// New ticket quantity, if changing.
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Request body for `POST /bookings/:id/feedback`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    /// Free-text feedback.
    pub feedback: String,
    /// Rating from 1 to 5.
    pub rating: u8,
}

/// Query parameters for booking list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct BookingFilterQuery {
    /// Match bookings with this status (e.g. `CONFIRMED`).
    #[serde(default)]
    pub status: Option<BookingStatus>,
    /// Match bookings for this event.
    #[serde(default)]
    pub event_id: Option<uuid::Uuid>,
}

impl BookingFilterQuery {
    /// Converts the query into a domain filter.
    #[must_use]
    pub fn into_filter(self) -> BookingFilter {
        BookingFilter {
            status: self.status,
            event_id: self.event_id.map(EventId::from_uuid),
        }
    }
}

/// A booking as returned by every booking endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    /// Booking identifier.
    #[schema(value_type = uuid::Uuid)]
    pub id: BookingId,
    /// Owning user.
    #[schema(value_type = uuid::Uuid)]
    pub user_id: UserId,
    /// Target event.
    #[schema(value_type = uuid::Uuid)]
    pub event_id: EventId,
    /// Current lifecycle status.
    #[schema(value_type = String)]
    pub status: BookingStatus,
    /// Number of tickets.
    pub quantity: u32,
    /// Total price in minor units (cents).
    pub total_price_cents: u64,
    /// Creation timestamp.
    pub booking_date: DateTime<Utc>,
    /// Cancellation timestamp, if cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_date: Option<DateTime<Utc>>,
    /// Feedback text, if submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    /// Rating 1–5, if submitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            user_id: booking.user_id,
            event_id: booking.event_id,
            status: booking.status,
            quantity: booking.quantity,
            total_price_cents: booking.total_price_cents,
            booking_date: booking.booking_date,
            cancellation_date: booking.cancellation_date,
            feedback: booking.feedback,
            rating: booking.rating,
        }
    }
}

/// List response for `GET /bookings` and `GET /bookings/my`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingListResponse {
    /// Matching bookings, oldest first.
    pub data: Vec<BookingResponse>,
    /// Total number of matches.
    pub total: usize,
}

impl BookingListResponse {
    /// Builds a list response from domain bookings.
    #[must_use]
    pub fn from_bookings(bookings: Vec<Booking>) -> Self {
        let data: Vec<BookingResponse> = bookings.into_iter().map(Into::into).collect();
        let total = data.len();
        Self { data, total }
    }
}

/// Response body for `POST /events/:id/complete-bookings`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteBookingsResponse {
    /// The event whose bookings were completed.
    #[schema(value_type = uuid::Uuid)]
    pub event_id: EventId,
    /// Number of bookings transitioned from confirmed to completed.
    pub completed: u64,
}
