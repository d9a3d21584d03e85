//! Booking entity: one user's reservation against one event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookingId, EventId, UserId};

/// Lifecycle status of a booking.
///
/// Statuses serialize in `SCREAMING_SNAKE_CASE` on the wire
/// (`"CONFIRMED"` etc.), matching the status filter query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Reserved but not yet confirmed (counts against capacity).
    Pending,
    /// Confirmed reservation (counts against capacity).
    Confirmed,
    /// Cancelled by the owner or an admin before event start.
    Cancelled,
    /// Event has concluded; feedback window is open.
    Completed,
}

impl BookingStatus {
    /// Returns `true` if the booking counts against event capacity.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// One user's reservation against one event.
///
/// `user_id` and `event_id` are immutable after creation. `total_price_cents`
/// is computed at creation/update time, never re-derived lazily. All money
/// amounts are integer minor units (cents) to avoid precision loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    /// Unique booking identifier (immutable after creation).
    pub id: BookingId,

    /// Owning user (immutable after creation).
    pub user_id: UserId,

    /// Target event (immutable after creation).
    pub event_id: EventId,

    /// Current lifecycle status.
    pub status: BookingStatus,

    /// Number of tickets reserved. Always positive.
    pub quantity: u32,

    /// `event.price_cents × quantity` at the time it was last set.
    pub total_price_cents: u64,

    /// Creation timestamp.
    pub booking_date: DateTime<Utc>,

    /// Set only on cancellation, otherwise absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_date: Option<DateTime<Utc>>,

    /// Free-text feedback, settable once after completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,

    /// Rating 1–5, settable once after completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl Booking {
    /// Creates a confirmed booking with its price computed from the
    /// event's per-ticket price.
    #[must_use]
    pub fn confirmed(user_id: UserId, event_id: EventId, quantity: u32, price_cents: u64) -> Self {
        Self {
            id: BookingId::new(),
            user_id,
            event_id,
            status: BookingStatus::Confirmed,
            quantity,
            total_price_cents: price_cents.saturating_mul(u64::from(quantity)),
            booking_date: Utc::now(),
            cancellation_date: None,
            feedback: None,
            rating: None,
        }
    }

    /// Recomputes `total_price_cents` for a new quantity.
    pub fn reprice(&mut self, quantity: u32, price_cents: u64) {
        self.quantity = quantity;
        self.total_price_cents = price_cents.saturating_mul(u64::from(quantity));
    }
}

/// Conjunctive equality filter for booking list operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingFilter {
    /// Match bookings with this status.
    pub status: Option<BookingStatus>,
    /// Match bookings for this event.
    pub event_id: Option<EventId>,
}

impl BookingFilter {
    /// Returns `true` if the booking satisfies every set predicate.
    #[must_use]
    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(status) = self.status
            && booking.status != status
        {
            return false;
        }
        if let Some(event_id) = self.event_id
            && booking.event_id != event_id
        {
            return false;
        }
        true
    }
}

/// Partial update applied to a booking by its owner or an admin.
///
/// Serialized as the `details` payload of the UPDATE audit entry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BookingPatch {
    /// New status, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    /// New ticket quantity, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}
