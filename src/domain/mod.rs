//! Domain layer: identifiers, the booking entity, collaborator seams,
//! and the booking store.
//!
//! This module contains the server-side domain model: typed IDs, the
//! requester identity, the booking record with its status lifecycle, the
//! read-only event lookup seam, and the concurrent booking store that
//! serializes admission per event.

pub mod booking;
pub mod booking_store;
pub mod event_lookup;
pub mod identity;
pub mod ids;

pub use booking::{Booking, BookingFilter, BookingPatch, BookingStatus};
pub use booking_store::{BookingStore, ShardView};
pub use event_lookup::{EventCatalog, EventDetails, EventLookup};
pub use identity::{Identity, Role};
pub use ids::{BookingId, EventId, UserId};
