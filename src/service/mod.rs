//! Service layer: booking admission and lifecycle orchestration.
//!
//! [`BookingService`] coordinates admission control against the
//! [`crate::domain::BookingStore`], consults the event lookup collaborator,
//! and emits audit entries through the configured sink.

pub mod booking_service;

pub use booking_service::BookingService;
