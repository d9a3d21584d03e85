//! Data Transfer Objects for REST request/response serialization.
//!
//! All money amounts are integer minor units (cents); no floats cross
//! the wire.

pub mod booking_dto;

pub use booking_dto::*;
