//! # booking-gateway
//!
//! REST admission-control backend for capacity-constrained event bookings.
//!
//! This crate owns the booking lifecycle (create, update, cancel, feedback,
//! complete) against events with finite or unlimited capacity. Events and
//! user identity are externally owned — this service consumes them through
//! narrow collaborator interfaces and records every mutation in an audit
//! trail.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── BookingService (service/)
//!     │
//!     ├── BookingStore (domain/)     per-event admission serialization
//!     ├── EventLookup (domain/)      read-only collaborator
//!     │
//!     └── AuditSink (audit/)         tracing or PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod audit;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
