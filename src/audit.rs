//! Audit side-channel: who did what, when, to which booking.
//!
//! Every mutation in the service layer emits an [`AuditEntry`] through an
//! [`AuditSink`]. The sink is an explicit collaborator with a deliberate
//! failure policy ([`AuditPolicy`]) rather than a fire-and-forget call:
//! whether a failed audit write fails the parent operation is configuration,
//! not accident.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::UserId;
use crate::error::BookingError;

/// Action recorded by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A booking was created.
    Create,
    /// A booking was updated (status and/or quantity).
    Update,
    /// A booking was cancelled.
    Cancel,
    /// Feedback was attached to a completed booking.
    Feedback,
    /// A batch of confirmed bookings was completed for one event.
    Complete,
    /// A booking was hard-deleted by an admin.
    Delete,
}

impl AuditAction {
    /// Stable string form, used as the database discriminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Cancel => "cancel",
            Self::Feedback => "feedback",
            Self::Complete => "complete",
            Self::Delete => "delete",
        }
    }
}

/// Kind of entity an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A single booking.
    Booking,
    /// An event, for batch operations spanning its bookings.
    Event,
}

impl EntityType {
    /// Stable string form, used as the database discriminator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Event => "event",
        }
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// What happened.
    pub action: AuditAction,
    /// What kind of entity it happened to.
    pub entity_type: EntityType,
    /// The entity's identifier.
    pub entity_id: uuid::Uuid,
    /// The acting user.
    pub user_id: UserId,
    /// Action-specific details.
    pub details: serde_json::Value,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        action: AuditAction,
        entity_type: EntityType,
        entity_id: uuid::Uuid,
        user_id: UserId,
        details: serde_json::Value,
    ) -> Self {
        Self {
            action,
            entity_type,
            entity_id,
            user_id,
            details,
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only recorder of audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    /// Records one entry.
    ///
    /// # Errors
    ///
    /// Returns a [`BookingError`] if the sink's backend fails. Whether that
    /// failure reaches the caller of the parent operation is decided by the
    /// configured [`AuditPolicy`], not by the sink.
    async fn record(&self, entry: AuditEntry) -> Result<(), BookingError>;
}

/// What to do when an audit write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditPolicy {
    /// Fail the parent operation.
    Propagate,
    /// Log a warning and let the parent operation succeed.
    #[default]
    LogAndContinue,
}

impl AuditPolicy {
    /// Parses a policy from its configuration string.
    ///
    /// Accepts `"propagate"` and `"continue"` (case-insensitive); anything
    /// else yields `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "propagate" => Some(Self::Propagate),
            "continue" => Some(Self::LogAndContinue),
            _ => None,
        }
    }
}

/// Sink that logs every entry through `tracing` at info level.
///
/// The default sink when audit persistence is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), BookingError> {
        tracing::info!(
            action = entry.action.as_str(),
            entity_type = entry.entity_type.as_str(),
            entity_id = %entry.entity_id,
            user_id = %entry.user_id,
            details = %entry.details,
            "audit"
        );
        Ok(())
    }
}

/// In-memory sink for tests: collects entries behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything recorded so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, entry: AuditEntry) -> Result<(), BookingError> {
        self.entries
            .lock()
            .map_err(|_| BookingError::Internal("audit sink poisoned".to_string()))?
            .push(entry);
        Ok(())
    }
}
