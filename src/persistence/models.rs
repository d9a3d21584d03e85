//! Database models for the audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A stored audit entry row from the `audit_log` table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditRecord {
    /// Auto-increment row ID.
    pub id: i64,
    /// Action discriminator (e.g. `"create"`).
    pub action: String,
    /// Entity kind discriminator (`"booking"` or `"event"`).
    pub entity_type: String,
    /// Identifier of the affected entity.
    pub entity_id: Uuid,
    /// The acting user.
    pub user_id: Uuid,
    /// JSONB payload with action-specific data.
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    /// Server-side recording timestamp.
    pub recorded_at: DateTime<Utc>,
}
