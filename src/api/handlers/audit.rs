//! Audit trail read endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::Identity;
use crate::error::{BookingError, ErrorResponse};
use crate::persistence::models::AuditRecord;

/// Default number of entries returned by the audit endpoint.
const RECENT_LIMIT: i64 = 100;

/// `GET /audit` — Most recent audit entries. Admin only.
///
/// Available only when audit persistence is enabled; with the tracing
/// sink there is no queryable history.
///
/// # Errors
///
/// Returns [`BookingError::Forbidden`] for non-admin callers and
/// [`BookingError::InvalidRequest`] when persistence is disabled.
#[utoipa::path(
    get,
    path = "/api/v1/audit",
    tag = "Audit",
    summary = "Recent audit entries (admin)",
    description = "Returns the most recent audit log entries, newest first. Requires audit persistence to be enabled.",
    responses(
        (status = 200, description = "Audit entries", body = Vec<AuditRecord>),
        (status = 400, description = "Audit persistence is disabled", body = ErrorResponse),
        (status = 403, description = "Requires the admin role", body = ErrorResponse),
    )
)]
pub async fn recent_audit(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, BookingError> {
    if !identity.is_admin() {
        return Err(BookingError::Forbidden(
            "reading the audit log requires the admin role".to_string(),
        ));
    }
    let Some(audit_log) = &state.audit_log else {
        return Err(BookingError::InvalidRequest(
            "audit persistence is not enabled".to_string(),
        ));
    };
    let records = audit_log.recent(RECENT_LIMIT).await?;
    Ok(Json(records))
}

/// Audit routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/audit", get(recent_audit))
}
