//! Axum extractor resolving the requester's [`Identity`].
//!
//! The upstream auth layer terminates tokens and forwards the resolved
//! principal in `x-user-id` / `x-user-role` headers. Token issuance and
//! verification are out of scope here; this extractor only translates the
//! forwarded headers into an explicit [`Identity`] value.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::{Identity, Role, UserId};
use crate::error::BookingError;

/// Header carrying the authenticated user's UUID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role (`user` or `admin`).
pub const USER_ROLE_HEADER: &str = "x-user-role";

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = BookingError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                BookingError::Unauthenticated(format!("missing {USER_ID_HEADER} header"))
            })?;
        let user_id = uuid::Uuid::parse_str(user_id).map_err(|_| {
            BookingError::Unauthenticated(format!("invalid {USER_ID_HEADER} header"))
        })?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                BookingError::Unauthenticated(format!("missing {USER_ROLE_HEADER} header"))
            })?;
        let role: Role = role.parse().map_err(|()| {
            BookingError::Unauthenticated(format!("invalid {USER_ROLE_HEADER} header"))
        })?;

        Ok(Identity::new(UserId::from_uuid(user_id), role))
    }
}
