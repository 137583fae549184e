//! Public user status endpoint.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use lovesense_core::{UserId, UserRecord};
use serde::Serialize;

use crate::{error::AppError, state::AppState};

/// Build the status router.
pub fn router() -> Router<AppState> {
    Router::new().route("/user_status/{uid}", get(user_status))
}

/// Stored record plus the effective premium state.
#[derive(Debug, Serialize)]
pub struct UserStatusResponse {
    pub uid: UserId,
    #[serde(flatten)]
    pub record: UserRecord,
    pub is_premium: bool,
}

/// Return the entitlement state of `uid`.
///
/// Reading does not create a record.
///
/// # Errors
///
/// Returns 400 for a malformed id and 404 for an unknown user.
pub async fn user_status(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<UserStatusResponse>, AppError> {
    let uid: UserId = uid
        .parse()
        .map_err(|e| AppError::BadRequest(format!("invalid uid: {e}")))?;
    let record = state
        .users()
        .peek(uid)
        .await
        .ok_or_else(|| AppError::NotFound(format!("user {uid}")))?;
    let is_premium = record.is_premium(state.entitlements().now().timestamp());

    Ok(Json(UserStatusResponse {
        uid,
        record,
        is_premium,
    }))
}
