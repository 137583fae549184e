//! Admin API handlers.
//!
//! The caller names itself with `admin_id` (query string for reads, JSON
//! body for writes). Every handler goes through [`AdminService`], so a
//! wrong, missing or malformed id is refused with 403 and recorded in the
//! action log.
//!
//! [`AdminService`]: crate::services::AdminService

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use lovesense_core::{
    AdminCommand, MANUAL_PAYMENT_GRANT_DAYS, Order, OrderId, OrderStatus, Stats, UserId,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    error::AppError,
    services::{AdminOutcome, OrderDecision},
    state::AppState,
};

/// Default number of log lines returned.
const DEFAULT_LOG_LIMIT: usize = 200;

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/admin/stats", get(stats))
        .route("/admin/logs", get(logs))
        .route("/admin/grant", post(grant))
        .route("/admin/revoke", post(revoke))
        .route("/admin/orders/{id}/approve", post(approve))
        .route("/admin/orders/{id}/reject", post(reject))
}

/// `admin_id` exactly as sent, a JSON number or a string.
///
/// Parsing is left to [`AdminService::authorize_caller`] so that a bad
/// value is refused and recorded instead of failing extraction.
///
/// [`AdminService::authorize_caller`]: crate::services::AdminService::authorize_caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerId(Option<String>);

impl CallerId {
    fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<'de> Deserialize<'de> for CallerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };
        Ok(Self(raw))
    }
}

/// Caller identity for read endpoints.
#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub admin_id: CallerId,
    /// Only return orders with this status.
    pub status: Option<OrderStatus>,
    /// Log lines to return.
    pub limit: Option<usize>,
}

/// Body of `POST /admin/grant`.
#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    #[serde(default)]
    pub admin_id: CallerId,
    pub uid: UserId,
    pub days: Option<u32>,
}

/// Body of `POST /admin/revoke`.
#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    #[serde(default)]
    pub admin_id: CallerId,
    pub uid: UserId,
}

/// Body of order decision endpoints.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub admin_id: CallerId,
}

/// Response for grant and revoke.
#[derive(Debug, Serialize)]
pub struct PremiumResponse {
    pub ok: bool,
    pub uid: UserId,
    pub premium_until: Option<DateTime<Utc>>,
}

/// Response for the log tail.
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub path: String,
    pub lines: Vec<String>,
}

fn parse_order_id(raw: &str) -> Result<OrderId, AppError> {
    raw.parse()
        .map_err(|e| AppError::BadRequest(format!("invalid order id: {e}")))
}

/// List orders, oldest first.
///
/// # Errors
///
/// Returns 403 if `admin_id` is missing or not the admin.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    state
        .admin()
        .authorize_caller(query.admin_id.as_deref(), "orders")
        .await?;
    let mut orders = state.orders().list().await;
    if let Some(status) = query.status {
        orders.retain(|o| o.status == status);
    }
    Ok(Json(orders))
}

/// Dashboard counters.
///
/// # Errors
///
/// Returns 403 if `admin_id` is missing or not the admin.
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<Stats>, AppError> {
    let actor = state
        .admin()
        .authorize_caller(query.admin_id.as_deref(), "stats")
        .await?;
    match state.admin().execute(actor, AdminCommand::Stats).await? {
        AdminOutcome::Stats(stats) => Ok(Json(stats)),
        other => Err(unexpected(&other)),
    }
}

/// Tail of the action log.
///
/// # Errors
///
/// Returns 403 if `admin_id` is missing or not the admin, or 500 if the log cannot be
/// read.
pub async fn logs(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<LogsResponse>, AppError> {
    state
        .admin()
        .authorize_caller(query.admin_id.as_deref(), "logs")
        .await?;
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    let lines = state.audit().read_recent(limit).await?;
    Ok(Json(LogsResponse {
        path: state.audit().path().display().to_string(),
        lines,
    }))
}

/// Grant premium, 30 days unless `days` is given.
///
/// # Errors
///
/// Returns 400 for a zero day count, 403 if `admin_id` is missing or not the admin, or
/// 500 if the change cannot be persisted.
pub async fn grant(
    State(state): State<AppState>,
    Json(body): Json<GrantRequest>,
) -> Result<Json<PremiumResponse>, AppError> {
    let actor = state
        .admin()
        .authorize_caller(body.admin_id.as_deref(), "grant")
        .await?;
    let days = body.days.unwrap_or(MANUAL_PAYMENT_GRANT_DAYS);
    if days == 0 {
        return Err(AppError::BadRequest("days must be positive".to_string()));
    }
    let command = AdminCommand::Grant {
        user: body.uid,
        days,
    };
    match state.admin().execute(actor, command).await? {
        AdminOutcome::Granted { user, until, .. } => Ok(Json(PremiumResponse {
            ok: true,
            uid: user,
            premium_until: Some(until),
        })),
        other => Err(unexpected(&other)),
    }
}

/// Revoke premium.
///
/// # Errors
///
/// Returns 403 if `admin_id` is missing or not the admin, or 500 if the change cannot
/// be persisted.
pub async fn revoke(
    State(state): State<AppState>,
    Json(body): Json<RevokeRequest>,
) -> Result<Json<PremiumResponse>, AppError> {
    let actor = state
        .admin()
        .authorize_caller(body.admin_id.as_deref(), "revoke")
        .await?;
    match state
        .admin()
        .execute(actor, AdminCommand::Revoke(body.uid))
        .await?
    {
        AdminOutcome::Revoked { user } => Ok(Json(PremiumResponse {
            ok: true,
            uid: user,
            premium_until: None,
        })),
        other => Err(unexpected(&other)),
    }
}

/// Approve a payment claim.
///
/// Approving an unknown order, or one whose user has nothing pending, is a
/// no-op reported with `affected: 0`.
///
/// # Errors
///
/// Returns 400 for a malformed id, 403 if `admin_id` is missing or not the admin, or
/// 500 if the change cannot be persisted.
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<OrderDecision>, AppError> {
    let actor = state
        .admin()
        .authorize_caller(body.admin_id.as_deref(), "approve")
        .await?;
    let order_id = parse_order_id(&id)?;
    match state
        .admin()
        .execute(actor, AdminCommand::Approve(order_id))
        .await?
    {
        AdminOutcome::Approved(decision) => Ok(Json(decision)),
        other => Err(unexpected(&other)),
    }
}

/// Reject a payment claim, removing the user's pending orders.
///
/// # Errors
///
/// Returns 400 for a malformed id, 403 if `admin_id` is missing or not the admin, or
/// 500 if the change cannot be persisted.
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<OrderDecision>, AppError> {
    let actor = state
        .admin()
        .authorize_caller(body.admin_id.as_deref(), "reject")
        .await?;
    let order_id = parse_order_id(&id)?;
    match state
        .admin()
        .execute(actor, AdminCommand::Reject(order_id))
        .await?
    {
        AdminOutcome::Rejected(decision) => Ok(Json(decision)),
        other => Err(unexpected(&other)),
    }
}

fn unexpected(outcome: &AdminOutcome) -> AppError {
    AppError::Internal(format!("unexpected admin outcome: {outcome:?}"))
}
