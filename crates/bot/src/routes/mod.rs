//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /user_status/{uid}              - Entitlement state of one user
//!
//! # Admin (caller identified by `admin_id`)
//! GET  /orders?admin_id=               - All orders, oldest first
//! GET  /admin/stats?admin_id=          - Dashboard counters
//! GET  /admin/logs?admin_id=&limit=    - Tail of the action log
//! POST /admin/grant                    - {admin_id, uid, days?}
//! POST /admin/revoke                   - {admin_id, uid}
//! POST /admin/orders/{id}/approve      - {admin_id}
//! POST /admin/orders/{id}/reject       - {admin_id}
//! ```

use axum::{Router, routing::get};

use crate::state::AppState;

pub mod admin;
pub mod status;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(status::router())
        .merge(admin::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{PaymentConfig, StorageConfig};
    use crate::services::{AdminGate, NoopNotifier};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use lovesense_core::{ManualClock, UserId};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_and_unknown_user() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            data_dir: dir.path().join("data"),
            logs_dir: dir.path().join("logs"),
        };
        let state = AppState::open(
            &storage,
            AdminGate::new(UserId::new(1)),
            PaymentConfig::default(),
            Arc::new(ManualClock::at(0)),
            Arc::new(NoopNotifier),
        )
        .await;
        let app = routes().with_state(state);

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/user_status/77").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
