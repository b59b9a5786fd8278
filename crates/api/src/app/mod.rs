//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the operations behind each route, over the shared stores
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use kirana_core::Clock;
use kirana_infra::{Mailer, Reconciler, ReconcilerConfig, Stores, SupplierNotifier};

use crate::config::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Wire the notifier, reconciler and services over one set of stores.
pub fn build_services(
    stores: Stores,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    config: &AppConfig,
) -> Arc<AppServices> {
    let notifier = SupplierNotifier::new(
        stores.clone(),
        mailer,
        config.mail_from.clone(),
        config.shop_signature.clone(),
    );
    let reconciler = Arc::new(Reconciler::new(
        stores.clone(),
        notifier.clone(),
        clock.clone(),
        ReconcilerConfig {
            notify_suppliers: config.auto_order_notify,
        },
    ));
    Arc::new(AppServices::new(stores, reconciler, notifier, clock))
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use kirana_core::SystemClock;
    use kirana_infra::InMemoryMailer;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let services = build_services(
            Stores::in_memory(),
            Arc::new(InMemoryMailer::new()),
            Arc::new(SystemClock),
            &config,
        );
        build_app(services)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let res = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let uri = format!("/inventory/{}", kirana_core::ItemId::new());
        let res = app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn malformed_body_uses_the_error_shape() {
        let res = app()
            .oneshot(
                Request::post("/inventory")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name": "Rice"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "invalid_body");
    }
}
