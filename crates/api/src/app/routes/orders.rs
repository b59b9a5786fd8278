use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use kirana_core::OrderId;
use kirana_orders::OrderStatus;

use crate::app::dto;
use crate::app::errors::{self, ApiJson};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/auto-create", post(auto_create))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::OrderListQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref().map(str::parse::<OrderStatus>).transpose() {
        Ok(s) => s,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_status", e.to_string()),
    };
    match services.orders_list(status).await {
        Ok(orders) => {
            let items = orders.iter().map(dto::order_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::CreateOrderRequest>,
) -> axum::response::Response {
    match services.orders_create(body).await {
        Ok(placed) => (
            StatusCode::CREATED,
            Json(dto::order_with_notification(
                &placed.order,
                placed.notification.as_ref(),
            )),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<OrderId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.orders_get(id).await {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::UpdateOrderRequest>,
) -> axum::response::Response {
    let id = match errors::parse_id::<OrderId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.orders_update(id, body).await {
        Ok(updated) => {
            let mut body = dto::order_with_notification(&updated.order, updated.notification.as_ref());
            body["restocked"] = updated
                .restocked
                .iter()
                .map(|item| {
                    serde_json::json!({
                        "item_id": item.id_typed().to_string(),
                        "name": item.name(),
                        "quantity": item.quantity(),
                    })
                })
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<OrderId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.orders_delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Order deleted successfully" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Run one replenishment pass now and report what it did.
pub async fn auto_create(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.orders_auto_create().await {
        Ok(outcome) => {
            let status = if outcome.created_order().is_some() {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            let mut body = serde_json::json!(outcome);
            if let Some(order) = outcome.created_order() {
                body["order"] = dto::order_to_json(order);
            }
            (status, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
