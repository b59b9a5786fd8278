use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use kirana_core::ItemId;
use kirana_inventory::{Category, InventoryItem, ItemPatch};

use crate::app::errors::{self, ApiJson};
use crate::app::services::AppServices;
use crate::app::dto;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/low-stock", get(low_stock_items))
        .route("/category/:category", get(items_by_category))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/:id/adjust", post(adjust_stock))
}

fn items_response(items: Vec<InventoryItem>) -> axum::response::Response {
    let items = items.iter().map(dto::item_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn list_items(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.inventory_list().await {
        Ok(items) => items_response(items),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn low_stock_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.inventory_low_stock().await {
        Ok(items) => items_response(items),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn items_by_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category): Path<String>,
) -> axum::response::Response {
    let category = match category.parse::<Category>() {
        Ok(c) => c,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_category", e.to_string());
        }
    };
    match services.inventory_by_category(category).await {
        Ok(items) => items_response(items),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::CreateItemRequest>,
) -> axum::response::Response {
    match services.inventory_create(body).await {
        Ok(item) => (StatusCode::CREATED, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ItemId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.inventory_get(id).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ItemPatch>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ItemId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.inventory_update(id, patch).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ItemId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.inventory_adjust(id, body.delta).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<ItemId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.inventory_delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Item deleted successfully" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
