use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use kirana_core::SupplierId;
use kirana_parties::{SupplierDraft, SupplierPatch};

use crate::app::dto;
use crate::app::errors::{self, ApiJson};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(register_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(deactivate_supplier),
        )
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.suppliers_list().await {
        Ok(suppliers) => {
            let items = suppliers.iter().map(dto::supplier_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn register_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<SupplierDraft>,
) -> axum::response::Response {
    match services.suppliers_create(body).await {
        Ok(s) => (StatusCode::CREATED, Json(dto::supplier_to_json(&s))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<SupplierId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.suppliers_get(id).await {
        Ok(s) => (StatusCode::OK, Json(dto::supplier_to_json(&s))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<SupplierPatch>,
) -> axum::response::Response {
    let id = match errors::parse_id::<SupplierId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.suppliers_update(id, patch).await {
        Ok(s) => (StatusCode::OK, Json(dto::supplier_to_json(&s))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// DELETE keeps the record and marks it inactive.
pub async fn deactivate_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<SupplierId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.suppliers_deactivate(id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Supplier deleted successfully" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
