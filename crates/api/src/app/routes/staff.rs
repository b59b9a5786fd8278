use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use kirana_core::StaffId;
use kirana_parties::{StaffDraft, StaffPatch};

use crate::app::dto;
use crate::app::errors::{self, ApiJson};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_staff).post(create_staff))
        .route("/:id", get(get_staff).put(update_staff).delete(delete_staff))
}

pub async fn list_staff(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.staff_list().await {
        Ok(staff) => {
            let items = staff.iter().map(dto::staff_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_staff(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<StaffDraft>,
) -> axum::response::Response {
    match services.staff_create(body).await {
        Ok(member) => (StatusCode::CREATED, Json(dto::staff_to_json(&member))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_staff(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<StaffId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.staff_get(id).await {
        Ok(member) => (StatusCode::OK, Json(dto::staff_to_json(&member))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_staff(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<StaffPatch>,
) -> axum::response::Response {
    let id = match errors::parse_id::<StaffId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.staff_update(id, patch).await {
        Ok(member) => (StatusCode::OK, Json(dto::staff_to_json(&member))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_staff(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<StaffId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.staff_delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Staff member deleted successfully" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
