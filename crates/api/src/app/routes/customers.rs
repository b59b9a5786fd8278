use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use kirana_core::CustomerId;
use kirana_parties::{CustomerDraft, CustomerPatch};

use crate::app::dto;
use crate::app::errors::{self, ApiJson};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/available-salespersons", get(available_salespersons))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.customers_list().await {
        Ok(customers) => {
            let items = customers
                .iter()
                .map(|(c, staff)| dto::customer_to_json(c, staff.as_ref()))
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn available_salespersons(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.available_salespersons().await {
        Ok(staff) => {
            let items = staff.iter().map(dto::staff_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<CustomerDraft>,
) -> axum::response::Response {
    match services.customers_create(body).await {
        Ok((c, staff)) => (
            StatusCode::CREATED,
            Json(dto::customer_to_json(&c, staff.as_ref())),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<CustomerId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.customers_get(id).await {
        Ok((c, staff)) => {
            (StatusCode::OK, Json(dto::customer_to_json(&c, staff.as_ref()))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<CustomerPatch>,
) -> axum::response::Response {
    let id = match errors::parse_id::<CustomerId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.customers_update(id, patch).await {
        Ok((c, staff)) => {
            (StatusCode::OK, Json(dto::customer_to_json(&c, staff.as_ref()))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match errors::parse_id::<CustomerId>(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match services.customers_delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Customer deleted successfully" })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
