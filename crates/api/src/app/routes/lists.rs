use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};

use motorpool_core::{ListId, ShopId};

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/shops/:shop_id/lists", post(create_list).get(list_lists))
        .route("/lists/:list_id", patch(update_list).delete(delete_list))
}

pub async fn create_list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
    Json(body): Json<dto::ListDescriptionRequest>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .lists
        .create(principal.user_id(), shop_id, body.description)
        .await
    {
        Ok(list) => (StatusCode::CREATED, Json(list)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_lists(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.lists.list(principal.user_id(), shop_id).await {
        Ok(lists) => (StatusCode::OK, Json(serde_json::json!({ "items": lists }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(list_id): Path<String>,
    Json(body): Json<dto::ListDescriptionRequest>,
) -> axum::response::Response {
    let list_id: ListId = match parse_id(&list_id, "list") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .lists
        .update(principal.user_id(), list_id, body.description)
        .await
    {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(list_id): Path<String>,
) -> axum::response::Response {
    let list_id: ListId = match parse_id(&list_id, "list") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.lists.delete(principal.user_id(), list_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
