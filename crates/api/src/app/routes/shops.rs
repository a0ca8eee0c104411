use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};

use motorpool_core::{ShopId, UserId};
use motorpool_shops::ShopUpdate;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/shops", post(create_shop).get(list_shops))
        .route("/shops/:shop_id", get(get_shop).patch(update_shop).delete(delete_shop))
        .route("/shops/:shop_id/members", get(list_members))
        .route("/shops/:shop_id/members/:user_id/promote", post(promote_member))
        .route("/shops/:shop_id/members/:user_id", delete(remove_member))
        .route("/shops/:shop_id/leave", post(leave_shop))
        .route("/shops/:shop_id/changes", get(shop_changes))
}

pub async fn create_shop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateShopRequest>,
) -> axum::response::Response {
    match services
        .shops
        .create(principal.user_id(), body.name, body.details, body.admin_only_lists)
        .await
    {
        Ok(shop) => (StatusCode::CREATED, Json(shop)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_shops(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.shops.list_for_user(principal.user_id()).await {
        Ok(shops) => (StatusCode::OK, Json(serde_json::json!({ "items": shops }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_shop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.shops.get(principal.user_id(), shop_id).await {
        Ok(shop) => (StatusCode::OK, Json(shop)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_shop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
    Json(body): Json<ShopUpdate>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.shops.update(principal.user_id(), shop_id, body).await {
        Ok(shop) => (StatusCode::OK, Json(shop)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_shop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.shops.delete(principal.user_id(), shop_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.members.members(principal.user_id(), shop_id).await {
        Ok(members) => (StatusCode::OK, Json(serde_json::json!({ "items": members }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn promote_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((shop_id, user_id)): Path<(String, String)>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    let user_id: UserId = match parse_id(&user_id, "user") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .members
        .promote(principal.user_id(), shop_id, user_id)
        .await
    {
        Ok(membership) => (StatusCode::OK, Json(membership)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_member(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((shop_id, user_id)): Path<(String, String)>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    let user_id: UserId = match parse_id(&user_id, "user") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .members
        .remove(principal.user_id(), shop_id, user_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn leave_shop(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.members.leave(principal.user_id(), shop_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn shop_changes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
    Query(query): Query<dto::ChangesQuery>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .changes
        .for_shop(principal.user_id(), shop_id, query.limit)
        .await
    {
        Ok(records) => (StatusCode::OK, Json(serde_json::json!({ "items": records }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
