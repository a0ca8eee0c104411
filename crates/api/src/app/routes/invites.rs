use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};

use motorpool_core::{InviteCodeId, ShopId};

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/shops/:shop_id/invites", post(generate_invite).get(list_invites))
        .route("/invites/redeem", post(redeem_invite))
        .route("/invites/:code_id/deactivate", post(deactivate_invite))
        .route("/invites/:code_id", delete(delete_invite))
}

pub async fn generate_invite(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
    Json(body): Json<dto::GenerateInviteRequest>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .invites
        .generate(principal.user_id(), shop_id, body.max_uses, body.expires_at)
        .await
    {
        Ok(code) => (StatusCode::CREATED, Json(code)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_invites(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.invites.list(principal.user_id(), shop_id).await {
        Ok(codes) => (StatusCode::OK, Json(serde_json::json!({ "items": codes }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn redeem_invite(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::RedeemInviteRequest>,
) -> axum::response::Response {
    match services.invites.redeem(principal.user_id(), &body.code).await {
        Ok(membership) => (StatusCode::OK, Json(membership)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn deactivate_invite(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(code_id): Path<String>,
) -> axum::response::Response {
    let code_id: InviteCodeId = match parse_id(&code_id, "invite code") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.invites.deactivate(principal.user_id(), code_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_invite(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(code_id): Path<String>,
) -> axum::response::Response {
    let code_id: InviteCodeId = match parse_id(&code_id, "invite code") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.invites.delete(principal.user_id(), code_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
