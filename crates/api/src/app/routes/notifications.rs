use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use motorpool_core::{ItemId, NotificationId};
use motorpool_vehicles::NotificationUpdate;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route(
            "/notifications/:id",
            patch(update_notification).delete(delete_notification),
        )
        .route(
            "/notifications/:id/items",
            post(add_items).get(list_items).delete(remove_items),
        )
        .route("/notifications/:id/changes", get(notification_changes))
}

pub async fn update_notification(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<NotificationUpdate>,
) -> axum::response::Response {
    let notification_id: NotificationId = match parse_id(&id, "notification") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .notifications
        .update(principal.user_id(), notification_id, body)
        .await
    {
        Ok(notification) => (StatusCode::OK, Json(notification)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_notification(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let notification_id: NotificationId = match parse_id(&id, "notification") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .notifications
        .delete(principal.user_id(), notification_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn add_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddItemsRequest>,
) -> axum::response::Response {
    let notification_id: NotificationId = match parse_id(&id, "notification") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .items
        .add_many(principal.user_id(), notification_id, body.items)
        .await
    {
        Ok(items) => (StatusCode::CREATED, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let notification_id: NotificationId = match parse_id(&id, "notification") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .items
        .list_for_notification(principal.user_id(), notification_id)
        .await
    {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RemoveItemsRequest>,
) -> axum::response::Response {
    let notification_id: NotificationId = match parse_id(&id, "notification") {
        Ok(v) => v,
        Err(r) => return r,
    };
    let mut item_ids = Vec::with_capacity(body.item_ids.len());
    for raw in &body.item_ids {
        let item_id: ItemId = match parse_id(raw, "item") {
            Ok(v) => v,
            Err(r) => return r,
        };
        item_ids.push(item_id);
    }
    match services
        .items
        .remove_many(principal.user_id(), notification_id, item_ids)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn notification_changes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let notification_id: NotificationId = match parse_id(&id, "notification") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .changes
        .for_notification(principal.user_id(), notification_id)
        .await
    {
        Ok(records) => (StatusCode::OK, Json(serde_json::json!({ "items": records }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
