use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use motorpool_core::{ShopId, VehicleId};
use motorpool_vehicles::{NotificationKind, VehicleDraft, VehicleUpdate};

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/shops/:shop_id/vehicles", post(create_vehicle).get(list_vehicles))
        .route("/vehicles/:vehicle_id", patch(update_vehicle).delete(delete_vehicle))
        .route(
            "/vehicles/:vehicle_id/notifications",
            post(create_notification).get(list_notifications),
        )
        .route("/vehicles/:vehicle_id/changes", get(vehicle_changes))
}

pub async fn create_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
    Json(body): Json<dto::CreateVehicleRequest>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    let draft = VehicleDraft {
        niin: body.niin,
        admin: body.admin,
        model: body.model,
        serial: body.serial,
        uoc: body.uoc,
        mileage: body.mileage,
        hours: body.hours,
        comment: body.comment,
    };
    match services.vehicles.create(principal.user_id(), shop_id, draft).await {
        Ok(vehicle) => (StatusCode::CREATED, Json(vehicle)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_vehicles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(shop_id): Path<String>,
) -> axum::response::Response {
    let shop_id: ShopId = match parse_id(&shop_id, "shop") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.vehicles.list_for_shop(principal.user_id(), shop_id).await {
        Ok(vehicles) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": vehicles }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(vehicle_id): Path<String>,
    Json(body): Json<VehicleUpdate>,
) -> axum::response::Response {
    let vehicle_id: VehicleId = match parse_id(&vehicle_id, "vehicle") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .vehicles
        .update(principal.user_id(), vehicle_id, body)
        .await
    {
        Ok(vehicle) => (StatusCode::OK, Json(vehicle)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(vehicle_id): Path<String>,
) -> axum::response::Response {
    let vehicle_id: VehicleId = match parse_id(&vehicle_id, "vehicle") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.vehicles.delete(principal.user_id(), vehicle_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_notification(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(vehicle_id): Path<String>,
    Json(body): Json<dto::CreateNotificationRequest>,
) -> axum::response::Response {
    let vehicle_id: VehicleId = match parse_id(&vehicle_id, "vehicle") {
        Ok(v) => v,
        Err(r) => return r,
    };
    let kind: NotificationKind = match body.notification_type.parse() {
        Ok(v) => v,
        Err(e) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("{e}"),
            )
        }
    };
    match services
        .notifications
        .create(principal.user_id(), vehicle_id, body.title, body.description, kind)
        .await
    {
        Ok(notification) => (StatusCode::CREATED, Json(notification)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(vehicle_id): Path<String>,
) -> axum::response::Response {
    let vehicle_id: VehicleId = match parse_id(&vehicle_id, "vehicle") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services
        .notifications
        .list_for_vehicle(principal.user_id(), vehicle_id)
        .await
    {
        Ok(notifications) => {
            (StatusCode::OK, Json(serde_json::json!({ "items": notifications }))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn vehicle_changes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(vehicle_id): Path<String>,
) -> axum::response::Response {
    let vehicle_id: VehicleId = match parse_id(&vehicle_id, "vehicle") {
        Ok(v) => v,
        Err(r) => return r,
    };
    match services.changes.for_vehicle(principal.user_id(), vehicle_id).await {
        Ok(records) => (StatusCode::OK, Json(serde_json::json!({ "items": records }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
