use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use motorpool_auth::AccessError;
use motorpool_infra::StoreError;
use motorpool_service::ServiceError;

/// One JSON shape for every failure: `{"error": code, "message": text}`.
/// Invite redemption failures keep distinct codes so clients can tell a
/// dead code from a stale one.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Access(access) => access_error_to_response(access),
        ServiceError::InviteCodeInvalid => {
            json_error(StatusCode::BAD_REQUEST, "invite_code_invalid", "invite code is invalid")
        }
        ServiceError::InviteCodeExpired => {
            json_error(StatusCode::GONE, "invite_code_expired", "invite code has expired")
        }
        ServiceError::InviteCodeExhausted => json_error(
            StatusCode::GONE,
            "invite_code_exhausted",
            "invite code has no remaining uses",
        ),
        ServiceError::AlreadyMember => json_error(
            StatusCode::CONFLICT,
            "already_member",
            "user is already a member of this shop",
        ),
        ServiceError::ItemNotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "item not found")
        }
        ServiceError::InviteCodeGeneration => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "invite_code_generation",
            "could not generate a unique invite code",
        ),
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::Store(e) => store_error_to_response(e),
    }
}

fn access_error_to_response(err: AccessError) -> axum::response::Response {
    match err {
        AccessError::NotMember(_) | AccessError::AccessDenied => {
            json_error(StatusCode::FORBIDDEN, "forbidden", "not allowed")
        }
        AccessError::AdminRequired => {
            json_error(StatusCode::FORBIDDEN, "admin_required", "admin role required")
        }
        AccessError::ShopNotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", "shop not found"),
        AccessError::VehicleNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "vehicle not found")
        }
        AccessError::ListNotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", "list not found"),
        AccessError::NotificationNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "notification not found")
        }
        AccessError::Store(e) => store_error_to_response(e),
    }
}

fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Serialization(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "serialization_error", msg)
        }
        StoreError::Backend(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
