use thiserror::Error;

use motorpool_core::{ListId, NotificationId, ShopId, VehicleId};
use motorpool_infra::StoreError;

/// Result type for authorization decisions.
pub type AccessResult<T> = Result<T, AccessError>;

/// Why an authorization question could not be answered "yes".
///
/// Every variant except `Store` is a definite decision and must surface to
/// the caller verbatim; masking one would hide an authorization failure.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The actor holds no membership in the shop.
    #[error("user is not a member of shop {0}")]
    NotMember(ShopId),

    /// The actor is not allowed to act on the resource.
    #[error("access denied")]
    AccessDenied,

    /// The action is admin-gated and the actor is not an admin.
    #[error("admin role required")]
    AdminRequired,

    #[error("shop {0} not found")]
    ShopNotFound(ShopId),

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("list {0} not found")]
    ListNotFound(ListId),

    #[error("notification {0} not found")]
    NotificationNotFound(NotificationId),

    /// The decision could not be made because storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
