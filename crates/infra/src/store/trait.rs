use chrono::{DateTime, Utc};
use thiserror::Error;

use motorpool_audit::ChangeRecord;
use motorpool_core::{
    InviteCodeId, ItemId, ListId, NotificationId, ShopId, UserId, VehicleId,
};
use motorpool_shops::{InviteCode, Membership, Role, Shop, ShopList};
use motorpool_vehicles::{NotificationItem, Vehicle, VehicleNotification};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operation error.
///
/// These are **infrastructure errors** (missing rows, constraint violations,
/// backend failures) as opposed to domain errors (validation, invariants).
/// Authorization decisions never live here.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness or concurrent-modification conflict (duplicate
    /// membership pair, duplicate invite code, raced delete).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value could not be decoded into its domain type.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The backend itself failed (connection, pool, poisoned lock).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Shop rows (the tenant boundary).
///
/// `delete` removes the shop and everything it owns **except** change
/// records, which deliberately outlive their shop's other rows.
#[async_trait::async_trait]
pub trait ShopStore: Send + Sync {
    /// Persist a new shop together with its creator's Admin membership, as
    /// one atomic step. A shop never exists without exactly one admin at
    /// creation time.
    async fn create_with_admin(&self, shop: Shop, admin: Membership) -> StoreResult<()>;

    async fn get(&self, shop_id: ShopId) -> StoreResult<Option<Shop>>;

    /// Overwrite an existing shop row.
    async fn save(&self, shop: Shop) -> StoreResult<()>;

    async fn delete(&self, shop_id: ShopId) -> StoreResult<()>;
}

/// Membership facts: at most one row per (shop, user) pair.
#[async_trait::async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a membership; `Conflict` if the (shop, user) pair already has
    /// one.
    async fn insert(&self, membership: Membership) -> StoreResult<()>;

    async fn get(&self, shop_id: ShopId, user_id: UserId) -> StoreResult<Option<Membership>>;

    /// Remove the (shop, user) membership; `NotFound` if absent.
    async fn delete(&self, shop_id: ShopId, user_id: UserId) -> StoreResult<()>;

    /// Change the role on an existing membership; `NotFound` if absent.
    async fn update_role(&self, shop_id: ShopId, user_id: UserId, role: Role) -> StoreResult<()>;

    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<Membership>>;

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Membership>>;

    async fn count_for_shop(&self, shop_id: ShopId) -> StoreResult<u64>;
}

/// Invite code rows. The code string is unique across the store so a bare
/// code resolves to exactly one shop.
#[async_trait::async_trait]
pub trait InviteStore: Send + Sync {
    /// Insert a code; `Conflict` when the code string collides with an
    /// existing one (callers retry with a fresh code).
    async fn insert(&self, code: InviteCode) -> StoreResult<()>;

    async fn get(&self, code_id: InviteCodeId) -> StoreResult<Option<InviteCode>>;

    /// Look up by code string. Callers pass the normalized (uppercase) form.
    async fn get_by_code(&self, code: &str) -> StoreResult<Option<InviteCode>>;

    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<InviteCode>>;

    /// Atomically consume one use: increments `current_uses` iff the code is
    /// usable at `now` (active, unexpired, unexhausted). Returns whether a
    /// use was consumed. This single conditional step is what keeps
    /// `current_uses ≤ max_uses` under concurrent redemption.
    async fn consume_use(&self, code_id: InviteCodeId, now: DateTime<Utc>) -> StoreResult<bool>;

    /// Give back one consumed use (redemption lost a race after consuming).
    /// Never drops below zero.
    async fn release_use(&self, code_id: InviteCodeId) -> StoreResult<()>;

    /// Soft-kill: sets `is_active = false`. Zero rows affected means the row
    /// vanished between lookup and update and surfaces as `Conflict`.
    async fn deactivate(&self, code_id: InviteCodeId) -> StoreResult<()>;

    /// Hard delete; same raced-delete contract as `deactivate`.
    async fn delete(&self, code_id: InviteCodeId) -> StoreResult<()>;
}

/// Vehicle rows. Deleting a vehicle removes its notifications and their
/// items; audit records pointing at it stay untouched.
#[async_trait::async_trait]
pub trait VehicleStore: Send + Sync {
    async fn insert(&self, vehicle: Vehicle) -> StoreResult<()>;

    async fn get(&self, vehicle_id: VehicleId) -> StoreResult<Option<Vehicle>>;

    async fn save(&self, vehicle: Vehicle) -> StoreResult<()>;

    async fn delete(&self, vehicle_id: VehicleId) -> StoreResult<()>;

    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<Vehicle>>;
}

/// Maintenance notification rows. Deleting one removes its items.
#[async_trait::async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: VehicleNotification) -> StoreResult<()>;

    async fn get(&self, notification_id: NotificationId)
        -> StoreResult<Option<VehicleNotification>>;

    async fn save(&self, notification: VehicleNotification) -> StoreResult<()>;

    async fn delete(&self, notification_id: NotificationId) -> StoreResult<()>;

    async fn list_for_vehicle(&self, vehicle_id: VehicleId)
        -> StoreResult<Vec<VehicleNotification>>;
}

/// Notification line-item rows.
#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a batch of items atomically (all or none).
    async fn insert_many(&self, items: Vec<NotificationItem>) -> StoreResult<()>;

    async fn get(&self, item_id: ItemId) -> StoreResult<Option<NotificationItem>>;

    /// Delete a batch; `NotFound` if any id is absent (nothing is removed).
    async fn delete_many(&self, item_ids: &[ItemId]) -> StoreResult<()>;

    async fn list_for_notification(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Vec<NotificationItem>>;
}

/// Shop quick-list rows.
#[async_trait::async_trait]
pub trait ListStore: Send + Sync {
    async fn insert(&self, list: ShopList) -> StoreResult<()>;

    async fn get(&self, list_id: ListId) -> StoreResult<Option<ShopList>>;

    async fn save(&self, list: ShopList) -> StoreResult<()>;

    async fn delete(&self, list_id: ListId) -> StoreResult<()>;

    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<ShopList>>;
}

/// Append-only change audit log.
///
/// The trait surface is the invariant: there is no update and no delete, so
/// nothing in the system can rewrite history. Records survive the deletion
/// of every row they reference (including the shop itself).
#[async_trait::async_trait]
pub trait ChangeStore: Send + Sync {
    async fn append(&self, record: ChangeRecord) -> StoreResult<()>;

    /// Records for one notification, newest first.
    async fn for_notification(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Vec<ChangeRecord>>;

    /// Records for one vehicle, newest first.
    async fn for_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<Vec<ChangeRecord>>;

    /// Most recent records for a whole shop, newest first, at most `limit`.
    async fn for_shop(&self, shop_id: ShopId, limit: u32) -> StoreResult<Vec<ChangeRecord>>;
}
