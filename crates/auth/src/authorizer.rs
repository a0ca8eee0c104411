use std::sync::Arc;

use motorpool_core::{ListId, NotificationId, ShopId, UserId, VehicleId};
use motorpool_infra::{ListStore, MembershipStore, NotificationStore, ShopStore, VehicleStore};
use motorpool_shops::Role;

use crate::error::{AccessError, AccessResult};

/// The single authorization oracle, injected into every mutation service.
///
/// All methods are read-only and side-effect-free. No result is cached:
/// every check is a fresh read, trading latency for staleness-freedom.
#[derive(Clone)]
pub struct Authorizer {
    memberships: Arc<dyn MembershipStore>,
    shops: Arc<dyn ShopStore>,
    vehicles: Arc<dyn VehicleStore>,
    notifications: Arc<dyn NotificationStore>,
    lists: Arc<dyn ListStore>,
}

impl Authorizer {
    pub fn new(
        memberships: Arc<dyn MembershipStore>,
        shops: Arc<dyn ShopStore>,
        vehicles: Arc<dyn VehicleStore>,
        notifications: Arc<dyn NotificationStore>,
        lists: Arc<dyn ListStore>,
    ) -> Self {
        Self {
            memberships,
            shops,
            vehicles,
            notifications,
            lists,
        }
    }

    /// True iff a membership row exists for (shop, actor).
    pub async fn is_member(&self, actor: UserId, shop_id: ShopId) -> AccessResult<bool> {
        Ok(self.memberships.get(shop_id, actor).await?.is_some())
    }

    /// True iff a membership row exists with the Admin role.
    pub async fn is_admin(&self, actor: UserId, shop_id: ShopId) -> AccessResult<bool> {
        Ok(self
            .memberships
            .get(shop_id, actor)
            .await?
            .is_some_and(|m| m.role.is_admin()))
    }

    /// The actor's role in the shop; `NotMember` if no row exists.
    pub async fn role_of(&self, actor: UserId, shop_id: ShopId) -> AccessResult<Role> {
        self.memberships
            .get(shop_id, actor)
            .await?
            .map(|m| m.role)
            .ok_or(AccessError::NotMember(shop_id))
    }

    /// True iff the actor created the vehicle or administers its shop.
    pub async fn can_modify_vehicle(
        &self,
        actor: UserId,
        vehicle_id: VehicleId,
    ) -> AccessResult<bool> {
        let vehicle = self
            .vehicles
            .get(vehicle_id)
            .await?
            .ok_or(AccessError::VehicleNotFound(vehicle_id))?;
        if vehicle.creator_id == actor {
            return Ok(true);
        }
        self.is_admin(actor, vehicle.shop_id).await
    }

    /// Any member may modify a list unless the shop's `admin_only_lists`
    /// flag restricts it to admins.
    pub async fn can_modify_list(&self, actor: UserId, list_id: ListId) -> AccessResult<bool> {
        let list = self
            .lists
            .get(list_id)
            .await?
            .ok_or(AccessError::ListNotFound(list_id))?;
        let shop = self
            .shops
            .get(list.shop_id)
            .await?
            .ok_or(AccessError::ShopNotFound(list.shop_id))?;
        if shop.admin_only_lists {
            self.is_admin(actor, shop.id).await
        } else {
            self.is_member(actor, shop.id).await
        }
    }

    /// Plain membership on the notification's shop. Ownership is enforced
    /// only for vehicles and (conditionally) lists, never notifications.
    pub async fn can_modify_notification(
        &self,
        actor: UserId,
        notification_id: NotificationId,
    ) -> AccessResult<bool> {
        let notification = self
            .notifications
            .get(notification_id)
            .await?
            .ok_or(AccessError::NotificationNotFound(notification_id))?;
        self.is_member(actor, notification.shop_id).await
    }

    /// Fail-fast assertion: `AccessDenied` unless the actor is a member.
    pub async fn require_member(&self, actor: UserId, shop_id: ShopId) -> AccessResult<()> {
        if self.is_member(actor, shop_id).await? {
            Ok(())
        } else {
            Err(AccessError::AccessDenied)
        }
    }

    /// Fail-fast assertion: `AdminRequired` unless the actor is an admin.
    pub async fn require_admin(&self, actor: UserId, shop_id: ShopId) -> AccessResult<()> {
        if self.is_admin(actor, shop_id).await? {
            Ok(())
        } else {
            Err(AccessError::AdminRequired)
        }
    }
}
