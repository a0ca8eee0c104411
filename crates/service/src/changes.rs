use std::sync::Arc;

use motorpool_audit::ChangeRecord;
use motorpool_auth::{AccessError, Authorizer};
use motorpool_core::{NotificationId, ShopId, UserId, VehicleId};
use motorpool_infra::{ChangeStore, NotificationStore, VehicleStore};

use crate::error::ServiceResult;

/// Default page size for shop-level history queries.
pub const DEFAULT_CHANGE_LIMIT: u32 = 50;
/// Hard cap on shop-level history queries.
pub const MAX_CHANGE_LIMIT: u32 = 200;

/// Read-side of the audit trail. Results come newest-first; the records
/// themselves are immutable, so there is nothing to write here.
#[derive(Clone)]
pub struct ChangeQueryService {
    changes: Arc<dyn ChangeStore>,
    notifications: Arc<dyn NotificationStore>,
    vehicles: Arc<dyn VehicleStore>,
    authorizer: Authorizer,
}

impl ChangeQueryService {
    pub fn new(
        changes: Arc<dyn ChangeStore>,
        notifications: Arc<dyn NotificationStore>,
        vehicles: Arc<dyn VehicleStore>,
        authorizer: Authorizer,
    ) -> Self {
        Self {
            changes,
            notifications,
            vehicles,
            authorizer,
        }
    }

    /// History of one notification, member-gated through its shop. The
    /// notification must still exist to resolve the shop; history of deleted
    /// notifications is reachable through the vehicle and shop queries.
    pub async fn for_notification(
        &self,
        actor: UserId,
        notification_id: NotificationId,
    ) -> ServiceResult<Vec<ChangeRecord>> {
        let notification = self
            .notifications
            .get(notification_id)
            .await?
            .ok_or(AccessError::NotificationNotFound(notification_id))?;
        self.authorizer
            .require_member(actor, notification.shop_id)
            .await?;
        Ok(self.changes.for_notification(notification_id).await?)
    }

    /// History of one vehicle, member-gated through its shop.
    pub async fn for_vehicle(
        &self,
        actor: UserId,
        vehicle_id: VehicleId,
    ) -> ServiceResult<Vec<ChangeRecord>> {
        let vehicle = self
            .vehicles
            .get(vehicle_id)
            .await?
            .ok_or(AccessError::VehicleNotFound(vehicle_id))?;
        self.authorizer.require_member(actor, vehicle.shop_id).await?;
        Ok(self.changes.for_vehicle(vehicle_id).await?)
    }

    /// Recent shop-wide history. `limit` defaults to 50 and is capped at
    /// 200; zero is treated as unspecified.
    pub async fn for_shop(
        &self,
        actor: UserId,
        shop_id: ShopId,
        limit: Option<u32>,
    ) -> ServiceResult<Vec<ChangeRecord>> {
        self.authorizer.require_member(actor, shop_id).await?;
        let limit = match limit {
            Some(0) | None => DEFAULT_CHANGE_LIMIT,
            Some(n) => n.min(MAX_CHANGE_LIMIT),
        };
        Ok(self.changes.for_shop(shop_id, limit).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use motorpool_audit::ChangeType;
    use motorpool_vehicles::NotificationKind;

    use crate::error::ServiceError;
    use crate::testutil::{add_vehicle, TestEnv};

    #[tokio::test]
    async fn vehicle_history_survives_notification_deletion() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let vehicle = add_vehicle(&env, &shop, admin).await;
        let notification = env
            .notifications
            .create(admin, vehicle.id, "Leak", "", NotificationKind::M1)
            .await
            .unwrap();
        env.notifications.delete(admin, notification.id).await.unwrap();

        // The notification row is gone, so its direct history query 404s...
        match env.changes.for_notification(admin, notification.id).await {
            Err(ServiceError::Access(AccessError::NotificationNotFound(_))) => {}
            other => panic!("Expected NotificationNotFound, got {other:?}"),
        }

        // ...but both records are still there through the vehicle, context
        // intact.
        let records = env.changes.for_vehicle(admin, vehicle.id).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].change_type, ChangeType::Delete);
        assert_eq!(records[1].change_type, ChangeType::Create);
        assert!(records
            .iter()
            .all(|r| r.notification_title.as_deref() == Some("Leak")));
    }

    #[tokio::test]
    async fn shop_history_is_newest_first_and_member_gated() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let vehicle = add_vehicle(&env, &shop, admin).await;
        for i in 0..3 {
            env.notifications
                .create(admin, vehicle.id, format!("Fault {i}"), "", NotificationKind::Pm)
                .await
                .unwrap();
        }

        let records = env.changes.for_shop(admin, shop.id, None).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].notification_title.as_deref(), Some("Fault 2"));

        match env.changes.for_shop(UserId::new(), shop.id, None).await {
            Err(ServiceError::Access(AccessError::AccessDenied)) => {}
            other => panic!("Expected AccessDenied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn shop_history_limit_is_applied_and_capped() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let vehicle = add_vehicle(&env, &shop, admin).await;
        for i in 0..4 {
            env.notifications
                .create(admin, vehicle.id, format!("Fault {i}"), "", NotificationKind::Mw)
                .await
                .unwrap();
        }

        let two = env.changes.for_shop(admin, shop.id, Some(2)).await.unwrap();
        assert_eq!(two.len(), 2);

        // Oversized and zero limits fall back to the cap and the default.
        let capped = env.changes.for_shop(admin, shop.id, Some(10_000)).await.unwrap();
        assert_eq!(capped.len(), 4);
        let defaulted = env.changes.for_shop(admin, shop.id, Some(0)).await.unwrap();
        assert_eq!(defaulted.len(), 4);
    }
}
