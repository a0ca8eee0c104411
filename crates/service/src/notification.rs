use std::sync::Arc;

use tracing::instrument;

use motorpool_audit::{payload, ChangeRecord, ChangeType};
use motorpool_auth::{AccessError, Authorizer};
use motorpool_core::{NotificationId, UserId, VehicleId};
use motorpool_infra::{NotificationStore, VehicleStore};
use motorpool_vehicles::{NotificationKind, NotificationUpdate, Vehicle, VehicleNotification};

use crate::error::ServiceResult;
use crate::recorder::AuditRecorder;

/// Maintenance notification lifecycle. Every mutation appends a change
/// record; the change type of an edit is derived from the `completed`
/// transition (false→true is `complete`, true→false is `reopen`, anything
/// else is `update`).
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationStore>,
    vehicles: Arc<dyn VehicleStore>,
    authorizer: Authorizer,
    recorder: AuditRecorder,
}

fn derive_change_type(before: &VehicleNotification, after: &VehicleNotification) -> ChangeType {
    match (before.completed, after.completed) {
        (false, true) => ChangeType::Complete,
        (true, false) => ChangeType::Reopen,
        _ => ChangeType::Update,
    }
}

impl NotificationService {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        vehicles: Arc<dyn VehicleStore>,
        authorizer: Authorizer,
        recorder: AuditRecorder,
    ) -> Self {
        Self {
            notifications,
            vehicles,
            authorizer,
            recorder,
        }
    }

    async fn vehicle(&self, vehicle_id: VehicleId) -> ServiceResult<Vehicle> {
        Ok(self
            .vehicles
            .get(vehicle_id)
            .await?
            .ok_or(AccessError::VehicleNotFound(vehicle_id))?)
    }

    /// Create a notification on a vehicle; member-gated on the vehicle's
    /// shop. Audits `create`.
    #[instrument(skip(self, title, description), fields(actor = %actor, vehicle_id = %vehicle_id))]
    pub async fn create(
        &self,
        actor: UserId,
        vehicle_id: VehicleId,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: NotificationKind,
    ) -> ServiceResult<VehicleNotification> {
        let vehicle = self.vehicle(vehicle_id).await?;
        self.authorizer.require_member(actor, vehicle.shop_id).await?;

        let notification =
            VehicleNotification::new(vehicle.shop_id, vehicle_id, title, description, kind)?;
        self.notifications.insert(notification.clone()).await?;

        self.recorder
            .record(
                ChangeRecord::new(
                    notification.shop_id,
                    actor,
                    ChangeType::Create,
                    payload::notification_created(),
                )
                .with_notification(
                    notification.id,
                    notification.title.clone(),
                    notification.kind.as_str(),
                )
                .with_vehicle(vehicle.id, vehicle.admin.clone()),
            )
            .await;
        Ok(notification)
    }

    /// Fetch one notification; member-gated on its shop.
    pub async fn get(
        &self,
        actor: UserId,
        notification_id: NotificationId,
    ) -> ServiceResult<VehicleNotification> {
        let notification = self
            .notifications
            .get(notification_id)
            .await?
            .ok_or(AccessError::NotificationNotFound(notification_id))?;
        self.authorizer
            .require_member(actor, notification.shop_id)
            .await?;
        Ok(notification)
    }

    /// Member-gated listing of a vehicle's notifications.
    pub async fn list_for_vehicle(
        &self,
        actor: UserId,
        vehicle_id: VehicleId,
    ) -> ServiceResult<Vec<VehicleNotification>> {
        let vehicle = self.vehicle(vehicle_id).await?;
        self.authorizer.require_member(actor, vehicle.shop_id).await?;
        Ok(self.notifications.list_for_vehicle(vehicle_id).await?)
    }

    /// Partial edit. Audits the derived change type with the list of fields
    /// that actually differ (empty when the edit changed nothing).
    #[instrument(skip(self, update), fields(actor = %actor, notification_id = %notification_id))]
    pub async fn update(
        &self,
        actor: UserId,
        notification_id: NotificationId,
        update: NotificationUpdate,
    ) -> ServiceResult<VehicleNotification> {
        if !self
            .authorizer
            .can_modify_notification(actor, notification_id)
            .await?
        {
            return Err(AccessError::AccessDenied.into());
        }
        let before = self
            .notifications
            .get(notification_id)
            .await?
            .ok_or(AccessError::NotificationNotFound(notification_id))?;

        let mut notification = before.clone();
        notification.apply_update(update)?;
        self.notifications.save(notification.clone()).await?;

        let changed = notification.changed_fields_since(&before);
        let vehicle = self.vehicles.get(notification.vehicle_id).await?;
        let mut record = ChangeRecord::new(
            notification.shop_id,
            actor,
            derive_change_type(&before, &notification),
            payload::fields_changed(&changed),
        )
        .with_notification(
            notification.id,
            notification.title.clone(),
            notification.kind.as_str(),
        );
        if let Some(vehicle) = vehicle {
            record = record.with_vehicle(vehicle.id, vehicle.admin.clone());
        }
        self.recorder.record(record).await;
        Ok(notification)
    }

    /// Delete a notification and its items. The `delete` record captures the
    /// title and type before the row goes.
    #[instrument(skip(self), fields(actor = %actor, notification_id = %notification_id))]
    pub async fn delete(&self, actor: UserId, notification_id: NotificationId) -> ServiceResult<()> {
        if !self
            .authorizer
            .can_modify_notification(actor, notification_id)
            .await?
        {
            return Err(AccessError::AccessDenied.into());
        }
        let notification = self
            .notifications
            .get(notification_id)
            .await?
            .ok_or(AccessError::NotificationNotFound(notification_id))?;
        let vehicle = self.vehicles.get(notification.vehicle_id).await?;

        self.notifications.delete(notification_id).await?;

        let mut record = ChangeRecord::new(
            notification.shop_id,
            actor,
            ChangeType::Delete,
            payload::notification_deleted(),
        )
        .with_notification(
            notification.id,
            notification.title.clone(),
            notification.kind.as_str(),
        );
        if let Some(vehicle) = vehicle {
            record = record.with_vehicle(vehicle.id, vehicle.admin.clone());
        }
        self.recorder.record(record).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use motorpool_infra::ChangeStore;

    use crate::error::ServiceError;
    use crate::testutil::{add_vehicle, TestEnv};

    async fn setup() -> (TestEnv, motorpool_shops::Shop, UserId, Vehicle) {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let vehicle = add_vehicle(&env, &shop, admin).await;
        (env, shop, admin, vehicle)
    }

    #[tokio::test]
    async fn create_audits_a_created_record_with_context() {
        let (env, _shop, admin, vehicle) = setup().await;

        let notification = env
            .notifications
            .create(admin, vehicle.id, "Hydraulic leak", "Cylinder weeping", NotificationKind::M1)
            .await
            .unwrap();
        assert!(!notification.completed);

        let records = ChangeStore::for_notification(&*env.store, notification.id)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].change_type, ChangeType::Create);
        assert_eq!(records[0].notification_title.as_deref(), Some("Hydraulic leak"));
        assert_eq!(records[0].notification_type.as_deref(), Some("M1"));
        assert_eq!(records[0].vehicle_admin.as_deref(), Some("SSG Vasquez"));
        assert_eq!(records[0].field_changes, json!({"fields_changed": ["created"]}));
    }

    #[tokio::test]
    async fn create_is_member_gated_through_the_vehicle() {
        let (env, _shop, _admin, vehicle) = setup().await;

        match env
            .notifications
            .create(UserId::new(), vehicle.id, "Leak", "", NotificationKind::Pm)
            .await
        {
            Err(ServiceError::Access(AccessError::AccessDenied)) => {}
            other => panic!("Expected AccessDenied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn completing_derives_the_complete_change_type() {
        let (env, _shop, admin, vehicle) = setup().await;
        let notification = env
            .notifications
            .create(admin, vehicle.id, "Leak", "", NotificationKind::Mw)
            .await
            .unwrap();

        let updated = env
            .notifications
            .update(
                admin,
                notification.id,
                NotificationUpdate {
                    completed: Some(true),
                    ..NotificationUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.completed);

        let records = ChangeStore::for_notification(&*env.store, notification.id)
            .await
            .unwrap();
        // Newest first: complete, then create.
        assert_eq!(records[0].change_type, ChangeType::Complete);
        assert_eq!(records[0].field_changes, json!({"fields_changed": ["completed"]}));
    }

    #[tokio::test]
    async fn reopening_derives_the_reopen_change_type() {
        let (env, _shop, admin, vehicle) = setup().await;
        let notification = env
            .notifications
            .create(admin, vehicle.id, "Leak", "", NotificationKind::Mw)
            .await
            .unwrap();

        let complete = NotificationUpdate {
            completed: Some(true),
            ..NotificationUpdate::default()
        };
        env.notifications.update(admin, notification.id, complete).await.unwrap();

        let reopen = NotificationUpdate {
            completed: Some(false),
            ..NotificationUpdate::default()
        };
        env.notifications.update(admin, notification.id, reopen).await.unwrap();

        let records = ChangeStore::for_notification(&*env.store, notification.id)
            .await
            .unwrap();
        assert_eq!(records[0].change_type, ChangeType::Reopen);
    }

    #[tokio::test]
    async fn plain_edit_derives_update_with_the_field_diff() {
        let (env, shop, admin, vehicle) = setup().await;
        let member = env.join_as_member(&shop, admin).await;
        let notification = env
            .notifications
            .create(admin, vehicle.id, "Leak", "", NotificationKind::M1)
            .await
            .unwrap();

        // Any member may edit; ownership is not enforced for notifications.
        let updated = env
            .notifications
            .update(
                member,
                notification.id,
                NotificationUpdate {
                    title: Some("Leak (worse)".to_string()),
                    kind: Some(NotificationKind::Pm),
                    ..NotificationUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.kind, NotificationKind::Pm);

        let records = ChangeStore::for_notification(&*env.store, notification.id)
            .await
            .unwrap();
        assert_eq!(records[0].change_type, ChangeType::Update);
        assert_eq!(records[0].field_changes, json!({"fields_changed": ["title", "type"]}));
        assert_eq!(records[0].notification_title.as_deref(), Some("Leak (worse)"));
    }

    #[tokio::test]
    async fn no_op_edit_records_an_empty_diff() {
        let (env, _shop, admin, vehicle) = setup().await;
        let notification = env
            .notifications
            .create(admin, vehicle.id, "Leak", "", NotificationKind::M1)
            .await
            .unwrap();

        env.notifications
            .update(admin, notification.id, NotificationUpdate::default())
            .await
            .unwrap();

        let records = ChangeStore::for_notification(&*env.store, notification.id)
            .await
            .unwrap();
        assert_eq!(records[0].change_type, ChangeType::Update);
        assert_eq!(records[0].field_changes, json!({"fields_changed": []}));
    }

    #[tokio::test]
    async fn delete_keeps_the_denormalized_context() {
        let (env, _shop, admin, vehicle) = setup().await;
        let notification = env
            .notifications
            .create(admin, vehicle.id, "Leak", "", NotificationKind::M1)
            .await
            .unwrap();

        env.notifications.delete(admin, notification.id).await.unwrap();

        match env.notifications.get(admin, notification.id).await {
            Err(ServiceError::Access(AccessError::NotificationNotFound(_))) => {}
            other => panic!("Expected NotificationNotFound, got {other:?}"),
        }

        let records = ChangeStore::for_notification(&*env.store, notification.id)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].change_type, ChangeType::Delete);
        assert_eq!(records[0].notification_title.as_deref(), Some("Leak"));
        assert_eq!(records[0].field_changes, json!({"fields_changed": ["deleted"]}));
    }

    #[tokio::test]
    async fn outsider_cannot_edit_or_delete() {
        let (env, _shop, admin, vehicle) = setup().await;
        let notification = env
            .notifications
            .create(admin, vehicle.id, "Leak", "", NotificationKind::M1)
            .await
            .unwrap();

        let outsider = UserId::new();
        match env
            .notifications
            .update(outsider, notification.id, NotificationUpdate::default())
            .await
        {
            Err(ServiceError::Access(AccessError::AccessDenied)) => {}
            other => panic!("Expected AccessDenied, got {other:?}"),
        }
        match env.notifications.delete(outsider, notification.id).await {
            Err(ServiceError::Access(AccessError::AccessDenied)) => {}
            other => panic!("Expected AccessDenied, got {other:?}"),
        }
    }
}
