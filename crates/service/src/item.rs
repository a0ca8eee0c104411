use std::sync::Arc;

use tracing::instrument;

use motorpool_audit::{payload, ChangeRecord, ChangeType, ItemChange};
use motorpool_auth::{AccessError, Authorizer};
use motorpool_core::{ItemId, NotificationId, UserId};
use motorpool_infra::{ItemStore, NotificationStore, VehicleStore};
use motorpool_vehicles::{ItemDraft, NotificationItem, VehicleNotification};

use crate::error::{ServiceError, ServiceResult};
use crate::recorder::AuditRecorder;

/// Line items on a maintenance notification. Bulk operations validate
/// everything up front and write once, so a bad entry fails the whole call
/// with nothing persisted.
#[derive(Clone)]
pub struct ItemService {
    items: Arc<dyn ItemStore>,
    notifications: Arc<dyn NotificationStore>,
    vehicles: Arc<dyn VehicleStore>,
    authorizer: Authorizer,
    recorder: AuditRecorder,
}

fn item_change(item: &NotificationItem) -> ItemChange {
    ItemChange {
        niin: item.niin.clone(),
        nomenclature: item.nomenclature.clone(),
        quantity: item.quantity,
    }
}

impl ItemService {
    pub fn new(
        items: Arc<dyn ItemStore>,
        notifications: Arc<dyn NotificationStore>,
        vehicles: Arc<dyn VehicleStore>,
        authorizer: Authorizer,
        recorder: AuditRecorder,
    ) -> Self {
        Self {
            items,
            notifications,
            vehicles,
            authorizer,
            recorder,
        }
    }

    async fn notification(
        &self,
        notification_id: NotificationId,
    ) -> ServiceResult<VehicleNotification> {
        Ok(self
            .notifications
            .get(notification_id)
            .await?
            .ok_or(AccessError::NotificationNotFound(notification_id))?)
    }

    async fn record_item_change(
        &self,
        actor: UserId,
        notification: &VehicleNotification,
        change_type: ChangeType,
        changes: &[ItemChange],
    ) {
        let field_changes = match change_type {
            ChangeType::ItemsRemoved => payload::items_removed(changes),
            _ => payload::items_added(changes),
        };
        let mut record = ChangeRecord::new(notification.shop_id, actor, change_type, field_changes)
            .with_notification(
                notification.id,
                notification.title.clone(),
                notification.kind.as_str(),
            );
        if let Ok(Some(vehicle)) = self.vehicles.get(notification.vehicle_id).await {
            record = record.with_vehicle(vehicle.id, vehicle.admin.clone());
        }
        self.recorder.record(record).await;
    }

    /// Add one item; member-gated through the notification's shop.
    pub async fn add(
        &self,
        actor: UserId,
        notification_id: NotificationId,
        draft: ItemDraft,
    ) -> ServiceResult<NotificationItem> {
        let mut added = self.add_many(actor, notification_id, vec![draft]).await?;
        // add_many returns exactly as many items as drafts.
        Ok(added.remove(0))
    }

    /// Add a batch of items in one write and one `items_added` record.
    /// Every draft is validated before anything is inserted.
    #[instrument(skip(self, drafts), fields(actor = %actor, notification_id = %notification_id, count = drafts.len()))]
    pub async fn add_many(
        &self,
        actor: UserId,
        notification_id: NotificationId,
        drafts: Vec<ItemDraft>,
    ) -> ServiceResult<Vec<NotificationItem>> {
        let notification = self.notification(notification_id).await?;
        self.authorizer
            .require_member(actor, notification.shop_id)
            .await?;
        if drafts.is_empty() {
            return Err(ServiceError::validation("no items to add"));
        }

        let mut items = Vec::with_capacity(drafts.len());
        for draft in drafts {
            items.push(NotificationItem::new(notification.shop_id, notification_id, draft)?);
        }
        self.items.insert_many(items.clone()).await?;

        let changes: Vec<ItemChange> = items.iter().map(item_change).collect();
        self.record_item_change(actor, &notification, ChangeType::ItemsAdded, &changes)
            .await;
        Ok(items)
    }

    /// Member-gated listing of a notification's items.
    pub async fn list_for_notification(
        &self,
        actor: UserId,
        notification_id: NotificationId,
    ) -> ServiceResult<Vec<NotificationItem>> {
        let notification = self.notification(notification_id).await?;
        self.authorizer
            .require_member(actor, notification.shop_id)
            .await?;
        Ok(self.items.list_for_notification(notification_id).await?)
    }

    /// Remove one item.
    pub async fn remove(&self, actor: UserId, item_id: ItemId) -> ServiceResult<()> {
        let item = self
            .items
            .get(item_id)
            .await?
            .ok_or(ServiceError::ItemNotFound)?;
        self.remove_many(actor, item.notification_id, vec![item_id])
            .await
    }

    /// Remove a batch of items in one write and one `items_removed` record.
    /// Every id must name an existing item of this notification, or the call
    /// fails with nothing removed.
    #[instrument(skip(self, item_ids), fields(actor = %actor, notification_id = %notification_id, count = item_ids.len()))]
    pub async fn remove_many(
        &self,
        actor: UserId,
        notification_id: NotificationId,
        item_ids: Vec<ItemId>,
    ) -> ServiceResult<()> {
        let notification = self.notification(notification_id).await?;
        self.authorizer
            .require_member(actor, notification.shop_id)
            .await?;
        if item_ids.is_empty() {
            return Err(ServiceError::validation("no items to remove"));
        }

        let mut changes = Vec::with_capacity(item_ids.len());
        for &item_id in &item_ids {
            let item = self
                .items
                .get(item_id)
                .await?
                .ok_or(ServiceError::ItemNotFound)?;
            if item.notification_id != notification_id {
                return Err(ServiceError::validation(
                    "item does not belong to this notification",
                ));
            }
            changes.push(item_change(&item));
        }

        self.items.delete_many(&item_ids).await?;
        self.record_item_change(actor, &notification, ChangeType::ItemsRemoved, &changes)
            .await;
        Ok(())
    }
}
