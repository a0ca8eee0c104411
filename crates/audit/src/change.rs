use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorpool_core::{ChangeRecordId, DomainError, NotificationId, ShopId, UserId, VehicleId};

/// What kind of mutation a record describes. Wire values are stable; readers
/// of old rows depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Create,
    Update,
    Complete,
    Reopen,
    Delete,
    ItemsAdded,
    ItemsRemoved,
    VehicleDeleted,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
            ChangeType::Complete => "complete",
            ChangeType::Reopen => "reopen",
            ChangeType::Delete => "delete",
            ChangeType::ItemsAdded => "items_added",
            ChangeType::ItemsRemoved => "items_removed",
            ChangeType::VehicleDeleted => "vehicle_deleted",
        }
    }
}

impl core::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ChangeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(ChangeType::Create),
            "update" => Ok(ChangeType::Update),
            "complete" => Ok(ChangeType::Complete),
            "reopen" => Ok(ChangeType::Reopen),
            "delete" => Ok(ChangeType::Delete),
            "items_added" => Ok(ChangeType::ItemsAdded),
            "items_removed" => Ok(ChangeType::ItemsRemoved),
            "vehicle_deleted" => Ok(ChangeType::VehicleDeleted),
            other => Err(DomainError::validation(format!("unknown change type: {other}"))),
        }
    }
}

/// One immutable audit log entry.
///
/// Vehicle and notification ids are weak references: the record deliberately
/// outlives the rows it points at, and the denormalized title/type/admin
/// fields keep it readable once they are gone. Nothing in the system updates
/// or deletes a record after it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub id: ChangeRecordId,
    pub notification_id: Option<NotificationId>,
    pub shop_id: ShopId,
    pub vehicle_id: Option<VehicleId>,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
    pub change_type: ChangeType,
    pub field_changes: serde_json::Value,
    pub notification_title: Option<String>,
    pub notification_type: Option<String>,
    pub vehicle_admin: Option<String>,
}

impl ChangeRecord {
    pub fn new(
        shop_id: ShopId,
        changed_by: UserId,
        change_type: ChangeType,
        field_changes: serde_json::Value,
    ) -> Self {
        Self {
            id: ChangeRecordId::new(),
            notification_id: None,
            shop_id,
            vehicle_id: None,
            changed_by,
            changed_at: Utc::now(),
            change_type,
            field_changes,
            notification_title: None,
            notification_type: None,
            vehicle_admin: None,
        }
    }

    /// Attach the notification context (id plus denormalized title/type).
    pub fn with_notification(
        mut self,
        notification_id: NotificationId,
        title: impl Into<String>,
        notification_type: impl Into<String>,
    ) -> Self {
        self.notification_id = Some(notification_id);
        self.notification_title = Some(title.into());
        self.notification_type = Some(notification_type.into());
        self
    }

    /// Attach the vehicle context (id plus denormalized admin name).
    pub fn with_vehicle(mut self, vehicle_id: VehicleId, vehicle_admin: impl Into<String>) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self.vehicle_admin = Some(vehicle_admin.into());
        self
    }
}
