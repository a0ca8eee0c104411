use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorpool_core::{DomainError, DomainResult, ItemId, NotificationId, ShopId};

/// A part line item attached to a maintenance notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    pub id: ItemId,
    pub shop_id: ShopId,
    pub notification_id: NotificationId,
    pub niin: String,
    pub nomenclature: String,
    pub quantity: i32,
    pub save_time: DateTime<Utc>,
}

/// Field values for one new item, before ids and timestamps are stamped.
/// Also the shape embedded in item audit payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub niin: String,
    pub nomenclature: String,
    pub quantity: i32,
}

impl NotificationItem {
    pub fn new(shop_id: ShopId, notification_id: NotificationId, draft: ItemDraft) -> DomainResult<Self> {
        if draft.niin.trim().is_empty() {
            return Err(DomainError::validation("item niin cannot be empty"));
        }
        if draft.quantity < 1 {
            return Err(DomainError::validation("item quantity must be at least 1"));
        }
        Ok(Self {
            id: ItemId::new(),
            shop_id,
            notification_id,
            niin: draft.niin,
            nomenclature: draft.nomenclature,
            quantity: draft.quantity,
            save_time: Utc::now(),
        })
    }

    /// Summary triple recorded in audit payloads.
    pub fn draft(&self) -> ItemDraft {
        ItemDraft {
            niin: self.niin.clone(),
            nomenclature: self.nomenclature.clone(),
            quantity: self.quantity,
        }
    }
}
