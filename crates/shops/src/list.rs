use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorpool_core::{ListId, ShopId, UserId};

/// A shop quick list. Plain data; the design interest is the per-shop
/// `admin_only_lists` gate applied when these rows are mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopList {
    pub id: ListId,
    pub shop_id: ShopId,
    pub created_by: UserId,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShopList {
    pub fn new(shop_id: ShopId, created_by: UserId, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ListId::new(),
            shop_id,
            created_by,
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.updated_at = Utc::now();
    }
}
