use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorpool_core::{DomainError, DomainResult, ShopId, UserId};

/// A shop: the tenant boundary every authorization decision is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    pub details: Option<String>,
    /// When true, list creation/modification is restricted to admins.
    pub admin_only_lists: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied by an admin; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopUpdate {
    pub name: Option<String>,
    pub details: Option<String>,
    pub admin_only_lists: Option<bool>,
}

impl Shop {
    pub fn new(
        name: impl Into<String>,
        details: Option<String>,
        admin_only_lists: bool,
        created_by: UserId,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("shop name cannot be empty"));
        }
        let now = Utc::now();
        Ok(Self {
            id: ShopId::new(),
            name,
            details,
            admin_only_lists,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: ShopUpdate) -> DomainResult<()> {
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("shop name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(details) = update.details {
            self.details = Some(details);
        }
        if let Some(admin_only_lists) = update.admin_only_lists {
            self.admin_only_lists = admin_only_lists;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_id() -> UserId {
        UserId::new()
    }

    #[test]
    fn new_shop_defaults() {
        let shop = Shop::new("Bravo Motor Pool", None, false, test_user_id()).unwrap();
        assert!(!shop.admin_only_lists);
        assert_eq!(shop.created_at, shop.updated_at);
    }

    #[test]
    fn empty_name_is_rejected() {
        match Shop::new("   ", None, false, test_user_id()) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("name")),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn apply_update_only_touches_provided_fields() {
        let mut shop = Shop::new("Bravo", Some("bay 3".into()), false, test_user_id()).unwrap();
        shop.apply_update(ShopUpdate {
            admin_only_lists: Some(true),
            ..ShopUpdate::default()
        })
        .unwrap();
        assert_eq!(shop.name, "Bravo");
        assert_eq!(shop.details.as_deref(), Some("bay 3"));
        assert!(shop.admin_only_lists);
    }

    #[test]
    fn apply_update_rejects_blank_name() {
        let mut shop = Shop::new("Bravo", None, false, test_user_id()).unwrap();
        let err = shop
            .apply_update(ShopUpdate {
                name: Some("".into()),
                ..ShopUpdate::default()
            })
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
