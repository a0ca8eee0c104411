use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorpool_core::{MembershipId, ShopId, UserId};

use crate::role::Role;

/// The (shop, user, role) fact granting access to a shop's resources.
///
/// At most one row exists per (shop, user) pair; the stores enforce the
/// uniqueness, this type only carries the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub shop_id: ShopId,
    pub user_id: UserId,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(shop_id: ShopId, user_id: UserId, role: Role) -> Self {
        Self {
            id: MembershipId::new(),
            shop_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_membership_carries_role() {
        let shop_id = ShopId::new();
        let user_id = UserId::new();
        let membership = Membership::new(shop_id, user_id, Role::Admin);
        assert_eq!(membership.shop_id, shop_id);
        assert_eq!(membership.user_id, user_id);
        assert!(membership.role.is_admin());
    }
}
