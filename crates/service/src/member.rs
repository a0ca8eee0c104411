use std::sync::Arc;

use tracing::instrument;

use motorpool_auth::Authorizer;
use motorpool_core::{ShopId, UserId};
use motorpool_infra::{MembershipStore, ShopStore};
use motorpool_shops::{Membership, Role};

use crate::error::{ServiceError, ServiceResult};

/// Membership management: listing, leaving, admin-gated removal and
/// promotion.
#[derive(Clone)]
pub struct MemberService {
    memberships: Arc<dyn MembershipStore>,
    shops: Arc<dyn ShopStore>,
    authorizer: Authorizer,
}

impl MemberService {
    pub fn new(
        memberships: Arc<dyn MembershipStore>,
        shops: Arc<dyn ShopStore>,
        authorizer: Authorizer,
    ) -> Self {
        Self {
            memberships,
            shops,
            authorizer,
        }
    }

    /// Member-gated listing of a shop's memberships.
    pub async fn members(&self, actor: UserId, shop_id: ShopId) -> ServiceResult<Vec<Membership>> {
        self.authorizer.require_member(actor, shop_id).await?;
        Ok(self.memberships.list_for_shop(shop_id).await?)
    }

    /// Leave a shop. The last member to leave takes the shop (and
    /// everything it owns, except change records) with them.
    #[instrument(skip(self), fields(actor = %actor, shop_id = %shop_id))]
    pub async fn leave(&self, actor: UserId, shop_id: ShopId) -> ServiceResult<()> {
        self.authorizer.require_member(actor, shop_id).await?;
        self.memberships.delete(shop_id, actor).await?;

        if self.memberships.count_for_shop(shop_id).await? == 0 {
            self.shops.delete(shop_id).await?;
        }
        Ok(())
    }

    /// Admin-gated removal of another member. Removing yourself is
    /// rejected; `leave` is the path for that.
    #[instrument(skip(self), fields(actor = %actor, shop_id = %shop_id, target = %target))]
    pub async fn remove(&self, actor: UserId, shop_id: ShopId, target: UserId) -> ServiceResult<()> {
        self.authorizer.require_admin(actor, shop_id).await?;
        if target == actor {
            return Err(ServiceError::validation(
                "admins cannot remove themselves; leave the shop instead",
            ));
        }
        self.memberships.delete(shop_id, target).await?;
        Ok(())
    }

    /// Admin-gated promotion of a current Member to Admin.
    #[instrument(skip(self), fields(actor = %actor, shop_id = %shop_id, target = %target))]
    pub async fn promote(
        &self,
        actor: UserId,
        shop_id: ShopId,
        target: UserId,
    ) -> ServiceResult<Membership> {
        self.authorizer.require_admin(actor, shop_id).await?;

        let membership = self
            .memberships
            .get(shop_id, target)
            .await?
            .ok_or_else(|| ServiceError::validation("target user is not a member of this shop"))?;
        if membership.role.is_admin() {
            return Err(ServiceError::validation("target user is already an admin"));
        }

        self.memberships
            .update_role(shop_id, target, Role::Admin)
            .await?;
        Ok(Membership {
            role: Role::Admin,
            ..membership
        })
    }
}
