use std::sync::Arc;

use tracing::instrument;

use motorpool_auth::{AccessError, Authorizer};
use motorpool_core::{ShopId, UserId};
use motorpool_infra::{MembershipStore, ShopStore};
use motorpool_shops::{Membership, Role, Shop, ShopUpdate};

use crate::error::ServiceResult;

/// Shop lifecycle: creation (with its creator as the one admin), reads,
/// admin-gated updates and deletion.
#[derive(Clone)]
pub struct ShopService {
    shops: Arc<dyn ShopStore>,
    memberships: Arc<dyn MembershipStore>,
    authorizer: Authorizer,
}

impl ShopService {
    pub fn new(
        shops: Arc<dyn ShopStore>,
        memberships: Arc<dyn MembershipStore>,
        authorizer: Authorizer,
    ) -> Self {
        Self {
            shops,
            memberships,
            authorizer,
        }
    }

    /// Create a shop. The creator's Admin membership is written in the same
    /// atomic store step; a shop never exists without its admin.
    #[instrument(skip(self, name, details), fields(actor = %actor))]
    pub async fn create(
        &self,
        actor: UserId,
        name: impl Into<String>,
        details: Option<String>,
        admin_only_lists: bool,
    ) -> ServiceResult<Shop> {
        let shop = Shop::new(name, details, admin_only_lists, actor)?;
        let admin = Membership::new(shop.id, actor, Role::Admin);
        self.shops.create_with_admin(shop.clone(), admin).await?;
        Ok(shop)
    }

    /// Fetch one shop; member-gated.
    pub async fn get(&self, actor: UserId, shop_id: ShopId) -> ServiceResult<Shop> {
        let shop = self
            .shops
            .get(shop_id)
            .await?
            .ok_or(AccessError::ShopNotFound(shop_id))?;
        self.authorizer.require_member(actor, shop_id).await?;
        Ok(shop)
    }

    /// Every shop the actor belongs to.
    pub async fn list_for_user(&self, actor: UserId) -> ServiceResult<Vec<Shop>> {
        let memberships = self.memberships.list_for_user(actor).await?;
        let mut shops = Vec::with_capacity(memberships.len());
        for membership in memberships {
            // A membership can briefly outlive its shop during deletion.
            if let Some(shop) = self.shops.get(membership.shop_id).await? {
                shops.push(shop);
            }
        }
        Ok(shops)
    }

    /// Admin-gated partial update.
    #[instrument(skip(self, update), fields(actor = %actor, shop_id = %shop_id))]
    pub async fn update(
        &self,
        actor: UserId,
        shop_id: ShopId,
        update: ShopUpdate,
    ) -> ServiceResult<Shop> {
        let mut shop = self
            .shops
            .get(shop_id)
            .await?
            .ok_or(AccessError::ShopNotFound(shop_id))?;
        self.authorizer.require_admin(actor, shop_id).await?;
        shop.apply_update(update)?;
        self.shops.save(shop.clone()).await?;
        Ok(shop)
    }

    /// Admin-gated deletion; owned rows cascade, change records stay.
    #[instrument(skip(self), fields(actor = %actor, shop_id = %shop_id))]
    pub async fn delete(&self, actor: UserId, shop_id: ShopId) -> ServiceResult<()> {
        if self.shops.get(shop_id).await?.is_none() {
            return Err(AccessError::ShopNotFound(shop_id).into());
        }
        self.authorizer.require_admin(actor, shop_id).await?;
        self.shops.delete(shop_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::ServiceError;
    use crate::testutil::TestEnv;

    #[tokio::test]
    async fn creator_becomes_the_shops_admin() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;

        assert!(env.authorizer.is_admin(admin, shop.id).await.unwrap());
        assert_eq!(shop.created_by, admin);
    }

    #[tokio::test]
    async fn get_is_member_gated() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;

        assert_eq!(env.shops.get(admin, shop.id).await.unwrap().id, shop.id);

        match env.shops.get(UserId::new(), shop.id).await {
            Err(ServiceError::Access(AccessError::AccessDenied)) => {}
            other => panic!("Expected AccessDenied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_shop_is_not_found() {
        let env = TestEnv::new();
        match env.shops.get(UserId::new(), ShopId::new()).await {
            Err(ServiceError::Access(AccessError::ShopNotFound(_))) => {}
            other => panic!("Expected ShopNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_is_admin_gated() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let member = env.join_as_member(&shop, admin).await;

        let update = ShopUpdate {
            admin_only_lists: Some(true),
            ..ShopUpdate::default()
        };
        match env.shops.update(member, shop.id, update.clone()).await {
            Err(ServiceError::Access(AccessError::AdminRequired)) => {}
            other => panic!("Expected AdminRequired, got {other:?}"),
        }

        let updated = env.shops.update(admin, shop.id, update).await.unwrap();
        assert!(updated.admin_only_lists);
    }

    #[tokio::test]
    async fn list_for_user_returns_joined_shops_only() {
        let env = TestEnv::new();
        let (shop_a, admin) = env.shop_with_admin(false).await;
        let (_other, _other_admin) = env.shop_with_admin(false).await;
        let member = env.join_as_member(&shop_a, admin).await;

        let shops = env.shops.list_for_user(member).await.unwrap();
        assert_eq!(shops.len(), 1);
        assert_eq!(shops[0].id, shop_a.id);
    }

    #[tokio::test]
    async fn delete_is_admin_gated_and_removes_the_shop() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let member = env.join_as_member(&shop, admin).await;

        match env.shops.delete(member, shop.id).await {
            Err(ServiceError::Access(AccessError::AdminRequired)) => {}
            other => panic!("Expected AdminRequired, got {other:?}"),
        }

        env.shops.delete(admin, shop.id).await.unwrap();
        match env.shops.get(admin, shop.id).await {
            Err(ServiceError::Access(AccessError::ShopNotFound(_))) => {}
            other => panic!("Expected ShopNotFound, got {other:?}"),
        }
    }
}
