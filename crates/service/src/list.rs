use std::sync::Arc;

use tracing::instrument;

use motorpool_auth::{AccessError, Authorizer};
use motorpool_core::{ListId, ShopId, UserId};
use motorpool_infra::{ListStore, ShopStore};
use motorpool_shops::ShopList;

use crate::error::ServiceResult;

/// Shop quick lists, mutated under the per-shop `admin_only_lists` gate.
#[derive(Clone)]
pub struct ListService {
    lists: Arc<dyn ListStore>,
    shops: Arc<dyn ShopStore>,
    authorizer: Authorizer,
}

impl ListService {
    pub fn new(lists: Arc<dyn ListStore>, shops: Arc<dyn ShopStore>, authorizer: Authorizer) -> Self {
        Self {
            lists,
            shops,
            authorizer,
        }
    }

    /// Create a list. When the shop sets `admin_only_lists`, only admins may;
    /// otherwise any member.
    #[instrument(skip(self, description), fields(actor = %actor, shop_id = %shop_id))]
    pub async fn create(
        &self,
        actor: UserId,
        shop_id: ShopId,
        description: impl Into<String>,
    ) -> ServiceResult<ShopList> {
        let shop = self
            .shops
            .get(shop_id)
            .await?
            .ok_or(AccessError::ShopNotFound(shop_id))?;
        let allowed = if shop.admin_only_lists {
            self.authorizer.is_admin(actor, shop_id).await?
        } else {
            self.authorizer.is_member(actor, shop_id).await?
        };
        if !allowed {
            return Err(AccessError::AccessDenied.into());
        }

        let list = ShopList::new(shop_id, actor, description);
        self.lists.insert(list.clone()).await?;
        Ok(list)
    }

    /// Member-gated listing of a shop's lists.
    pub async fn list(&self, actor: UserId, shop_id: ShopId) -> ServiceResult<Vec<ShopList>> {
        self.authorizer.require_member(actor, shop_id).await?;
        Ok(self.lists.list_for_shop(shop_id).await?)
    }

    /// Replace a list's description, under the same gate as creation.
    #[instrument(skip(self, description), fields(actor = %actor, list_id = %list_id))]
    pub async fn update(
        &self,
        actor: UserId,
        list_id: ListId,
        description: impl Into<String>,
    ) -> ServiceResult<ShopList> {
        if !self.authorizer.can_modify_list(actor, list_id).await? {
            return Err(AccessError::AccessDenied.into());
        }
        let mut list = self
            .lists
            .get(list_id)
            .await?
            .ok_or(AccessError::ListNotFound(list_id))?;
        list.set_description(description);
        self.lists.save(list.clone()).await?;
        Ok(list)
    }

    /// Delete a list, under the same gate as creation.
    #[instrument(skip(self), fields(actor = %actor, list_id = %list_id))]
    pub async fn delete(&self, actor: UserId, list_id: ListId) -> ServiceResult<()> {
        if !self.authorizer.can_modify_list(actor, list_id).await? {
            return Err(AccessError::AccessDenied.into());
        }
        self.lists.delete(list_id).await?;
        Ok(())
    }
}
