use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use motorpool_auth::Authorizer;
use motorpool_core::{InviteCodeId, ShopId, UserId};
use motorpool_infra::{InviteStore, MembershipStore, StoreError};
use motorpool_shops::{
    generate_code, max_generation_attempts, normalize_code, InviteCode, InviteUsability,
    Membership, Role,
};

use crate::error::{ServiceError, ServiceResult};

/// Invite code lifecycle: member-gated generation, redemption, admin-gated
/// deactivation and deletion.
#[derive(Clone)]
pub struct InviteService {
    invites: Arc<dyn InviteStore>,
    memberships: Arc<dyn MembershipStore>,
    authorizer: Authorizer,
}

/// The strongest reason a dead code is dead, as a service error.
fn usability_error(usability: InviteUsability) -> ServiceError {
    match usability {
        InviteUsability::Deactivated => ServiceError::InviteCodeInvalid,
        InviteUsability::Expired => ServiceError::InviteCodeExpired,
        // `Usable` can only reach here when a racing consume beat us to the
        // last use; report it the same way as plain exhaustion.
        InviteUsability::Exhausted | InviteUsability::Usable => ServiceError::InviteCodeExhausted,
    }
}

impl InviteService {
    pub fn new(
        invites: Arc<dyn InviteStore>,
        memberships: Arc<dyn MembershipStore>,
        authorizer: Authorizer,
    ) -> Self {
        Self {
            invites,
            memberships,
            authorizer,
        }
    }

    /// Generate a fresh code for a shop. Any member may do this; managing
    /// codes afterwards (deactivate/delete) is admin-only.
    ///
    /// The code space is 4 random bytes, so collisions are a correctness
    /// concern, not a curiosity: inserts retry with a new code until the
    /// attempt budget runs out.
    #[instrument(skip(self), fields(actor = %actor, shop_id = %shop_id))]
    pub async fn generate(
        &self,
        actor: UserId,
        shop_id: ShopId,
        max_uses: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> ServiceResult<InviteCode> {
        self.authorizer.require_member(actor, shop_id).await?;

        for _ in 0..max_generation_attempts() {
            let code = InviteCode::new(shop_id, actor, generate_code(), max_uses, expires_at)?;
            match self.invites.insert(code.clone()).await {
                Ok(()) => return Ok(code),
                Err(StoreError::Conflict(_)) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(ServiceError::InviteCodeGeneration)
    }

    /// Member-gated listing of a shop's codes.
    pub async fn list(&self, actor: UserId, shop_id: ShopId) -> ServiceResult<Vec<InviteCode>> {
        self.authorizer.require_member(actor, shop_id).await?;
        Ok(self.invites.list_for_shop(shop_id).await?)
    }

    /// Redeem a code, joining its shop as a Member.
    ///
    /// The use is consumed through one atomic conditional update whose
    /// affected-row count gates the membership insert, so `current_uses`
    /// can never pass `max_uses` however many redeemers race. If the
    /// membership insert then loses a same-user race, the consumed use is
    /// given back before `AlreadyMember` is returned.
    #[instrument(skip(self, code), fields(actor = %actor))]
    pub async fn redeem(&self, actor: UserId, code: &str) -> ServiceResult<Membership> {
        let normalized = normalize_code(code);
        let invite = self
            .invites
            .get_by_code(&normalized)
            .await?
            .ok_or(ServiceError::InviteCodeInvalid)?;

        let now = Utc::now();
        match invite.usability(now) {
            InviteUsability::Usable => {}
            dead => return Err(usability_error(dead)),
        }

        // Sequential-path precheck: the second redemption by the same user
        // must fail AlreadyMember without burning a use.
        if self
            .memberships
            .get(invite.shop_id, actor)
            .await?
            .is_some()
        {
            return Err(ServiceError::AlreadyMember);
        }

        if !self.invites.consume_use(invite.id, now).await? {
            // Someone else got there between our read and the consume;
            // re-read to report the accurate reason.
            let current = self
                .invites
                .get(invite.id)
                .await?
                .ok_or(ServiceError::InviteCodeInvalid)?;
            return Err(usability_error(current.usability(now)));
        }

        let membership = Membership::new(invite.shop_id, actor, Role::Member);
        match self.memberships.insert(membership.clone()).await {
            Ok(()) => Ok(membership),
            Err(err) => {
                // The use was consumed but no member was admitted; give it
                // back so the code's budget stays accurate.
                if let Err(release_err) = self.invites.release_use(invite.id).await {
                    tracing::warn!(
                        error = %release_err,
                        code_id = %invite.id,
                        "failed to release a consumed invite use"
                    );
                }
                match err {
                    StoreError::Conflict(_) => Err(ServiceError::AlreadyMember),
                    other => Err(other.into()),
                }
            }
        }
    }

    /// Admin-gated soft kill.
    #[instrument(skip(self), fields(actor = %actor, code_id = %code_id))]
    pub async fn deactivate(&self, actor: UserId, code_id: InviteCodeId) -> ServiceResult<()> {
        let invite = self
            .invites
            .get(code_id)
            .await?
            .ok_or(ServiceError::InviteCodeInvalid)?;
        self.authorizer.require_admin(actor, invite.shop_id).await?;
        self.invites.deactivate(code_id).await?;
        Ok(())
    }

    /// Admin-gated hard delete.
    #[instrument(skip(self), fields(actor = %actor, code_id = %code_id))]
    pub async fn delete(&self, actor: UserId, code_id: InviteCodeId) -> ServiceResult<()> {
        let invite = self
            .invites
            .get(code_id)
            .await?
            .ok_or(ServiceError::InviteCodeInvalid)?;
        self.authorizer.require_admin(actor, invite.shop_id).await?;
        self.invites.delete(code_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    use motorpool_auth::AccessError;

    use crate::testutil::TestEnv;

    #[tokio::test]
    async fn generated_codes_are_member_gated_and_listed() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let member = env.join_as_member(&shop, admin).await;

        match env.invites.generate(UserId::new(), shop.id, None, None).await {
            Err(ServiceError::Access(AccessError::AccessDenied)) => {}
            other => panic!("Expected AccessDenied, got {other:?}"),
        }

        // Plain members may generate; management stays admin-only.
        let code = env.invites.generate(member, shop.id, Some(5), None).await.unwrap();
        assert_eq!(code.current_uses, 0);
        assert!(code.is_active);

        let listed = env.invites.list(member, shop.id).await.unwrap();
        assert!(listed.iter().any(|c| c.id == code.id));
    }

    #[tokio::test]
    async fn redeeming_joins_the_shop_and_counts_the_use() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let code = env.invites.generate(admin, shop.id, Some(1), None).await.unwrap();

        let user = UserId::new();
        let membership = env.invites.redeem(user, &code.code).await.unwrap();
        assert_eq!(membership.shop_id, shop.id);
        assert_eq!(membership.role, Role::Member);
        assert!(env.authorizer.is_member(user, shop.id).await.unwrap());

        let stored = motorpool_infra::InviteStore::get(&*env.store, code.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_uses, 1);
    }

    #[tokio::test]
    async fn redemption_is_case_insensitive() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let code = env.invites.generate(admin, shop.id, None, None).await.unwrap();

        let user = UserId::new();
        env.invites
            .redeem(user, &code.code.to_lowercase())
            .await
            .unwrap();
        assert!(env.authorizer.is_member(user, shop.id).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_code_is_invalid() {
        let env = TestEnv::new();
        let (_shop, _admin) = env.shop_with_admin(false).await;

        match env.invites.redeem(UserId::new(), "ZZ99ZZ99").await {
            Err(ServiceError::InviteCodeInvalid) => {}
            other => panic!("Expected InviteCodeInvalid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn expired_code_is_reported_as_expired() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let expires = Utc::now() - Duration::minutes(1);
        let code = env
            .invites
            .generate(admin, shop.id, None, Some(expires))
            .await
            .unwrap();

        match env.invites.redeem(UserId::new(), &code.code).await {
            Err(ServiceError::InviteCodeExpired) => {}
            other => panic!("Expected InviteCodeExpired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exhausted_code_rejects_the_next_redeemer() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let code = env.invites.generate(admin, shop.id, Some(1), None).await.unwrap();

        env.invites.redeem(UserId::new(), &code.code).await.unwrap();

        match env.invites.redeem(UserId::new(), &code.code).await {
            Err(ServiceError::InviteCodeExhausted) => {}
            other => panic!("Expected InviteCodeExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_redemption_by_the_same_user_does_not_burn_a_use() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let code = env.invites.generate(admin, shop.id, Some(5), None).await.unwrap();

        let user = UserId::new();
        env.invites.redeem(user, &code.code).await.unwrap();
        match env.invites.redeem(user, &code.code).await {
            Err(ServiceError::AlreadyMember) => {}
            other => panic!("Expected AlreadyMember, got {other:?}"),
        }

        let stored = motorpool_infra::InviteStore::get(&*env.store, code.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_uses, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_redeemers_admit_exactly_one_member() {
        let env = Arc::new(TestEnv::new());
        let (shop, admin) = env.shop_with_admin(false).await;
        let code = env.invites.generate(admin, shop.id, Some(1), None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..12 {
            let env = env.clone();
            let code = code.code.clone();
            handles.push(tokio::spawn(async move {
                env.invites.redeem(UserId::new(), &code).await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(ServiceError::InviteCodeExhausted) => {}
                Err(other) => panic!("unexpected redemption error: {other:?}"),
            }
        }
        assert_eq!(admitted, 1);

        let stored = motorpool_infra::InviteStore::get(&*env.store, code.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_uses, 1);
    }

    #[tokio::test]
    async fn deactivated_code_reads_as_invalid_to_redeemers() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let member = env.join_as_member(&shop, admin).await;
        let code = env.invites.generate(admin, shop.id, None, None).await.unwrap();

        // Management is admin-only even for the member who created a code.
        match env.invites.deactivate(member, code.id).await {
            Err(ServiceError::Access(AccessError::AdminRequired)) => {}
            other => panic!("Expected AdminRequired, got {other:?}"),
        }

        env.invites.deactivate(admin, code.id).await.unwrap();
        match env.invites.redeem(UserId::new(), &code.code).await {
            Err(ServiceError::InviteCodeInvalid) => {}
            other => panic!("Expected InviteCodeInvalid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_removes_the_code_entirely() {
        let env = TestEnv::new();
        let (shop, admin) = env.shop_with_admin(false).await;
        let code = env.invites.generate(admin, shop.id, None, None).await.unwrap();

        env.invites.delete(admin, code.id).await.unwrap();
        match env.invites.redeem(UserId::new(), &code.code).await {
            Err(ServiceError::InviteCodeInvalid) => {}
            other => panic!("Expected InviteCodeInvalid, got {other:?}"),
        }
        match env.invites.delete(admin, code.id).await {
            Err(ServiceError::InviteCodeInvalid) => {}
            other => panic!("Expected InviteCodeInvalid, got {other:?}"),
        }
    }
}
