//! Shared fixtures for service tests: one in-memory store wired through
//! every service, plus helpers for the common setup steps.

use std::sync::Arc;

use motorpool_auth::Authorizer;
use motorpool_core::UserId;
use motorpool_infra::InMemoryStore;
use motorpool_shops::Shop;
use motorpool_vehicles::{Vehicle, VehicleDraft};

use crate::changes::ChangeQueryService;
use crate::invite::InviteService;
use crate::item::ItemService;
use crate::list::ListService;
use crate::member::MemberService;
use crate::notification::NotificationService;
use crate::recorder::AuditRecorder;
use crate::shop::ShopService;
use crate::vehicle::VehicleService;

pub struct TestEnv {
    pub store: Arc<InMemoryStore>,
    pub authorizer: Authorizer,
    pub shops: ShopService,
    pub members: MemberService,
    pub invites: InviteService,
    pub vehicles: VehicleService,
    pub notifications: NotificationService,
    pub items: ItemService,
    pub lists: ListService,
    pub changes: ChangeQueryService,
}

impl TestEnv {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let authorizer = Authorizer::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        let recorder = AuditRecorder::new(store.clone());
        Self {
            shops: ShopService::new(store.clone(), store.clone(), authorizer.clone()),
            members: MemberService::new(store.clone(), store.clone(), authorizer.clone()),
            invites: InviteService::new(store.clone(), store.clone(), authorizer.clone()),
            vehicles: VehicleService::new(store.clone(), authorizer.clone(), recorder.clone()),
            notifications: NotificationService::new(
                store.clone(),
                store.clone(),
                authorizer.clone(),
                recorder.clone(),
            ),
            items: ItemService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                authorizer.clone(),
                recorder.clone(),
            ),
            lists: ListService::new(store.clone(), store.clone(), authorizer.clone()),
            changes: ChangeQueryService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                authorizer.clone(),
            ),
            store,
            authorizer,
        }
    }

    /// Create a shop through the service; the returned user is its admin.
    pub async fn shop_with_admin(&self, admin_only_lists: bool) -> (Shop, UserId) {
        let admin = UserId::new();
        let shop = self
            .shops
            .create(admin, "Bravo Motor Pool", None, admin_only_lists)
            .await
            .unwrap();
        (shop, admin)
    }

    /// Join `user` to `shop` as a plain member via an invite redemption.
    pub async fn join_as_member(&self, shop: &Shop, admin: UserId) -> UserId {
        let user = UserId::new();
        let code = self.invites.generate(admin, shop.id, None, None).await.unwrap();
        self.invites.redeem(user, &code.code).await.unwrap();
        user
    }
}

pub fn test_vehicle_draft() -> VehicleDraft {
    VehicleDraft {
        niin: "011234567".to_string(),
        admin: "SSG Vasquez".to_string(),
        model: "M1083".to_string(),
        serial: "FM-2291".to_string(),
        uoc: String::new(),
        mileage: 1200,
        hours: 88,
        comment: String::new(),
    }
}

pub async fn add_vehicle(env: &TestEnv, shop: &Shop, creator: UserId) -> Vehicle {
    env.vehicles
        .create(creator, shop.id, test_vehicle_draft())
        .await
        .unwrap()
}
