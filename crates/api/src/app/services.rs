//! Store selection and service construction.

use std::sync::Arc;

use motorpool_auth::Authorizer;
use motorpool_infra::{
    ChangeStore, InviteStore, ItemStore, ListStore, MembershipStore, NotificationStore, ShopStore,
    VehicleStore,
};
use motorpool_service::{
    AuditRecorder, ChangeQueryService, InviteService, ItemService, ListService, MemberService,
    NotificationService, ShopService, VehicleService,
};

/// All service entry points, shared by every handler through an Extension.
pub struct AppServices {
    pub shops: ShopService,
    pub members: MemberService,
    pub invites: InviteService,
    pub vehicles: VehicleService,
    pub notifications: NotificationService,
    pub items: ItemService,
    pub lists: ListService,
    pub changes: ChangeQueryService,
}

/// Wire every service over one store value. Both store implementations
/// carry all the store traits, so a single `Arc` fans out to each seam.
pub fn build_services<S>(store: Arc<S>) -> AppServices
where
    S: ShopStore
        + MembershipStore
        + InviteStore
        + VehicleStore
        + NotificationStore
        + ItemStore
        + ListStore
        + ChangeStore
        + 'static,
{
    let authorizer = Authorizer::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    );
    let recorder = AuditRecorder::new(store.clone());

    AppServices {
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
            recorder,
        ),
        lists: ListService::new(store.clone(), store.clone(), authorizer.clone()),
        changes: ChangeQueryService::new(store.clone(), store.clone(), store, authorizer),
    }
}
