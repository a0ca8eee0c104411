use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use motorpool_audit::ChangeRecord;
use motorpool_core::{
    InviteCodeId, ItemId, ListId, NotificationId, ShopId, UserId, VehicleId,
};
use motorpool_shops::{InviteCode, Membership, Role, Shop, ShopList};
use motorpool_vehicles::{NotificationItem, Vehicle, VehicleNotification};

use super::r#trait::{
    ChangeStore, InviteStore, ItemStore, ListStore, MembershipStore, NotificationStore, ShopStore,
    StoreError, StoreResult, VehicleStore,
};

/// All tables behind one lock, so multi-table writes (shop + creator
/// membership, cascading deletes) are atomic the same way a database
/// transaction makes them atomic.
#[derive(Debug, Default)]
struct State {
    shops: HashMap<ShopId, Shop>,
    memberships: HashMap<(ShopId, UserId), Membership>,
    invites: HashMap<InviteCodeId, InviteCode>,
    /// code string (normalized) → id; enforces store-wide code uniqueness.
    invite_codes: HashMap<String, InviteCodeId>,
    vehicles: HashMap<VehicleId, Vehicle>,
    notifications: HashMap<NotificationId, VehicleNotification>,
    items: HashMap<ItemId, NotificationItem>,
    lists: HashMap<ListId, ShopList>,
    changes: Vec<ChangeRecord>,
}

/// In-memory implementation of every store trait.
///
/// Intended for tests/dev. Not optimized for performance; correctness
/// (uniqueness, atomic consume, cascades) matches the Postgres schema.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

impl State {
    /// Remove everything one vehicle owns (notifications and their items).
    /// Change records are left alone.
    fn cascade_vehicle(&mut self, vehicle_id: VehicleId) {
        let gone: Vec<NotificationId> = self
            .notifications
            .values()
            .filter(|n| n.vehicle_id == vehicle_id)
            .map(|n| n.id)
            .collect();
        self.notifications.retain(|_, n| n.vehicle_id != vehicle_id);
        self.items.retain(|_, i| !gone.contains(&i.notification_id));
    }
}

#[async_trait::async_trait]
impl ShopStore for InMemoryStore {
    async fn create_with_admin(&self, shop: Shop, admin: Membership) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.shops.contains_key(&shop.id) {
            return Err(StoreError::conflict(format!("shop {} already exists", shop.id)));
        }
        let pair = (admin.shop_id, admin.user_id);
        if state.memberships.contains_key(&pair) {
            return Err(StoreError::conflict(format!(
                "membership ({}, {}) already exists",
                pair.0, pair.1
            )));
        }
        state.shops.insert(shop.id, shop);
        state.memberships.insert(pair, admin);
        Ok(())
    }

    async fn get(&self, shop_id: ShopId) -> StoreResult<Option<Shop>> {
        Ok(self.read()?.shops.get(&shop_id).cloned())
    }

    async fn save(&self, shop: Shop) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.shops.contains_key(&shop.id) {
            return Err(StoreError::not_found(format!("shop {}", shop.id)));
        }
        state.shops.insert(shop.id, shop);
        Ok(())
    }

    async fn delete(&self, shop_id: ShopId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.shops.remove(&shop_id).is_none() {
            return Err(StoreError::not_found(format!("shop {shop_id}")));
        }
        state.memberships.retain(|(s, _), _| *s != shop_id);
        let dead_codes: Vec<String> = state
            .invites
            .values()
            .filter(|i| i.shop_id == shop_id)
            .map(|i| i.code.clone())
            .collect();
        for code in dead_codes {
            state.invite_codes.remove(&code);
        }
        state.invites.retain(|_, i| i.shop_id != shop_id);
        let dead_vehicles: Vec<VehicleId> = state
            .vehicles
            .values()
            .filter(|v| v.shop_id == shop_id)
            .map(|v| v.id)
            .collect();
        for vehicle_id in dead_vehicles {
            state.cascade_vehicle(vehicle_id);
        }
        state.vehicles.retain(|_, v| v.shop_id != shop_id);
        state.lists.retain(|_, l| l.shop_id != shop_id);
        // change records survive the shop on purpose
        Ok(())
    }
}

#[async_trait::async_trait]
impl MembershipStore for InMemoryStore {
    async fn insert(&self, membership: Membership) -> StoreResult<()> {
        let mut state = self.write()?;
        let pair = (membership.shop_id, membership.user_id);
        if state.memberships.contains_key(&pair) {
            return Err(StoreError::conflict(format!(
                "membership ({}, {}) already exists",
                pair.0, pair.1
            )));
        }
        state.memberships.insert(pair, membership);
        Ok(())
    }

    async fn get(&self, shop_id: ShopId, user_id: UserId) -> StoreResult<Option<Membership>> {
        Ok(self.read()?.memberships.get(&(shop_id, user_id)).cloned())
    }

    async fn delete(&self, shop_id: ShopId, user_id: UserId) -> StoreResult<()> {
        let mut state = self.write()?;
        state
            .memberships
            .remove(&(shop_id, user_id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(format!("membership ({shop_id}, {user_id})")))
    }

    async fn update_role(&self, shop_id: ShopId, user_id: UserId, role: Role) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.memberships.get_mut(&(shop_id, user_id)) {
            Some(membership) => {
                membership.role = role;
                Ok(())
            }
            None => Err(StoreError::not_found(format!(
                "membership ({shop_id}, {user_id})"
            ))),
        }
    }

    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<Membership>> {
        let state = self.read()?;
        let mut rows: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.shop_id == shop_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.joined_at);
        Ok(rows)
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Membership>> {
        let state = self.read()?;
        let mut rows: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.joined_at);
        Ok(rows)
    }

    async fn count_for_shop(&self, shop_id: ShopId) -> StoreResult<u64> {
        let state = self.read()?;
        Ok(state
            .memberships
            .values()
            .filter(|m| m.shop_id == shop_id)
            .count() as u64)
    }
}

#[async_trait::async_trait]
impl InviteStore for InMemoryStore {
    async fn insert(&self, code: InviteCode) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.invite_codes.contains_key(&code.code) {
            return Err(StoreError::conflict(format!(
                "invite code '{}' already exists",
                code.code
            )));
        }
        state.invite_codes.insert(code.code.clone(), code.id);
        state.invites.insert(code.id, code);
        Ok(())
    }

    async fn get(&self, code_id: InviteCodeId) -> StoreResult<Option<InviteCode>> {
        Ok(self.read()?.invites.get(&code_id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Option<InviteCode>> {
        let state = self.read()?;
        Ok(state
            .invite_codes
            .get(code)
            .and_then(|id| state.invites.get(id))
            .cloned())
    }

    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<InviteCode>> {
        let state = self.read()?;
        let mut rows: Vec<InviteCode> = state
            .invites
            .values()
            .filter(|i| i.shop_id == shop_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.created_at);
        Ok(rows)
    }

    async fn consume_use(&self, code_id: InviteCodeId, now: DateTime<Utc>) -> StoreResult<bool> {
        // One write lock spans the usability check and the increment; this
        // is the in-memory counterpart of the conditional UPDATE.
        let mut state = self.write()?;
        match state.invites.get_mut(&code_id) {
            Some(invite) if invite.is_usable(now) => {
                invite.current_uses += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::not_found(format!("invite code {code_id}"))),
        }
    }

    async fn release_use(&self, code_id: InviteCodeId) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.invites.get_mut(&code_id) {
            Some(invite) => {
                invite.current_uses = (invite.current_uses - 1).max(0);
                Ok(())
            }
            None => Err(StoreError::not_found(format!("invite code {code_id}"))),
        }
    }

    async fn deactivate(&self, code_id: InviteCodeId) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.invites.get_mut(&code_id) {
            Some(invite) => {
                invite.is_active = false;
                Ok(())
            }
            None => Err(StoreError::conflict(format!(
                "invite code {code_id} was removed concurrently"
            ))),
        }
    }

    async fn delete(&self, code_id: InviteCodeId) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.invites.remove(&code_id) {
            Some(invite) => {
                state.invite_codes.remove(&invite.code);
                Ok(())
            }
            None => Err(StoreError::conflict(format!(
                "invite code {code_id} was removed concurrently"
            ))),
        }
    }
}

#[async_trait::async_trait]
impl VehicleStore for InMemoryStore {
    async fn insert(&self, vehicle: Vehicle) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.vehicles.contains_key(&vehicle.id) {
            return Err(StoreError::conflict(format!(
                "vehicle {} already exists",
                vehicle.id
            )));
        }
        state.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    async fn get(&self, vehicle_id: VehicleId) -> StoreResult<Option<Vehicle>> {
        Ok(self.read()?.vehicles.get(&vehicle_id).cloned())
    }

    async fn save(&self, vehicle: Vehicle) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.vehicles.contains_key(&vehicle.id) {
            return Err(StoreError::not_found(format!("vehicle {}", vehicle.id)));
        }
        state.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    async fn delete(&self, vehicle_id: VehicleId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.vehicles.remove(&vehicle_id).is_none() {
            return Err(StoreError::not_found(format!("vehicle {vehicle_id}")));
        }
        state.cascade_vehicle(vehicle_id);
        Ok(())
    }

    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<Vehicle>> {
        let state = self.read()?;
        let mut rows: Vec<Vehicle> = state
            .vehicles
            .values()
            .filter(|v| v.shop_id == shop_id)
            .cloned()
            .collect();
        rows.sort_by_key(|v| v.save_time);
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl NotificationStore for InMemoryStore {
    async fn insert(&self, notification: VehicleNotification) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.notifications.contains_key(&notification.id) {
            return Err(StoreError::conflict(format!(
                "notification {} already exists",
                notification.id
            )));
        }
        state.notifications.insert(notification.id, notification);
        Ok(())
    }

    async fn get(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Option<VehicleNotification>> {
        Ok(self.read()?.notifications.get(&notification_id).cloned())
    }

    async fn save(&self, notification: VehicleNotification) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.notifications.contains_key(&notification.id) {
            return Err(StoreError::not_found(format!(
                "notification {}",
                notification.id
            )));
        }
        state.notifications.insert(notification.id, notification);
        Ok(())
    }

    async fn delete(&self, notification_id: NotificationId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.notifications.remove(&notification_id).is_none() {
            return Err(StoreError::not_found(format!(
                "notification {notification_id}"
            )));
        }
        state.items.retain(|_, i| i.notification_id != notification_id);
        Ok(())
    }

    async fn list_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> StoreResult<Vec<VehicleNotification>> {
        let state = self.read()?;
        let mut rows: Vec<VehicleNotification> = state
            .notifications
            .values()
            .filter(|n| n.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        rows.sort_by_key(|n| n.save_time);
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl ItemStore for InMemoryStore {
    async fn insert_many(&self, items: Vec<NotificationItem>) -> StoreResult<()> {
        let mut state = self.write()?;
        for item in &items {
            if state.items.contains_key(&item.id) {
                return Err(StoreError::conflict(format!("item {} already exists", item.id)));
            }
        }
        for item in items {
            state.items.insert(item.id, item);
        }
        Ok(())
    }

    async fn get(&self, item_id: ItemId) -> StoreResult<Option<NotificationItem>> {
        Ok(self.read()?.items.get(&item_id).cloned())
    }

    async fn delete_many(&self, item_ids: &[ItemId]) -> StoreResult<()> {
        let mut state = self.write()?;
        for item_id in item_ids {
            if !state.items.contains_key(item_id) {
                return Err(StoreError::not_found(format!("item {item_id}")));
            }
        }
        for item_id in item_ids {
            state.items.remove(item_id);
        }
        Ok(())
    }

    async fn list_for_notification(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Vec<NotificationItem>> {
        let state = self.read()?;
        let mut rows: Vec<NotificationItem> = state
            .items
            .values()
            .filter(|i| i.notification_id == notification_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| i.save_time);
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl ListStore for InMemoryStore {
    async fn insert(&self, list: ShopList) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.lists.contains_key(&list.id) {
            return Err(StoreError::conflict(format!("list {} already exists", list.id)));
        }
        state.lists.insert(list.id, list);
        Ok(())
    }

    async fn get(&self, list_id: ListId) -> StoreResult<Option<ShopList>> {
        Ok(self.read()?.lists.get(&list_id).cloned())
    }

    async fn save(&self, list: ShopList) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.lists.contains_key(&list.id) {
            return Err(StoreError::not_found(format!("list {}", list.id)));
        }
        state.lists.insert(list.id, list);
        Ok(())
    }

    async fn delete(&self, list_id: ListId) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.lists.remove(&list_id).is_none() {
            return Err(StoreError::not_found(format!("list {list_id}")));
        }
        Ok(())
    }

    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<ShopList>> {
        let state = self.read()?;
        let mut rows: Vec<ShopList> = state
            .lists
            .values()
            .filter(|l| l.shop_id == shop_id)
            .cloned()
            .collect();
        rows.sort_by_key(|l| l.created_at);
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl ChangeStore for InMemoryStore {
    async fn append(&self, record: ChangeRecord) -> StoreResult<()> {
        self.write()?.changes.push(record);
        Ok(())
    }

    async fn for_notification(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Vec<ChangeRecord>> {
        let state = self.read()?;
        let mut rows: Vec<ChangeRecord> = state
            .changes
            .iter()
            .filter(|r| r.notification_id == Some(notification_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(rows)
    }

    async fn for_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<Vec<ChangeRecord>> {
        let state = self.read()?;
        let mut rows: Vec<ChangeRecord> = state
            .changes
            .iter()
            .filter(|r| r.vehicle_id == Some(vehicle_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(rows)
    }

    async fn for_shop(&self, shop_id: ShopId, limit: u32) -> StoreResult<Vec<ChangeRecord>> {
        let state = self.read()?;
        let mut rows: Vec<ChangeRecord> = state
            .changes
            .iter()
            .filter(|r| r.shop_id == shop_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}
