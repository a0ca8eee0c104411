//! Postgres-backed store implementations.
//!
//! One pool, one struct, every trait. Runtime-checked `sqlx::query` with
//! explicit binds; unique violations (SQLSTATE 23505) map to
//! [`StoreError::Conflict`] so callers can retry invite codes and reject
//! duplicate memberships. Multi-row writes run in explicit transactions with
//! rollback on failure.
//!
//! Schema expectations (uuid keys, timestamptz timestamps):
//!
//! - `shops(id, name, details, admin_only_lists, created_by, created_at, updated_at)`
//! - `memberships(id, shop_id ON DELETE CASCADE, user_id, role, joined_at, UNIQUE (shop_id, user_id))`
//! - `invite_codes(id, shop_id ON DELETE CASCADE, code UNIQUE, created_by, is_active, expires_at, max_uses, current_uses, created_at)`
//! - `vehicles(id, shop_id ON DELETE CASCADE, creator_id, niin, admin, model, serial, uoc, mileage, hours, comment, save_time, last_updated)`
//! - `vehicle_notifications(id, shop_id, vehicle_id ON DELETE CASCADE, title, description, notification_type, completed, save_time, last_updated)`
//! - `notification_items(id, shop_id, notification_id ON DELETE CASCADE, niin, nomenclature, quantity, save_time)`
//! - `shop_lists(id, shop_id ON DELETE CASCADE, created_by, description, created_at, updated_at)`
//! - `change_records(id, notification_id, shop_id, vehicle_id, changed_by, changed_at, change_type, field_changes jsonb, notification_title, notification_type, vehicle_admin)`
//!
//! `change_records` carries **no** foreign keys: its references are weak by
//! design so the audit trail survives the rows it describes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use motorpool_audit::{ChangeRecord, ChangeType};
use motorpool_core::{
    ChangeRecordId, InviteCodeId, ItemId, ListId, MembershipId, NotificationId, ShopId, UserId,
    VehicleId,
};
use motorpool_shops::{InviteCode, Membership, Role, Shop, ShopList};
use motorpool_vehicles::{NotificationItem, Vehicle, VehicleNotification};

use super::r#trait::{
    ChangeStore, InviteStore, ItemStore, ListStore, MembershipStore, NotificationStore, ShopStore,
    StoreError, StoreResult, VehicleStore,
};

/// Postgres implementation of every store trait.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound(format!("{operation}: row not found")),
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

fn decode_err(table: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::serialization(format!("failed to decode {table} row: {err}"))
}

fn shop_from_row(row: &PgRow) -> StoreResult<Shop> {
    Ok(Shop {
        id: ShopId::from_uuid(row.try_get("id").map_err(|e| decode_err("shops", e))?),
        name: row.try_get("name").map_err(|e| decode_err("shops", e))?,
        details: row.try_get("details").map_err(|e| decode_err("shops", e))?,
        admin_only_lists: row
            .try_get("admin_only_lists")
            .map_err(|e| decode_err("shops", e))?,
        created_by: UserId::from_uuid(
            row.try_get("created_by").map_err(|e| decode_err("shops", e))?,
        ),
        created_at: row.try_get("created_at").map_err(|e| decode_err("shops", e))?,
        updated_at: row.try_get("updated_at").map_err(|e| decode_err("shops", e))?,
    })
}

fn membership_from_row(row: &PgRow) -> StoreResult<Membership> {
    let role: String = row.try_get("role").map_err(|e| decode_err("memberships", e))?;
    Ok(Membership {
        id: MembershipId::from_uuid(row.try_get("id").map_err(|e| decode_err("memberships", e))?),
        shop_id: ShopId::from_uuid(
            row.try_get("shop_id").map_err(|e| decode_err("memberships", e))?,
        ),
        user_id: UserId::from_uuid(
            row.try_get("user_id").map_err(|e| decode_err("memberships", e))?,
        ),
        role: role.parse::<Role>().map_err(|e| decode_err("memberships", e))?,
        joined_at: row.try_get("joined_at").map_err(|e| decode_err("memberships", e))?,
    })
}

fn invite_from_row(row: &PgRow) -> StoreResult<InviteCode> {
    Ok(InviteCode {
        id: InviteCodeId::from_uuid(row.try_get("id").map_err(|e| decode_err("invite_codes", e))?),
        shop_id: ShopId::from_uuid(
            row.try_get("shop_id").map_err(|e| decode_err("invite_codes", e))?,
        ),
        code: row.try_get("code").map_err(|e| decode_err("invite_codes", e))?,
        created_by: UserId::from_uuid(
            row.try_get("created_by").map_err(|e| decode_err("invite_codes", e))?,
        ),
        is_active: row.try_get("is_active").map_err(|e| decode_err("invite_codes", e))?,
        expires_at: row.try_get("expires_at").map_err(|e| decode_err("invite_codes", e))?,
        max_uses: row.try_get("max_uses").map_err(|e| decode_err("invite_codes", e))?,
        current_uses: row
            .try_get("current_uses")
            .map_err(|e| decode_err("invite_codes", e))?,
        created_at: row.try_get("created_at").map_err(|e| decode_err("invite_codes", e))?,
    })
}

fn vehicle_from_row(row: &PgRow) -> StoreResult<Vehicle> {
    Ok(Vehicle {
        id: VehicleId::from_uuid(row.try_get("id").map_err(|e| decode_err("vehicles", e))?),
        shop_id: ShopId::from_uuid(row.try_get("shop_id").map_err(|e| decode_err("vehicles", e))?),
        creator_id: UserId::from_uuid(
            row.try_get("creator_id").map_err(|e| decode_err("vehicles", e))?,
        ),
        niin: row.try_get("niin").map_err(|e| decode_err("vehicles", e))?,
        admin: row.try_get("admin").map_err(|e| decode_err("vehicles", e))?,
        model: row.try_get("model").map_err(|e| decode_err("vehicles", e))?,
        serial: row.try_get("serial").map_err(|e| decode_err("vehicles", e))?,
        uoc: row.try_get("uoc").map_err(|e| decode_err("vehicles", e))?,
        mileage: row.try_get("mileage").map_err(|e| decode_err("vehicles", e))?,
        hours: row.try_get("hours").map_err(|e| decode_err("vehicles", e))?,
        comment: row.try_get("comment").map_err(|e| decode_err("vehicles", e))?,
        save_time: row.try_get("save_time").map_err(|e| decode_err("vehicles", e))?,
        last_updated: row.try_get("last_updated").map_err(|e| decode_err("vehicles", e))?,
    })
}

fn notification_from_row(row: &PgRow) -> StoreResult<VehicleNotification> {
    let kind: String = row
        .try_get("notification_type")
        .map_err(|e| decode_err("vehicle_notifications", e))?;
    Ok(VehicleNotification {
        id: NotificationId::from_uuid(
            row.try_get("id").map_err(|e| decode_err("vehicle_notifications", e))?,
        ),
        shop_id: ShopId::from_uuid(
            row.try_get("shop_id").map_err(|e| decode_err("vehicle_notifications", e))?,
        ),
        vehicle_id: VehicleId::from_uuid(
            row.try_get("vehicle_id").map_err(|e| decode_err("vehicle_notifications", e))?,
        ),
        title: row.try_get("title").map_err(|e| decode_err("vehicle_notifications", e))?,
        description: row
            .try_get("description")
            .map_err(|e| decode_err("vehicle_notifications", e))?,
        kind: kind.parse().map_err(|e| decode_err("vehicle_notifications", e))?,
        completed: row
            .try_get("completed")
            .map_err(|e| decode_err("vehicle_notifications", e))?,
        save_time: row
            .try_get("save_time")
            .map_err(|e| decode_err("vehicle_notifications", e))?,
        last_updated: row
            .try_get("last_updated")
            .map_err(|e| decode_err("vehicle_notifications", e))?,
    })
}

fn item_from_row(row: &PgRow) -> StoreResult<NotificationItem> {
    Ok(NotificationItem {
        id: ItemId::from_uuid(row.try_get("id").map_err(|e| decode_err("notification_items", e))?),
        shop_id: ShopId::from_uuid(
            row.try_get("shop_id").map_err(|e| decode_err("notification_items", e))?,
        ),
        notification_id: NotificationId::from_uuid(
            row.try_get("notification_id")
                .map_err(|e| decode_err("notification_items", e))?,
        ),
        niin: row.try_get("niin").map_err(|e| decode_err("notification_items", e))?,
        nomenclature: row
            .try_get("nomenclature")
            .map_err(|e| decode_err("notification_items", e))?,
        quantity: row.try_get("quantity").map_err(|e| decode_err("notification_items", e))?,
        save_time: row.try_get("save_time").map_err(|e| decode_err("notification_items", e))?,
    })
}

fn list_from_row(row: &PgRow) -> StoreResult<ShopList> {
    Ok(ShopList {
        id: ListId::from_uuid(row.try_get("id").map_err(|e| decode_err("shop_lists", e))?),
        shop_id: ShopId::from_uuid(
            row.try_get("shop_id").map_err(|e| decode_err("shop_lists", e))?,
        ),
        created_by: UserId::from_uuid(
            row.try_get("created_by").map_err(|e| decode_err("shop_lists", e))?,
        ),
        description: row.try_get("description").map_err(|e| decode_err("shop_lists", e))?,
        created_at: row.try_get("created_at").map_err(|e| decode_err("shop_lists", e))?,
        updated_at: row.try_get("updated_at").map_err(|e| decode_err("shop_lists", e))?,
    })
}

fn change_from_row(row: &PgRow) -> StoreResult<ChangeRecord> {
    let change_type: String = row
        .try_get("change_type")
        .map_err(|e| decode_err("change_records", e))?;
    let notification_id: Option<Uuid> = row
        .try_get("notification_id")
        .map_err(|e| decode_err("change_records", e))?;
    let vehicle_id: Option<Uuid> = row
        .try_get("vehicle_id")
        .map_err(|e| decode_err("change_records", e))?;
    Ok(ChangeRecord {
        id: ChangeRecordId::from_uuid(
            row.try_get("id").map_err(|e| decode_err("change_records", e))?,
        ),
        notification_id: notification_id.map(NotificationId::from_uuid),
        shop_id: ShopId::from_uuid(
            row.try_get("shop_id").map_err(|e| decode_err("change_records", e))?,
        ),
        vehicle_id: vehicle_id.map(VehicleId::from_uuid),
        changed_by: UserId::from_uuid(
            row.try_get("changed_by").map_err(|e| decode_err("change_records", e))?,
        ),
        changed_at: row.try_get("changed_at").map_err(|e| decode_err("change_records", e))?,
        change_type: change_type
            .parse::<ChangeType>()
            .map_err(|e| decode_err("change_records", e))?,
        field_changes: row
            .try_get("field_changes")
            .map_err(|e| decode_err("change_records", e))?,
        notification_title: row
            .try_get("notification_title")
            .map_err(|e| decode_err("change_records", e))?,
        notification_type: row
            .try_get("notification_type")
            .map_err(|e| decode_err("change_records", e))?,
        vehicle_admin: row
            .try_get("vehicle_admin")
            .map_err(|e| decode_err("change_records", e))?,
    })
}

#[async_trait::async_trait]
impl ShopStore for PostgresStore {
    #[instrument(skip(self, shop, admin), fields(shop_id = %shop.id), err)]
    async fn create_with_admin(&self, shop: Shop, admin: Membership) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO shops (id, name, details, admin_only_lists, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(shop.id.as_uuid())
        .bind(&shop.name)
        .bind(&shop.details)
        .bind(shop.admin_only_lists)
        .bind(shop.created_by.as_uuid())
        .bind(shop.created_at)
        .bind(shop.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_shop", e))?;

        sqlx::query(
            r#"
            INSERT INTO memberships (id, shop_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(admin.id.as_uuid())
        .bind(admin.shop_id.as_uuid())
        .bind(admin.user_id.as_uuid())
        .bind(admin.role.as_str())
        .bind(admin.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_creator_membership", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn get(&self, shop_id: ShopId) -> StoreResult<Option<Shop>> {
        let row = sqlx::query("SELECT * FROM shops WHERE id = $1")
            .bind(shop_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_shop", e))?;
        row.as_ref().map(shop_from_row).transpose()
    }

    #[instrument(skip(self, shop), fields(shop_id = %shop.id), err)]
    async fn save(&self, shop: Shop) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE shops
            SET name = $2, details = $3, admin_only_lists = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(shop.id.as_uuid())
        .bind(&shop.name)
        .bind(&shop.details)
        .bind(shop.admin_only_lists)
        .bind(shop.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_shop", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("shop {}", shop.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, shop_id: ShopId) -> StoreResult<()> {
        // Owned rows go with the shop via ON DELETE CASCADE; change_records
        // have no foreign key and stay.
        let result = sqlx::query("DELETE FROM shops WHERE id = $1")
            .bind(shop_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_shop", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("shop {shop_id}")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl MembershipStore for PostgresStore {
    #[instrument(skip(self, membership), fields(shop_id = %membership.shop_id, user_id = %membership.user_id), err)]
    async fn insert(&self, membership: Membership) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO memberships (id, shop_id, user_id, role, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(membership.shop_id.as_uuid())
        .bind(membership.user_id.as_uuid())
        .bind(membership.role.as_str())
        .bind(membership.joined_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_membership", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get(&self, shop_id: ShopId, user_id: UserId) -> StoreResult<Option<Membership>> {
        let row = sqlx::query("SELECT * FROM memberships WHERE shop_id = $1 AND user_id = $2")
            .bind(shop_id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_membership", e))?;
        row.as_ref().map(membership_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, shop_id: ShopId, user_id: UserId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM memberships WHERE shop_id = $1 AND user_id = $2")
            .bind(shop_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_membership", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "membership ({shop_id}, {user_id})"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn update_role(&self, shop_id: ShopId, user_id: UserId, role: Role) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE memberships SET role = $3 WHERE shop_id = $1 AND user_id = $2")
                .bind(shop_id.as_uuid())
                .bind(user_id.as_uuid())
                .bind(role.as_str())
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_role", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "membership ({shop_id}, {user_id})"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<Membership>> {
        let rows = sqlx::query("SELECT * FROM memberships WHERE shop_id = $1 ORDER BY joined_at")
            .bind(shop_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_memberships_for_shop", e))?;
        rows.iter().map(membership_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<Membership>> {
        let rows = sqlx::query("SELECT * FROM memberships WHERE user_id = $1 ORDER BY joined_at")
            .bind(user_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_memberships_for_user", e))?;
        rows.iter().map(membership_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn count_for_shop(&self, shop_id: ShopId) -> StoreResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM memberships WHERE shop_id = $1")
            .bind(shop_id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_memberships", e))?;
        let n: i64 = row.try_get("n").map_err(|e| decode_err("memberships", e))?;
        Ok(n as u64)
    }
}

#[async_trait::async_trait]
impl InviteStore for PostgresStore {
    #[instrument(skip(self, code), fields(code_id = %code.id, shop_id = %code.shop_id), err)]
    async fn insert(&self, code: InviteCode) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invite_codes
                (id, shop_id, code, created_by, is_active, expires_at, max_uses, current_uses, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(code.id.as_uuid())
        .bind(code.shop_id.as_uuid())
        .bind(&code.code)
        .bind(code.created_by.as_uuid())
        .bind(code.is_active)
        .bind(code.expires_at)
        .bind(code.max_uses)
        .bind(code.current_uses)
        .bind(code.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_invite", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get(&self, code_id: InviteCodeId) -> StoreResult<Option<InviteCode>> {
        let row = sqlx::query("SELECT * FROM invite_codes WHERE id = $1")
            .bind(code_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_invite", e))?;
        row.as_ref().map(invite_from_row).transpose()
    }

    #[instrument(skip(self, code), err)]
    async fn get_by_code(&self, code: &str) -> StoreResult<Option<InviteCode>> {
        let row = sqlx::query("SELECT * FROM invite_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_invite_by_code", e))?;
        row.as_ref().map(invite_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<InviteCode>> {
        let rows = sqlx::query("SELECT * FROM invite_codes WHERE shop_id = $1 ORDER BY created_at")
            .bind(shop_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_invites", e))?;
        rows.iter().map(invite_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn consume_use(&self, code_id: InviteCodeId, now: DateTime<Utc>) -> StoreResult<bool> {
        // The usability predicate and the increment are one statement; the
        // affected-row count is the whole concurrency story. Two racers on a
        // max_uses = 1 code cannot both see rows_affected = 1.
        let result = sqlx::query(
            r#"
            UPDATE invite_codes
            SET current_uses = current_uses + 1
            WHERE id = $1
              AND is_active
              AND (expires_at IS NULL OR expires_at > $2)
              AND (max_uses IS NULL OR current_uses < max_uses)
            "#,
        )
        .bind(code_id.as_uuid())
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("consume_use", e))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        // Distinguish "not usable" from "no such row".
        let exists = sqlx::query("SELECT 1 AS one FROM invite_codes WHERE id = $1")
            .bind(code_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("consume_use_exists", e))?;
        if exists.is_none() {
            return Err(StoreError::not_found(format!("invite code {code_id}")));
        }
        Ok(false)
    }

    #[instrument(skip(self), err)]
    async fn release_use(&self, code_id: InviteCodeId) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE invite_codes SET current_uses = GREATEST(current_uses - 1, 0) WHERE id = $1",
        )
        .bind(code_id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("release_use", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("invite code {code_id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn deactivate(&self, code_id: InviteCodeId) -> StoreResult<()> {
        let result = sqlx::query("UPDATE invite_codes SET is_active = FALSE WHERE id = $1")
            .bind(code_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("deactivate_invite", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::conflict(format!(
                "invite code {code_id} was removed concurrently"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, code_id: InviteCodeId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM invite_codes WHERE id = $1")
            .bind(code_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_invite", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::conflict(format!(
                "invite code {code_id} was removed concurrently"
            )));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VehicleStore for PostgresStore {
    #[instrument(skip(self, vehicle), fields(vehicle_id = %vehicle.id, shop_id = %vehicle.shop_id), err)]
    async fn insert(&self, vehicle: Vehicle) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicles
                (id, shop_id, creator_id, niin, admin, model, serial, uoc, mileage, hours, comment, save_time, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(vehicle.id.as_uuid())
        .bind(vehicle.shop_id.as_uuid())
        .bind(vehicle.creator_id.as_uuid())
        .bind(&vehicle.niin)
        .bind(&vehicle.admin)
        .bind(&vehicle.model)
        .bind(&vehicle.serial)
        .bind(&vehicle.uoc)
        .bind(vehicle.mileage)
        .bind(vehicle.hours)
        .bind(&vehicle.comment)
        .bind(vehicle.save_time)
        .bind(vehicle.last_updated)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_vehicle", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get(&self, vehicle_id: VehicleId) -> StoreResult<Option<Vehicle>> {
        let row = sqlx::query("SELECT * FROM vehicles WHERE id = $1")
            .bind(vehicle_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_vehicle", e))?;
        row.as_ref().map(vehicle_from_row).transpose()
    }

    #[instrument(skip(self, vehicle), fields(vehicle_id = %vehicle.id), err)]
    async fn save(&self, vehicle: Vehicle) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET niin = $2, admin = $3, model = $4, serial = $5, uoc = $6,
                mileage = $7, hours = $8, comment = $9, last_updated = $10
            WHERE id = $1
            "#,
        )
        .bind(vehicle.id.as_uuid())
        .bind(&vehicle.niin)
        .bind(&vehicle.admin)
        .bind(&vehicle.model)
        .bind(&vehicle.serial)
        .bind(&vehicle.uoc)
        .bind(vehicle.mileage)
        .bind(vehicle.hours)
        .bind(&vehicle.comment)
        .bind(vehicle.last_updated)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_vehicle", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("vehicle {}", vehicle.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, vehicle_id: VehicleId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(vehicle_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_vehicle", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("vehicle {vehicle_id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<Vehicle>> {
        let rows = sqlx::query("SELECT * FROM vehicles WHERE shop_id = $1 ORDER BY save_time")
            .bind(shop_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_vehicles", e))?;
        rows.iter().map(vehicle_from_row).collect()
    }
}

#[async_trait::async_trait]
impl NotificationStore for PostgresStore {
    #[instrument(skip(self, notification), fields(notification_id = %notification.id), err)]
    async fn insert(&self, notification: VehicleNotification) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO vehicle_notifications
                (id, shop_id, vehicle_id, title, description, notification_type, completed, save_time, last_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.shop_id.as_uuid())
        .bind(notification.vehicle_id.as_uuid())
        .bind(&notification.title)
        .bind(&notification.description)
        .bind(notification.kind.as_str())
        .bind(notification.completed)
        .bind(notification.save_time)
        .bind(notification.last_updated)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_notification", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Option<VehicleNotification>> {
        let row = sqlx::query("SELECT * FROM vehicle_notifications WHERE id = $1")
            .bind(notification_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_notification", e))?;
        row.as_ref().map(notification_from_row).transpose()
    }

    #[instrument(skip(self, notification), fields(notification_id = %notification.id), err)]
    async fn save(&self, notification: VehicleNotification) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicle_notifications
            SET title = $2, description = $3, notification_type = $4, completed = $5, last_updated = $6
            WHERE id = $1
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(&notification.title)
        .bind(&notification.description)
        .bind(notification.kind.as_str())
        .bind(notification.completed)
        .bind(notification.last_updated)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_notification", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "notification {}",
                notification.id
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, notification_id: NotificationId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM vehicle_notifications WHERE id = $1")
            .bind(notification_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_notification", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "notification {notification_id}"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> StoreResult<Vec<VehicleNotification>> {
        let rows = sqlx::query(
            "SELECT * FROM vehicle_notifications WHERE vehicle_id = $1 ORDER BY save_time",
        )
        .bind(vehicle_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_notifications", e))?;
        rows.iter().map(notification_from_row).collect()
    }
}

#[async_trait::async_trait]
impl ItemStore for PostgresStore {
    #[instrument(skip(self, items), fields(item_count = items.len()), err)]
    async fn insert_many(&self, items: Vec<NotificationItem>) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO notification_items
                    (id, shop_id, notification_id, niin, nomenclature, quantity, save_time)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(item.shop_id.as_uuid())
            .bind(item.notification_id.as_uuid())
            .bind(&item.niin)
            .bind(&item.nomenclature)
            .bind(item.quantity)
            .bind(item.save_time)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_item", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn get(&self, item_id: ItemId) -> StoreResult<Option<NotificationItem>> {
        let row = sqlx::query("SELECT * FROM notification_items WHERE id = $1")
            .bind(item_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?;
        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self, item_ids), fields(item_count = item_ids.len()), err)]
    async fn delete_many(&self, item_ids: &[ItemId]) -> StoreResult<()> {
        let ids: Vec<Uuid> = item_ids.iter().map(|id| *id.as_uuid()).collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query("DELETE FROM notification_items WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_items", e))?;

        // All-or-nothing: if any id was missing, put the rest back.
        if result.rows_affected() != item_ids.len() as u64 {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::not_found(
                "one or more items do not exist".to_string(),
            ));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn list_for_notification(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Vec<NotificationItem>> {
        let rows = sqlx::query(
            "SELECT * FROM notification_items WHERE notification_id = $1 ORDER BY save_time",
        )
        .bind(notification_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_items", e))?;
        rows.iter().map(item_from_row).collect()
    }
}

#[async_trait::async_trait]
impl ListStore for PostgresStore {
    #[instrument(skip(self, list), fields(list_id = %list.id, shop_id = %list.shop_id), err)]
    async fn insert(&self, list: ShopList) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shop_lists (id, shop_id, created_by, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(list.id.as_uuid())
        .bind(list.shop_id.as_uuid())
        .bind(list.created_by.as_uuid())
        .bind(&list.description)
        .bind(list.created_at)
        .bind(list.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_list", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn get(&self, list_id: ListId) -> StoreResult<Option<ShopList>> {
        let row = sqlx::query("SELECT * FROM shop_lists WHERE id = $1")
            .bind(list_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_list", e))?;
        row.as_ref().map(list_from_row).transpose()
    }

    #[instrument(skip(self, list), fields(list_id = %list.id), err)]
    async fn save(&self, list: ShopList) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE shop_lists SET description = $2, updated_at = $3 WHERE id = $1")
                .bind(list.id.as_uuid())
                .bind(&list.description)
                .bind(list.updated_at)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("save_list", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("list {}", list.id)));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete(&self, list_id: ListId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM shop_lists WHERE id = $1")
            .bind(list_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_list", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("list {list_id}")));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_for_shop(&self, shop_id: ShopId) -> StoreResult<Vec<ShopList>> {
        let rows = sqlx::query("SELECT * FROM shop_lists WHERE shop_id = $1 ORDER BY created_at")
            .bind(shop_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_lists", e))?;
        rows.iter().map(list_from_row).collect()
    }
}

#[async_trait::async_trait]
impl ChangeStore for PostgresStore {
    #[instrument(skip(self, record), fields(change_type = %record.change_type, shop_id = %record.shop_id), err)]
    async fn append(&self, record: ChangeRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO change_records
                (id, notification_id, shop_id, vehicle_id, changed_by, changed_at,
                 change_type, field_changes, notification_title, notification_type, vehicle_admin)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.notification_id.map(|id| *id.as_uuid()))
        .bind(record.shop_id.as_uuid())
        .bind(record.vehicle_id.map(|id| *id.as_uuid()))
        .bind(record.changed_by.as_uuid())
        .bind(record.changed_at)
        .bind(record.change_type.as_str())
        .bind(&record.field_changes)
        .bind(&record.notification_title)
        .bind(&record.notification_type)
        .bind(&record.vehicle_admin)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_change", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn for_notification(
        &self,
        notification_id: NotificationId,
    ) -> StoreResult<Vec<ChangeRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM change_records WHERE notification_id = $1 ORDER BY changed_at DESC",
        )
        .bind(notification_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("changes_for_notification", e))?;
        rows.iter().map(change_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn for_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<Vec<ChangeRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM change_records WHERE vehicle_id = $1 ORDER BY changed_at DESC",
        )
        .bind(vehicle_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("changes_for_vehicle", e))?;
        rows.iter().map(change_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn for_shop(&self, shop_id: ShopId, limit: u32) -> StoreResult<Vec<ChangeRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM change_records WHERE shop_id = $1 ORDER BY changed_at DESC LIMIT $2",
        )
        .bind(shop_id.as_uuid())
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("changes_for_shop", e))?;
        rows.iter().map(change_from_row).collect()
    }
}
