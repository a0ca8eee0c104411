use std::sync::Arc;

use tracing::instrument;

use motorpool_audit::{payload, ChangeRecord, ChangeType, VehicleSnapshot};
use motorpool_auth::{AccessError, Authorizer};
use motorpool_core::{ShopId, UserId, VehicleId};
use motorpool_infra::VehicleStore;
use motorpool_vehicles::{Vehicle, VehicleDraft, VehicleUpdate};

use crate::error::ServiceResult;
use crate::recorder::AuditRecorder;

/// Vehicle lifecycle. Modification rights belong to the vehicle's creator
/// and shop admins; plain members can read.
#[derive(Clone)]
pub struct VehicleService {
    vehicles: Arc<dyn VehicleStore>,
    authorizer: Authorizer,
    recorder: AuditRecorder,
}

fn snapshot(vehicle: &Vehicle) -> VehicleSnapshot {
    VehicleSnapshot {
        admin: vehicle.admin.clone(),
        niin: vehicle.niin.clone(),
        uoc: vehicle.uoc.clone(),
        mileage: vehicle.mileage,
        hours: vehicle.hours,
        comment: vehicle.comment.clone(),
    }
}

impl VehicleService {
    pub fn new(vehicles: Arc<dyn VehicleStore>, authorizer: Authorizer, recorder: AuditRecorder) -> Self {
        Self {
            vehicles,
            authorizer,
            recorder,
        }
    }

    /// Member-gated creation.
    #[instrument(skip(self, draft), fields(actor = %actor, shop_id = %shop_id))]
    pub async fn create(
        &self,
        actor: UserId,
        shop_id: ShopId,
        draft: VehicleDraft,
    ) -> ServiceResult<Vehicle> {
        self.authorizer.require_member(actor, shop_id).await?;
        let vehicle = Vehicle::new(shop_id, actor, draft)?;
        self.vehicles.insert(vehicle.clone()).await?;
        Ok(vehicle)
    }

    /// Fetch one vehicle; member-gated on its shop.
    pub async fn get(&self, actor: UserId, vehicle_id: VehicleId) -> ServiceResult<Vehicle> {
        let vehicle = self
            .vehicles
            .get(vehicle_id)
            .await?
            .ok_or(AccessError::VehicleNotFound(vehicle_id))?;
        self.authorizer.require_member(actor, vehicle.shop_id).await?;
        Ok(vehicle)
    }

    /// Member-gated listing of a shop's vehicles.
    pub async fn list_for_shop(&self, actor: UserId, shop_id: ShopId) -> ServiceResult<Vec<Vehicle>> {
        self.authorizer.require_member(actor, shop_id).await?;
        Ok(self.vehicles.list_for_shop(shop_id).await?)
    }

    /// Partial update, allowed to the creator or a shop admin.
    #[instrument(skip(self, update), fields(actor = %actor, vehicle_id = %vehicle_id))]
    pub async fn update(
        &self,
        actor: UserId,
        vehicle_id: VehicleId,
        update: VehicleUpdate,
    ) -> ServiceResult<Vehicle> {
        if !self.authorizer.can_modify_vehicle(actor, vehicle_id).await? {
            return Err(AccessError::AccessDenied.into());
        }
        let mut vehicle = self
            .vehicles
            .get(vehicle_id)
            .await?
            .ok_or(AccessError::VehicleNotFound(vehicle_id))?;
        vehicle.apply_update(update)?;
        self.vehicles.save(vehicle.clone()).await?;
        Ok(vehicle)
    }

    /// Delete a vehicle, cascading its notifications and items. A
    /// `vehicle_deleted` change record carrying a field snapshot is appended
    /// after the delete commits, so the history survives the row.
    #[instrument(skip(self), fields(actor = %actor, vehicle_id = %vehicle_id))]
    pub async fn delete(&self, actor: UserId, vehicle_id: VehicleId) -> ServiceResult<()> {
        if !self.authorizer.can_modify_vehicle(actor, vehicle_id).await? {
            return Err(AccessError::AccessDenied.into());
        }
        let vehicle = self
            .vehicles
            .get(vehicle_id)
            .await?
            .ok_or(AccessError::VehicleNotFound(vehicle_id))?;

        let snapshot = snapshot(&vehicle);
        self.vehicles.delete(vehicle_id).await?;

        self.recorder
            .record(
                ChangeRecord::new(
                    vehicle.shop_id,
                    actor,
                    ChangeType::VehicleDeleted,
                    payload::vehicle_deleted(&snapshot),
                )
                .with_vehicle(vehicle.id, vehicle.admin.clone()),
            )
            .await;
        Ok(())
    }
}
