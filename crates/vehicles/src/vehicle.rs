use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorpool_core::{DomainError, DomainResult, ShopId, UserId, VehicleId};

/// Unit-of-choice fallback when a vehicle is recorded without one.
pub const DEFAULT_UOC: &str = "UNK";

/// A vehicle record owned by one shop.
///
/// `admin` is the responsible party's name, denormalized into audit records
/// when the vehicle is deleted. `creator_id` grants the creator modify
/// rights alongside shop admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub shop_id: ShopId,
    pub creator_id: UserId,
    pub niin: String,
    pub admin: String,
    pub model: String,
    pub serial: String,
    pub uoc: String,
    pub mileage: i32,
    pub hours: i32,
    pub comment: String,
    pub save_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Field values for a new vehicle, before ids and timestamps are stamped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleDraft {
    pub niin: String,
    pub admin: String,
    pub model: String,
    pub serial: String,
    pub uoc: String,
    pub mileage: i32,
    pub hours: i32,
    pub comment: String,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleUpdate {
    pub niin: Option<String>,
    pub admin: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub uoc: Option<String>,
    pub mileage: Option<i32>,
    pub hours: Option<i32>,
    pub comment: Option<String>,
}

impl Vehicle {
    pub fn new(shop_id: ShopId, creator_id: UserId, draft: VehicleDraft) -> DomainResult<Self> {
        if draft.niin.trim().is_empty() {
            return Err(DomainError::validation("vehicle niin cannot be empty"));
        }
        let uoc = if draft.uoc.trim().is_empty() {
            DEFAULT_UOC.to_string()
        } else {
            draft.uoc
        };
        let now = Utc::now();
        Ok(Self {
            id: VehicleId::new(),
            shop_id,
            creator_id,
            niin: draft.niin,
            admin: draft.admin,
            model: draft.model,
            serial: draft.serial,
            uoc,
            mileage: draft.mileage,
            hours: draft.hours,
            comment: draft.comment,
            save_time: now,
            last_updated: now,
        })
    }

    pub fn apply_update(&mut self, update: VehicleUpdate) -> DomainResult<()> {
        if let Some(niin) = update.niin {
            if niin.trim().is_empty() {
                return Err(DomainError::validation("vehicle niin cannot be empty"));
            }
            self.niin = niin;
        }
        if let Some(admin) = update.admin {
            self.admin = admin;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(serial) = update.serial {
            self.serial = serial;
        }
        if let Some(uoc) = update.uoc {
            self.uoc = if uoc.trim().is_empty() {
                DEFAULT_UOC.to_string()
            } else {
                uoc
            };
        }
        if let Some(mileage) = update.mileage {
            self.mileage = mileage;
        }
        if let Some(hours) = update.hours {
            self.hours = hours;
        }
        if let Some(comment) = update.comment {
            self.comment = comment;
        }
        self.last_updated = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draft() -> VehicleDraft {
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

    #[test]
    fn blank_uoc_defaults_to_unk() {
        let vehicle = Vehicle::new(ShopId::new(), UserId::new(), test_draft()).unwrap();
        assert_eq!(vehicle.uoc, DEFAULT_UOC);
    }

    #[test]
    fn provided_uoc_is_kept() {
        let mut draft = test_draft();
        draft.uoc = "A1".to_string();
        let vehicle = Vehicle::new(ShopId::new(), UserId::new(), draft).unwrap();
        assert_eq!(vehicle.uoc, "A1");
    }

    #[test]
    fn empty_niin_is_rejected() {
        let mut draft = test_draft();
        draft.niin = "  ".to_string();
        match Vehicle::new(ShopId::new(), UserId::new(), draft) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("niin")),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_touches_only_provided_fields() {
        let mut vehicle = Vehicle::new(ShopId::new(), UserId::new(), test_draft()).unwrap();
        vehicle
            .apply_update(VehicleUpdate {
                mileage: Some(1500),
                ..VehicleUpdate::default()
            })
            .unwrap();
        assert_eq!(vehicle.mileage, 1500);
        assert_eq!(vehicle.model, "M1083");
    }

    #[test]
    fn update_with_blank_uoc_restores_default() {
        let mut draft = test_draft();
        draft.uoc = "A1".to_string();
        let mut vehicle = Vehicle::new(ShopId::new(), UserId::new(), draft).unwrap();
        vehicle
            .apply_update(VehicleUpdate {
                uoc: Some("".to_string()),
                ..VehicleUpdate::default()
            })
            .unwrap();
        assert_eq!(vehicle.uoc, DEFAULT_UOC);
    }
}
