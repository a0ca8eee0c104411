//! `field_changes` payload builders.
//!
//! Payloads are point-in-time snapshots, not before/after diffs: by the time
//! a record is read the "before" state may already be gone. Shapes here are
//! stable; history readers parse them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Summary of one line item as embedded in item mutation payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChange {
    pub niin: String,
    pub nomenclature: String,
    pub quantity: i32,
}

/// Snapshot of the vehicle fields worth keeping after the row is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub admin: String,
    pub niin: String,
    pub uoc: String,
    pub mileage: i32,
    pub hours: i32,
    pub comment: String,
}

/// `{"fields_changed": ["items"], "item_count": N, "items_added": [...]}`
pub fn items_added(items: &[ItemChange]) -> Value {
    json!({
        "fields_changed": ["items"],
        "item_count": items.len(),
        "items_added": items,
    })
}

/// `{"fields_changed": ["items"], "item_count": N, "items_removed": [...]}`
pub fn items_removed(items: &[ItemChange]) -> Value {
    json!({
        "fields_changed": ["items"],
        "item_count": items.len(),
        "items_removed": items,
    })
}

/// `{"deleted": true, "vehicle_data": {...}}`
pub fn vehicle_deleted(snapshot: &VehicleSnapshot) -> Value {
    json!({
        "deleted": true,
        "vehicle_data": snapshot,
    })
}

/// Marker payload for a freshly created notification.
pub fn notification_created() -> Value {
    json!({"fields_changed": ["created"]})
}

/// Marker payload for a deleted notification.
pub fn notification_deleted() -> Value {
    json!({"fields_changed": ["deleted"]})
}

/// `{"fields_changed": [...]}` for a notification edit.
pub fn fields_changed(fields: &[&str]) -> Value {
    json!({"fields_changed": fields})
}
