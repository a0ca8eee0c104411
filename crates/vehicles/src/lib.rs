//! Vehicle domain module.
//!
//! Vehicles, their maintenance notifications, and notification line items,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage).

pub mod item;
pub mod notification;
pub mod vehicle;

pub use item::{ItemDraft, NotificationItem};
pub use notification::{NotificationKind, NotificationUpdate, VehicleNotification};
pub use vehicle::{Vehicle, VehicleDraft, VehicleUpdate, DEFAULT_UOC};
