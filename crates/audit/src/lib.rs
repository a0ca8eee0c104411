//! Change-audit domain module.
//!
//! The immutable record type and the payload builders mutating services use
//! to describe what they changed. Pure data; persistence lives in infra.

pub mod change;
pub mod payload;

pub use change::{ChangeRecord, ChangeType};
pub use payload::{ItemChange, VehicleSnapshot};
