//! `motorpool-auth` — the authorization oracle.
//!
//! One struct, [`Authorizer`], answers every membership/role/ownership
//! question in the system, backed by the stores. Predicates are
//! resource-scoped, not action-scoped: the oracle decides whether an actor
//! may act on a shop/vehicle/list/notification, and the calling service
//! decides what "act" means.

pub mod authorizer;
pub mod error;

pub use authorizer::Authorizer;
pub use error::{AccessError, AccessResult};
