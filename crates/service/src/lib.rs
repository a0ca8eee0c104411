//! `motorpool-service` — mutation services.
//!
//! Thin composition points over the stores: every mutating operation
//! resolves the owning shop from its target, asks the [`Authorizer`] the
//! right question for that resource kind, rejects before any write, performs
//! the write, and finally emits a best-effort audit record through the
//! [`AuditRecorder`].
//!
//! [`Authorizer`]: motorpool_auth::Authorizer
//! [`AuditRecorder`]: crate::recorder::AuditRecorder

pub mod changes;
pub mod error;
pub mod invite;
pub mod item;
pub mod list;
pub mod member;
pub mod notification;
pub mod recorder;
pub mod shop;
pub mod vehicle;

#[cfg(test)]
mod testutil;

pub use changes::ChangeQueryService;
pub use error::{ServiceError, ServiceResult};
pub use invite::InviteService;
pub use item::ItemService;
pub use list::ListService;
pub use member::MemberService;
pub use notification::NotificationService;
pub use recorder::AuditRecorder;
pub use shop::ShopService;
pub use vehicle::VehicleService;
