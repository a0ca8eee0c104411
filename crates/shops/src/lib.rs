//! Shop domain module.
//!
//! This crate contains the tenant-side business rules (shops, memberships,
//! invite codes, quick lists), implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod invite;
pub mod list;
pub mod membership;
pub mod role;
pub mod shop;

pub use invite::{
    generate_code, max_generation_attempts, normalize_code, InviteCode, InviteUsability,
    CODE_LENGTH, MAX_CODE_LENGTH,
};
pub use list::ShopList;
pub use membership::Membership;
pub use role::Role;
pub use shop::{Shop, ShopUpdate};
