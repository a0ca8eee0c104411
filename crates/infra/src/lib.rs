//! Infrastructure layer: persistence behind the domain store traits.
//!
//! Two implementations of every store: `InMemoryStore` (tests/dev, RwLock
//! maps) and `PostgresStore` (sqlx, one pool). Both uphold the same
//! invariants; the in-memory store guards by hand everything the SQL schema
//! guards with constraints.

pub mod store;


pub use store::in_memory::InMemoryStore;
pub use store::postgres::PostgresStore;
pub use store::r#trait::{
    ChangeStore, InviteStore, ItemStore, ListStore, MembershipStore, NotificationStore, ShopStore,
    StoreError, StoreResult, VehicleStore,
};
