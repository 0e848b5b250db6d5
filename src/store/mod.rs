//! Backing stores for sessions and the points ledger.
//!
//! The gate only talks to [`SessionStore`](crate::auth::SessionStore) and
//! [`LedgerStore`](crate::points::LedgerStore). `MemoryStore` implements both for
//! single-process deployments and tests, seeded from a JSON fixture.

pub mod memory;

pub use memory::{MemoryStore, StoreFixture};
