//! meterline-store: the external snapshot store boundary.
//!
//! The pipeline treats durability and networking as someone else's problem:
//! all it needs from the store is batched set-with-expiry, pattern scan, and
//! get. `SnapshotStore` captures that contract; the Redis backend is the
//! production implementation and the in-memory backend serves tests and
//! storeless local runs.
//!
//! Writes have at-least-once semantics per successful call and best-effort
//! ordering. Absence of a key after its TTL means "no data in the last
//! window", not an error.

pub mod backend;
pub mod error;
pub mod memory;
pub mod redis;

pub use backend::{SnapshotEntry, SnapshotStore};
pub use error::{StoreError, StoreResult};
pub use memory::MemorySnapshotStore;
pub use redis::RedisSnapshotStore;
