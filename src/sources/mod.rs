// src/sources/mod.rs
//! Concrete `EntitySource` and `SnapshotStore` implementations.
//!
//! Neither talks to the network: `FixtureSource` reads entity JSON from a
//! directory tree and `MemorySnapshotStore` keeps snapshots in memory.

mod fixture;
mod memory;

pub use fixture::FixtureSource;
pub use memory::MemorySnapshotStore;
