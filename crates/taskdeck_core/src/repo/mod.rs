//! Repository layer: the authoritative entity store.
//!
//! # Responsibility
//! - Define the storage contract consumed by the services.
//! - Keep locking and indexing details behind that contract.
//!
//! # Invariants
//! - Store writes enforce entity `validate()` and user references before
//!   mutating anything.
//! - Store APIs return semantic errors (`NotFound`, `Validation`) only.

pub mod entity_store;
