// src/backend/storage/mod.rs
pub mod config;
pub mod courses;
pub mod cursor;
pub mod enrollments;
pub mod ledger;
pub mod memory;
pub mod metrics;
pub mod notifications;
pub mod plans;
pub mod registration_fees;
pub mod sessions;
pub mod storable;

pub use memory::Memory;
pub use storable::Cbor;
