// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// the chain store, per-barangay state and chain verification.

pub mod core;
pub use self::core::*;
