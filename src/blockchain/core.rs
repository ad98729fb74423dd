// core.rs splits the ledger into the chain store, per-barangay state and
// chain verification.
pub mod chain;
pub mod state;
pub mod validation;

pub use chain::*;
pub use state::*;
pub use validation::*;
