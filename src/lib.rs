//! Ballotchain - A hash-linked voting ledger sealed one barangay at a time
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the ledger store and chain verification
//! - [`vote`] - Vote and ballot types, ballot validation
//! - [`roster`] - Roles and allowed candidates
//!
//! ## Results
//! - [`tally`] - Overall and per-barangay vote counts
//!
//! ## Hashing
//! - [`crypto`] - Canonical JSON rendering and SHA-256
//!
//! ## State Management
//! - [`persistence`] - JSON snapshot storage
//!
//! ## Integration
//! - [`api`] - HTTP API (axum)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod roster;
pub mod vote;

// ============================================================================
// Results
// ============================================================================
pub mod tally;

// ============================================================================
// Hashing
// ============================================================================
pub mod crypto;

// ============================================================================
// State Management
// ============================================================================
pub mod persistence;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
