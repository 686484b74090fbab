//! # Utilities Module
//!
//! Cross-cutting helpers that don't belong in domain-specific modules.
//!
//! ## Sub-modules
//! - `threading`: Rayon thread pool configuration
//! - `telemetry`: Progress blackboard and heartbeat thread

pub mod telemetry;
pub mod threading;
