//! Core deterministic primitives.
//!
//! Everything here is designed for perfect cross-platform determinism.
//! These types are the foundation the simulation and the online
//! synchronizer both rely on.

pub mod fixed;
pub mod hash;
pub mod rng;
pub mod vec3;

// Re-export core types
pub use fixed::{Fixed, FIXED_HALF, FIXED_ONE, FIXED_SCALE};
pub use hash::{compute_state_hash, StateHash};
pub use rng::DeterministicRng;
pub use vec3::FixedVec3;
