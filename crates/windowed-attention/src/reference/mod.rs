//! Portable, exact implementation of windowed causal attention.
//!
//! This path favours clarity over absolute performance and serves as the
//! baseline for validating the fused kernel, as well as the backend on
//! devices flash-attention does not support.

pub mod exact;

pub use exact::ReferenceKernel;
