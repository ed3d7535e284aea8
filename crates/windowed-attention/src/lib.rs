//! Causal, windowed flash-attention adapter.
//!
//! [`AttentionAdapter::wrap`] forwards query, key and value tensors to a fused
//! attention kernel with causal masking, the kernel's default softmax scale
//! (`1 / sqrt(head_dim)`) and a window admitting a fixed number of positions
//! to the left of each query. Tensors use the flash-attention layout
//! `[batch, seq_len, num_heads, head_dim]`; keys and values may carry fewer
//! heads than queries.
//!
//! Two kernels are provided:
//!
//! * [`fused::FlashKernel`] binds `candle-flash-attn` and is only compiled with
//!   the `fused` feature (CUDA, `f16`/`bf16`).
//! * [`reference::ReferenceKernel`] computes the same result with plain Candle
//!   ops on any device.
//!
//! The adapter performs no validation of its own; every error comes from the
//! kernel and is returned unchanged. Whether the kernel runs when the call is
//! wrapped or when the result is first requested is controlled by
//! [`Evaluation`].

pub mod adapter;
pub mod core;
pub mod masks;
pub mod reference;

#[cfg(feature = "fused")]
pub mod fused;

pub use adapter::{AttentionAdapter, DeferredAttention};
pub use self::core::{
    AttentionError, AttentionWidth, BackendSelection, Config, Evaluation, FusedKernel,
    KernelParams, PrecisionPolicy, WindowSize,
};
