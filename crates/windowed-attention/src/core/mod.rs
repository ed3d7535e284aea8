//! Core traits and types shared across attention backends.
//!
//! Kernels operate on tensors laid out as `[batch, seq_len, num_heads,
//! head_dim]`, the layout flash-attention consumes directly. Keys and values
//! may carry fewer heads than queries (grouped-query attention) as long as the
//! query head count is a multiple of theirs. The output mirrors the shape and
//! dtype of `q`.

pub mod config;
pub mod errors;
pub mod window;

use std::fmt;

use candle_core::{Result, Tensor};

pub use config::{BackendSelection, Config, Evaluation, PrecisionPolicy};
pub use errors::AttentionError;
pub use window::{AttentionWidth, WindowSize};

/// Arguments forwarded to a kernel alongside `q`, `k` and `v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    /// Multiplier applied to `Q·Kᵀ`. `None` lets the kernel use
    /// `1 / sqrt(head_dim)`.
    pub softmax_scale: Option<f32>,
    /// Forbid attention to later positions.
    pub causal: bool,
    pub window: WindowSize,
}

impl KernelParams {
    /// Causal attention restricted to `width` positions of left context.
    pub fn causal_window(width: AttentionWidth) -> Self {
        Self {
            softmax_scale: None,
            causal: true,
            window: WindowSize::left_of(width),
        }
    }

    /// Scale the kernel should apply for the given head dimension.
    pub fn scale_for(&self, head_dim: usize) -> f32 {
        self.softmax_scale
            .unwrap_or_else(|| default_softmax_scale(head_dim))
    }
}

/// Default softmax scale, `1 / sqrt(head_dim)`.
pub fn default_softmax_scale(head_dim: usize) -> f32 {
    1.0 / (head_dim as f32).sqrt()
}

/// A fused scaled-dot-product attention primitive.
///
/// * `q` is `[batch, q_len, heads_q, head_dim]`; `k` and `v` are
///   `[batch, k_len, heads_k, head_dim]` with `heads_q % heads_k == 0`.
/// * Query rows align to the bottom-right of the score matrix (see
///   [`WindowSize`]); rows that see no key produce zeros.
/// * Errors describe the kernel's own failure and are returned as-is by
///   callers.
pub trait FusedKernel: fmt::Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn forward(&self, q: &Tensor, k: &Tensor, v: &Tensor, params: &KernelParams)
        -> Result<Tensor>;
}
