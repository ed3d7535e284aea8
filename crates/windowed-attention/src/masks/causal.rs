//! Builders for plain causal attention masks.
//!
//! The resulting tensors have dtype [`MASK_DTYPE`](super::MASK_DTYPE) and shape
//! `[batch, num_heads, q_len, k_len]`. Entries are `0.0` where attention is
//! permitted and `f32::NEG_INFINITY` otherwise. Rows with no visible key follow
//! the same rule as [`build_window_mask`]: they stay `0.0` and are silenced by
//! [`build_live_rows`](super::build_live_rows).

use candle_core::{Device, Result, Tensor};

use super::window::build_window_mask;
use crate::core::WindowSize;

/// Construct a causal mask for the supplied sequence dimensions.
///
/// When `k_len > q_len`, queries are assumed to align with the most recent
/// `q_len` keys, allowing access to the extended prefix.
pub fn build_causal_mask(
    device: &Device,
    batch: usize,
    num_heads: usize,
    q_len: usize,
    k_len: usize,
) -> Result<Tensor> {
    let causal = WindowSize::UNBOUNDED.resolve(true);
    build_window_mask(device, q_len, k_len, causal)?
        .broadcast_as((batch, num_heads, q_len, k_len))?
        .contiguous()
}
