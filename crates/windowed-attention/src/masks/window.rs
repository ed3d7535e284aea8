//! Builders for windowed causal masks.
//!
//! Masks are shaped `[1, 1, q_len, k_len]` so they broadcast across batch and
//! heads. Rows without any visible key are left unmasked; pair them with
//! [`build_live_rows`] to zero those rows after the softmax.

use candle_core::{Device, Result, Tensor};

use crate::core::WindowSize;

/// Construct an additive mask admitting only the keys inside `window`.
pub fn build_window_mask(
    device: &Device,
    q_len: usize,
    k_len: usize,
    window: WindowSize,
) -> Result<Tensor> {
    let mut data = vec![f32::NEG_INFINITY; q_len * k_len];

    for q in 0..q_len {
        let row = &mut data[q * k_len..][..k_len];
        let visible = window.visible_keys(q, q_len, k_len);
        if visible.is_empty() {
            row.fill(0.0);
        } else {
            row[visible].fill(0.0);
        }
    }

    Tensor::from_vec(data, (1, 1, q_len, k_len), device)
}

/// Per-row multiplier that silences queries with no visible key.
///
/// Returns `None` when every row sees at least one key, otherwise a
/// `[1, 1, q_len, 1]` tensor holding `1.0` for live rows and `0.0` for empty
/// ones.
pub fn build_live_rows(
    device: &Device,
    q_len: usize,
    k_len: usize,
    window: WindowSize,
) -> Result<Option<Tensor>> {
    let live = (0..q_len)
        .map(|q| {
            if window.visible_keys(q, q_len, k_len).is_empty() {
                0f32
            } else {
                1f32
            }
        })
        .collect::<Vec<_>>();

    if live.iter().all(|&flag| flag == 1.0) {
        return Ok(None);
    }
    Tensor::from_vec(live, (1, 1, q_len, 1), device).map(Some)
}
