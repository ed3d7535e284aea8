//! Mask utilities shared by attention implementations.
//!
//! All masks produced here are additive tensors with dtype `f32`. Values are
//! either `0.0` (keep) or `f32::NEG_INFINITY` (discard) to align with Candle's
//! softmax-friendly masking behaviour. A query row that sees no key at all is
//! left at `0.0` in every builder; [`build_live_rows`] zeroes its output.

pub mod causal;
pub mod window;

use candle_core::DType;

/// Dtype shared by all additive masks.
pub const MASK_DTYPE: DType = DType::F32;

pub use causal::build_causal_mask;
pub use window::{build_live_rows, build_window_mask};
