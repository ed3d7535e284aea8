//! Reference attention kernel built from plain Candle ops.
//!
//! The exact path prioritises numerical fidelity and mirrors the semantics
//! described by the [`FusedKernel`](crate::core::FusedKernel) trait, including
//! windowing, bottom-right alignment and grouped-query heads.

use candle_core::{bail, DType, Result, Tensor};
use candle_nn::ops::softmax_last_dim;

use crate::core::{FusedKernel, KernelParams, PrecisionPolicy};
use crate::masks::{build_live_rows, build_window_mask};

/// Numerically stable, portable attention kernel.
#[derive(Debug, Clone, Default)]
pub struct ReferenceKernel {
    precision: PrecisionPolicy,
}

impl ReferenceKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a kernel computing in the working precision chosen by `precision`.
    pub fn with_precision(precision: PrecisionPolicy) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> PrecisionPolicy {
        self.precision
    }
}

impl FusedKernel for ReferenceKernel {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn forward(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        params: &KernelParams,
    ) -> Result<Tensor> {
        let (batch, q_len, heads, head_dim) = q.dims4()?;
        let (kb, k_len, kv_heads, kd) = k.dims4()?;
        let (vb, vk, vh, vd) = v.dims4()?;

        if kb != batch || kd != head_dim {
            bail!(
                "k shape mismatch: expected [{batch}, ?, ?, {head_dim}] got [{kb}, {k_len}, {kv_heads}, {kd}]"
            )
        }
        if vb != batch || vk != k_len || vh != kv_heads || vd != head_dim {
            bail!(
                "v shape mismatch: expected [{batch}, {k_len}, {kv_heads}, {head_dim}] got [{vb}, {vk}, {vh}, {vd}]"
            )
        }
        if kv_heads == 0 || heads % kv_heads != 0 {
            bail!("query heads ({heads}) must be a multiple of key/value heads ({kv_heads})")
        }

        let device = q.device();
        if !device.same_device(k.device()) || !device.same_device(v.device()) {
            bail!("q, k, v must reside on the same device")
        }
        let dtype = q.dtype();
        if dtype != k.dtype() || dtype != v.dtype() {
            bail!(
                "q, k, v must share the same dtype: got {dtype:?}, {:?}, {:?}",
                k.dtype(),
                v.dtype()
            )
        }

        // No keys means every row is empty.
        if k_len == 0 || q_len == 0 {
            return Tensor::zeros(q.shape(), dtype, device);
        }

        let work = match self.precision {
            PrecisionPolicy::ForceF32 => DType::F32,
            PrecisionPolicy::Inherit => dtype,
        };

        // [batch, seq, heads, dim] -> [batch, heads, seq, dim]
        let q = q.to_dtype(work)?.transpose(1, 2)?.contiguous()?;
        let k = repeat_kv(k.to_dtype(work)?.transpose(1, 2)?, heads / kv_heads)?;
        let v = repeat_kv(v.to_dtype(work)?.transpose(1, 2)?, heads / kv_heads)?;

        let window = params.window.resolve(params.causal);
        let scale = params.scale_for(head_dim) as f64;

        let scores = q.matmul(&k.t()?.contiguous()?)?.affine(scale, 0.0)?;
        let mask = build_window_mask(q.device(), q_len, k_len, window)?.to_dtype(work)?;
        let probs = softmax_last_dim(&scores.broadcast_add(&mask)?)?;

        let mut output = probs.matmul(&v)?;
        if let Some(live) = build_live_rows(q.device(), q_len, k_len, window)? {
            output = output.broadcast_mul(&live.to_dtype(work)?)?;
        }

        output.transpose(1, 2)?.contiguous()?.to_dtype(dtype)
    }
}

/// Expand `[batch, kv_heads, seq, dim]` to `[batch, kv_heads * n_rep, seq, dim]`.
fn repeat_kv(xs: Tensor, n_rep: usize) -> Result<Tensor> {
    if n_rep == 1 {
        return xs.contiguous();
    }
    let (batch, kv_heads, seq_len, head_dim) = xs.dims4()?;
    xs.unsqueeze(2)?
        .expand((batch, kv_heads, n_rep, seq_len, head_dim))?
        .reshape((batch, kv_heads * n_rep, seq_len, head_dim))
}
