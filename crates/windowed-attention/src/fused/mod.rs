//! Fused flash-attention kernel.
//!
//! Binds [`candle_flash_attn::flash_attn_windowed`]. Only compiled when the
//! `fused` feature is enabled; requires a CUDA device and `f16`/`bf16` inputs.

use candle_core::{Result, Tensor};

use crate::core::{FusedKernel, KernelParams};

/// Flash-attention v2 kernel from `candle-flash-attn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlashKernel;

impl FlashKernel {
    pub fn new() -> Self {
        Self
    }
}

impl FusedKernel for FlashKernel {
    fn name(&self) -> &'static str {
        "flash-attn"
    }

    fn forward(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        params: &KernelParams,
    ) -> Result<Tensor> {
        let (_, _, _, head_dim) = q.dims4()?;
        let window = params.window.resolve(params.causal);
        candle_flash_attn::flash_attn_windowed(
            q,
            k,
            v,
            params.scale_for(head_dim),
            window.left,
            window.right,
        )
    }
}
