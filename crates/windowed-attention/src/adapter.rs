//! Causal, windowed front-end over a [`FusedKernel`].
//!
//! [`AttentionAdapter::wrap`] binds `q`, `k`, `v` and a left-context width to
//! the kernel with causal masking, the kernel's default softmax scale and a
//! `(width, unbounded)` window. The returned [`DeferredAttention`] yields the
//! output tensor. Kernel errors reach the caller untouched.

use std::sync::{Arc, Mutex, OnceLock};

use candle_core::{Device, Tensor};

use crate::core::{
    AttentionError, AttentionWidth, BackendSelection, Config, Evaluation, FusedKernel,
    KernelParams,
};
use crate::reference::ReferenceKernel;

#[derive(Debug)]
pub struct AttentionAdapter {
    kernel: Arc<dyn FusedKernel>,
    evaluation: Evaluation,
    first_wrap: OnceLock<()>,
}

impl AttentionAdapter {
    /// Adapter over `kernel` using eager evaluation.
    pub fn new(kernel: Arc<dyn FusedKernel>) -> Self {
        Self {
            kernel,
            evaluation: Evaluation::default(),
            first_wrap: OnceLock::new(),
        }
    }

    pub fn with_evaluation(mut self, evaluation: Evaluation) -> Self {
        self.evaluation = evaluation;
        self
    }

    /// Pick a kernel for `device` according to `config`.
    ///
    /// `Auto` prefers the fused kernel and falls back to the reference kernel
    /// when it is not compiled in or the device is not CUDA. `FusedOnly`
    /// reports those cases as [`AttentionError::BackendUnavailable`].
    pub fn from_config(config: &Config, device: &Device) -> Result<Self, AttentionError> {
        let reference = || -> Arc<dyn FusedKernel> {
            Arc::new(ReferenceKernel::with_precision(config.precision))
        };
        let kernel = match config.backend {
            BackendSelection::ReferenceOnly => reference(),
            BackendSelection::FusedOnly => fused_kernel(device)?,
            BackendSelection::Auto => fused_kernel(device).unwrap_or_else(|err| {
                log::debug!("using reference attention kernel: {err}");
                reference()
            }),
        };
        Ok(Self::new(kernel).with_evaluation(config.evaluation))
    }

    pub fn kernel_name(&self) -> &'static str {
        self.kernel.name()
    }

    pub fn evaluation(&self) -> Evaluation {
        self.evaluation
    }

    /// Bind causal attention over `q`, `k`, `v` limited to `width` positions
    /// of left context.
    ///
    /// In [`Evaluation::Eager`] mode the kernel runs here and any error it
    /// raises is returned from this call. In [`Evaluation::Lazy`] mode this
    /// never fails and the kernel runs on the first
    /// [`invoke`](DeferredAttention::invoke).
    pub fn wrap(
        &self,
        q: &Tensor,
        k: &Tensor,
        v: &Tensor,
        width: impl Into<AttentionWidth>,
    ) -> candle_core::Result<DeferredAttention> {
        let width = width.into();
        if self.first_wrap.set(()).is_ok() {
            log::info!(
                "windowed-attention init kernel={} evaluation={}",
                self.kernel.name(),
                self.evaluation
            );
        }
        log::debug!(
            "wrap q={:?} k={:?} v={:?} width={width:?} evaluation={}",
            q.dims(),
            k.dims(),
            v.dims(),
            self.evaluation
        );

        let call = KernelCall {
            kernel: Arc::clone(&self.kernel),
            q: q.clone(),
            k: k.clone(),
            v: v.clone(),
            params: KernelParams::causal_window(width),
        };
        let slot = match self.evaluation {
            Evaluation::Eager => Slot::Evaluated(call.run()?),
            Evaluation::Lazy => Slot::Pending {
                call,
                output: Mutex::new(None),
            },
        };
        Ok(DeferredAttention { slot })
    }
}

#[cfg(feature = "fused")]
fn fused_kernel(device: &Device) -> Result<Arc<dyn FusedKernel>, AttentionError> {
    if device.is_cuda() {
        Ok(Arc::new(crate::fused::FlashKernel::new()))
    } else {
        Err(AttentionError::BackendUnavailable {
            backend: "fused",
            reason: format!("flash-attention needs a CUDA device, got {:?}", device.location()),
        })
    }
}

#[cfg(not(feature = "fused"))]
fn fused_kernel(_device: &Device) -> Result<Arc<dyn FusedKernel>, AttentionError> {
    Err(AttentionError::BackendUnavailable {
        backend: "fused",
        reason: "built without the `fused` feature".to_string(),
    })
}

/// Attention output bound by [`AttentionAdapter::wrap`].
///
/// Every successful [`invoke`](Self::invoke) returns the same tensor (same
/// [`id`](Tensor::id)); the kernel runs at most once per successful
/// evaluation, even when several threads invoke concurrently.
#[derive(Debug)]
pub struct DeferredAttention {
    slot: Slot,
}

#[derive(Debug)]
enum Slot {
    Evaluated(Tensor),
    Pending {
        call: KernelCall,
        output: Mutex<Option<Tensor>>,
    },
}

#[derive(Debug)]
struct KernelCall {
    kernel: Arc<dyn FusedKernel>,
    q: Tensor,
    k: Tensor,
    v: Tensor,
    params: KernelParams,
}

impl KernelCall {
    fn run(&self) -> candle_core::Result<Tensor> {
        self.kernel.forward(&self.q, &self.k, &self.v, &self.params)
    }
}

impl DeferredAttention {
    /// Produce the attention output, running the kernel if it has not run yet.
    ///
    /// A failed kernel run is not cached; the next call retries.
    pub fn invoke(&self) -> candle_core::Result<Tensor> {
        match &self.slot {
            Slot::Evaluated(output) => Ok(output.clone()),
            Slot::Pending { call, output } => {
                // Held across the kernel run so concurrent callers wait for it.
                let mut guard = output.lock().map_err(|_| {
                    candle_core::Error::Msg("deferred attention mutex poisoned".to_string())
                })?;
                if let Some(done) = guard.as_ref() {
                    return Ok(done.clone());
                }
                let computed = call.run()?;
                *guard = Some(computed.clone());
                Ok(computed)
            }
        }
    }

    /// Whether the kernel has already produced the output.
    pub fn is_evaluated(&self) -> bool {
        match &self.slot {
            Slot::Evaluated(_) => true,
            Slot::Pending { output, .. } => output
                .lock()
                .map(|guard| guard.is_some())
                .unwrap_or(false),
        }
    }

    /// Turn into a zero-argument closure returning the output.
    pub fn into_fn(self) -> impl Fn() -> candle_core::Result<Tensor> + Send + Sync {
        move || self.invoke()
    }
}
