//! Attention window geometry.
//!
//! Windows follow the flash-attention convention: query row `i` is aligned to
//! the bottom-right corner of the `[q_len, k_len]` score matrix, so its
//! diagonal key is `i + k_len - q_len`. A window `(left, right)` lets that row
//! see keys in `[diag - left, diag + right]`, with `None` leaving a side
//! unbounded.

use std::ops::Range;

/// Left-context width handed to [`AttentionAdapter::wrap`](crate::AttentionAdapter::wrap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttentionWidth {
    /// Attend to at most this many positions before the current one.
    Tokens(usize),
    /// No limit on left context.
    Unbounded,
}

impl AttentionWidth {
    /// Interpret a signed width where any negative value (usually `-1`) means
    /// unbounded.
    pub fn from_signed(width: i64) -> Self {
        usize::try_from(width).map_or(Self::Unbounded, Self::Tokens)
    }

    pub fn tokens(self) -> Option<usize> {
        match self {
            Self::Tokens(n) => Some(n),
            Self::Unbounded => None,
        }
    }
}

impl From<usize> for AttentionWidth {
    fn from(value: usize) -> Self {
        Self::Tokens(value)
    }
}

impl From<Option<usize>> for AttentionWidth {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Self::Unbounded, Self::Tokens)
    }
}

/// Window bounds measured from each query's diagonal key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WindowSize {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl WindowSize {
    /// Full attention in both directions.
    pub const UNBOUNDED: Self = Self {
        left: None,
        right: None,
    };

    pub const fn new(left: Option<usize>, right: Option<usize>) -> Self {
        Self { left, right }
    }

    /// `(width, unbounded)`: limited left context, nothing said about the right.
    pub fn left_of(width: AttentionWidth) -> Self {
        Self::new(width.tokens(), None)
    }

    /// Build from a flash-attention style signed pair where negative means
    /// unbounded.
    pub fn from_signed(left: i64, right: i64) -> Self {
        Self::new(
            AttentionWidth::from_signed(left).tokens(),
            AttentionWidth::from_signed(right).tokens(),
        )
    }

    /// Window actually applied by a kernel: causal masking clamps the right
    /// side to zero.
    pub fn resolve(self, causal: bool) -> Self {
        if causal {
            Self::new(self.left, Some(0))
        } else {
            self
        }
    }

    /// Keys visible to query `row`, or an empty range when none are.
    pub fn visible_keys(&self, row: usize, q_len: usize, k_len: usize) -> Range<usize> {
        if k_len == 0 {
            return 0..0;
        }
        let diag = row as i64 + k_len as i64 - q_len as i64;
        let lo = match self.left {
            Some(left) => (diag - left as i64).max(0),
            None => 0,
        };
        let hi = match self.right {
            Some(right) => (diag + right as i64).min(k_len as i64 - 1),
            None => k_len as i64 - 1,
        };
        if hi < lo {
            return 0..0;
        }
        lo as usize..hi as usize + 1
    }
}
