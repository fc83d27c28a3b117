// crates/vt_physics/src/numerics/limiter/minmod.rs

//! Minmod 限制器
//!
//! 最耗散的经典 TVD 限制器:
//!
//! ```text
//!                ⎧ min(|a|, |b|) · sign(a)   sign(a) = sign(b)
//! minmod(a, b) = ⎨
//!                ⎩ 0                          sign(a) ≠ sign(b)
//! ```
//!
//! 对外推量 Δ 与包络余量的比值取 minmod(1, ratio)。间断附近
//! 完全退回一阶，稳定性最好，光滑区域偏耗散。

use super::traits::{LimiterContext, SlopeLimiter};

/// Minmod 限制器
#[derive(Debug, Clone, Copy)]
pub struct Minmod {
    /// 判零容差
    eps: f64,
}

impl Default for Minmod {
    fn default() -> Self {
        Self { eps: 1e-12 }
    }
}

impl Minmod {
    /// 创建 Minmod 限制器
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建具有自定义容差的限制器
    pub fn with_tolerance(eps: f64) -> Self {
        Self { eps }
    }

    /// Minmod 函数
    #[inline]
    fn minmod(&self, a: f64, b: f64) -> f64 {
        if a * b <= 0.0 {
            0.0
        } else if a > 0.0 {
            a.min(b)
        } else {
            a.max(b)
        }
    }
}

impl SlopeLimiter for Minmod {
    fn compute(&self, ctx: &LimiterContext) -> f64 {
        if ctx.is_delta_zero(self.eps) {
            return 1.0;
        }

        let delta = ctx.delta;
        let ratio = if delta > 0.0 {
            let delta_max = ctx.delta_max();
            if delta_max < self.eps {
                0.0
            } else {
                delta_max / delta
            }
        } else {
            let delta_min = ctx.delta_min();
            if delta_min > -self.eps {
                0.0
            } else {
                delta_min / delta
            }
        };

        self.minmod(1.0, ratio).max(0.0)
    }

    fn name(&self) -> &'static str {
        "Minmod"
    }
}
