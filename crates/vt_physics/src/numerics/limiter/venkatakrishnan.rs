// crates/vt_physics/src/numerics/limiter/venkatakrishnan.rs

//! Venkatakrishnan 限制器
//!
//! 用光滑函数替代硬 min 操作，避免定常计算中限制因子的
//! 开关抖动。ε² = (K·h)³ 随本点网格尺度变化，h 取 √V。
//!
//! # K 参数
//!
//! - 0.01-0.1: 强限制，激波主导流动
//! - 0.1-1.0: 通用
//! - 1.0 以上: 弱限制，光滑流动
//!
//! # 参考文献
//!
//! Venkatakrishnan, V. (1993). "On the accuracy of limiters and
//! convergence to steady state solutions". AIAA Paper 93-0880.

use super::traits::{LimiterContext, SlopeLimiter};

/// Venkatakrishnan 限制器
#[derive(Debug, Clone, Copy)]
pub struct Venkatakrishnan {
    k: f64,
    tol: f64,
}

impl Venkatakrishnan {
    /// 创建限制器
    pub fn new(k: f64) -> Self {
        Self { k, tol: 1e-12 }
    }

    /// 创建具有自定义容差的限制器
    pub fn with_tolerance(k: f64, tol: f64) -> Self {
        Self { k, tol }
    }

    /// K 参数
    #[inline]
    pub fn k(&self) -> f64 {
        self.k
    }

    /// 光滑限制函数
    #[inline]
    fn phi(&self, x: f64, y: f64, eps2: f64) -> f64 {
        let x2 = x * x;
        let y2 = y * y;

        let numerator = (y2 + eps2) * x + 2.0 * x2 * y;
        let denominator = y2 + 2.0 * x2 + x * y + eps2;

        if denominator.abs() < self.tol {
            1.0
        } else {
            numerator / denominator
        }
    }
}

impl Default for Venkatakrishnan {
    fn default() -> Self {
        Self::new(0.3)
    }
}

impl SlopeLimiter for Venkatakrishnan {
    #[inline]
    fn compute(&self, ctx: &LimiterContext) -> f64 {
        if ctx.is_delta_zero(self.tol) {
            return 1.0;
        }

        let kh = self.k * ctx.mesh_scale;
        let eps2 = kh * kh * kh;
        let delta = ctx.delta;

        if delta > 0.0 {
            let delta_max = ctx.delta_max();
            if delta_max < self.tol {
                0.0
            } else {
                self.phi(delta, delta_max, eps2).min(1.0)
            }
        } else {
            let delta_min = ctx.delta_min();
            if delta_min > -self.tol {
                0.0
            } else {
                self.phi(-delta, -delta_min, eps2).min(1.0)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Venkatakrishnan"
    }
}
