// crates/vt_physics/src/numerics/limiter/traits.rs

//! 限制器接口与上下文
//!
//! 限制因子 φ ∈ [0, 1] 约束二阶重构:
//!
//! ```text
//! q_face = q_i + φ · (∇q · r)
//! ```
//!
//! 其中 r 为本点到边中点的向量。限制器保证重构值不超出
//! 邻域包络 `[q_min, q_max]`。

use std::fmt::Debug;

/// 限制器计算上下文
///
/// 单点单分量的一次外推所需的全部数据。
#[derive(Debug, Clone, Copy)]
pub struct LimiterContext {
    /// 本点场值 q_i
    pub point_value: f64,
    /// 沿边外推量 Δ = ∇q · r
    pub delta: f64,
    /// 邻域最小值（含本点）
    pub min_neighbor: f64,
    /// 邻域最大值（含本点）
    pub max_neighbor: f64,
    /// 本点网格特征尺度 h = √V
    pub mesh_scale: f64,
}

impl LimiterContext {
    /// 创建限制器上下文
    #[inline]
    pub fn new(
        point_value: f64,
        delta: f64,
        min_neighbor: f64,
        max_neighbor: f64,
        mesh_scale: f64,
    ) -> Self {
        Self {
            point_value,
            delta,
            min_neighbor,
            max_neighbor,
            mesh_scale,
        }
    }

    /// 允许的最大正向变化 Δ⁺ = q_max − q_i
    #[inline]
    pub fn delta_max(&self) -> f64 {
        self.max_neighbor - self.point_value
    }

    /// 允许的最大负向变化 Δ⁻ = q_min − q_i
    #[inline]
    pub fn delta_min(&self) -> f64 {
        self.min_neighbor - self.point_value
    }

    /// 外推量是否接近零
    #[inline]
    pub fn is_delta_zero(&self, eps: f64) -> bool {
        self.delta.abs() < eps
    }
}

impl Default for LimiterContext {
    fn default() -> Self {
        Self {
            point_value: 0.0,
            delta: 0.0,
            min_neighbor: 0.0,
            max_neighbor: 0.0,
            mesh_scale: 1.0,
        }
    }
}

/// 斜率限制器
pub trait SlopeLimiter: Debug + Send + Sync {
    /// 计算单次外推的限制因子 φ ∈ [0, 1]
    fn compute(&self, ctx: &LimiterContext) -> f64;

    /// 限制器名称
    fn name(&self) -> &'static str;
}

/// 无限制器（始终返回 1，即不限制）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimiter;

impl NoLimiter {
    /// 创建无限制器
    pub fn new() -> Self {
        Self
    }
}

impl SlopeLimiter for NoLimiter {
    #[inline]
    fn compute(&self, _ctx: &LimiterContext) -> f64 {
        1.0
    }

    fn name(&self) -> &'static str {
        "None"
    }
}

// ============================================================
// 测试
// ============================================================
