// crates/vt_physics/src/assembly/reconstruction.rs

//! MUSCL 面重构
//!
//! 二阶迎风路径沿每条边把两侧点值线性外推到边中点：
//!
//! ```text
//! q_L = q_i + φ_i·(∇q_i · r_i),   r_i = (x_j - x_i)/2
//! q_R = q_j + φ_j·(∇q_j · r_j),   r_j = (x_i - x_j)/2
//! ```
//!
//! 限制因子 φ ∈ [0, 1] 由限制器引擎预先算好。重构结果不做
//! 正性修正，非物理面状态由下游通量计算按数值发散报错。

use glam::DVec2;

use crate::state::{
    GradientField, LimiterField, PrimitiveState, PrimitiveView, N_VARS, PRIM_DENSITY,
    PRIM_PRESSURE, PRIM_VELOCITY_X, PRIM_VELOCITY_Y,
};

/// 单侧线性外推到边中点
#[inline]
fn extrapolate(
    primitives: &PrimitiveView<'_>,
    gradient: &GradientField,
    limiter: &LimiterField,
    point: usize,
    r: DVec2,
) -> PrimitiveState {
    let grads = gradient.get(point);
    let phis = limiter.get(point);
    let mut q = [0.0; N_VARS];
    for k in 0..N_VARS {
        q[k] = primitives.component(point, k) + phis[k] * grads[k].dot(r);
    }
    PrimitiveState::new(
        q[PRIM_DENSITY],
        DVec2::new(q[PRIM_VELOCITY_X], q[PRIM_VELOCITY_Y]),
        q[PRIM_PRESSURE],
    )
}

/// 重构一条边两侧的面状态
///
/// `xi`/`xj` 为两端点坐标，边中点近似取两点中点。
pub fn muscl_pair(
    primitives: &PrimitiveView<'_>,
    gradient: &GradientField,
    limiter: &LimiterField,
    i: usize,
    j: usize,
    xi: DVec2,
    xj: DVec2,
) -> (PrimitiveState, PrimitiveState) {
    let r = 0.5 * (xj - xi);
    let left = extrapolate(primitives, gradient, limiter, i, r);
    let right = extrapolate(primitives, gradient, limiter, j, -r);
    (left, right)
}

// ============================================================
// 测试
// ============================================================
