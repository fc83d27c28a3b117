// crates/vt_physics/src/numerics/gradient/least_squares.rs

//! 加权最小二乘梯度
//!
//! 最小化加权重构误差:
//!
//! min Σ_j w_j (φ_j − φ_i − ∇φ_i · r_ij)²,  w_j = 1/|r_ij|²
//!
//! 2D 下归结为 2×2 法方程:
//!
//! ```text
//! [a11 a12] [∂φ/∂x]   [b1]
//! [a12 a22] [∂φ/∂y] = [b2]
//! ```
//!
//! 模板取边连通邻居。邻居不足两个或法方程奇异时，
//! 该点回退到 Green-Gauss。

use glam::DVec2;
use rayon::prelude::*;
use vt_mesh::SolverMesh;

use super::green_gauss;
use super::traits::GradientMethod;
use crate::state::{GradientField, PrimitiveView, N_VARS};
use crate::types::NumericalParams;

// ============================================================
// 配置
// ============================================================

/// 最小二乘梯度配置
#[derive(Debug, Clone)]
pub struct LeastSquaresConfig {
    /// 行列式最小值（判断奇异性）
    pub det_min: f64,
    /// 是否启用并行
    pub parallel: bool,
    /// 并行阈值（点数）
    pub parallel_threshold: usize,
}

impl Default for LeastSquaresConfig {
    fn default() -> Self {
        Self {
            det_min: 1e-12,
            parallel: true,
            parallel_threshold: 1000,
        }
    }
}

// ============================================================
// 最小二乘梯度计算器
// ============================================================

/// 加权最小二乘梯度计算器
#[derive(Debug, Clone)]
pub struct LeastSquaresGradient {
    config: LeastSquaresConfig,
}

impl Default for LeastSquaresGradient {
    fn default() -> Self {
        Self {
            config: LeastSquaresConfig::default(),
        }
    }
}

impl LeastSquaresGradient {
    /// 创建新实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 从数值参数创建
    pub fn from_params(params: &NumericalParams) -> Self {
        Self {
            config: LeastSquaresConfig {
                det_min: params.det_min,
                parallel: params.parallel,
                parallel_threshold: params.parallel_threshold,
            },
        }
    }

    /// 设置行列式最小值
    pub fn with_det_min(mut self, det_min: f64) -> Self {
        self.config.det_min = det_min;
        self
    }

    /// 设置并行开关
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    /// 求解 2×2 对称系统
    #[inline]
    fn solve_2x2(
        a11: f64,
        a12: f64,
        a22: f64,
        b1: f64,
        b2: f64,
        det_min: f64,
    ) -> Option<(f64, f64)> {
        let det = a11 * a22 - a12 * a12;
        if det.abs() < det_min {
            return None;
        }
        let inv = 1.0 / det;
        let x1 = (a22 * b1 - a12 * b2) * inv;
        let x2 = (a11 * b2 - a12 * b1) * inv;
        if x1.is_finite() && x2.is_finite() {
            Some((x1, x2))
        } else {
            None
        }
    }

    /// 单点全部原始分量的最小二乘梯度
    ///
    /// 返回 `None` 表示模板退化，交给回退方法。
    fn point_gradient(
        &self,
        point: usize,
        mesh: &SolverMesh,
        primitives: PrimitiveView<'_>,
    ) -> Option<[DVec2; N_VARS]> {
        let xi = mesh.coords(point);

        let mut a11 = 0.0;
        let mut a12 = 0.0;
        let mut a22 = 0.0;
        let mut b1 = [0.0; N_VARS];
        let mut b2 = [0.0; N_VARS];
        let mut neighbor_count = 0usize;

        for other in mesh.neighbors(point) {
            let d = mesh.coords(other) - xi;
            let dist_sq = d.length_squared();
            if dist_sq < 1e-20 {
                continue;
            }

            // 距离平方反比加权
            let w = 1.0 / dist_sq;
            a11 += w * d.x * d.x;
            a12 += w * d.x * d.y;
            a22 += w * d.y * d.y;
            for k in 0..N_VARS {
                let dphi = primitives.component(other, k) - primitives.component(point, k);
                b1[k] += w * d.x * dphi;
                b2[k] += w * d.y * dphi;
            }
            neighbor_count += 1;
        }

        // 2D 梯度至少需要两个线性无关方向
        if neighbor_count < 2 {
            return None;
        }

        let mut grad = [DVec2::ZERO; N_VARS];
        for k in 0..N_VARS {
            let (gx, gy) = Self::solve_2x2(a11, a12, a22, b1[k], b2[k], self.config.det_min)?;
            grad[k] = DVec2::new(gx, gy);
        }
        Some(grad)
    }
}

impl GradientMethod for LeastSquaresGradient {
    fn compute(
        &self,
        mesh: &SolverMesh,
        primitives: PrimitiveView<'_>,
        output: &mut GradientField,
    ) {
        debug_assert_eq!(output.len(), mesh.n_points());
        let n_owned = mesh.n_owned();
        let mut fallback_points = Vec::new();

        if self.config.parallel && n_owned >= self.config.parallel_threshold {
            let grads: Vec<Option<[DVec2; N_VARS]>> = (0..n_owned)
                .into_par_iter()
                .map(|p| self.point_gradient(p, mesh, primitives))
                .collect();
            for (p, g) in grads.into_iter().enumerate() {
                match g {
                    Some(g) => {
                        for k in 0..N_VARS {
                            output.comp[k][p] = g[k];
                        }
                    }
                    None => fallback_points.push(p),
                }
            }
        } else {
            for p in 0..n_owned {
                match self.point_gradient(p, mesh, primitives) {
                    Some(g) => {
                        for k in 0..N_VARS {
                            output.comp[k][p] = g[k];
                        }
                    }
                    None => fallback_points.push(p),
                }
            }
        }

        // 退化模板回退到 Green-Gauss
        if !fallback_points.is_empty() {
            let closure = green_gauss::boundary_closure_sums(mesh);
            for p in fallback_points {
                let g = green_gauss::point_gradient(p, mesh, primitives, &closure);
                for k in 0..N_VARS {
                    output.comp[k][p] = g[k];
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "Least-Squares"
    }
}

// ============================================================
// 测试
// ============================================================
