// crates/vt_physics/src/numerics/gradient/green_gauss.rs

//! Green-Gauss 梯度
//!
//! 散度定理把体积分化为面积分:
//!
//! ∇φ_i ≈ (1/V_i) Σ_f φ_f · n_f · A_f
//!
//! 内部面取两端点算术平均；边界面无对端，用本点值闭合面积分
//! (φ_f = φ_i)。周期环绕边已是内部面，分区切面由 halo 边覆盖，
//! 两者都不计入边界闭合。

use glam::DVec2;
use rayon::prelude::*;
use vt_mesh::SolverMesh;

use super::traits::GradientMethod;
use crate::state::{GradientField, PrimitiveView, N_VARS};
use crate::types::NumericalParams;

// ============================================================
// 配置
// ============================================================

/// Green-Gauss 梯度配置
#[derive(Debug, Clone)]
pub struct GreenGaussConfig {
    /// 是否启用并行
    pub parallel: bool,
    /// 并行阈值（点数）
    pub parallel_threshold: usize,
}

impl Default for GreenGaussConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 1000,
        }
    }
}

// ============================================================
// Green-Gauss 梯度计算器
// ============================================================

/// Green-Gauss 梯度计算器
#[derive(Debug, Clone)]
pub struct GreenGaussGradient {
    config: GreenGaussConfig,
}

impl Default for GreenGaussGradient {
    fn default() -> Self {
        Self {
            config: GreenGaussConfig::default(),
        }
    }
}

impl GreenGaussGradient {
    /// 创建新实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用配置创建
    pub fn with_config(config: GreenGaussConfig) -> Self {
        Self { config }
    }

    /// 从数值参数创建
    pub fn from_params(params: &NumericalParams) -> Self {
        Self {
            config: GreenGaussConfig {
                parallel: params.parallel,
                parallel_threshold: params.parallel_threshold,
            },
        }
    }

    /// 设置并行开关
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    /// 设置并行阈值
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.config.parallel_threshold = threshold;
        self
    }
}

/// 边界闭合向量 Σ n·A（按点聚合）
///
/// 周期边界与分区切面不是物理表面，跳过。
pub(super) fn boundary_closure_sums(mesh: &SolverMesh) -> Vec<DVec2> {
    let mut sums = vec![DVec2::ZERO; mesh.n_points()];
    for marker in mesh.markers() {
        if !marker.kind.requires_condition() {
            continue;
        }
        for v in marker.vertices() {
            sums[v.point] += v.normal * v.area;
        }
    }
    sums
}

/// 单点全部原始分量的 Green-Gauss 梯度
pub(super) fn point_gradient(
    point: usize,
    mesh: &SolverMesh,
    primitives: PrimitiveView<'_>,
    closure: &[DVec2],
) -> [DVec2; N_VARS] {
    let inv_volume = 1.0 / mesh.volume(point);
    let mut grad = [DVec2::ZERO; N_VARS];

    for &e in mesh.incident_edges(point) {
        let edge = mesh.edge(e as usize);
        let other = edge.other(point);
        // 法向约定 i→j，本点为 j 时取反
        let ds = if edge.i as usize == point {
            edge.normal
        } else {
            -edge.normal
        };
        for k in 0..N_VARS {
            let phi_face = 0.5 * (primitives.component(point, k) + primitives.component(other, k));
            grad[k] += ds * phi_face;
        }
    }

    let s = closure[point];
    for (k, g) in grad.iter_mut().enumerate() {
        *g = (*g + s * primitives.component(point, k)) * inv_volume;
    }
    grad
}

impl GradientMethod for GreenGaussGradient {
    fn compute(
        &self,
        mesh: &SolverMesh,
        primitives: PrimitiveView<'_>,
        output: &mut GradientField,
    ) {
        debug_assert_eq!(output.len(), mesh.n_points());
        let closure = boundary_closure_sums(mesh);
        let n_owned = mesh.n_owned();

        if self.config.parallel && n_owned >= self.config.parallel_threshold {
            let grads: Vec<[DVec2; N_VARS]> = (0..n_owned)
                .into_par_iter()
                .map(|p| point_gradient(p, mesh, primitives, &closure))
                .collect();
            for (p, g) in grads.into_iter().enumerate() {
                for k in 0..N_VARS {
                    output.comp[k][p] = g[k];
                }
            }
        } else {
            for p in 0..n_owned {
                let g = point_gradient(p, mesh, primitives, &closure);
                for k in 0..N_VARS {
                    output.comp[k][p] = g[k];
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "Green-Gauss"
    }
}

// ============================================================
// 测试
// ============================================================
