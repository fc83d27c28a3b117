// crates/vt_physics/src/numerics/limiter/engine.rs

//! 限制器引擎
//!
//! 两遍扫描刷新拥有点的限制因子:
//!
//! 1. 包络遍: 按分量收集边连通邻域的最小/最大值（含本点），
//!    写入 [`LimiterField`] 的包络缓存
//! 2. 限制遍: 沿每条关联边外推 Δ = ∇q·r（r 为到边中点的半程
//!    向量），对所有边取最严限制因子
//!
//! halo 邻居的场值参与包络；halo 点自身的 φ 由分区同步填充。

use rayon::prelude::*;
use vt_mesh::SolverMesh;

use super::create_limiter;
use super::traits::{LimiterContext, SlopeLimiter};
use crate::state::{GradientField, LimiterField, PrimitiveView, N_VARS};
use crate::types::{LimiterKind, NumericalParams};

/// 限制器引擎
pub struct LimiterEngine {
    kind: LimiterKind,
    limiter: Box<dyn SlopeLimiter>,
    parallel: bool,
    parallel_threshold: usize,
}

impl LimiterEngine {
    /// 按配置创建引擎
    pub fn new(kind: LimiterKind, params: &NumericalParams) -> Self {
        Self {
            kind,
            limiter: create_limiter(kind, params),
            parallel: params.parallel,
            parallel_threshold: params.parallel_threshold,
        }
    }

    /// 限制器类型
    #[inline]
    pub fn kind(&self) -> LimiterKind {
        self.kind
    }

    /// 限制器名称
    pub fn name(&self) -> &'static str {
        self.limiter.name()
    }

    /// 刷新拥有点的包络与限制因子
    pub fn compute(
        &self,
        mesh: &SolverMesh,
        primitives: PrimitiveView<'_>,
        gradient: &GradientField,
        output: &mut LimiterField,
    ) {
        debug_assert_eq!(output.len(), mesh.n_points());

        if self.kind == LimiterKind::None {
            output.reset();
            return;
        }

        let n_owned = mesh.n_owned();
        let use_parallel = self.parallel && n_owned >= self.parallel_threshold;

        // 包络遍
        if use_parallel {
            let envelopes: Vec<([f64; N_VARS], [f64; N_VARS])> = (0..n_owned)
                .into_par_iter()
                .map(|p| point_envelope(p, mesh, primitives))
                .collect();
            for (p, (lo, hi)) in envelopes.into_iter().enumerate() {
                for k in 0..N_VARS {
                    output.env_min[k][p] = lo[k];
                    output.env_max[k][p] = hi[k];
                }
            }
        } else {
            for p in 0..n_owned {
                let (lo, hi) = point_envelope(p, mesh, primitives);
                for k in 0..N_VARS {
                    output.env_min[k][p] = lo[k];
                    output.env_max[k][p] = hi[k];
                }
            }
        }

        // 限制遍
        if use_parallel {
            let env_min = &output.env_min;
            let env_max = &output.env_max;
            let phis: Vec<[f64; N_VARS]> = (0..n_owned)
                .into_par_iter()
                .map(|p| {
                    point_limiter(
                        self.limiter.as_ref(),
                        p,
                        mesh,
                        primitives,
                        gradient,
                        env_min,
                        env_max,
                    )
                })
                .collect();
            for (p, phi) in phis.into_iter().enumerate() {
                for k in 0..N_VARS {
                    output.phi[k][p] = phi[k];
                }
            }
        } else {
            for p in 0..n_owned {
                let phi = point_limiter(
                    self.limiter.as_ref(),
                    p,
                    mesh,
                    primitives,
                    gradient,
                    &output.env_min,
                    &output.env_max,
                );
                for k in 0..N_VARS {
                    output.phi[k][p] = phi[k];
                }
            }
        }
    }
}

/// 单点邻域包络（含本点）
fn point_envelope(
    point: usize,
    mesh: &SolverMesh,
    primitives: PrimitiveView<'_>,
) -> ([f64; N_VARS], [f64; N_VARS]) {
    let mut lo = [0.0; N_VARS];
    let mut hi = [0.0; N_VARS];
    for k in 0..N_VARS {
        let v = primitives.component(point, k);
        lo[k] = v;
        hi[k] = v;
    }
    for other in mesh.neighbors(point) {
        for k in 0..N_VARS {
            let v = primitives.component(other, k);
            lo[k] = lo[k].min(v);
            hi[k] = hi[k].max(v);
        }
    }
    (lo, hi)
}

/// 单点全部分量的限制因子（对所有关联边取最小）
#[allow(clippy::too_many_arguments)]
fn point_limiter(
    limiter: &dyn SlopeLimiter,
    point: usize,
    mesh: &SolverMesh,
    primitives: PrimitiveView<'_>,
    gradient: &GradientField,
    env_min: &[Vec<f64>; N_VARS],
    env_max: &[Vec<f64>; N_VARS],
) -> [f64; N_VARS] {
    let xi = mesh.coords(point);
    let mesh_scale = mesh.volume(point).sqrt();
    let grads = gradient.get(point);
    let mut phi = [1.0_f64; N_VARS];

    for &e in mesh.incident_edges(point) {
        let edge = mesh.edge(e as usize);
        let other = edge.other(point);
        // 边中点近似为两点中点
        let r = 0.5 * (mesh.coords(other) - xi);
        for k in 0..N_VARS {
            let ctx = LimiterContext::new(
                primitives.component(point, k),
                grads[k].dot(r),
                env_min[k][point],
                env_max[k][point],
                mesh_scale,
            );
            phi[k] = phi[k].min(limiter.compute(&ctx));
        }
    }
    phi
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::gradient::{GradientMethod, GreenGaussGradient};
    use crate::state::PRIM_DENSITY;
    use glam::DVec2;
    use vt_mesh::generation::{cartesian, CartesianConfig};

    /// x 方向密度阶跃场（第一列 1.0，其余 2.0）
    fn step_setup(mesh: &vt_mesh::SolverMesh) -> (Vec<f64>, Vec<DVec2>, Vec<f64>) {
        let n = mesh.n_points();
        let mut density = Vec::with_capacity(n);
        for p in 0..n {
            density.push(if mesh.coords(p).x < 0.5 { 1.0 } else { 2.0 });
        }
        (density, vec![DVec2::ZERO; n], vec![1.0; n])
    }

    #[test]
    fn test_uniform_field_unlimited() {
        let mesh = cartesian(&CartesianConfig::new(3, 3, 3.0, 3.0)).unwrap();
        let density = vec![1.0; 9];
        let velocity = vec![DVec2::new(2.0, 1.0); 9];
        let pressure = vec![5.0; 9];
        let view = PrimitiveView {
            density: &density,
            velocity: &velocity,
            pressure: &pressure,
        };

        let params = NumericalParams::default();
        let gradient = GradientField::new(9);
        let mut limiter = LimiterField::new(9);
        LimiterEngine::new(LimiterKind::Venkatakrishnan, &params).compute(
            &mesh,
            view,
            &gradient,
            &mut limiter,
        );

        for p in 0..9 {
            for phi in limiter.get(p) {
                assert!((phi - 1.0).abs() < 1e-12, "均匀场不应限制: φ={}", phi);
            }
        }
    }

    #[test]
    fn test_step_downstream_limited() {
        let mesh = cartesian(&CartesianConfig::new(3, 3, 3.0, 3.0)).unwrap();
        let (density, velocity, pressure) = step_setup(&mesh);
        let view = PrimitiveView {
            density: &density,
            velocity: &velocity,
            pressure: &pressure,
        };

        let params = NumericalParams::default();
        let mut gradient = GradientField::new(9);
        GreenGaussGradient::new()
            .with_parallel(false)
            .compute(&mesh, view, &mut gradient);

        let mut limiter = LimiterField::new(9);
        LimiterEngine::new(LimiterKind::Minmod, &params).compute(
            &mesh,
            view,
            &gradient,
            &mut limiter,
        );

        for p in 0..9 {
            for phi in limiter.get(p) {
                assert!((0.0..=1.0).contains(&phi));
            }
        }
        // 阶跃高侧中列点：自身值即包络上界，但阶跃让梯度非零，
        // 朝高侧的正外推 Δ⁺ = 0，密度限制因子应完全归零
        let downstream = 4;
        assert!(limiter.phi[PRIM_DENSITY][downstream] < 1e-10);
    }

    #[test]
    fn test_reconstruction_stays_in_envelope() {
        let mesh = cartesian(&CartesianConfig::new(3, 3, 3.0, 3.0)).unwrap();
        let (density, velocity, pressure) = step_setup(&mesh);
        let view = PrimitiveView {
            density: &density,
            velocity: &velocity,
            pressure: &pressure,
        };

        let params = NumericalParams::default();
        let mut gradient = GradientField::new(9);
        GreenGaussGradient::new()
            .with_parallel(false)
            .compute(&mesh, view, &mut gradient);

        let mut limiter = LimiterField::new(9);
        LimiterEngine::new(LimiterKind::Minmod, &params).compute(
            &mesh,
            view,
            &gradient,
            &mut limiter,
        );

        // 限制后的线性外推不越出邻域包络
        for p in 0..9 {
            let grads = gradient.get(p);
            let phis = limiter.get(p);
            for &e in mesh.incident_edges(p) {
                let edge = mesh.edge(e as usize);
                let r = 0.5 * (mesh.coords(edge.other(p)) - mesh.coords(p));
                for k in 0..N_VARS {
                    let q_face = view.component(p, k) + phis[k] * grads[k].dot(r);
                    let lo = limiter.env_min[k][p];
                    let hi = limiter.env_max[k][p];
                    assert!(
                        q_face >= lo - 1e-10 && q_face <= hi + 1e-10,
                        "点 {} 分量 {} 重构值 {} 越出包络 [{}, {}]",
                        p,
                        k,
                        q_face,
                        lo,
                        hi
                    );
                }
            }
        }
    }

    #[test]
    fn test_none_kind_all_ones() {
        let mesh = cartesian(&CartesianConfig::new(3, 3, 3.0, 3.0)).unwrap();
        let (density, velocity, pressure) = step_setup(&mesh);
        let view = PrimitiveView {
            density: &density,
            velocity: &velocity,
            pressure: &pressure,
        };

        let params = NumericalParams::default();
        let mut gradient = GradientField::new(9);
        GreenGaussGradient::new()
            .with_parallel(false)
            .compute(&mesh, view, &mut gradient);

        let mut limiter = LimiterField::new(9);
        // 预置脏数据，确认 None 会重置
        limiter.phi[0][4] = 0.3;
        LimiterEngine::new(LimiterKind::None, &params).compute(
            &mesh,
            view,
            &gradient,
            &mut limiter,
        );
        for p in 0..9 {
            for phi in limiter.get(p) {
                assert_eq!(phi, 1.0);
            }
        }
    }
}
