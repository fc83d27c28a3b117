// crates/vt_physics/src/engine/timestep.rs

//! 时间步长控制
//!
//! 按 CFL 条件计算每点时间步长：
//!
//! $$ \Delta t_i = C \cdot \frac{V_i}{\Lambda_i} $$
//!
//! 对流谱半径 `Λ_i = Σ_面 (|ū·n̂| + c̄)·A` 对本点全部界面求和，
//! 物理边界面与内部边一样计入。NS 运行追加黏性谱半径
//! `Λ_v = Σ_面 max(4/3, γ/Pr)·ν̄·A²`，黏性步长按
//! `C·K_v·V²/Λ_v` 限制后与对流步长取小。
//!
//! 局部模式保留每点步长（定常加速收敛），全局模式取本分区
//! 最小值统一推进；跨分区的全局归约由外层驱动完成。

use rayon::prelude::*;
use vt_foundation::{VtError, VtResult};
use vt_mesh::SolverMesh;

use crate::state::FlowField;
use crate::types::{GasModel, NumericalParams, PhysicsModel, TimeStepMode, ViscosityLaw};

/// 黏性时间步安全系数
const VISCOUS_SAFETY: f64 = 0.25;

// ============================================================
// 步长摘要
// ============================================================

/// 一轮时间步计算的极值
#[derive(Debug, Clone, Copy)]
pub struct TimeStepSummary {
    /// 拥有点上最小步长 [s]
    pub min: f64,
    /// 拥有点上最大步长 [s]
    pub max: f64,
}

// ============================================================
// 控制器
// ============================================================

/// CFL 时间步控制器
#[derive(Debug, Clone)]
pub struct TimeStepController {
    gas: GasModel,
    /// NS 运行携带黏性律用于谱半径
    viscosity: Option<(ViscosityLaw, f64)>,
    cfl: f64,
    mode: TimeStepMode,
    dt_floor: f64,
    dt_ceiling: f64,
    parallel: bool,
    parallel_threshold: usize,
}

impl TimeStepController {
    /// 创建控制器
    pub fn new(
        gas: GasModel,
        physics: &PhysicsModel,
        cfl: f64,
        mode: TimeStepMode,
        params: &NumericalParams,
    ) -> Self {
        let viscosity = match *physics {
            PhysicsModel::Euler => None,
            PhysicsModel::NavierStokes { viscosity, prandtl } => Some((viscosity, prandtl)),
        };
        Self {
            gas,
            viscosity,
            cfl,
            mode,
            dt_floor: 1e-14,
            dt_ceiling: 1e6,
            parallel: params.parallel,
            parallel_threshold: params.parallel_threshold,
        }
    }

    /// 设置步长上下限
    pub fn with_limits(mut self, floor: f64, ceiling: f64) -> Self {
        self.dt_floor = floor;
        self.dt_ceiling = ceiling;
        self
    }

    /// 当前 CFL 数
    #[inline]
    pub fn cfl(&self) -> f64 {
        self.cfl
    }

    /// 调整 CFL 数
    pub fn set_cfl(&mut self, cfl: f64) {
        self.cfl = cfl.max(1e-6);
    }

    /// 步长选取方式
    #[inline]
    pub fn mode(&self) -> TimeStepMode {
        self.mode
    }

    /// 计算拥有点的时间步长并写入 `field.local_dt`
    ///
    /// 要求原始变量缓存已刷新。全局模式下所有拥有点取同一最小值。
    pub fn compute(&self, mesh: &SolverMesh, field: &mut FlowField) -> VtResult<TimeStepSummary> {
        let n_owned = mesh.n_owned();
        let primitives = field.primitive_view();

        // 谱半径散射：内部边加两端，物理边界面加本点
        let mut lambda_conv = vec![0.0; n_owned];
        let mut lambda_visc = if self.viscosity.is_some() {
            vec![0.0; n_owned]
        } else {
            Vec::new()
        };

        for e in 0..mesh.n_edges() {
            let edge = mesh.edge(e);
            let (i, j) = (edge.i as usize, edge.j as usize);
            let area = edge.area();
            let normal = edge.unit_normal();

            let mean_velocity = 0.5 * (primitives.velocity[i] + primitives.velocity[j]);
            let ci = self.gas.sound_speed(primitives.density[i], primitives.pressure[i]);
            let cj = self.gas.sound_speed(primitives.density[j], primitives.pressure[j]);
            let lambda = (mean_velocity.dot(normal).abs() + 0.5 * (ci + cj)) * area;
            if i < n_owned {
                lambda_conv[i] += lambda;
            }
            if j < n_owned {
                lambda_conv[j] += lambda;
            }

            if let Some((law, prandtl)) = self.viscosity {
                let nu = 0.5 * (self.kinematic_viscosity(&primitives, i, &law)
                    + self.kinematic_viscosity(&primitives, j, &law));
                let coeff = (4.0 / 3.0_f64).max(self.gas.gamma / prandtl);
                let lambda_v = coeff * nu * area * area;
                if i < n_owned {
                    lambda_visc[i] += lambda_v;
                }
                if j < n_owned {
                    lambda_visc[j] += lambda_v;
                }
            }
        }

        for marker in mesh.markers() {
            if !marker.kind.requires_condition() {
                continue;
            }
            for vertex in marker.vertices() {
                let p = vertex.point;
                if p >= n_owned {
                    continue;
                }
                let c = self.gas.sound_speed(primitives.density[p], primitives.pressure[p]);
                lambda_conv[p] +=
                    (primitives.velocity[p].dot(vertex.normal).abs() + c) * vertex.area;
                if let Some((law, prandtl)) = self.viscosity {
                    let nu = self.kinematic_viscosity(&primitives, p, &law);
                    let coeff = (4.0 / 3.0_f64).max(self.gas.gamma / prandtl);
                    lambda_visc[p] += coeff * nu * vertex.area * vertex.area;
                }
            }
        }

        // 逐点步长
        let point_dt = |p: usize| -> f64 {
            let volume = mesh.volume(p);
            let mut dt = if lambda_conv[p] > 0.0 {
                self.cfl * volume / lambda_conv[p]
            } else {
                self.dt_ceiling
            };
            if self.viscosity.is_some() && lambda_visc[p] > 0.0 {
                let dt_visc = self.cfl * VISCOUS_SAFETY * volume * volume / lambda_visc[p];
                dt = dt.min(dt_visc);
            }
            dt.clamp(self.dt_floor, self.dt_ceiling)
        };

        let dts: Vec<f64> = if self.parallel && n_owned >= self.parallel_threshold {
            (0..n_owned).into_par_iter().map(point_dt).collect()
        } else {
            (0..n_owned).map(point_dt).collect()
        };

        let mut min = f64::MAX;
        let mut max: f64 = 0.0;
        for (p, &dt) in dts.iter().enumerate() {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(VtError::numerical(
                    format!("时间步长非正或非有限: {:e}", dt),
                    format!("点 {}", p),
                ));
            }
            min = min.min(dt);
            max = max.max(dt);
        }

        match self.mode {
            TimeStepMode::Local => {
                field.local_dt[..n_owned].copy_from_slice(&dts);
            }
            TimeStepMode::Global => {
                for dt in field.local_dt[..n_owned].iter_mut() {
                    *dt = min;
                }
                max = min;
            }
        }

        Ok(TimeStepSummary { min, max })
    }

    fn kinematic_viscosity(
        &self,
        primitives: &crate::state::PrimitiveView<'_>,
        p: usize,
        law: &ViscosityLaw,
    ) -> f64 {
        let t = self
            .gas
            .temperature(primitives.density[p], primitives.pressure[p]);
        law.dynamic_viscosity(t) / primitives.density[p]
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PrimitiveState;
    use glam::DVec2;
    use vt_mesh::generation::{cartesian, cartesian_periodic, CartesianConfig};

    fn serial_params() -> NumericalParams {
        NumericalParams {
            parallel: false,
            ..NumericalParams::default()
        }
    }

    fn uniform_field(mesh: &SolverMesh, state: PrimitiveState) -> FlowField {
        let mut field = FlowField::new(mesh.n_points(), mesh.n_owned());
        field.initialize_uniform(state, &GasModel::AIR);
        field
    }

    #[test]
    fn test_local_dt_matches_formula() {
        // 周期 4×4，单位面与单位体积：每点 4 条边
        let mesh = cartesian_periodic(4, 4, 4.0, 4.0).unwrap();
        let state = PrimitiveState::new(1.2, DVec2::new(50.0, 0.0), 1.0e5);
        let mut field = uniform_field(&mesh, state);

        let controller = TimeStepController::new(
            GasModel::AIR,
            &PhysicsModel::Euler,
            0.5,
            TimeStepMode::Local,
            &serial_params(),
        );
        let summary = controller.compute(&mesh, &mut field).unwrap();

        let c = GasModel::AIR.sound_speed(1.2, 1.0e5);
        // x 向两面 |u·n̂| = 50，y 向两面为 0
        let lambda = 2.0 * (50.0 + c) + 2.0 * c;
        let expected = 0.5 * 1.0 / lambda;
        assert!(
            (summary.min - expected).abs() < 1e-12 * expected,
            "步长 {} 不符合公式值 {}",
            summary.min,
            expected
        );
        assert!((summary.max - summary.min).abs() < 1e-15);
        for p in 0..mesh.n_owned() {
            assert!((field.local_dt[p] - expected).abs() < 1e-12 * expected);
        }
    }

    #[test]
    fn test_boundary_faces_counted() {
        // 封闭矩形：边界点由标记面补足四个方向，均匀场下
        // 所有点的谱半径一致
        let mesh = cartesian(&CartesianConfig::new(4, 3, 4.0, 3.0)).unwrap();
        let state = PrimitiveState::new(1.2, DVec2::new(50.0, 0.0), 1.0e5);
        let mut field = uniform_field(&mesh, state);

        let controller = TimeStepController::new(
            GasModel::AIR,
            &PhysicsModel::Euler,
            0.8,
            TimeStepMode::Local,
            &serial_params(),
        );
        let summary = controller.compute(&mesh, &mut field).unwrap();

        assert!(
            (summary.max - summary.min).abs() < 1e-12 * summary.min,
            "边界面计入后均匀场步长应处处一致: [{}, {}]",
            summary.min,
            summary.max
        );
    }

    #[test]
    fn test_global_mode_takes_minimum() {
        let mesh = cartesian_periodic(4, 4, 4.0, 4.0).unwrap();
        let gas = GasModel::AIR;
        let mut field = FlowField::new(mesh.n_points(), mesh.n_owned());
        for p in 0..mesh.n_points() {
            // 点 0 声速最大，限制全局步长
            let pressure = if p == 0 { 4.0e5 } else { 1.0e5 };
            let q = PrimitiveState::new(1.2, DVec2::new(50.0, 0.0), pressure);
            field.conserved.set(p, q.to_conserved(&gas));
        }
        field.update_primitives(&gas, &serial_params()).unwrap();

        let local = TimeStepController::new(
            gas,
            &PhysicsModel::Euler,
            0.5,
            TimeStepMode::Local,
            &serial_params(),
        );
        let mut scratch = field.clone();
        let local_summary = local.compute(&mesh, &mut scratch).unwrap();
        assert!(local_summary.max > local_summary.min);

        let global = TimeStepController::new(
            gas,
            &PhysicsModel::Euler,
            0.5,
            TimeStepMode::Global,
            &serial_params(),
        );
        let summary = global.compute(&mesh, &mut field).unwrap();
        assert!((summary.min - local_summary.min).abs() < 1e-15);
        assert_eq!(summary.min, summary.max);
        for p in 0..mesh.n_owned() {
            assert_eq!(field.local_dt[p], summary.min);
        }
    }

    #[test]
    fn test_viscous_deflation_shrinks_dt() {
        let mesh = cartesian_periodic(4, 4, 4.0, 4.0).unwrap();
        let state = PrimitiveState::new(1.2, DVec2::new(50.0, 0.0), 1.0e5);

        let inviscid = TimeStepController::new(
            GasModel::AIR,
            &PhysicsModel::Euler,
            0.5,
            TimeStepMode::Local,
            &serial_params(),
        );
        let mut field = uniform_field(&mesh, state);
        let dt_euler = inviscid.compute(&mesh, &mut field).unwrap().min;

        // 极端黏性使黏性限制起效
        let sticky = PhysicsModel::navier_stokes(ViscosityLaw::Constant(100.0));
        let viscous = TimeStepController::new(
            GasModel::AIR,
            &sticky,
            0.5,
            TimeStepMode::Local,
            &serial_params(),
        );
        let mut field = uniform_field(&mesh, state);
        let dt_ns = viscous.compute(&mesh, &mut field).unwrap().min;

        assert!(dt_ns < dt_euler, "黏性步长 {} 应小于无黏 {}", dt_ns, dt_euler);
        assert!(dt_ns > 0.0);
    }

    #[test]
    fn test_dt_positive_on_varying_field() {
        let mesh = cartesian_periodic(5, 5, 5.0, 5.0).unwrap();
        let gas = GasModel::AIR;
        let mut field = FlowField::new(mesh.n_points(), mesh.n_owned());
        for p in 0..mesh.n_points() {
            let q = PrimitiveState::new(
                0.8 + 0.05 * (p % 7) as f64,
                DVec2::new(-120.0 + 11.0 * p as f64, 40.0 - 3.0 * p as f64),
                6.0e4 + 4.0e3 * p as f64,
            );
            field.conserved.set(p, q.to_conserved(&gas));
        }
        field.update_primitives(&gas, &serial_params()).unwrap();

        let controller = TimeStepController::new(
            gas,
            &PhysicsModel::Euler,
            0.9,
            TimeStepMode::Local,
            &serial_params(),
        );
        let summary = controller.compute(&mesh, &mut field).unwrap();
        assert!(summary.min > 0.0 && summary.min.is_finite());
        assert!(summary.max >= summary.min);
        for p in 0..mesh.n_owned() {
            assert!(field.local_dt[p] > 0.0);
        }
    }
}
