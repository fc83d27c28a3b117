// crates/vt_physics/src/schemes/viscous.rs

//! 粘性通量
//!
//! Navier-Stokes 扩散项的界面离散。面上梯度取两侧平均并沿
//! 边方向校正，抑制棋盘模态：
//!
//! ```text
//! ∇φ̄ = 0.5 (∇φ_i + ∇φ_j)
//! ∇φ_f = ∇φ̄ - [∇φ̄·ê - (φ_j - φ_i)/|e|] ê,   ê = e/|e|
//! ```
//!
//! 粘性应力与热流：
//!
//! ```text
//! τ = μ (∇v + ∇vᵀ) - (2/3) μ (∇·v) I
//! q = -k ∇T,   k = μ c_p / Pr
//! ```
//!
//! 温度梯度由密度与压力梯度通过状态方程重构：
//! ∇T = (∇p - (p/ρ) ∇ρ) / (ρ R)。
//!
//! 粘性通量按物理方向（动量与热量的扩散输运）给出，
//! 装配时从对流通量中减去。
//!
//! # 雅可比
//!
//! 薄剪切层近似：梯度只保留边法向分量 (φ_j - φ_i)/d，
//! 平均量冻结。得到的块对 (∂F_v/∂U_i, ∂F_v/∂U_j) 严格
//! 互为相反数。

use glam::DVec2;

use super::flux::{pressure_derivative, FluxError, FluxJacobians};
use crate::numerics::Block4;
use crate::state::{
    Flux, PrimitiveState, N_VARS, PRIM_DENSITY, PRIM_PRESSURE, PRIM_VELOCITY_X, PRIM_VELOCITY_Y,
};
use crate::types::{GasModel, PhysicsModel, ViscosityLaw};

// ============================================================================
// 结果类型
// ============================================================================

/// 粘性通量计算结果
#[derive(Debug, Clone, Copy)]
pub struct ViscousResult {
    /// 单位面积粘性通量（质量分量恒为零）
    pub flux: Flux,
    /// 通量对两侧守恒状态的导数，仅在请求时计算
    pub jacobians: Option<FluxJacobians>,
}

// ============================================================================
// 粘性格式
// ============================================================================

/// 粘性通量格式
///
/// 持有气体模型、粘性定律与 Prandtl 数，对每条边独立求值。
#[derive(Debug, Clone)]
pub struct ViscousScheme {
    /// 气体模型
    gas: GasModel,
    /// 动力粘性定律
    viscosity: ViscosityLaw,
    /// Prandtl 数
    prandtl: f64,
}

impl ViscousScheme {
    /// 创建粘性格式
    pub fn new(gas: GasModel, viscosity: ViscosityLaw, prandtl: f64) -> Self {
        Self {
            gas,
            viscosity,
            prandtl,
        }
    }

    /// 从物理模型创建，Euler 模型返回 `None`
    pub fn from_model(gas: GasModel, model: &PhysicsModel) -> Option<Self> {
        match model {
            PhysicsModel::Euler => None,
            PhysicsModel::NavierStokes { viscosity, prandtl } => {
                Some(Self::new(gas, *viscosity, *prandtl))
            }
        }
    }

    /// Prandtl 数
    #[inline]
    pub fn prandtl(&self) -> f64 {
        self.prandtl
    }

    /// 按温度求动力粘性
    #[inline]
    pub fn dynamic_viscosity(&self, temperature: f64) -> f64 {
        self.viscosity.dynamic_viscosity(temperature)
    }

    /// 计算界面粘性通量
    ///
    /// # 参数
    /// - `left`/`right`: 界面两侧原始状态（点值，不做重构）
    /// - `grad_left`/`grad_right`: 两侧原始变量梯度 [ρ, u, v, p]
    /// - `edge_vector`: 由左点指向右点的位置差 x_R - x_L
    /// - `unit_normal`: 单位法向量，由左指向右
    /// - `with_jacobian`: 是否计算薄剪切层雅可比
    pub fn evaluate(
        &self,
        left: &PrimitiveState,
        right: &PrimitiveState,
        grad_left: [DVec2; N_VARS],
        grad_right: [DVec2; N_VARS],
        edge_vector: DVec2,
        unit_normal: DVec2,
        with_jacobian: bool,
    ) -> Result<ViscousResult, FluxError> {
        let dist = edge_vector.length();
        if !(dist > 0.0) || !dist.is_finite() {
            return Err(FluxError::InvalidInput {
                message: format!("边长度非法: {:e}", dist),
            });
        }
        let edge_dir = edge_vector / dist;

        // 两侧温度与温度梯度
        let t_left = left.temperature(&self.gas);
        let t_right = right.temperature(&self.gas);
        let grad_t_left = temperature_gradient(left, &grad_left, &self.gas);
        let grad_t_right = temperature_gradient(right, &grad_right, &self.gas);

        // 面上校正梯度
        let grad_u = corrected_gradient(
            grad_left[PRIM_VELOCITY_X],
            grad_right[PRIM_VELOCITY_X],
            left.velocity.x,
            right.velocity.x,
            edge_dir,
            dist,
        );
        let grad_v = corrected_gradient(
            grad_left[PRIM_VELOCITY_Y],
            grad_right[PRIM_VELOCITY_Y],
            left.velocity.y,
            right.velocity.y,
            edge_dir,
            dist,
        );
        let grad_t = corrected_gradient(grad_t_left, grad_t_right, t_left, t_right, edge_dir, dist);

        // 面上平均量
        let mean_velocity = (left.velocity + right.velocity) * 0.5;
        let mu = 0.5
            * (self.viscosity.dynamic_viscosity(t_left)
                + self.viscosity.dynamic_viscosity(t_right));
        let conductivity = mu * self.gas.cp() / self.prandtl;

        // 应力张量
        let divergence = grad_u.x + grad_v.y;
        let tau_xx = mu * (2.0 * grad_u.x) - 2.0 / 3.0 * mu * divergence;
        let tau_yy = mu * (2.0 * grad_v.y) - 2.0 / 3.0 * mu * divergence;
        let tau_xy = mu * (grad_u.y + grad_v.x);

        let (nx, ny) = (unit_normal.x, unit_normal.y);
        let momentum_x = tau_xx * nx + tau_xy * ny;
        let momentum_y = tau_xy * nx + tau_yy * ny;
        let energy = momentum_x * mean_velocity.x
            + momentum_y * mean_velocity.y
            + conductivity * grad_t.dot(unit_normal);

        let flux = Flux::new(0.0, momentum_x, momentum_y, energy);
        if !flux.is_valid() {
            return Err(FluxError::Numerical {
                message: format!(
                    "粘性通量非有限: 左 ρ={:e} T={:e}，右 ρ={:e} T={:e}",
                    left.density, t_left, right.density, t_right
                ),
            });
        }

        let jacobians = if with_jacobian {
            let mean = PrimitiveState::new(
                0.5 * (left.density + right.density),
                mean_velocity,
                0.5 * (left.pressure + right.pressure),
            );
            let g = self.tsl_jacobian(&mean, mu, conductivity, unit_normal, dist);
            Some(FluxJacobians::new(-g, g))
        } else {
            None
        };

        Ok(ViscousResult { flux, jacobians })
    }

    /// 薄剪切层雅可比 G = ∂F_v/∂U_R（∂F_v/∂U_L = -G）
    fn tsl_jacobian(
        &self,
        mean: &PrimitiveState,
        mu: f64,
        conductivity: f64,
        unit_normal: DVec2,
        dist: f64,
    ) -> Block4 {
        let (nx, ny) = (unit_normal.x, unit_normal.y);
        let (u, v) = (mean.velocity.x, mean.velocity.y);

        // 动量块 (μ/d)(I + n⊗n/3) 经 ∂v/∂U 映射
        let theta_x = 1.0 + nx * nx / 3.0;
        let theta_y = 1.0 + ny * ny / 3.0;
        let eta = nx * ny / 3.0;
        let pi_x = u * theta_x + v * eta;
        let pi_y = u * eta + v * theta_y;

        let factor = mu / (dist * mean.density);

        let mut m = [[0.0; 4]; 4];
        m[1][0] = -factor * pi_x;
        m[1][1] = factor * theta_x;
        m[1][2] = factor * eta;
        m[2][0] = -factor * pi_y;
        m[2][1] = factor * eta;
        m[2][2] = factor * theta_y;

        // 能量行：应力做功 + 热传导
        m[3][0] = -factor * (u * pi_x + v * pi_y);
        m[3][1] = factor * pi_x;
        m[3][2] = factor * pi_y;

        let t_mean = mean.temperature(&self.gas);
        let dp = pressure_derivative(mean, &self.gas);
        let inv_rho_r = 1.0 / (mean.density * self.gas.gas_constant);
        let heat = conductivity / dist;
        m[3][0] += heat * (dp[0] * inv_rho_r - t_mean / mean.density);
        m[3][1] += heat * dp[1] * inv_rho_r;
        m[3][2] += heat * dp[2] * inv_rho_r;
        m[3][3] += heat * dp[3] * inv_rho_r;

        Block4::new(m)
    }
}

/// 由状态方程重构温度梯度
///
/// T = p/(ρR) ⇒ ∇T = (∇p - (p/ρ)∇ρ) / (ρR)
#[inline]
pub fn temperature_gradient(
    q: &PrimitiveState,
    grad: &[DVec2; N_VARS],
    gas: &GasModel,
) -> DVec2 {
    let inv_rho_r = 1.0 / (q.density * gas.gas_constant);
    (grad[PRIM_PRESSURE] - grad[PRIM_DENSITY] * (q.pressure / q.density)) * inv_rho_r
}

/// 平均梯度的边方向校正
#[inline]
fn corrected_gradient(
    grad_left: DVec2,
    grad_right: DVec2,
    value_left: f64,
    value_right: f64,
    edge_dir: DVec2,
    dist: f64,
) -> DVec2 {
    let mean = (grad_left + grad_right) * 0.5;
    let directional = (value_right - value_left) / dist;
    mean - edge_dir * (mean.dot(edge_dir) - directional)
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MU: f64 = 1.8e-5;

    fn create_test_scheme() -> ViscousScheme {
        ViscousScheme::new(GasModel::AIR, ViscosityLaw::Constant(MU), 0.72)
    }

    fn uniform_gradients() -> [DVec2; N_VARS] {
        [DVec2::ZERO; N_VARS]
    }

    #[test]
    fn test_from_model() {
        assert!(ViscousScheme::from_model(GasModel::AIR, &PhysicsModel::Euler).is_none());

        let ns = PhysicsModel::navier_stokes(ViscosityLaw::Constant(MU));
        let scheme = ViscousScheme::from_model(GasModel::AIR, &ns).unwrap();
        assert!(scheme.prandtl() > 0.0);
    }

    #[test]
    fn test_couette_shear() {
        // 线性剪切 u(y) = S·y：τ_xy = μS，能量通量为粘性做功 μS²/2
        let scheme = create_test_scheme();
        let shear = 100.0;

        let left = PrimitiveState::new(1.2, DVec2::ZERO, 100000.0);
        let right = PrimitiveState::new(1.2, DVec2::new(shear, 0.0), 100000.0);
        let mut grads = uniform_gradients();
        grads[PRIM_VELOCITY_X] = DVec2::new(0.0, shear);

        let result = scheme
            .evaluate(&left, &right, grads, grads, DVec2::Y, DVec2::Y, false)
            .unwrap();

        assert_eq!(result.flux.mass, 0.0);
        assert!((result.flux.momentum_x - MU * shear).abs() < 1e-12, "剪切应力错误");
        assert!(result.flux.momentum_y.abs() < 1e-12);
        assert!(
            (result.flux.energy - MU * shear * shear * 0.5).abs() < 1e-9,
            "粘性做功错误: {}",
            result.flux.energy
        );
    }

    #[test]
    fn test_gradient_correction_from_values() {
        // 两侧梯度为零但点值不同：校正项以 Δφ/d 重建法向导数
        let scheme = create_test_scheme();
        let left = PrimitiveState::new(1.0, DVec2::ZERO, 100000.0);
        let right = PrimitiveState::new(1.0, DVec2::new(1.0, 0.0), 100000.0);

        let result = scheme
            .evaluate(
                &left,
                &right,
                uniform_gradients(),
                uniform_gradients(),
                DVec2::X,
                DVec2::X,
                false,
            )
            .unwrap();

        // ∇u = (1, 0)，τ_xx = μ(2 - 2/3) = 4μ/3
        assert!(
            (result.flux.momentum_x - 4.0 / 3.0 * MU).abs() < 1e-12,
            "法向应力错误: {}",
            result.flux.momentum_x
        );
    }

    #[test]
    fn test_heat_conduction() {
        // 静止气体中的压力梯度给出温度梯度，热流 k∇T·n
        let gas = GasModel::AIR;
        let scheme = create_test_scheme();
        let rho = 1.0;
        let left = PrimitiveState::new(rho, DVec2::ZERO, 100000.0);
        let right = PrimitiveState::new(rho, DVec2::ZERO, 100100.0);

        let mut grads = uniform_gradients();
        grads[PRIM_PRESSURE] = DVec2::new(100.0, 0.0);

        let result = scheme
            .evaluate(&left, &right, grads, grads, DVec2::X, DVec2::X, false)
            .unwrap();

        let conductivity = MU * gas.cp() / 0.72;
        let expected = conductivity * 100.0 / (rho * gas.gas_constant);
        assert!(result.flux.momentum_x.abs() < 1e-12);
        assert!(
            (result.flux.energy - expected).abs() < 1e-9 * expected.abs(),
            "热流错误: {} 期望 {}",
            result.flux.energy,
            expected
        );
    }

    #[test]
    fn test_temperature_gradient_reconstruction() {
        // ρ, p 同向增长且 T 恒定时 ∇T = 0
        let gas = GasModel::AIR;
        let q = PrimitiveState::new(1.0, DVec2::ZERO, 100000.0);
        let mut grads = uniform_gradients();
        grads[PRIM_DENSITY] = DVec2::new(0.01, 0.0);
        grads[PRIM_PRESSURE] = DVec2::new(1000.0, 0.0);

        let grad_t = temperature_gradient(&q, &grads, &gas);
        assert!(grad_t.x.abs() < 1e-12, "等温场温度梯度应为零: {}", grad_t.x);
        assert!(grad_t.y.abs() < 1e-15);
    }

    #[test]
    fn test_flux_antisymmetry() {
        // 交换两侧并反转几何，通量反号
        let scheme = create_test_scheme();
        let left = PrimitiveState::new(1.0, DVec2::new(10.0, 5.0), 100000.0);
        let right = PrimitiveState::new(0.9, DVec2::new(30.0, -15.0), 98000.0);

        let mut gl = uniform_gradients();
        gl[PRIM_VELOCITY_X] = DVec2::new(3.0, 20.0);
        gl[PRIM_VELOCITY_Y] = DVec2::new(-5.0, 7.0);
        gl[PRIM_PRESSURE] = DVec2::new(500.0, -200.0);
        let mut gr = uniform_gradients();
        gr[PRIM_VELOCITY_X] = DVec2::new(8.0, 12.0);
        gr[PRIM_VELOCITY_Y] = DVec2::new(2.0, -4.0);
        gr[PRIM_DENSITY] = DVec2::new(0.02, 0.01);

        let edge = DVec2::new(0.8, 0.6) * 0.01;
        let normal = DVec2::new(0.8, 0.6);

        let forward = scheme
            .evaluate(&left, &right, gl, gr, edge, normal, false)
            .unwrap();
        let backward = scheme
            .evaluate(&right, &left, gr, gl, -edge, -normal, false)
            .unwrap();

        let f = forward.flux.to_array();
        let b = (-backward.flux).to_array();
        for k in 0..N_VARS {
            let scale = f[k].abs().max(1.0);
            assert!((f[k] - b[k]).abs() / scale < 1e-12, "分量 {} 不反对称", k);
        }
    }

    #[test]
    fn test_tsl_jacobian_structure() {
        let gas = GasModel::AIR;
        let scheme = create_test_scheme();
        let q = PrimitiveState::new(1.0, DVec2::new(50.0, 0.0), 100000.0);
        let grads = uniform_gradients();

        let result = scheme
            .evaluate(&q, &q, grads, grads, DVec2::X * 0.01, DVec2::X, true)
            .unwrap();
        let jac = result.jacobians.unwrap();

        // 两侧雅可比互为相反数
        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    (jac.left.m[i][j] + jac.right.m[i][j]).abs() < 1e-12,
                    "TSL 雅可比 ({},{}) 不反号",
                    i,
                    j
                );
            }
        }

        // 质量行为零
        for j in 0..4 {
            assert_eq!(jac.right.m[0][j], 0.0);
        }

        // 法向动量项 (μ/ρd)(1 + 1/3)
        let factor = MU / (0.01 * q.density);
        assert!((jac.right.m[1][1] - factor * 4.0 / 3.0).abs() < 1e-12);
        assert!((jac.right.m[2][2] - factor).abs() < 1e-12);

        // 热传导项使能量对角为正
        let conductivity = MU * gas.cp() / 0.72;
        let expected_heat = conductivity / 0.01 * gas.gamma_minus_one()
            / (q.density * gas.gas_constant);
        assert!((jac.right.m[3][3] - expected_heat).abs() < 1e-12 * expected_heat.max(1.0));
    }

    #[test]
    fn test_degenerate_edge_rejected() {
        let scheme = create_test_scheme();
        let q = PrimitiveState::new(1.0, DVec2::ZERO, 100000.0);
        let grads = uniform_gradients();

        let result = scheme.evaluate(&q, &q, grads, grads, DVec2::ZERO, DVec2::X, false);
        assert!(result.is_err(), "零长度边应报错");
    }
}
