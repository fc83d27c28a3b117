// crates/vt_physics/src/schemes/flux/central.rs

//! JST 中心格式
//!
//! Jameson-Schmidt-Turkel 人工耗散格式：界面通量取算术平均
//! 状态处的物理通量，叠加二阶与四阶混合耗散：
//!
//! ```text
//! F* = F(q̄) - λ * [ε₂ (U_R - U_L) - ε₄ (L_R - L_L)]
//! ```
//!
//! 其中 L 为守恒变量的无量纲拉普拉斯（邻点差分和），λ 为界面
//! 谱半径。二阶耗散系数 ε₂ 由压力传感器驱动，在激波附近开启；
//! 四阶耗散 ε₄ = max(0, κ₄ - ε₂) 在光滑区抑制奇偶失联，
//! 激波处自动关闭以避免过冲。
//!
//! 守恒变量差分的能量分量以 ρH 代替 ρE，定常解的总焓
//! 保持性更好。
//!
//! # 耗散雅可比
//!
//! 冻结 ε 与 λ 后，耗散对两侧守恒变量近似为对角阵，能量行
//! 因 ρH 替换改用 d(ρH)/dU。四阶项经由拉普拉斯引入邻点数
//! 相关的放大因子 (N+1)。

use glam::DVec2;

use super::physical;
use super::traits::{ensure_physical, FluxError, FluxJacobians, FluxResult};
use crate::numerics::Block4;
use crate::state::{ConservedState, Flux, PrimitiveState, N_VARS};
use crate::types::GasModel;

// ============================================================================
// 边辅助数据
// ============================================================================

/// JST 耗散所需的边两侧辅助量
///
/// 拉普拉斯与传感器由装配层在通量扫描前整场计算，
/// 拉普拉斯的能量分量按 ρH 差分。
#[derive(Debug, Clone, Copy)]
pub struct JstEdgeData {
    /// 左侧无量纲拉普拉斯
    pub laplacian_left: ConservedState,
    /// 右侧无量纲拉普拉斯
    pub laplacian_right: ConservedState,
    /// 左侧压力传感器 ∈ [0, 1]
    pub sensor_left: f64,
    /// 右侧压力传感器 ∈ [0, 1]
    pub sensor_right: f64,
    /// 左侧邻点数
    pub neighbors_left: u32,
    /// 右侧邻点数
    pub neighbors_right: u32,
}

impl Default for JstEdgeData {
    fn default() -> Self {
        Self {
            laplacian_left: ConservedState::ZERO,
            laplacian_right: ConservedState::ZERO,
            sensor_left: 0.0,
            sensor_right: 0.0,
            neighbors_left: 1,
            neighbors_right: 1,
        }
    }
}

// ============================================================================
// JST 格式
// ============================================================================

/// JST 中心通量格式
#[derive(Debug, Clone)]
pub struct JstScheme {
    /// 气体模型
    gas: GasModel,
    /// 二阶耗散系数，典型值 0.5
    kappa2: f64,
    /// 四阶耗散系数，典型值 0.02
    kappa4: f64,
}

impl JstScheme {
    /// 创建 JST 格式
    pub fn new(gas: GasModel, kappa2: f64, kappa4: f64) -> Self {
        Self { gas, kappa2, kappa4 }
    }

    /// 格式名称
    pub fn name(&self) -> &'static str {
        "JST"
    }

    /// 二阶耗散系数
    #[inline]
    pub fn kappa2(&self) -> f64 {
        self.kappa2
    }

    /// 四阶耗散系数
    #[inline]
    pub fn kappa4(&self) -> f64 {
        self.kappa4
    }

    /// 计算界面通量
    ///
    /// # 参数
    /// - `left`/`right`: 界面两侧原始状态（中心格式不做重构）
    /// - `edge`: 两侧拉普拉斯、传感器与邻点数
    /// - `unit_normal`: 单位法向量，由左指向右
    /// - `with_jacobian`: 是否同时计算通量雅可比
    pub fn evaluate(
        &self,
        left: &PrimitiveState,
        right: &PrimitiveState,
        edge: &JstEdgeData,
        unit_normal: DVec2,
        with_jacobian: bool,
    ) -> Result<FluxResult, FluxError> {
        ensure_physical(left, right)?;

        // 算术平均状态处的中心通量
        let mean = PrimitiveState::new(
            0.5 * (left.density + right.density),
            (left.velocity + right.velocity) * 0.5,
            0.5 * (left.pressure + right.pressure),
        );
        let central = physical::normal_flux(&mean, &self.gas, unit_normal).to_array();

        // 界面谱半径
        let lambda = 0.5
            * (physical::spectral_radius(left, &self.gas, unit_normal)
                + physical::spectral_radius(right, &self.gas, unit_normal));

        // 守恒变量差分，能量分量用 ρH
        let mut du = (right.to_conserved(&self.gas) - left.to_conserved(&self.gas)).to_array();
        du[N_VARS - 1] = right.density * right.total_enthalpy(&self.gas)
            - left.density * left.total_enthalpy(&self.gas);
        let dl = (edge.laplacian_right - edge.laplacian_left).to_array();

        // 网格拉伸校正因子
        let nl = edge.neighbors_left.max(1) as f64;
        let nr = edge.neighbors_right.max(1) as f64;
        let sc2 = 3.0 * (nl + nr) / (nl * nr);
        let sc4 = sc2 * sc2 / 4.0;

        let epsilon2 = self.kappa2 * 0.5 * (edge.sensor_left + edge.sensor_right) * sc2;
        let epsilon4 = (self.kappa4 - epsilon2).max(0.0) * sc4;

        let mut f = [0.0; N_VARS];
        for k in 0..N_VARS {
            f[k] = central[k] - lambda * (epsilon2 * du[k] - epsilon4 * dl[k]);
        }
        let flux = Flux::from_array(f);

        let result = if with_jacobian {
            let half_mean = physical::flux_jacobian(&mean, &self.gas, unit_normal) * 0.5;
            let coeff_l = (epsilon2 + epsilon4 * (nl + 1.0)) * lambda;
            let coeff_r = (epsilon2 + epsilon4 * (nr + 1.0)) * lambda;
            let jacobians = FluxJacobians::new(
                half_mean + dissipation_jacobian(coeff_l, left, &self.gas),
                half_mean - dissipation_jacobian(coeff_r, right, &self.gas),
            );
            FluxResult::with_jacobians(flux, lambda, jacobians)
        } else {
            FluxResult::new(flux, lambda)
        };

        if !result.is_valid() {
            return Err(FluxError::Numerical {
                message: format!(
                    "JST 通量非有限: 左 ρ={:e} p={:e}，右 ρ={:e} p={:e}",
                    left.density, left.pressure, right.density, right.pressure
                ),
            });
        }
        Ok(result)
    }
}

/// 耗散项对守恒变量的对角近似
///
/// 能量行因 ρH 差分改用 d(ρH)/dU = [(γ-1)q²/2, -(γ-1)u, -(γ-1)v, γ]。
fn dissipation_jacobian(coeff: f64, q: &PrimitiveState, gas: &GasModel) -> Block4 {
    let mut m = Block4::from_scalar_diagonal(coeff).m;
    let dp = physical::pressure_derivative(q, gas);
    m[3][0] = coeff * dp[0];
    m[3][1] = coeff * dp[1];
    m[3][2] = coeff * dp[2];
    m[3][3] = coeff * gas.gamma;
    Block4::new(m)
}

// ============================================================================
// 测试
// ============================================================================
