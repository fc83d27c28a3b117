// crates/vt_physics/src/schemes/flux/rusanov.rs

//! Rusanov (Local Lax-Friedrichs) 通量格式
//!
//! 单波速估计的标量耗散格式：
//!
//! ```text
//! F* = 0.5 * (F_L + F_R) - 0.5 * λ_max * (U_R - U_L)
//! λ_max = max(|u_n_L| + c_L, |u_n_R| + c_R)
//! ```
//!
//! 耗散强于 Roe，会抹平接触间断，但无需特征分解、
//! 天然满足熵条件，适合初场迭代与强激波问题。
//!
//! # 雅可比
//!
//! 冻结 λ_max 后的解析形式：
//!
//! ```text
//! ∂F*/∂U_L = 0.5 * (A_L + λ_max I)
//! ∂F*/∂U_R = 0.5 * (A_R - λ_max I)
//! ```
//!
//! 对角占优强于 Roe 雅可比，隐式迭代更稳健。

use glam::DVec2;

use super::physical;
use super::traits::{
    ensure_physical, FluxError, FluxJacobians, FluxResult, SchemeCapabilities, UpwindScheme,
};
use crate::numerics::Block4;
use crate::state::{Flux, PrimitiveState, N_VARS};
use crate::types::GasModel;

/// Rusanov 迎风通量格式
#[derive(Debug, Clone)]
pub struct RusanovScheme {
    /// 气体模型
    gas: GasModel,
    /// 波速放大系数 (≥1.0)，增大可提高稳定性
    wave_speed_factor: f64,
}

impl RusanovScheme {
    /// 创建标准 Rusanov 格式
    pub fn new(gas: GasModel) -> Self {
        Self {
            gas,
            wave_speed_factor: 1.0,
        }
    }

    /// 设置波速放大系数
    pub fn with_wave_speed_factor(mut self, factor: f64) -> Self {
        self.wave_speed_factor = factor;
        self
    }

    /// 获取波速放大系数
    #[inline]
    pub fn wave_speed_factor(&self) -> f64 {
        self.wave_speed_factor
    }
}

impl UpwindScheme for RusanovScheme {
    fn name(&self) -> &'static str {
        "Rusanov (LLF)"
    }

    fn capabilities(&self) -> SchemeCapabilities {
        SchemeCapabilities {
            has_entropy_fix: false,
            provides_jacobian: true,
            contact_resolving: false,
            order: 1,
        }
    }

    fn evaluate(
        &self,
        left: &PrimitiveState,
        right: &PrimitiveState,
        unit_normal: DVec2,
        with_jacobian: bool,
    ) -> Result<FluxResult, FluxError> {
        ensure_physical(left, right)?;

        let lambda_l = physical::spectral_radius(left, &self.gas, unit_normal);
        let lambda_r = physical::spectral_radius(right, &self.gas, unit_normal);
        let lambda = lambda_l.max(lambda_r) * self.wave_speed_factor;

        let flux_l = physical::normal_flux(left, &self.gas, unit_normal).to_array();
        let flux_r = physical::normal_flux(right, &self.gas, unit_normal).to_array();
        let du = (right.to_conserved(&self.gas) - left.to_conserved(&self.gas)).to_array();

        let mut f = [0.0; N_VARS];
        for k in 0..N_VARS {
            f[k] = 0.5 * (flux_l[k] + flux_r[k]) - 0.5 * lambda * du[k];
        }
        let flux = Flux::from_array(f);

        let result = if with_jacobian {
            let a_l = physical::flux_jacobian(left, &self.gas, unit_normal);
            let a_r = physical::flux_jacobian(right, &self.gas, unit_normal);
            let stabilizer = Block4::from_scalar_diagonal(lambda);
            let jacobians =
                FluxJacobians::new((a_l + stabilizer) * 0.5, (a_r - stabilizer) * 0.5);
            FluxResult::with_jacobians(flux, lambda, jacobians)
        } else {
            FluxResult::new(flux, lambda)
        };

        if !result.is_valid() {
            return Err(FluxError::Numerical {
                message: format!(
                    "Rusanov 通量非有限: 左 ρ={:e} p={:e}，右 ρ={:e} p={:e}",
                    left.density, left.pressure, right.density, right.pressure
                ),
            });
        }
        Ok(result)
    }
}

// ============================================================================
// 测试
// ============================================================================
