// crates/vt_physics/src/schemes/flux/roe.rs

//! Roe 近似黎曼求解器
//!
//! 以 Roe 平均状态处的通量雅可比线性化界面问题：
//!
//! ```text
//! F* = 0.5 * (F_L + F_R) - 0.5 * |Ã| * (U_R - U_L)
//! ```
//!
//! 其中 |Ã| = R̃ |Λ̃| R̃⁻¹ 由 Roe 平均处的特征分解构造。Roe 平均
//! 满足性质 U（Ã ΔU = ΔF），因此全超声速时通量精确退化为单侧
//! 物理通量，静止接触间断被无耗散地分辨。
//!
//! # 熵修正
//!
//! 声波特征值在跨声速膨胀处可能趋于零，导致非物理的膨胀激波。
//! 采用 Harten-Hyman 修正：|λ| < δ 时用抛物线 (λ² + δ²)/(2δ)
//! 代替，阈值 δ 随当地波速缩放。接触与剪切波不做修正，
//! 以保持接触间断的精确分辨。
//!
//! # 雅可比
//!
//! 隐式装配使用冻结耗散近似：
//!
//! ```text
//! ∂F*/∂U_L ≈ 0.5 * (A_L + |Ã|)
//! ∂F*/∂U_R ≈ 0.5 * (A_R - |Ã|)
//! ```

use glam::DVec2;

use super::physical;
use super::traits::{
    ensure_physical, FluxError, FluxJacobians, FluxResult, SchemeCapabilities, UpwindScheme,
};
use crate::numerics::Block4;
use crate::state::{Flux, PrimitiveState, N_VARS};
use crate::types::{GasModel, NumericalParams};

// ============================================================================
// Roe 平均
// ============================================================================

/// Roe 平均状态
///
/// 密度取几何平均，速度与总焓取 √ρ 加权平均，
/// 声速由 c̃² = (γ-1)(H̃ - |ṽ|²/2) 回算。
#[derive(Debug, Clone, Copy)]
pub struct RoeAverage {
    /// 平均密度 √(ρ_L ρ_R)
    pub density: f64,
    /// 加权平均速度
    pub velocity: DVec2,
    /// 加权平均总焓
    pub enthalpy: f64,
    /// 平均声速
    pub sound_speed: f64,
}

/// 计算 Roe 平均
pub fn roe_average(
    left: &PrimitiveState,
    right: &PrimitiveState,
    gas: &GasModel,
) -> Result<RoeAverage, FluxError> {
    let sqrt_l = left.density.sqrt();
    let sqrt_r = right.density.sqrt();
    let inv_sum = 1.0 / (sqrt_l + sqrt_r);

    let velocity = (left.velocity * sqrt_l + right.velocity * sqrt_r) * inv_sum;
    let enthalpy =
        (left.total_enthalpy(gas) * sqrt_l + right.total_enthalpy(gas) * sqrt_r) * inv_sum;

    let c2 = gas.gamma_minus_one() * (enthalpy - 0.5 * velocity.length_squared());
    if !(c2 > 0.0) || !c2.is_finite() {
        return Err(FluxError::Numerical {
            message: format!("Roe 平均声速平方非正: c²={:e}", c2),
        });
    }

    Ok(RoeAverage {
        density: sqrt_l * sqrt_r,
        velocity,
        enthalpy,
        sound_speed: c2.sqrt(),
    })
}

// ============================================================================
// 特征分解
// ============================================================================

/// Harten-Hyman 熵修正
///
/// |λ| ≥ δ 时返回 |λ|，否则用抛物线 (λ² + δ²)/(2δ) 平滑，
/// 在 |λ| = δ 处连续。
#[inline]
fn harten_hyman(lambda: f64, delta: f64) -> f64 {
    let abs = lambda.abs();
    if abs >= delta || delta <= 0.0 {
        abs
    } else {
        0.5 * (lambda * lambda / delta + delta)
    }
}

/// 由特征分解组装波矩阵 Σ λ_k r_k l_kᵀ
///
/// `lambda` 为三个特征速度 [u_n - c, u_n, u_n + c] 的权重，
/// 中间值同时作用于熵波与剪切波。传入带符号特征值得到
/// Roe 矩阵 Ã 本身，传入绝对值得到耗散矩阵 |Ã|。
fn wave_matrix(avg: &RoeAverage, gas: &GasModel, unit_normal: DVec2, lambda: [f64; 3]) -> Block4 {
    let gm1 = gas.gamma_minus_one();
    let (nx, ny) = (unit_normal.x, unit_normal.y);
    let tangent = DVec2::new(-ny, nx);

    let (u, v) = (avg.velocity.x, avg.velocity.y);
    let un = avg.velocity.dot(unit_normal);
    let ut = avg.velocity.dot(tangent);
    let c = avg.sound_speed;
    let q2 = avg.velocity.length_squared();
    let h = avg.enthalpy;

    // 右特征向量（按列）
    let right = [
        [1.0, u - c * nx, v - c * ny, h - c * un],
        [1.0, u, v, 0.5 * q2],
        [0.0, tangent.x, tangent.y, ut],
        [1.0, u + c * nx, v + c * ny, h + c * un],
    ];

    // 左特征向量（按行），满足 l_m · r_k = δ_mk
    let inv_c2 = 1.0 / (c * c);
    let half_inv_c2 = 0.5 * inv_c2;
    let left = [
        [
            (0.5 * gm1 * q2 + c * un) * half_inv_c2,
            (-gm1 * u - c * nx) * half_inv_c2,
            (-gm1 * v - c * ny) * half_inv_c2,
            gm1 * half_inv_c2,
        ],
        [
            1.0 - 0.5 * gm1 * q2 * inv_c2,
            gm1 * u * inv_c2,
            gm1 * v * inv_c2,
            -gm1 * inv_c2,
        ],
        [-ut, tangent.x, tangent.y, 0.0],
        [
            (0.5 * gm1 * q2 - c * un) * half_inv_c2,
            (-gm1 * u + c * nx) * half_inv_c2,
            (-gm1 * v + c * ny) * half_inv_c2,
            gm1 * half_inv_c2,
        ],
    ];

    let weights = [lambda[0], lambda[1], lambda[1], lambda[2]];

    let mut m = [[0.0; 4]; 4];
    for k in 0..4 {
        let w = weights[k];
        if w == 0.0 {
            continue;
        }
        for i in 0..4 {
            let wr = w * right[k][i];
            for (j, l) in left[k].iter().enumerate() {
                m[i][j] += wr * l;
            }
        }
    }
    Block4::new(m)
}

// ============================================================================
// Roe 格式
// ============================================================================

/// Roe 迎风通量格式
///
/// # 示例
///
/// ```ignore
/// use vt_physics::schemes::flux::{RoeScheme, UpwindScheme};
///
/// let scheme = RoeScheme::new(GasModel::AIR, &params);
/// let result = scheme.evaluate(&left, &right, DVec2::X, false)?;
/// println!("质量通量: {}", result.flux.mass);
/// ```
#[derive(Debug, Clone)]
pub struct RoeScheme {
    /// 气体模型
    gas: GasModel,
    /// 熵修正阈值比例，0 关闭修正
    entropy_fix_ratio: f64,
}

impl RoeScheme {
    /// 创建 Roe 格式
    pub fn new(gas: GasModel, params: &NumericalParams) -> Self {
        Self {
            gas,
            entropy_fix_ratio: params.entropy_fix_ratio,
        }
    }

    /// 设置熵修正比例
    pub fn with_entropy_fix_ratio(mut self, ratio: f64) -> Self {
        self.entropy_fix_ratio = ratio;
        self
    }

    /// 获取熵修正比例
    #[inline]
    pub fn entropy_fix_ratio(&self) -> f64 {
        self.entropy_fix_ratio
    }
}

impl UpwindScheme for RoeScheme {
    fn name(&self) -> &'static str {
        "Roe"
    }

    fn capabilities(&self) -> SchemeCapabilities {
        SchemeCapabilities {
            has_entropy_fix: self.entropy_fix_ratio > 0.0,
            provides_jacobian: true,
            contact_resolving: true,
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

        let avg = roe_average(left, right, &self.gas)?;
        let un = avg.velocity.dot(unit_normal);
        let c = avg.sound_speed;

        // 声波做熵修正，接触/剪切波保持 |u_n|
        let delta = self.entropy_fix_ratio * (un.abs() + c);
        let fixed = [
            harten_hyman(un - c, delta),
            un.abs(),
            harten_hyman(un + c, delta),
        ];
        let dissipation = wave_matrix(&avg, &self.gas, unit_normal, fixed);

        let flux_l = physical::normal_flux(left, &self.gas, unit_normal).to_array();
        let flux_r = physical::normal_flux(right, &self.gas, unit_normal).to_array();
        let du = (right.to_conserved(&self.gas) - left.to_conserved(&self.gas)).to_array();
        let dv = dissipation.mul_vec(du);

        let mut f = [0.0; N_VARS];
        for k in 0..N_VARS {
            f[k] = 0.5 * (flux_l[k] + flux_r[k]) - 0.5 * dv[k];
        }
        let flux = Flux::from_array(f);
        let max_wave_speed = un.abs() + c;

        let result = if with_jacobian {
            let a_l = physical::flux_jacobian(left, &self.gas, unit_normal);
            let a_r = physical::flux_jacobian(right, &self.gas, unit_normal);
            let jacobians = FluxJacobians::new(
                (a_l + dissipation) * 0.5,
                (a_r - dissipation) * 0.5,
            );
            FluxResult::with_jacobians(flux, max_wave_speed, jacobians)
        } else {
            FluxResult::new(flux, max_wave_speed)
        };

        if !result.is_valid() {
            return Err(FluxError::Numerical {
                message: format!(
                    "Roe 通量非有限: 左 ρ={:e} p={:e}，右 ρ={:e} p={:e}",
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
