// crates/vt_physics/src/assembly/sources.rs

//! 体积源项
//!
//! 源项以单位体积变化率给出，装配时乘以控制体体积后从残差中
//! 扣除；隐式路径同时向对角块累加 `-∂S/∂U · V`。多个源项逐点
//! 求和。

use glam::DVec2;

use crate::numerics::Block4;
use crate::state::{Flux, PrimitiveState};
use crate::types::GasModel;

// ============================================================
// 源项贡献
// ============================================================

/// 单点源项贡献
///
/// `rate` 为单位体积的守恒量变化率
/// [kg/(m³·s), N/m³, N/m³, W/m³]。
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceContribution {
    /// 单位体积变化率 S
    pub rate: Flux,
    /// 源项雅可比 ∂S/∂U，仅隐式路径请求时填充
    pub jacobian: Option<Block4>,
}

impl SourceContribution {
    /// 零贡献
    pub const ZERO: Self = Self {
        rate: Flux::ZERO,
        jacobian: None,
    };

    /// 创建仅变化率的贡献
    #[inline]
    pub fn new(rate: Flux) -> Self {
        Self {
            rate,
            jacobian: None,
        }
    }

    /// 创建带雅可比的贡献
    #[inline]
    pub fn with_jacobian(rate: Flux, jacobian: Block4) -> Self {
        Self {
            rate,
            jacobian: Some(jacobian),
        }
    }

    /// 累加另一份贡献（雅可比缺失视为零块）
    pub fn accumulate(&mut self, other: &Self) {
        self.rate += other.rate;
        match (&mut self.jacobian, &other.jacobian) {
            (Some(mine), Some(theirs)) => *mine += *theirs,
            (None, Some(theirs)) => self.jacobian = Some(*theirs),
            _ => {}
        }
    }

    /// 检查数值有效性
    #[inline]
    pub fn is_valid(&self) -> bool {
        let jac_ok = match &self.jacobian {
            Some(jac) => jac.is_finite(),
            None => true,
        };
        self.rate.is_valid() && jac_ok
    }
}

// ============================================================
// 源项接口
// ============================================================

/// 体积源项统一接口
pub trait SourceTerm: Send + Sync {
    /// 源项名称
    fn name(&self) -> &'static str;

    /// 是否启用（禁用的源项在装配时跳过）
    fn is_enabled(&self) -> bool {
        true
    }

    /// 计算单点贡献
    ///
    /// # 参数
    /// - `point`: 网格点编号
    /// - `coords`: 该点坐标 [m]
    /// - `state`: 该点原始状态
    /// - `with_jacobian`: 隐式路径为 true，要求同时给出 ∂S/∂U
    fn evaluate(
        &self,
        point: usize,
        coords: DVec2,
        state: &PrimitiveState,
        gas: &GasModel,
        with_jacobian: bool,
    ) -> SourceContribution;
}

// ============================================================
// 旋转参考系
// ============================================================

/// 旋转参考系源项（绝对速度形式）
///
/// 以绝对速度为未知量时，科氏力与离心力合并为单一动量源
/// `S = -ω ẑ × (ρu, ρv) = (ω·ρv, -ω·ρu)`，能量方程无源。
#[derive(Debug, Clone, Copy)]
pub struct RotatingFrameSource {
    /// 角速度 ω [rad/s]，逆时针为正
    angular_velocity: f64,
}

impl RotatingFrameSource {
    /// 创建给定角速度的旋转参考系源项
    pub fn new(angular_velocity: f64) -> Self {
        Self { angular_velocity }
    }

    /// 当前角速度 [rad/s]
    #[inline]
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }
}

impl SourceTerm for RotatingFrameSource {
    fn name(&self) -> &'static str {
        "rotating_frame"
    }

    fn is_enabled(&self) -> bool {
        self.angular_velocity != 0.0
    }

    fn evaluate(
        &self,
        _point: usize,
        _coords: DVec2,
        state: &PrimitiveState,
        _gas: &GasModel,
        with_jacobian: bool,
    ) -> SourceContribution {
        let omega = self.angular_velocity;
        let momentum = state.density * state.velocity;
        let rate = Flux::new(0.0, omega * momentum.y, -omega * momentum.x, 0.0);

        if with_jacobian {
            // S 对守恒量线性：∂S_mx/∂(ρv) = ω，∂S_my/∂(ρu) = -ω
            let mut jac = Block4::ZERO;
            jac.m[1][2] = omega;
            jac.m[2][1] = -omega;
            SourceContribution::with_jacobian(rate, jac)
        } else {
            SourceContribution::new(rate)
        }
    }
}

// ============================================================
// 测试
// ============================================================
