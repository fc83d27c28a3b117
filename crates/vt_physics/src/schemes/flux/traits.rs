// crates/vt_physics/src/schemes/flux/traits.rs

//! 对流通量格式统一接口

use glam::DVec2;

use crate::numerics::Block4;
use crate::state::{Flux, PrimitiveState};

// ============================================================================
// 通量结果
// ============================================================================

/// 界面通量对左右守恒状态的导数
///
/// 隐式装配时每条边贡献四个雅可比块：
/// `∂F/∂U_L` 进入 (i,i) 与 (j,i)，`∂F/∂U_R` 进入 (i,j) 与 (j,j)。
#[derive(Debug, Clone, Copy, Default)]
pub struct FluxJacobians {
    /// 对左侧守恒状态的导数 ∂F/∂U_L
    pub left: Block4,
    /// 对右侧守恒状态的导数 ∂F/∂U_R
    pub right: Block4,
}

impl FluxJacobians {
    /// 零雅可比
    pub const ZERO: Self = Self {
        left: Block4::ZERO,
        right: Block4::ZERO,
    };

    /// 创建雅可比对
    pub fn new(left: Block4, right: Block4) -> Self {
        Self { left, right }
    }

    /// 检查数值有效性
    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.right.is_finite()
    }
}

/// 对流通量求解结果
///
/// 通量按单位面积给出，装配时乘以界面面积。
#[derive(Debug, Clone, Copy)]
pub struct FluxResult {
    /// 单位面积数值通量
    pub flux: Flux,
    /// 界面最大波速 [m/s]，用于时间步长估计
    pub max_wave_speed: f64,
    /// 通量雅可比，仅在请求时计算
    pub jacobians: Option<FluxJacobians>,
}

impl FluxResult {
    /// 创建不带雅可比的结果
    pub fn new(flux: Flux, max_wave_speed: f64) -> Self {
        Self {
            flux,
            max_wave_speed,
            jacobians: None,
        }
    }

    /// 创建带雅可比的结果
    pub fn with_jacobians(flux: Flux, max_wave_speed: f64, jacobians: FluxJacobians) -> Self {
        Self {
            flux,
            max_wave_speed,
            jacobians: Some(jacobians),
        }
    }

    /// 检查数值有效性
    pub fn is_valid(&self) -> bool {
        let jac_ok = match &self.jacobians {
            Some(jac) => jac.is_finite(),
            None => true,
        };
        self.flux.is_valid() && self.max_wave_speed.is_finite() && self.max_wave_speed >= 0.0 && jac_ok
    }
}

// ============================================================================
// 格式能力
// ============================================================================

/// 通量格式能力标志
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemeCapabilities {
    /// 是否包含熵修正
    pub has_entropy_fix: bool,
    /// 是否提供解析雅可比
    pub provides_jacobian: bool,
    /// 是否精确分辨接触间断
    pub contact_resolving: bool,
    /// 基础精度阶数（不含重构）
    pub order: u8,
}

// ============================================================================
// 迎风格式 trait
// ============================================================================

/// 迎风对流通量格式
///
/// 输入为界面左右两侧的原始状态（可能经过二阶重构）
/// 与指向右侧的单位法向量，输出单位面积数值通量。
pub trait UpwindScheme: Send + Sync {
    /// 格式名称
    fn name(&self) -> &'static str;

    /// 格式能力
    fn capabilities(&self) -> SchemeCapabilities;

    /// 计算界面通量
    ///
    /// # 参数
    /// - `left`: 左侧原始状态
    /// - `right`: 右侧原始状态
    /// - `unit_normal`: 单位法向量，由左指向右
    /// - `with_jacobian`: 是否同时计算通量雅可比
    fn evaluate(
        &self,
        left: &PrimitiveState,
        right: &PrimitiveState,
        unit_normal: DVec2,
        with_jacobian: bool,
    ) -> Result<FluxResult, FluxError>;
}

// ============================================================================
// 错误类型
// ============================================================================

/// 通量计算错误
#[derive(Debug, Clone)]
pub enum FluxError {
    /// 数值错误
    Numerical { message: String },
    /// 无效输入
    InvalidInput { message: String },
}

impl std::fmt::Display for FluxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numerical { message } => write!(f, "Numerical error: {}", message),
            Self::InvalidInput { message } => write!(f, "Invalid input: {}", message),
        }
    }
}

impl std::error::Error for FluxError {}

/// 检查界面两侧状态的物理有效性
///
/// 密度或压力非正视为真空状态，通量格式无法处理，直接报错。
pub(super) fn ensure_physical(
    left: &PrimitiveState,
    right: &PrimitiveState,
) -> Result<(), FluxError> {
    for (side, q) in [("左", left), ("右", right)] {
        let positive = q.density > 0.0 && q.pressure > 0.0;
        let finite = q.density.is_finite() && q.pressure.is_finite() && q.velocity.is_finite();
        if !positive || !finite {
            return Err(FluxError::InvalidInput {
                message: format!(
                    "{}侧状态非物理: ρ={:e} p={:e} v=({:e}, {:e})",
                    side, q.density, q.pressure, q.velocity.x, q.velocity.y
                ),
            });
        }
    }
    Ok(())
}

impl From<FluxError> for vt_foundation::VtError {
    fn from(err: FluxError) -> Self {
        vt_foundation::VtError::numerical(err.to_string(), "convective_flux")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_result_validity() {
        let result = FluxResult::new(Flux::new(1.0, 2.0, 3.0, 4.0), 5.0);
        assert!(result.is_valid());
        assert!(result.jacobians.is_none());

        let bad = FluxResult::new(Flux::new(f64::NAN, 0.0, 0.0, 0.0), 1.0);
        assert!(!bad.is_valid());

        let negative_speed = FluxResult::new(Flux::ZERO, -1.0);
        assert!(!negative_speed.is_valid());
    }

    #[test]
    fn test_flux_jacobians_finite() {
        let jac = FluxJacobians::new(Block4::IDENTITY, Block4::ZERO);
        assert!(jac.is_finite());

        let mut broken = Block4::IDENTITY;
        broken.m[2][3] = f64::INFINITY;
        assert!(!FluxJacobians::new(broken, Block4::ZERO).is_finite());
    }

    #[test]
    fn test_flux_error_display() {
        let err = FluxError::Numerical {
            message: "声速为负".to_string(),
        };
        assert!(err.to_string().contains("声速为负"));
    }
}
