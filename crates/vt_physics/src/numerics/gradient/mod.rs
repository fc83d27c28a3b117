// crates/vt_physics/src/numerics/gradient/mod.rs

//! 梯度计算模块
//!
//! 对拥有点计算原始变量 `[ρ, u, v, p]` 的空间梯度，供 MUSCL
//! 二阶重构与黏性通量共用：
//!
//! - [`GreenGaussGradient`]: 面积分法，边界面以本点值闭合
//! - [`LeastSquaresGradient`]: 加权最小二乘，奇异模板回退 Green-Gauss

mod green_gauss;
mod least_squares;
mod traits;

pub use green_gauss::{GreenGaussConfig, GreenGaussGradient};
pub use least_squares::{LeastSquaresConfig, LeastSquaresGradient};
pub use traits::GradientMethod;

use crate::types::{GradientKind, NumericalParams};

/// 根据配置创建梯度计算方法
pub fn create_gradient_method(
    kind: GradientKind,
    params: &NumericalParams,
) -> Box<dyn GradientMethod> {
    match kind {
        GradientKind::GreenGauss => Box::new(GreenGaussGradient::from_params(params)),
        GradientKind::LeastSquares => Box::new(LeastSquaresGradient::from_params(params)),
    }
}
