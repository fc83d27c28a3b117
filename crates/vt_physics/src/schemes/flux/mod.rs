// crates/vt_physics/src/schemes/flux/mod.rs

//! 对流通量格式
//!
//! 提供欧拉方程界面通量的三种离散：
//!
//! - [`RoeScheme`]: 特征分解迎风格式，精确分辨接触间断
//! - [`RusanovScheme`]: 标量耗散迎风格式，简单鲁棒
//! - [`JstScheme`]: 中心格式加人工耗散，依赖传感器与拉普拉斯辅助场
//!
//! # 格式选择指南
//!
//! | 格式 | 耗散 | 接触分辨 | 适用场景 |
//! |---------|------|---------|------------------|
//! | Roe | 低 | 精确 | 边界层、剪切流 |
//! | Rusanov | 高 | 抹平 | 初场迭代、强激波 |
//! | JST | 可调 | 抹平 | 定常跨声速流 |
//!
//! 迎风格式实现 [`UpwindScheme`] trait，配合 MUSCL 重构达到
//! 二阶精度；JST 是中心格式，直接使用点值。所有通量按单位
//! 面积计，由装配层乘以界面面积并累加到残差。

mod central;
mod physical;
mod roe;
mod rusanov;
mod traits;

// 核心类型
pub use traits::{FluxError, FluxJacobians, FluxResult, SchemeCapabilities, UpwindScheme};

// 物理通量
pub use physical::{flux_jacobian, normal_flux, pressure_derivative, spectral_radius};

// 格式实现
pub use central::{JstEdgeData, JstScheme};
pub use roe::{roe_average, RoeAverage, RoeScheme};
pub use rusanov::RusanovScheme;

use crate::types::{GasModel, NumericalParams, UpwindKind};

/// 按配置创建迎风通量格式
pub fn create_upwind_scheme(
    kind: UpwindKind,
    gas: GasModel,
    params: &NumericalParams,
) -> Box<dyn UpwindScheme> {
    match kind {
        UpwindKind::Roe => Box::new(RoeScheme::new(gas, params)),
        UpwindKind::Rusanov => Box::new(RusanovScheme::new(gas)),
    }
}
