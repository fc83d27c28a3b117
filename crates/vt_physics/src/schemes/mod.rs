// crates/vt_physics/src/schemes/mod.rs

//! 通量格式
//!
//! 界面通量的空间离散：
//!
//! - [`flux`]: 对流通量（Roe / Rusanov 迎风与 JST 中心格式）
//! - [`viscous`]: 粘性通量（校正平均梯度 + 薄剪切层雅可比）
//!
//! 所有格式输出单位面积通量与可选的解析雅可比，
//! 由装配层乘以界面面积并按边的两端累加。

pub mod flux;
pub mod viscous;

pub use flux::{
    create_upwind_scheme, FluxError, FluxJacobians, FluxResult, JstEdgeData, JstScheme,
    RoeScheme, RusanovScheme, SchemeCapabilities, UpwindScheme,
};
pub use viscous::{ViscousResult, ViscousScheme};
