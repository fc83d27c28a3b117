// crates/vt_physics/src/assembly/mod.rs

//! 空间残差装配
//!
//! 半离散约定：`V_i·dU_i/dt + R_i = 0`，残差
//! `R_i = Σ_边 ±F·A + Σ_边界顶点 F_b·A - S_i·V_i` 由
//! [`ResidualAssembler`] 一轮扫描完成。调用方负责在装配前刷新
//! 原始变量缓存并同步 halo；中心路径还需先行调用
//! [`compute_jst_fields`] 并同步拉普拉斯与传感器。
//!
//! 装配只覆盖空间项：时间导数的对角增广与 halo 行单位化属于
//! 时间推进层。

mod aux_fields;
mod reconstruction;
mod residual;
mod sources;

pub use aux_fields::compute_jst_fields;
pub use reconstruction::muscl_pair;
pub use residual::{AssemblyReport, ResidualAssembler};
pub use sources::{RotatingFrameSource, SourceContribution, SourceTerm};
