// crates/vt_physics/src/numerics/linear_algebra/mod.rs

//! 块稀疏线性代数
//!
//! 隐式时间推进在每个物理量点上耦合 4 个守恒方程，Jacobian
//! 天然呈 4×4 块结构。本模块提供：
//!
//! - [`Block4`]：4×4 稠密块及其求逆
//! - [`BsrPattern`] / [`BsrMatrix`]：块压缩行存储（BSR）
//! - [`BlockPreconditioner`]：块预条件接口与块 Jacobi 实现
//! - [`BiCgStabSolver`]：BiCGStab 迭代求解器
//! - 平铺向量运算（`dot` / `norm2` / `axpy` 等）
//!
//! 稀疏结构由网格边集一次性构建，装配阶段只写数值。

pub mod block;
pub mod bsr;
pub mod preconditioner;
pub mod solver;
pub mod vector_ops;

pub use block::Block4;
pub use bsr::{BsrMatrix, BsrPattern};
pub use preconditioner::{BlockJacobiPreconditioner, BlockPreconditioner, IdentityPreconditioner};
pub use solver::{BiCgStabSolver, SolverConfig, SolverResult, SolverStatus};
pub use vector_ops::{axpy, copy, dot, fill, norm2, norm_inf, scale, xpay};
