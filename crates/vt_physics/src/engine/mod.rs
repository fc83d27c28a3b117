// crates/vt_physics/src/engine/mod.rs

//! 时间推进引擎
//!
//! 外迭代的全部运行期组件：
//!
//! - `timestep` - CFL 局部/全局时间步
//! - `explicit` - 显式多级更新
//! - `implicit` - 隐式 Euler 线性求解
//! - `convergence` - 逐轮收敛报告
//! - `solver` - 外迭代编排与构建器

pub mod convergence;
pub mod explicit;
pub mod implicit;
pub mod solver;
pub mod timestep;

pub use convergence::{IterationReport, LinearSolveStats};
pub use explicit::ExplicitUpdater;
pub use implicit::ImplicitUpdater;
pub use solver::{FlowSolver, SolverBuilder, SolverOptions};
pub use timestep::{TimeStepController, TimeStepSummary};
