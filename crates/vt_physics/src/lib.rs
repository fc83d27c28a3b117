// crates/vt_physics/src/lib.rs

//! 可压缩流动求解核心
//!
//! 非结构化网格上二维 Euler / 层流 Navier-Stokes 方程的
//! 顶点中心有限体积离散与推进：
//!
//! - 核心类型定义 (types)
//! - 流场状态存储 (state)
//! - 数值方法 (numerics) - 梯度、限制器、块稀疏线性代数
//! - 通量格式 (schemes) - Roe / Rusanov / JST 对流与层流黏性
//! - 边界条件 (boundary) - 弱虚元通量与强施加
//! - 残差装配 (assembly) - 边扫描、源项、雅可比
//! - 时间推进 (engine) - 显式多级、隐式 Euler、双重时间步
//! - 分区同步 (halo) - 发送/接收列表上的场交换
//!
//! 网格由 `vt_mesh` 以只读形式提供；文件 I/O 与外层驱动循环
//! 不在本 crate 范围内。

pub mod assembly;
pub mod boundary;
pub mod engine;
pub mod halo;
pub mod numerics;
pub mod schemes;
pub mod state;
pub mod types;

// 重导出常用类型
pub use engine::{
    ExplicitUpdater, FlowSolver, ImplicitUpdater, IterationReport, LinearSolveStats,
    SolverBuilder, SolverOptions, TimeStepController, TimeStepSummary,
};
pub use state::{
    ConservedField, ConservedState, FlowField, Flux, GradientField, LimiterField,
    PrimitiveState, PrimitiveView, Residual, StateError, N_VARS,
};
pub use types::{
    ConvectiveKind, DualTimeScheme, GasModel, GradientKind, LimiterKind, NumericalParams,
    PhysicsModel, ReconstructionOrder, TimeSchemeKind, TimeStepMode, UpwindKind, ViscosityLaw,
};

// 重导出装配与边界类型
pub use assembly::{
    compute_jst_fields, AssemblyReport, ResidualAssembler, RotatingFrameSource,
    SourceContribution, SourceTerm,
};
pub use boundary::{BoundaryCondition, BoundarySet, ResolvedBoundaries};

// 重导出数值与同步组件
pub use halo::{HaloChannel, HaloExchange, HaloField, HaloPacket, MailboxNetwork};
pub use numerics::{
    BiCgStabSolver, Block4, BlockJacobiPreconditioner, BsrMatrix, BsrPattern, GradientMethod,
    LimiterEngine, SolverConfig, SolverResult, SolverStatus,
};
pub use schemes::{create_upwind_scheme, JstScheme, UpwindScheme, ViscousScheme};
