// crates/vt_physics/src/numerics/mod.rs

//! 数值方法模块
//!
//! - gradient/ - 原始变量梯度 (Green-Gauss, Least-Squares)
//! - limiter/ - 斜率限制器 (Venkatakrishnan, Minmod)
//! - linear_algebra/ - 块稀疏线性代数 (BSR, BiCGStab)

pub mod gradient;
pub mod limiter;
pub mod linear_algebra;

pub use gradient::{
    create_gradient_method, GradientMethod, GreenGaussConfig, GreenGaussGradient,
    LeastSquaresConfig, LeastSquaresGradient,
};

pub use limiter::{
    create_limiter, LimiterContext, LimiterEngine, Minmod, NoLimiter, SlopeLimiter,
    Venkatakrishnan,
};

pub use linear_algebra::{
    axpy, copy, dot, fill, norm2, norm_inf, scale, xpay, BiCgStabSolver, Block4,
    BlockJacobiPreconditioner, BlockPreconditioner, BsrMatrix, BsrPattern, IdentityPreconditioner,
    SolverConfig, SolverResult, SolverStatus,
};
