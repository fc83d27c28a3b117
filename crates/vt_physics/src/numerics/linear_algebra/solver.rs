// crates/vt_physics/src/numerics/linear_algebra/solver.rs

//! 迭代求解器
//!
//! 隐式时间推进产生的块稀疏线性系统 J·Δx = −R 非对称，
//! 使用 BiCGStab（双共轭梯度稳定法）配合块预条件求解。
//!
//! # 使用示例
//!
//! ```ignore
//! let mut solver = BiCgStabSolver::new(SolverConfig::new(1e-6, 100));
//! let precond = BlockJacobiPreconditioner::from_matrix(&matrix);
//! let result = solver.solve(&matrix, &b, &mut x, &precond);
//! ```

use serde::{Deserialize, Serialize};

use super::bsr::BsrMatrix;
use super::preconditioner::BlockPreconditioner;
use super::vector_ops::{axpy, copy, dot, norm2};

/// 停滞判据（内积绝对值下限）
const STAG_TOL: f64 = 1e-30;
/// 发散判据（残差相对初值的放大倍数）
const DIV_FACTOR: f64 = 1e6;

// ============================================================
// 配置与结果
// ============================================================

/// 求解器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 相对收敛容差
    pub rtol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
    /// 是否逐迭代记录残差
    pub verbose: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-14,
            max_iter: 200,
            verbose: false,
        }
    }
}

impl SolverConfig {
    /// 创建求解器配置
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }

    /// 设置绝对容差
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// 启用详细输出
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

/// 求解器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞
    Stagnated,
}

/// 求解器结果
#[derive(Debug, Clone, Copy)]
pub struct SolverResult {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
    /// 相对残差
    pub relative_residual: f64,
}

impl SolverResult {
    /// 是否成功收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}

// ============================================================
// BiCGStab
// ============================================================

/// 双共轭梯度稳定法求解器
///
/// 工作向量在首次求解时分配，后续求解复用。
pub struct BiCgStabSolver {
    config: SolverConfig,
    // 工作向量
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    p_hat: Vec<f64>,
    s_hat: Vec<f64>,
}

impl BiCgStabSolver {
    /// 创建 BiCGStab 求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            p_hat: Vec::new(),
            s_hat: Vec::new(),
        }
    }

    /// 求解器配置
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// 确保工作向量大小正确
    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.r0 = vec![0.0; n];
            self.p = vec![0.0; n];
            self.v = vec![0.0; n];
            self.s = vec![0.0; n];
            self.t = vec![0.0; n];
            self.p_hat = vec![0.0; n];
            self.s_hat = vec![0.0; n];
        }
    }

    /// 求解 A·x = b
    ///
    /// `x` 传入初始猜测，返回时为近似解。
    pub fn solve(
        &mut self,
        matrix: &BsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &dyn BlockPreconditioner,
    ) -> SolverResult {
        let n = b.len();
        debug_assert_eq!(n, matrix.n_scalar_rows());
        debug_assert_eq!(n, x.len());
        self.ensure_workspace(n);

        let rtol = self.config.rtol;
        let atol = self.config.atol;

        // r = b - A*x
        matrix.mul_vec(x, &mut self.r);
        for i in 0..n {
            self.r[i] = b[i] - self.r[i];
        }

        let initial_norm = norm2(&self.r);
        if initial_norm < atol {
            return SolverResult {
                status: SolverStatus::Converged,
                iterations: 0,
                residual_norm: initial_norm,
                initial_residual_norm: initial_norm,
                relative_residual: 0.0,
            };
        }

        // 影子残差固定为初始残差
        copy(&self.r, &mut self.r0);

        let mut rho_old = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;

        self.v.fill(0.0);
        self.p.fill(0.0);

        for iter in 0..self.config.max_iter {
            let rho = dot(&self.r0, &self.r);

            if rho.abs() < STAG_TOL {
                if iter == 0 {
                    // 初始残差与影子残差正交，视为已收敛
                    return SolverResult {
                        status: SolverStatus::Converged,
                        iterations: 0,
                        residual_norm: initial_norm,
                        initial_residual_norm: initial_norm,
                        relative_residual: 0.0,
                    };
                }
                return self.finish(SolverStatus::Stagnated, iter, initial_norm);
            }

            let beta = if iter == 0 {
                0.0
            } else {
                (rho / rho_old) * (alpha / omega)
            };
            rho_old = rho;

            // p = r + beta * (p - omega * v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            // p_hat = M⁻¹ p, v = A p_hat
            precond.apply(&self.p, &mut self.p_hat);
            matrix.mul_vec(&self.p_hat, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if r0v.abs() < STAG_TOL {
                return self.finish(SolverStatus::Stagnated, iter, initial_norm);
            }
            alpha = rho / r0v;

            // s = r - alpha * v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            let s_norm = norm2(&self.s);
            if s_norm < atol {
                axpy(alpha, &self.p_hat, x);
                return SolverResult {
                    status: SolverStatus::Converged,
                    iterations: iter + 1,
                    residual_norm: s_norm,
                    initial_residual_norm: initial_norm,
                    relative_residual: s_norm / initial_norm,
                };
            }

            // s_hat = M⁻¹ s, t = A s_hat
            precond.apply(&self.s, &mut self.s_hat);
            matrix.mul_vec(&self.s_hat, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt.abs() < STAG_TOL {
                1.0
            } else {
                dot(&self.t, &self.s) / tt
            };

            if omega.abs() < STAG_TOL {
                axpy(alpha, &self.p_hat, x);
                return SolverResult {
                    status: SolverStatus::Stagnated,
                    iterations: iter + 1,
                    residual_norm: s_norm,
                    initial_residual_norm: initial_norm,
                    relative_residual: s_norm / initial_norm,
                };
            }

            // x = x + alpha * p_hat + omega * s_hat
            axpy(alpha, &self.p_hat, x);
            axpy(omega, &self.s_hat, x);

            // r = s - omega * t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = norm2(&self.r);
            let rel_res = res_norm / initial_norm;

            if self.config.verbose {
                log::trace!("BiCGStab iter {}: residual = {:.6e}", iter + 1, res_norm);
            }

            if res_norm < atol || rel_res < rtol {
                return SolverResult {
                    status: SolverStatus::Converged,
                    iterations: iter + 1,
                    residual_norm: res_norm,
                    initial_residual_norm: initial_norm,
                    relative_residual: rel_res,
                };
            }

            if res_norm > initial_norm * DIV_FACTOR {
                return SolverResult {
                    status: SolverStatus::Diverged,
                    iterations: iter + 1,
                    residual_norm: res_norm,
                    initial_residual_norm: initial_norm,
                    relative_residual: rel_res,
                };
            }
        }

        self.finish(
            SolverStatus::MaxIterationsReached,
            self.config.max_iter,
            initial_norm,
        )
    }

    fn finish(&self, status: SolverStatus, iterations: usize, initial_norm: f64) -> SolverResult {
        let residual_norm = norm2(&self.r);
        SolverResult {
            status,
            iterations,
            residual_norm,
            initial_residual_norm: initial_norm,
            relative_residual: residual_norm / initial_norm,
        }
    }
}
