// crates/vt_physics/src/engine/implicit.rs

//! 隐式时间推进
//!
//! 在空间装配得到的 `(R, J)` 之上完成一轮隐式 Euler 更新：
//!
//! 1. 双重时间步时把 BDF 物理时间导数加入残差，
//!    `c₀·V/Δt_phys` 加入对角
//! 2. 对角块增广 `V_i/Δt_i·I`
//! 3. halo 行置单位行、右端置零，固定非本地未知量
//! 4. BiCGStab + 块 Jacobi 预条件求解 `J·ΔU = -R`
//! 5. `ΔU` 加回外迭代快照
//!
//! 线性求解不收敛不致命：记录警告并带回统计，外迭代继续。

use vt_mesh::SolverMesh;

use crate::numerics::{BiCgStabSolver, BlockJacobiPreconditioner, BsrMatrix, SolverConfig};
use crate::state::{FlowField, Flux, N_VARS};
use crate::types::DualTimeScheme;

use super::convergence::LinearSolveStats;

/// 隐式更新器
///
/// 右端与解向量工作区跨外迭代复用。
pub struct ImplicitUpdater {
    solver: BiCgStabSolver,
    rhs: Vec<f64>,
    delta: Vec<f64>,
}

impl ImplicitUpdater {
    /// 创建更新器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            solver: BiCgStabSolver::new(config),
            rhs: Vec::new(),
            delta: Vec::new(),
        }
    }

    /// 线性求解配置
    pub fn linear_config(&self) -> &SolverConfig {
        self.solver.config()
    }

    /// 完成一轮隐式更新
    ///
    /// 进入时 `field.residual` 与 `matrix` 为空间装配结果，且
    /// `field.conserved == field.old`（外迭代快照后尚未更新）。
    /// 双重时间步的物理时间导数会加进 `field.residual`，收敛
    /// 报告据此反映完整的非定常残差。
    pub fn advance(
        &mut self,
        mesh: &SolverMesh,
        field: &mut FlowField,
        matrix: &mut BsrMatrix,
        dual: DualTimeScheme,
        physical_dt: f64,
    ) -> LinearSolveStats {
        let n_points = mesh.n_points();
        let n_owned = mesh.n_owned();
        let n_scalar = N_VARS * n_points;

        // 物理时间导数
        if dual != DualTimeScheme::None {
            debug_assert!(physical_dt > 0.0);
            let (c0, c1, c2) = dual.coefficients();
            for p in 0..n_owned {
                let factor = mesh.volume(p) / physical_dt;
                let u = field.conserved.get(p).to_array();
                let un = field.time_n.get(p).to_array();
                let un1 = field.time_n1.get(p).to_array();
                let mut rate = [0.0; N_VARS];
                for k in 0..N_VARS {
                    rate[k] = factor * (c0 * u[k] - c1 * un[k] + c2 * un1[k]);
                }
                field
                    .residual
                    .add_flux(p, Flux::new(rate[0], rate[1], rate[2], rate[3]));
                matrix.add_to_diagonal(p, c0 * factor);
            }
        }

        // 伪时间对角增广
        for p in 0..n_owned {
            debug_assert!(field.local_dt[p] > 0.0);
            matrix.add_to_diagonal(p, mesh.volume(p) / field.local_dt[p]);
        }

        // halo 未知量由邻分区权威更新，本地固定为零增量
        for p in n_owned..n_points {
            matrix.set_row_identity(p);
        }

        self.rhs.resize(n_scalar, 0.0);
        self.rhs.fill(0.0);
        for p in 0..n_owned {
            let r = field.residual.get(p);
            for k in 0..N_VARS {
                self.rhs[N_VARS * p + k] = -r[k];
            }
        }

        self.delta.resize(n_scalar, 0.0);
        self.delta.fill(0.0);

        let precond = BlockJacobiPreconditioner::from_matrix(matrix);
        let result = self
            .solver
            .solve(matrix, &self.rhs, &mut self.delta, &precond);

        let stats = LinearSolveStats {
            iterations: result.iterations,
            relative_residual: result.relative_residual,
            converged: result.is_converged(),
        };
        if !stats.converged {
            log::warn!(
                "线性求解未收敛: 状态 {:?}, {} 次迭代, 相对残差 {:.3e}",
                result.status,
                result.iterations,
                result.relative_residual
            );
        }

        if self.delta[..N_VARS * n_owned]
            .iter()
            .any(|v| !v.is_finite())
        {
            log::warn!("线性解含非有限分量，跳过本轮状态更新");
            return stats;
        }

        for p in 0..n_owned {
            let mut u = field.old.get(p).to_array();
            for k in 0..N_VARS {
                u[k] += self.delta[N_VARS * p + k];
            }
            field
                .conserved
                .set(p, crate::state::ConservedState::from_array(u));
        }

        stats
    }
}

// ============================================================
// 测试
// ============================================================
