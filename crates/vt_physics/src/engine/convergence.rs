// crates/vt_physics/src/engine/convergence.rs

//! 迭代收敛报告
//!
//! 每轮外迭代返回一份新的 [`IterationReport`]，绝不原地累积：
//! 逐方程残差 RMS（以 log10 报出）、带点索引的最大残差、
//! 线性求解统计与时间步极值。多分区运行用 [`IterationReport::merge`]
//! 归约（平方和相加、最大值带点保留胜出分区的索引）。

use crate::state::{Residual, EQUATION_NAMES, N_VARS};

use super::timestep::TimeStepSummary;

// ============================================================
// 线性求解统计
// ============================================================

/// 一轮隐式迭代的线性求解统计
#[derive(Debug, Clone, Copy)]
pub struct LinearSolveStats {
    /// 迭代次数
    pub iterations: usize,
    /// 最终相对残差
    pub relative_residual: f64,
    /// 是否收敛
    pub converged: bool,
}

// ============================================================
// 迭代报告
// ============================================================

/// 单轮外迭代的收敛报告
#[derive(Debug, Clone)]
pub struct IterationReport {
    /// 外迭代序号
    pub iteration: usize,
    /// 逐方程残差平方和（跨分区可加）
    residual_sumsq: [f64; N_VARS],
    /// 参与统计的点数
    n_sampled: usize,
    /// 逐方程最大残差绝对值
    pub max_residual: [f64; N_VARS],
    /// 最大残差所在点
    pub max_residual_point: [usize; N_VARS],
    /// 本轮最小时间步 [s]
    pub dt_min: f64,
    /// 本轮最大时间步 [s]
    pub dt_max: f64,
    /// 线性求解统计（显式路径为空）
    pub linear: Option<LinearSolveStats>,
}

impl IterationReport {
    /// 从残差采样生成报告
    pub fn from_residual(
        iteration: usize,
        residual: &Residual,
        n_owned: usize,
        dt: TimeStepSummary,
    ) -> Self {
        let mut sumsq = [0.0; N_VARS];
        let mut max_abs = [0.0; N_VARS];
        let mut argmax = [0; N_VARS];
        for p in 0..n_owned {
            let r = residual.get(p);
            for k in 0..N_VARS {
                sumsq[k] += r[k] * r[k];
                if r[k].abs() > max_abs[k] {
                    max_abs[k] = r[k].abs();
                    argmax[k] = p;
                }
            }
        }
        Self {
            iteration,
            residual_sumsq: sumsq,
            n_sampled: n_owned,
            max_residual: max_abs,
            max_residual_point: argmax,
            dt_min: dt.min,
            dt_max: dt.max,
            linear: None,
        }
    }

    /// 附加线性求解统计
    pub fn with_linear(mut self, stats: LinearSolveStats) -> Self {
        self.linear = Some(stats);
        self
    }

    /// 逐方程残差 RMS 的 log10
    ///
    /// 残差精确为零时返回负无穷。
    pub fn rms_log10(&self, var: usize) -> f64 {
        debug_assert!(var < N_VARS);
        if self.n_sampled == 0 {
            return f64::NEG_INFINITY;
        }
        (self.residual_sumsq[var] / self.n_sampled as f64)
            .sqrt()
            .log10()
    }

    /// 全方程中最深的收敛水平（最大 RMS 的 log10）
    pub fn worst_rms_log10(&self) -> f64 {
        (0..N_VARS)
            .map(|k| self.rms_log10(k))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// 归约另一分区的报告
    ///
    /// 平方和与采样数相加；最大残差取胜出方并保留其点索引
    /// （索引为分区局部编号）；线性统计取最差。
    pub fn merge(&mut self, other: &IterationReport) {
        debug_assert_eq!(self.iteration, other.iteration);
        for k in 0..N_VARS {
            self.residual_sumsq[k] += other.residual_sumsq[k];
            if other.max_residual[k] > self.max_residual[k] {
                self.max_residual[k] = other.max_residual[k];
                self.max_residual_point[k] = other.max_residual_point[k];
            }
        }
        self.n_sampled += other.n_sampled;
        self.dt_min = self.dt_min.min(other.dt_min);
        self.dt_max = self.dt_max.max(other.dt_max);
        self.linear = match (self.linear, other.linear) {
            (Some(mine), Some(theirs)) => Some(LinearSolveStats {
                iterations: mine.iterations.max(theirs.iterations),
                relative_residual: mine.relative_residual.max(theirs.relative_residual),
                converged: mine.converged && theirs.converged,
            }),
            (mine, theirs) => mine.or(theirs),
        };
    }

    /// 单行诊断摘要
    pub fn summary(&self) -> String {
        let mut line = format!("iter {:>5}", self.iteration);
        for k in 0..N_VARS {
            line.push_str(&format!(
                " | log10({})={:+.3}",
                EQUATION_NAMES[k],
                self.rms_log10(k)
            ));
        }
        line.push_str(&format!(" | dt=[{:.3e}, {:.3e}]", self.dt_min, self.dt_max));
        if let Some(linear) = self.linear {
            line.push_str(&format!(
                " | lin {} it, r={:.2e}{}",
                linear.iterations,
                linear.relative_residual,
                if linear.converged { "" } else { " (未收敛)" }
            ));
        }
        line
    }
}

// ============================================================
// 测试
// ============================================================
