// crates/vt_physics/src/engine/explicit.rs

//! 显式级更新
//!
//! 多级显式推进的单级更新：`U = U_old - α_s·(Δt_i/V_i)·R`。
//! 级间的原始变量刷新、halo 同步与残差重装配由求解器编排，
//! 这里只做拥有点的代数更新。

use rayon::prelude::*;
use vt_mesh::SolverMesh;

use crate::state::{ConservedState, FlowField, N_VARS};
use crate::types::NumericalParams;

/// 显式级更新器
#[derive(Debug, Clone)]
pub struct ExplicitUpdater {
    parallel: bool,
    parallel_threshold: usize,
}

impl ExplicitUpdater {
    /// 创建更新器
    pub fn new(params: &NumericalParams) -> Self {
        Self {
            parallel: params.parallel,
            parallel_threshold: params.parallel_threshold,
        }
    }

    /// 对拥有点施加一级更新
    ///
    /// 从外迭代快照 `field.old` 出发，按局部步长缩放残差。
    /// 更新后守恒量的物理性校验由随后的原始变量刷新承担。
    pub fn apply_stage(&self, mesh: &SolverMesh, field: &mut FlowField, alpha: f64) {
        let n_owned = mesh.n_owned();
        let FlowField {
            ref mut conserved,
            ref old,
            ref residual,
            ref local_dt,
            ..
        } = *field;

        let stage_state = |p: usize| -> ConservedState {
            let scale = alpha * local_dt[p] / mesh.volume(p);
            let base = old.get(p).to_array();
            let r = residual.get(p);
            let mut updated = [0.0; N_VARS];
            for k in 0..N_VARS {
                updated[k] = base[k] - scale * r[k];
            }
            ConservedState::from_array(updated)
        };

        if self.parallel && n_owned >= self.parallel_threshold {
            let states: Vec<ConservedState> =
                (0..n_owned).into_par_iter().map(stage_state).collect();
            for (p, u) in states.into_iter().enumerate() {
                conserved.set(p, u);
            }
        } else {
            for p in 0..n_owned {
                conserved.set(p, stage_state(p));
            }
        }
    }
}

// ============================================================
// 测试
// ============================================================
