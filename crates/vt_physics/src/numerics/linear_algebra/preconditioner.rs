// crates/vt_physics/src/numerics/linear_algebra/preconditioner.rs

//! 预条件器模块
//!
//! 预条件器用于加速迭代求解器的收敛，将原问题 Ax = b 转换为
//! 条件数更好的问题 M⁻¹Ax = M⁻¹b。
//!
//! # 预条件器类型
//!
//! - [`IdentityPreconditioner`]: 恒等预条件器（无预条件）
//! - [`BlockJacobiPreconditioner`]: 块 Jacobi 预条件器（对角块求逆）
//!
//! 块 Jacobi 对隐式 CFD 的对角占优 Jacobian 足够有效，且每轮装配后
//! 的更新开销只有 n 个 4×4 求逆。

use super::block::Block4;
use super::bsr::BsrMatrix;

/// 预条件器 trait
///
/// 核心操作是 `apply`: z = M⁻¹ * r，向量为按点分块的扁平布局。
pub trait BlockPreconditioner: Send + Sync {
    /// 应用预条件器: z = M⁻¹ * r
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// 预条件器名称
    fn name(&self) -> &'static str;

    /// 矩阵值变化后更新（模式不变）
    fn update(&mut self, matrix: &BsrMatrix);
}

/// 恒等预条件器（无预条件）
///
/// M = I，即 z = r
#[derive(Debug, Clone, Default)]
pub struct IdentityPreconditioner;

impl IdentityPreconditioner {
    /// 创建恒等预条件器
    pub fn new() -> Self {
        Self
    }
}

impl BlockPreconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }

    fn update(&mut self, _matrix: &BsrMatrix) {}
}

/// 块 Jacobi 预条件器
///
/// M = blockdiag(A)，即 z_i = A_ii⁻¹ · r_i。
/// 奇异对角块回退为单位块。
#[derive(Debug, Clone)]
pub struct BlockJacobiPreconditioner {
    /// 对角块的逆
    inv_diag: Vec<Block4>,
}

impl BlockJacobiPreconditioner {
    /// 从 BSR 矩阵创建块 Jacobi 预条件器
    pub fn from_matrix(matrix: &BsrMatrix) -> Self {
        let n = matrix.n_rows();
        let mut inv_diag = vec![Block4::IDENTITY; n];
        for (row, inv) in inv_diag.iter_mut().enumerate() {
            if let Some(b) = matrix.diagonal_block(row).invert() {
                *inv = b;
            }
        }
        Self { inv_diag }
    }

    /// 对角块逆的引用
    pub fn inv_diagonal(&self) -> &[Block4] {
        &self.inv_diag
    }
}

impl BlockPreconditioner for BlockJacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        debug_assert_eq!(r.len(), z.len());
        debug_assert_eq!(r.len(), self.inv_diag.len() * 4);

        for (row, inv) in self.inv_diag.iter().enumerate() {
            let rb = [r[4 * row], r[4 * row + 1], r[4 * row + 2], r[4 * row + 3]];
            let zb = inv.mul_vec(rb);
            z[4 * row..4 * row + 4].copy_from_slice(&zb);
        }
    }

    fn name(&self) -> &'static str {
        "BlockJacobi"
    }

    fn update(&mut self, matrix: &BsrMatrix) {
        for (row, inv) in self.inv_diag.iter_mut().enumerate() {
            *inv = matrix
                .diagonal_block(row)
                .invert()
                .unwrap_or(Block4::IDENTITY);
        }
    }
}
