// crates/vt_physics/src/numerics/gradient/traits.rs

//! 梯度计算接口

use vt_mesh::SolverMesh;

use crate::state::{GradientField, PrimitiveView};

/// 梯度计算方法
///
/// 对拥有点 `[0, n_owned)` 计算全部原始分量 `[ρ, u, v, p]` 的梯度。
/// halo 点的梯度不在本地计算，由分区同步填充。
pub trait GradientMethod: Send + Sync {
    /// 计算拥有点的原始变量梯度
    fn compute(
        &self,
        mesh: &SolverMesh,
        primitives: PrimitiveView<'_>,
        output: &mut GradientField,
    );

    /// 方法名称
    fn name(&self) -> &'static str;
}
