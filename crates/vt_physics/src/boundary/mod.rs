// crates/vt_physics/src/boundary/mod.rs

//! 边界条件模块
//!
//! 边界施加分两条路径：
//!
//! - **弱施加（虚元通量）**: 滑移壁、对称面、远场、入口、出口。
//!   按条件构造边界外侧虚元状态，跨 (内点, 虚元) 求通量计入残差，
//!   雅可比只贡献对角块。滑移壁与对称面退化为解析压力通量。
//! - **强施加**: 无滑移壁。动量直接置零，动量残差行清零，
//!   雅可比对应方程行换成单位阵，线性求解不会扰动被固定的未知量。
//!
//! 周期边界由网格提供方预先折算成内部边；分区边界走 halo 同步，
//! 两者都不经过通量分派。
//!
//! # 使用示例
//!
//! ```ignore
//! use vt_physics::boundary::{BoundaryCondition, BoundarySet};
//!
//! let set = BoundarySet::new()
//!     .with("airfoil", BoundaryCondition::EulerWall)
//!     .with("farfield", BoundaryCondition::FarField { state: free_stream });
//! let resolved = set.resolve(&mesh)?;
//! ```

pub mod ghost;
pub mod types;

pub use ghost::{
    far_field_ghost, inlet_mass_flow_ghost, inlet_total_ghost, outlet_ghost, reflect_velocity,
    symmetry_ghost, wall_pressure_flux, wall_pressure_jacobian,
};
pub use types::{BoundaryBinding, BoundaryCondition, BoundarySet, ResolvedBoundaries};
