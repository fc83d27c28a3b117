// crates/vt_mesh/src/lib.rs

//! Ventus 网格层
//!
//! 为求解器核心提供只读的网格数据模型：
//! - [`SolverMesh`]: 冻结的 SoA 网格容器（点、边、边界标记、分区拓扑）
//! - [`Marker`] / [`MarkerKind`]: 命名边界段及其类型标签
//! - [`HaloTopology`]: 分区间共享点的发送/接收索引表
//! - [`generation`]: 测试与算例用的结构化网格生成器
//!
//! 网格的生成、剖分与变形属于外部职责；本层只负责承载数据并在
//! 构造时做一次性拓扑校验（孤立点、越界索引等在此处致命报错）。

#![warn(missing_docs)]

pub mod frozen;
pub mod generation;
pub mod halo;
pub mod marker;

pub use frozen::{Edge, MeshData, SolverMesh};
pub use halo::{HaloTopology, PartitionLink};
pub use marker::{BoundaryVertex, Marker, MarkerKind};
