// crates/vt_mesh/src/marker.rs

//! 边界标记定义
//!
//! 本模块提供边界段的数据模型：
//! - [`MarkerKind`]: 边界类型标签
//! - [`Marker`]: 命名边界段（有序边界顶点集合）
//! - [`BoundaryVertex`]: 单个边界顶点视图
//!
//! 标记只携带几何与类型信息；具体的边界条件参数（远场状态、
//! 背压等）由物理层按标记名称注册。

use glam::DVec2;
use serde::{Deserialize, Serialize};

// ============================================================
// 边界类型
// ============================================================

/// 边界类型标签
///
/// 网格中每个边界段携带一个类型标签，物理层据此选择弱/强施加方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MarkerKind {
    /// 固壁（滑移或无滑移由物理层条件参数决定）
    #[default]
    Wall = 0,
    /// 远场
    FarField = 1,
    /// 对称面
    Symmetry = 2,
    /// 入口
    Inlet = 3,
    /// 出口
    Outlet = 4,
    /// 周期边界（应由网格提供方预先解析为内部边）
    Periodic = 5,
    /// 分区边界（由 halo 同步处理，不参与通量装配）
    PartitionBoundary = 6,
}

impl MarkerKind {
    /// 是否需要物理层注册边界条件参数
    ///
    /// 周期边界与分区边界不经过通量分派，无需条件参数。
    #[inline]
    pub fn requires_condition(&self) -> bool {
        !matches!(self, Self::Periodic | Self::PartitionBoundary)
    }

    /// 是否为固体边界
    #[inline]
    pub fn is_solid(&self) -> bool {
        matches!(self, Self::Wall)
    }

    /// 是否为开边界（有质量交换）
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::FarField | Self::Inlet | Self::Outlet)
    }

    /// 从 u8 转换
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Wall),
            1 => Some(Self::FarField),
            2 => Some(Self::Symmetry),
            3 => Some(Self::Inlet),
            4 => Some(Self::Outlet),
            5 => Some(Self::Periodic),
            6 => Some(Self::PartitionBoundary),
            _ => None,
        }
    }

    /// 转换为 u8
    #[inline]
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Wall => "Wall",
            Self::FarField => "FarField",
            Self::Symmetry => "Symmetry",
            Self::Inlet => "Inlet",
            Self::Outlet => "Outlet",
            Self::Periodic => "Periodic",
            Self::PartitionBoundary => "PartitionBoundary",
        };
        write!(f, "{}", name)
    }
}

// ============================================================
// 边界段
// ============================================================

/// 单个边界顶点视图
///
/// 每个边界顶点绑定一个内部网格点，携带外法向单位向量与面面积。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryVertex {
    /// 绑定的网格点索引
    pub point: usize,
    /// 外法向单位向量
    pub normal: DVec2,
    /// 边界面面积（2D 下为边长）
    pub area: f64,
}

/// 命名边界段
///
/// SoA 布局：`points[k]`、`normals[k]`、`areas[k]` 描述第 k 个边界顶点。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    /// 标记名称（物理层按名称注册条件）
    pub name: String,
    /// 边界类型标签
    pub kind: MarkerKind,
    /// 边界顶点绑定的网格点索引
    pub points: Vec<u32>,
    /// 外法向单位向量
    pub normals: Vec<DVec2>,
    /// 边界面面积
    pub areas: Vec<f64>,
}

impl Marker {
    /// 创建边界段
    pub fn new(name: impl Into<String>, kind: MarkerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            points: Vec::new(),
            normals: Vec::new(),
            areas: Vec::new(),
        }
    }

    /// 追加一个边界顶点
    pub fn push_vertex(&mut self, point: u32, normal: DVec2, area: f64) {
        self.points.push(point);
        self.normals.push(normal);
        self.areas.push(area);
    }

    /// 边界顶点数量
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 获取第 k 个边界顶点
    #[inline]
    pub fn vertex(&self, k: usize) -> BoundaryVertex {
        BoundaryVertex {
            point: self.points[k] as usize,
            normal: self.normals[k],
            area: self.areas[k],
        }
    }

    /// 边界顶点迭代器
    pub fn vertices(&self) -> impl Iterator<Item = BoundaryVertex> + '_ {
        (0..self.len()).map(|k| self.vertex(k))
    }
}

// ============================================================
// 测试
// ============================================================
