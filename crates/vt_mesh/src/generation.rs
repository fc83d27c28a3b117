// crates/vt_mesh/src/generation.rs

//! 结构化网格生成器
//!
//! 生成单分区的矩形均匀网格，主要服务于测试与小型算例：
//! - [`cartesian`]: 四边带标记的矩形网格
//! - [`cartesian_periodic`]: 双向周期网格（无边界标记，周期面
//!   已解析为环绕边）
//!
//! 单元即网格点（格心格式），单元中心为点坐标，单元面积为控制体面积。

use glam::DVec2;
use vt_foundation::{ensure, VtError, VtResult};

use crate::frozen::{MeshData, SolverMesh};
use crate::halo::HaloTopology;
use crate::marker::{Marker, MarkerKind};

/// 矩形网格配置
#[derive(Debug, Clone)]
pub struct CartesianConfig {
    /// x 方向单元数
    pub nx: usize,
    /// y 方向单元数
    pub ny: usize,
    /// x 方向总长度
    pub lx: f64,
    /// y 方向总长度
    pub ly: f64,
    /// 西侧边界类型
    pub west: MarkerKind,
    /// 东侧边界类型
    pub east: MarkerKind,
    /// 南侧边界类型
    pub south: MarkerKind,
    /// 北侧边界类型
    pub north: MarkerKind,
}

impl Default for CartesianConfig {
    fn default() -> Self {
        Self {
            nx: 4,
            ny: 4,
            lx: 1.0,
            ly: 1.0,
            west: MarkerKind::Wall,
            east: MarkerKind::Wall,
            south: MarkerKind::Wall,
            north: MarkerKind::Wall,
        }
    }
}

impl CartesianConfig {
    /// 创建 nx × ny 的单位间距配置
    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64) -> Self {
        Self {
            nx,
            ny,
            lx,
            ly,
            ..Default::default()
        }
    }

    /// 设置东西两侧边界类型
    pub fn with_x_boundaries(mut self, west: MarkerKind, east: MarkerKind) -> Self {
        self.west = west;
        self.east = east;
        self
    }

    /// 设置南北两侧边界类型
    pub fn with_y_boundaries(mut self, south: MarkerKind, north: MarkerKind) -> Self {
        self.south = south;
        self.north = north;
        self
    }
}

#[inline]
fn cell_index(nx: usize, i: usize, j: usize) -> u32 {
    (j * nx + i) as u32
}

fn interior_edges(nx: usize, ny: usize, dx: f64, dy: f64) -> (Vec<[u32; 2]>, Vec<DVec2>) {
    let mut edge_points = Vec::new();
    let mut edge_normal = Vec::new();

    // x 方向相邻：法向 +x，面长 dy
    for j in 0..ny {
        for i in 0..nx - 1 {
            edge_points.push([cell_index(nx, i, j), cell_index(nx, i + 1, j)]);
            edge_normal.push(DVec2::new(dy, 0.0));
        }
    }
    // y 方向相邻：法向 +y，面长 dx
    for j in 0..ny - 1 {
        for i in 0..nx {
            edge_points.push([cell_index(nx, i, j), cell_index(nx, i, j + 1)]);
            edge_normal.push(DVec2::new(0.0, dx));
        }
    }
    (edge_points, edge_normal)
}

fn cell_geometry(nx: usize, ny: usize, dx: f64, dy: f64) -> (Vec<DVec2>, Vec<f64>) {
    let n = nx * ny;
    let mut coords = Vec::with_capacity(n);
    for j in 0..ny {
        for i in 0..nx {
            coords.push(DVec2::new((i as f64 + 0.5) * dx, (j as f64 + 0.5) * dy));
        }
    }
    (coords, vec![dx * dy; n])
}

/// 生成四边带标记的矩形网格
pub fn cartesian(config: &CartesianConfig) -> VtResult<SolverMesh> {
    let (nx, ny) = (config.nx, config.ny);
    ensure!(
        nx >= 2 && ny >= 2,
        VtError::invalid_input(format!("矩形网格至少需要 2x2 单元, 实际 {}x{}", nx, ny))
    );
    ensure!(
        config.lx > 0.0 && config.ly > 0.0,
        VtError::invalid_input("网格尺寸必须为正")
    );

    let dx = config.lx / nx as f64;
    let dy = config.ly / ny as f64;
    let (point_coords, point_volume) = cell_geometry(nx, ny, dx, dy);
    let (edge_points, edge_normal) = interior_edges(nx, ny, dx, dy);

    let mut west = Marker::new("west", config.west);
    let mut east = Marker::new("east", config.east);
    let mut south = Marker::new("south", config.south);
    let mut north = Marker::new("north", config.north);

    for j in 0..ny {
        west.push_vertex(cell_index(nx, 0, j), DVec2::new(-1.0, 0.0), dy);
        east.push_vertex(cell_index(nx, nx - 1, j), DVec2::new(1.0, 0.0), dy);
    }
    for i in 0..nx {
        south.push_vertex(cell_index(nx, i, 0), DVec2::new(0.0, -1.0), dx);
        north.push_vertex(cell_index(nx, i, ny - 1), DVec2::new(0.0, 1.0), dx);
    }

    SolverMesh::from_data(MeshData {
        n_points: nx * ny,
        n_owned: nx * ny,
        point_coords,
        point_volume,
        edge_points,
        edge_normal,
        markers: vec![west, east, south, north],
        halo: HaloTopology::single(0),
    })
}

/// 生成双向周期矩形网格
///
/// 周期面被解析为环绕边（东缘接西缘、北缘接南缘），
/// 因此网格没有任何边界标记，全部面都是内部面。
pub fn cartesian_periodic(nx: usize, ny: usize, lx: f64, ly: f64) -> VtResult<SolverMesh> {
    ensure!(
        nx >= 2 && ny >= 2,
        VtError::invalid_input(format!("周期网格至少需要 2x2 单元, 实际 {}x{}", nx, ny))
    );
    ensure!(lx > 0.0 && ly > 0.0, VtError::invalid_input("网格尺寸必须为正"));

    let dx = lx / nx as f64;
    let dy = ly / ny as f64;
    let (point_coords, point_volume) = cell_geometry(nx, ny, dx, dy);
    let (mut edge_points, mut edge_normal) = interior_edges(nx, ny, dx, dy);

    // 环绕边：东缘 -> 西缘，外法向 +x
    for j in 0..ny {
        edge_points.push([cell_index(nx, nx - 1, j), cell_index(nx, 0, j)]);
        edge_normal.push(DVec2::new(dy, 0.0));
    }
    // 环绕边：北缘 -> 南缘，外法向 +y
    for i in 0..nx {
        edge_points.push([cell_index(nx, i, ny - 1), cell_index(nx, i, 0)]);
        edge_normal.push(DVec2::new(0.0, dx));
    }

    SolverMesh::from_data(MeshData {
        n_points: nx * ny,
        n_owned: nx * ny,
        point_coords,
        point_volume,
        edge_points,
        edge_normal,
        markers: Vec::new(),
        halo: HaloTopology::single(0),
    })
}

// ============================================================
// 测试
// ============================================================
