// crates/vt_mesh/src/frozen.rs

//! 冻结网格容器
//!
//! - [`MeshData`]: 网格提供方产出的原始 SoA 数据（可序列化、可手工构造）
//! - [`SolverMesh`]: 求解器消费的只读视图，构造时完成拓扑校验并
//!   建立点-边邻接表
//!
//! # 数据模型
//!
//! - 点: 坐标、控制体面积、所有权（`[0, n_owned)` 为本分区拥有，
//!   `[n_owned, n_points)` 为 halo 镜像）
//! - 边: 点对 `(i, j)` 与面积缩放法向量，方向 i→j
//! - 标记: 命名边界段，见 [`crate::marker`]
//!
//! 求解器对网格严格只读；网格变形或重剖分意味着重建 `SolverMesh`。

use glam::DVec2;
use serde::{Deserialize, Serialize};
use vt_foundation::{ensure, VtError, VtResult};

use crate::halo::HaloTopology;
use crate::marker::Marker;

// ============================================================
// 原始网格数据
// ============================================================

/// 网格提供方产出的原始 SoA 数据
///
/// 字段全部公开，便于手工构造与序列化。不保证自洽；
/// 自洽性在 [`SolverMesh::from_data`] 中校验。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshData {
    /// 点总数（含 halo）
    pub n_points: usize,
    /// 本分区拥有的点数
    pub n_owned: usize,
    /// 点坐标
    pub point_coords: Vec<DVec2>,
    /// 控制体面积
    pub point_volume: Vec<f64>,
    /// 边端点对 (i, j)
    pub edge_points: Vec<[u32; 2]>,
    /// 面积缩放法向量，方向 i→j
    pub edge_normal: Vec<DVec2>,
    /// 边界标记
    pub markers: Vec<Marker>,
    /// 分区拓扑
    pub halo: HaloTopology,
}

// ============================================================
// 边视图
// ============================================================

/// 单条边的只读视图
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// 端点 i
    pub i: u32,
    /// 端点 j
    pub j: u32,
    /// 面积缩放法向量，方向 i→j
    pub normal: DVec2,
}

impl Edge {
    /// 面面积（2D 下为边长）
    #[inline]
    pub fn area(&self) -> f64 {
        self.normal.length()
    }

    /// 单位法向量（i→j）
    #[inline]
    pub fn unit_normal(&self) -> DVec2 {
        self.normal / self.area()
    }

    /// 给定一个端点，返回另一端点
    #[inline]
    pub fn other(&self, point: usize) -> usize {
        if point == self.i as usize {
            self.j as usize
        } else {
            self.i as usize
        }
    }
}

// ============================================================
// 求解器网格
// ============================================================

/// 求解器消费的只读网格
///
/// 由 [`MeshData`] 经校验冻结而来，附带点-边邻接表。
#[derive(Debug, Clone)]
pub struct SolverMesh {
    n_points: usize,
    n_owned: usize,
    point_coords: Vec<DVec2>,
    point_volume: Vec<f64>,
    edge_points: Vec<[u32; 2]>,
    edge_normal: Vec<DVec2>,
    // 点 -> 关联边 CSR 邻接表
    point_edge_offsets: Vec<u32>,
    point_edge_indices: Vec<u32>,
    markers: Vec<Marker>,
    halo: HaloTopology,
}

impl SolverMesh {
    /// 从原始数据构造，完成一次性拓扑校验
    ///
    /// # 校验内容
    ///
    /// - 数组长度自洽
    /// - 控制体面积为正且有限
    /// - 边端点索引在界内且互异
    /// - 标记引用的点在界内、外法向为单位向量、面面积为正
    /// - 每个拥有的点至少关联一条边或一个边界顶点（孤立点致命）
    /// - halo 拓扑与所有权划分一致
    pub fn from_data(data: MeshData) -> VtResult<Self> {
        let MeshData {
            n_points,
            n_owned,
            point_coords,
            point_volume,
            edge_points,
            edge_normal,
            markers,
            halo,
        } = data;

        ensure!(n_points > 0, VtError::invalid_mesh("网格不含任何点"));
        ensure!(
            n_owned > 0 && n_owned <= n_points,
            VtError::invalid_mesh(format!("所有权划分非法: n_owned={}, n_points={}", n_owned, n_points))
        );
        VtError::check_size("point_coords", n_points, point_coords.len())?;
        VtError::check_size("point_volume", n_points, point_volume.len())?;
        VtError::check_size("edge_normal", edge_points.len(), edge_normal.len())?;

        for (p, &vol) in point_volume.iter().enumerate() {
            ensure!(
                vol.is_finite() && vol > 0.0,
                VtError::invalid_mesh(format!("点 {} 的控制体面积非法: {}", p, vol))
            );
        }

        for (e, pair) in edge_points.iter().enumerate() {
            let (i, j) = (pair[0] as usize, pair[1] as usize);
            ensure!(
                i < n_points && j < n_points,
                VtError::invalid_mesh(format!("边 {} 端点越界: ({}, {})", e, i, j))
            );
            ensure!(
                i != j,
                VtError::invalid_mesh(format!("边 {} 的两个端点相同: {}", e, i))
            );
            let area = edge_normal[e].length();
            ensure!(
                area.is_finite() && area > 0.0,
                VtError::invalid_mesh(format!("边 {} 的法向量面积非法: {}", e, area))
            );
        }

        for marker in &markers {
            VtError::check_size("marker.normals", marker.points.len(), marker.normals.len())?;
            VtError::check_size("marker.areas", marker.points.len(), marker.areas.len())?;
            for (k, &p) in marker.points.iter().enumerate() {
                ensure!(
                    (p as usize) < n_points,
                    VtError::invalid_mesh(format!(
                        "标记 '{}' 的顶点 {} 引用越界点 {}",
                        marker.name, k, p
                    ))
                );
                let n_len = marker.normals[k].length();
                ensure!(
                    (n_len - 1.0).abs() < 1e-8,
                    VtError::invalid_mesh(format!(
                        "标记 '{}' 的顶点 {} 法向量未归一化: |n|={}",
                        marker.name, k, n_len
                    ))
                );
                ensure!(
                    marker.areas[k].is_finite() && marker.areas[k] > 0.0,
                    VtError::invalid_mesh(format!(
                        "标记 '{}' 的顶点 {} 面面积非法: {}",
                        marker.name, k, marker.areas[k]
                    ))
                );
            }
        }

        halo.validate(n_owned, n_points)?;

        // 建立点 -> 关联边 CSR 邻接表
        let mut counts = vec![0u32; n_points];
        for pair in &edge_points {
            counts[pair[0] as usize] += 1;
            counts[pair[1] as usize] += 1;
        }

        let mut offsets = vec![0u32; n_points + 1];
        for p in 0..n_points {
            offsets[p + 1] = offsets[p] + counts[p];
        }
        let mut indices = vec![0u32; offsets[n_points] as usize];
        let mut cursor = offsets.clone();
        for (e, pair) in edge_points.iter().enumerate() {
            for &p in pair {
                indices[cursor[p as usize] as usize] = e as u32;
                cursor[p as usize] += 1;
            }
        }

        // 孤立点检查：拥有的点必须出现在至少一条边或一个边界顶点中
        let mut on_boundary = vec![false; n_points];
        for marker in &markers {
            for &p in &marker.points {
                on_boundary[p as usize] = true;
            }
        }
        for p in 0..n_owned {
            let has_edges = offsets[p + 1] > offsets[p];
            ensure!(
                has_edges || on_boundary[p],
                VtError::invalid_mesh(format!("点 {} 既无关联边也不在任何边界上", p))
            );
        }

        Ok(Self {
            n_points,
            n_owned,
            point_coords,
            point_volume,
            edge_points,
            edge_normal,
            point_edge_offsets: offsets,
            point_edge_indices: indices,
            markers,
            halo,
        })
    }

    // --------------------------------------------------------
    // 点访问
    // --------------------------------------------------------

    /// 点总数（含 halo）
    #[inline]
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// 本分区拥有的点数
    #[inline]
    pub fn n_owned(&self) -> usize {
        self.n_owned
    }

    /// halo 点数
    #[inline]
    pub fn n_halo(&self) -> usize {
        self.n_points - self.n_owned
    }

    /// 点坐标
    #[inline]
    pub fn coords(&self, point: usize) -> DVec2 {
        self.point_coords[point]
    }

    /// 控制体面积
    #[inline]
    pub fn volume(&self, point: usize) -> f64 {
        self.point_volume[point]
    }

    /// 点是否为本分区拥有
    #[inline]
    pub fn is_owned(&self, point: usize) -> bool {
        point < self.n_owned
    }

    /// 拥有点的控制体面积之和
    pub fn owned_volume(&self) -> f64 {
        self.point_volume[..self.n_owned].iter().sum()
    }

    // --------------------------------------------------------
    // 边访问
    // --------------------------------------------------------

    /// 边总数
    #[inline]
    pub fn n_edges(&self) -> usize {
        self.edge_points.len()
    }

    /// 获取边视图
    #[inline]
    pub fn edge(&self, e: usize) -> Edge {
        Edge {
            i: self.edge_points[e][0],
            j: self.edge_points[e][1],
            normal: self.edge_normal[e],
        }
    }

    /// 点的关联边索引
    #[inline]
    pub fn incident_edges(&self, point: usize) -> &[u32] {
        let start = self.point_edge_offsets[point] as usize;
        let end = self.point_edge_offsets[point + 1] as usize;
        &self.point_edge_indices[start..end]
    }

    /// 点的边连通邻居迭代器
    pub fn neighbors(&self, point: usize) -> impl Iterator<Item = usize> + '_ {
        self.incident_edges(point)
            .iter()
            .map(move |&e| self.edge(e as usize).other(point))
    }

    // --------------------------------------------------------
    // 标记与分区
    // --------------------------------------------------------

    /// 全部边界标记
    #[inline]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// 按名称查找标记
    pub fn marker_by_name(&self, name: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.name == name)
    }

    /// 分区拓扑
    #[inline]
    pub fn halo(&self) -> &HaloTopology {
        &self.halo
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerKind;

    /// 两个单位方格单元，共享一条竖直面
    fn two_point_data() -> MeshData {
        let mut wall = Marker::new("wall", MarkerKind::Wall);
        // 每个点三条外边界
        wall.push_vertex(0, DVec2::new(-1.0, 0.0), 1.0);
        wall.push_vertex(0, DVec2::new(0.0, -1.0), 1.0);
        wall.push_vertex(0, DVec2::new(0.0, 1.0), 1.0);
        wall.push_vertex(1, DVec2::new(1.0, 0.0), 1.0);
        wall.push_vertex(1, DVec2::new(0.0, -1.0), 1.0);
        wall.push_vertex(1, DVec2::new(0.0, 1.0), 1.0);

        MeshData {
            n_points: 2,
            n_owned: 2,
            point_coords: vec![DVec2::new(0.5, 0.5), DVec2::new(1.5, 0.5)],
            point_volume: vec![1.0, 1.0],
            edge_points: vec![[0, 1]],
            edge_normal: vec![DVec2::new(1.0, 0.0)],
            markers: vec![wall],
            halo: HaloTopology::single(0),
        }
    }

    #[test]
    fn test_from_data_ok() {
        let mesh = SolverMesh::from_data(two_point_data()).unwrap();
        assert_eq!(mesh.n_points(), 2);
        assert_eq!(mesh.n_owned(), 2);
        assert_eq!(mesh.n_edges(), 1);
        assert_eq!(mesh.incident_edges(0), &[0]);
        assert_eq!(mesh.incident_edges(1), &[0]);

        let edge = mesh.edge(0);
        assert_eq!(edge.i, 0);
        assert_eq!(edge.j, 1);
        assert!((edge.area() - 1.0).abs() < 1e-14);
        assert_eq!(edge.other(0), 1);
        assert_eq!(edge.other(1), 0);
    }

    #[test]
    fn test_neighbors() {
        let mesh = SolverMesh::from_data(two_point_data()).unwrap();
        let n0: Vec<_> = mesh.neighbors(0).collect();
        assert_eq!(n0, vec![1]);
    }

    #[test]
    fn test_negative_volume_rejected() {
        let mut data = two_point_data();
        data.point_volume[1] = -1.0;
        assert!(SolverMesh::from_data(data).is_err());
    }

    #[test]
    fn test_degenerate_edge_rejected() {
        let mut data = two_point_data();
        data.edge_points[0] = [0, 0];
        assert!(SolverMesh::from_data(data).is_err());
    }

    #[test]
    fn test_edge_out_of_range_rejected() {
        let mut data = two_point_data();
        data.edge_points[0] = [0, 5];
        assert!(SolverMesh::from_data(data).is_err());
    }

    #[test]
    fn test_marker_out_of_range_rejected() {
        let mut data = two_point_data();
        data.markers[0].points[0] = 9;
        assert!(SolverMesh::from_data(data).is_err());
    }

    #[test]
    fn test_unnormalized_marker_normal_rejected() {
        let mut data = two_point_data();
        data.markers[0].normals[0] = DVec2::new(2.0, 0.0);
        assert!(SolverMesh::from_data(data).is_err());
    }

    #[test]
    fn test_isolated_point_rejected() {
        let data = MeshData {
            n_points: 2,
            n_owned: 2,
            point_coords: vec![DVec2::new(0.5, 0.5), DVec2::new(1.5, 0.5)],
            point_volume: vec![1.0, 1.0],
            edge_points: Vec::new(),
            edge_normal: Vec::new(),
            markers: Vec::new(),
            halo: HaloTopology::single(0),
        };
        let err = SolverMesh::from_data(data).unwrap_err();
        assert!(err.to_string().contains("孤立") || err.to_string().contains("既无关联边"));
    }

    #[test]
    fn test_single_point_with_boundary_ok() {
        // 单点网格：四面全是边界，无内部边
        let mut wall = Marker::new("wall", MarkerKind::Wall);
        wall.push_vertex(0, DVec2::new(1.0, 0.0), 1.0);
        wall.push_vertex(0, DVec2::new(-1.0, 0.0), 1.0);
        wall.push_vertex(0, DVec2::new(0.0, 1.0), 1.0);
        wall.push_vertex(0, DVec2::new(0.0, -1.0), 1.0);

        let data = MeshData {
            n_points: 1,
            n_owned: 1,
            point_coords: vec![DVec2::new(0.5, 0.5)],
            point_volume: vec![1.0],
            edge_points: Vec::new(),
            edge_normal: Vec::new(),
            markers: vec![wall],
            halo: HaloTopology::single(0),
        };
        assert!(SolverMesh::from_data(data).is_ok());
    }
}
