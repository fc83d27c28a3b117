// crates/vt_mesh/src/halo.rs

//! 分区 halo 拓扑
//!
//! 描述分区间共享点的收发关系：
//! - [`PartitionLink`]: 与单个邻居分区的发送/接收点索引表
//! - [`HaloTopology`]: 本分区的全部邻居链接
//!
//! 发送表引用本分区拥有的点（权威值），接收表引用本分区的
//! halo 点（镜像值）。配对的两个分区必须满足
//! `send_points.len() == 对方 recv_points.len()`，顺序一一对应。
//! 拓扑由网格剖分方产出，求解器只读。

use serde::{Deserialize, Serialize};
use vt_foundation::{ensure, VtError, VtResult};

/// 与单个邻居分区的链接
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartitionLink {
    /// 邻居分区号
    pub rank: usize,
    /// 发送点索引（本分区拥有的点）
    pub send_points: Vec<u32>,
    /// 接收点索引（本分区的 halo 点）
    pub recv_points: Vec<u32>,
}

impl PartitionLink {
    /// 创建链接
    pub fn new(rank: usize, send_points: Vec<u32>, recv_points: Vec<u32>) -> Self {
        Self {
            rank,
            send_points,
            recv_points,
        }
    }
}

/// 本分区的 halo 拓扑
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HaloTopology {
    /// 本分区号
    pub rank: usize,
    /// 邻居链接（按 rank 升序）
    pub links: Vec<PartitionLink>,
}

impl HaloTopology {
    /// 单分区拓扑（无邻居）
    pub fn single(rank: usize) -> Self {
        Self {
            rank,
            links: Vec::new(),
        }
    }

    /// 是否为单分区运行
    #[inline]
    pub fn is_single_partition(&self) -> bool {
        self.links.is_empty()
    }

    /// 邻居数量
    #[inline]
    pub fn n_neighbors(&self) -> usize {
        self.links.len()
    }

    /// 校验拓扑与点集的一致性
    ///
    /// - 发送点必须是本分区拥有的点（`< n_owned`）
    /// - 接收点必须是 halo 点（`[n_owned, n_points)`）
    /// - 不允许与自身建立链接
    pub fn validate(&self, n_owned: usize, n_points: usize) -> VtResult<()> {
        for link in &self.links {
            ensure!(
                link.rank != self.rank,
                VtError::invalid_mesh(format!("分区 {} 与自身建立 halo 链接", self.rank))
            );
            for &p in &link.send_points {
                ensure!(
                    (p as usize) < n_owned,
                    VtError::invalid_mesh(format!(
                        "发送点 {} 不是分区 {} 拥有的点 (n_owned={})",
                        p, self.rank, n_owned
                    ))
                );
            }
            for &p in &link.recv_points {
                ensure!(
                    (p as usize) >= n_owned && (p as usize) < n_points,
                    VtError::invalid_mesh(format!(
                        "接收点 {} 不在分区 {} 的 halo 区间 [{}, {})",
                        p, self.rank, n_owned, n_points
                    ))
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_partition() {
        let topo = HaloTopology::single(0);
        assert!(topo.is_single_partition());
        assert_eq!(topo.n_neighbors(), 0);
        assert!(topo.validate(4, 4).is_ok());
    }

    #[test]
    fn test_validate_send_must_be_owned() {
        let topo = HaloTopology {
            rank: 0,
            links: vec![PartitionLink::new(1, vec![3], vec![3])],
        };
        // 3 >= n_owned=3 -> 发送点非法
        assert!(topo.validate(3, 4).is_err());
    }

    #[test]
    fn test_validate_recv_must_be_halo() {
        let topo = HaloTopology {
            rank: 0,
            links: vec![PartitionLink::new(1, vec![0], vec![1])],
        };
        // 1 < n_owned=3 -> 接收点非法
        assert!(topo.validate(3, 4).is_err());

        let good = HaloTopology {
            rank: 0,
            links: vec![PartitionLink::new(1, vec![0], vec![3])],
        };
        assert!(good.validate(3, 4).is_ok());
    }

    #[test]
    fn test_validate_self_link() {
        let topo = HaloTopology {
            rank: 2,
            links: vec![PartitionLink::new(2, vec![0], vec![3])],
        };
        assert!(topo.validate(3, 4).is_err());
    }
}
