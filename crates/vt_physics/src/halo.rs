// crates/vt_physics/src/halo.rs

//! 分区 halo 同步
//!
//! 单一入口 [`HaloExchange::synchronize`]：把所选场在发送列表上的
//! 值打包，经 [`HaloChannel`] 与每个邻分区阻塞交换，再散布进接收
//! 列表指向的 halo 点。无邻分区时严格零开销返回。
//!
//! 进程内传输由 [`MailboxNetwork`] 提供（互斥量加条件变量信箱），
//! 用于把多个求解器实例接成多分区测试。跨进程后端只需另行实现
//! [`HaloChannel`]。

use std::collections::HashMap;
use std::sync::Arc;

use glam::DVec2;
use parking_lot::{Condvar, Mutex};
use vt_foundation::{ensure, VtError, VtResult};
use vt_mesh::SolverMesh;

use crate::state::{ConservedState, FlowField, N_VARS};

// ============================================================
// 场选择
// ============================================================

/// 可同步的逐点场
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaloField {
    /// 守恒变量
    Conserved,
    /// 外迭代快照
    Old,
    /// 原始变量梯度
    Gradient,
    /// 限制器
    Limiter,
    /// 无除拉普拉斯与压力传感器（中心格式辅助场）
    JstAux,
}

impl HaloField {
    /// 每点打包的标量个数
    fn width(self) -> usize {
        match self {
            Self::Conserved | Self::Old | Self::Limiter => N_VARS,
            Self::Gradient => 2 * N_VARS,
            Self::JstAux => N_VARS + 1,
        }
    }
}

// ============================================================
// 传输通道
// ============================================================

/// 一次交换中发往或来自单个邻分区的数据包
#[derive(Debug, Clone)]
pub struct HaloPacket {
    /// 邻分区 rank
    pub peer: usize,
    /// 打包数据，长度 = 点数 × 场宽
    pub values: Vec<f64>,
}

/// 分区间传输通道
///
/// 实现方把 `outgoing` 中的每个包送达其 `peer`，并带回所有邻分区
/// 发给 `rank` 的包。调用在全部来件到齐前阻塞。
pub trait HaloChannel: Send + Sync {
    /// 与全部邻分区完成一轮对称交换
    fn exchange(&self, rank: usize, outgoing: Vec<HaloPacket>) -> VtResult<Vec<HaloPacket>>;
}

// ============================================================
// 同步引擎
// ============================================================

/// halo 同步引擎
///
/// 持有可选的传输通道。单分区网格（无链接）下任何同步调用都直接
/// 返回，不触碰通道。
pub struct HaloExchange {
    channel: Option<Arc<dyn HaloChannel>>,
}

impl HaloExchange {
    /// 单分区运行，无传输通道
    pub fn local() -> Self {
        Self { channel: None }
    }

    /// 多分区运行，经给定通道交换
    pub fn networked(channel: Arc<dyn HaloChannel>) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    /// 是否配置了传输通道
    #[inline]
    pub fn is_networked(&self) -> bool {
        self.channel.is_some()
    }

    /// 同步所选场的 halo 区
    ///
    /// 发送列表上的点按链接次序打包，接收包按邻分区 rank 对位，
    /// 长度不符或缺包视为拓扑损坏（致命）。
    pub fn synchronize(
        &self,
        mesh: &SolverMesh,
        field: &mut FlowField,
        what: HaloField,
    ) -> VtResult<()> {
        let topology = mesh.halo();
        if topology.links.is_empty() {
            return Ok(());
        }

        let channel = self.channel.as_deref().ok_or_else(|| {
            VtError::config("网格含分区链接但未配置 halo 传输通道")
        })?;

        let width = what.width();
        let outgoing = topology
            .links
            .iter()
            .map(|link| HaloPacket {
                peer: link.rank,
                values: gather(field, what, &link.send_points),
            })
            .collect();

        let incoming = channel.exchange(topology.rank, outgoing)?;

        for link in &topology.links {
            let packet = incoming
                .iter()
                .find(|p| p.peer == link.rank)
                .ok_or_else(|| {
                    VtError::communication(format!(
                        "分区 {} 未收到邻分区 {} 的 halo 数据",
                        topology.rank, link.rank
                    ))
                })?;
            ensure!(
                packet.values.len() == width * link.recv_points.len(),
                VtError::communication(format!(
                    "邻分区 {} 的 halo 包长度 {} 与接收列表 {}×{} 不符",
                    link.rank,
                    packet.values.len(),
                    link.recv_points.len(),
                    width
                ))
            );
            scatter(field, what, &link.recv_points, &packet.values);
        }
        Ok(())
    }
}

/// 按发送列表打包场值
fn gather(field: &FlowField, what: HaloField, points: &[u32]) -> Vec<f64> {
    let mut values = Vec::with_capacity(points.len() * what.width());
    match what {
        HaloField::Conserved => {
            for &p in points {
                values.extend_from_slice(&field.conserved.get(p as usize).to_array());
            }
        }
        HaloField::Old => {
            for &p in points {
                values.extend_from_slice(&field.old.get(p as usize).to_array());
            }
        }
        HaloField::Gradient => {
            for &p in points {
                for g in field.gradient.get(p as usize) {
                    values.push(g.x);
                    values.push(g.y);
                }
            }
        }
        HaloField::Limiter => {
            for &p in points {
                values.extend_from_slice(&field.limiter.get(p as usize));
            }
        }
        HaloField::JstAux => {
            for &p in points {
                values.extend_from_slice(&field.laplacian.get(p as usize).to_array());
                values.push(field.sensor[p as usize]);
            }
        }
    }
    values
}

/// 按接收列表散布场值
fn scatter(field: &mut FlowField, what: HaloField, points: &[u32], values: &[f64]) {
    let width = what.width();
    for (k, &p) in points.iter().enumerate() {
        let p = p as usize;
        let chunk = &values[k * width..(k + 1) * width];
        match what {
            HaloField::Conserved => {
                field
                    .conserved
                    .set(p, ConservedState::from_array([chunk[0], chunk[1], chunk[2], chunk[3]]));
            }
            HaloField::Old => {
                field
                    .old
                    .set(p, ConservedState::from_array([chunk[0], chunk[1], chunk[2], chunk[3]]));
            }
            HaloField::Gradient => {
                for var in 0..N_VARS {
                    field.gradient.comp[var][p] =
                        DVec2::new(chunk[2 * var], chunk[2 * var + 1]);
                }
            }
            HaloField::Limiter => {
                for var in 0..N_VARS {
                    field.limiter.phi[var][p] = chunk[var];
                }
            }
            HaloField::JstAux => {
                field.laplacian.set(
                    p,
                    ConservedState::from_array([chunk[0], chunk[1], chunk[2], chunk[3]]),
                );
                field.sensor[p] = chunk[N_VARS];
            }
        }
    }
}

// ============================================================
// 进程内信箱网络
// ============================================================

/// 进程内信箱网络
///
/// 每对有序 `(发送方, 接收方)` 一个信箱槽。`exchange` 先投递全部
/// 发件并唤醒等待者，再阻塞等待每个邻分区的来件。要求所有分区在
/// 同一轮调用同一场的同步，错配轮次会因重复投递报错。
pub struct MailboxNetwork {
    slots: Mutex<HashMap<(usize, usize), Vec<f64>>>,
    ready: Condvar,
}

impl MailboxNetwork {
    /// 创建共享信箱网络
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(HashMap::new()),
            ready: Condvar::new(),
        })
    }
}

impl HaloChannel for MailboxNetwork {
    fn exchange(&self, rank: usize, outgoing: Vec<HaloPacket>) -> VtResult<Vec<HaloPacket>> {
        let peers: Vec<usize> = outgoing.iter().map(|p| p.peer).collect();

        let mut slots = self.slots.lock();
        for packet in outgoing {
            let occupied = slots.insert((rank, packet.peer), packet.values).is_some();
            ensure!(
                !occupied,
                VtError::communication(format!(
                    "分区 {} 发往 {} 的信箱被重复投递，交换轮次错配",
                    rank, packet.peer
                ))
            );
        }
        self.ready.notify_all();

        let mut incoming = Vec::with_capacity(peers.len());
        for peer in peers {
            loop {
                if let Some(values) = slots.remove(&(peer, rank)) {
                    incoming.push(HaloPacket { peer, values });
                    break;
                }
                self.ready.wait(&mut slots);
            }
        }
        Ok(incoming)
    }
}

// ============================================================
// 测试
// ============================================================
