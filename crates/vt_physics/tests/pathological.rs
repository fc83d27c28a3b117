// tests/pathological.rs

//! 病态状态与故障路径验证
//!
//! 发散检测绝不钳位遮盖：一旦出现非物理状态，外迭代必须以
//! 致命错误返回并指认出错的点；halo 通道的协议违例同样在
//! 当轮立即暴露。

use std::sync::Arc;

use glam::DVec2;
use vt_foundation::VtResult;
use vt_mesh::generation::cartesian_periodic;
use vt_mesh::{HaloTopology, MeshData, PartitionLink, SolverMesh};
use vt_physics::{
    FlowSolver, HaloChannel, HaloPacket, PrimitiveState, TimeSchemeKind,
};

// ============================================================
// 测试辅助函数
// ============================================================

fn explicit_solver() -> (FlowSolver, vt_physics::FlowField) {
    let mesh = Arc::new(cartesian_periodic(3, 3, 1.0, 1.0).unwrap());
    let mut solver = FlowSolver::builder()
        .with_time_scheme(TimeSchemeKind::ExplicitEuler)
        .with_cfl(0.5)
        .build(mesh)
        .unwrap();
    let gas = solver.options().gas;
    let mut field = solver.allocate_field();
    field.initialize_uniform(PrimitiveState::new(1.2, DVec2::new(60.0, 20.0), 1.0e5), &gas);
    (solver, field)
}

/// 两点拥有 + 一点镜像的最小分区网格
fn chain_partition() -> SolverMesh {
    SolverMesh::from_data(MeshData {
        n_points: 3,
        n_owned: 2,
        point_coords: vec![DVec2::ZERO, DVec2::new(1.0, 0.0), DVec2::new(2.0, 0.0)],
        point_volume: vec![1.0; 3],
        edge_points: vec![[0, 1], [1, 2]],
        edge_normal: vec![DVec2::new(1.0, 0.0); 2],
        markers: Vec::new(),
        halo: HaloTopology {
            rank: 0,
            links: vec![PartitionLink::new(1, vec![1], vec![2])],
        },
    })
    .unwrap()
}

/// 原样回送但截短数值的通道
struct ShortChannel;

impl HaloChannel for ShortChannel {
    fn exchange(&self, _rank: usize, outgoing: Vec<HaloPacket>) -> VtResult<Vec<HaloPacket>> {
        Ok(outgoing
            .into_iter()
            .map(|mut packet| {
                packet.values.truncate(1);
                packet
            })
            .collect())
    }
}

/// 什么也不回送的通道
struct SilentChannel;

impl HaloChannel for SilentChannel {
    fn exchange(&self, _rank: usize, _outgoing: Vec<HaloPacket>) -> VtResult<Vec<HaloPacket>> {
        Ok(Vec::new())
    }
}

fn partitioned_solver(channel: Arc<dyn HaloChannel>) -> (FlowSolver, vt_physics::FlowField) {
    let mesh = Arc::new(chain_partition());
    let solver = FlowSolver::builder()
        .with_time_scheme(TimeSchemeKind::ExplicitEuler)
        .with_cfl(0.5)
        .with_halo_channel(channel)
        .build(mesh)
        .unwrap();
    let gas = solver.options().gas;
    let mut field = solver.allocate_field();
    field.initialize_uniform(PrimitiveState::new(1.2, DVec2::new(60.0, 0.0), 1.0e5), &gas);
    (solver, field)
}

// ============================================================
// 状态发散检测
// ============================================================

#[test]
fn test_vacuum_density_aborts_iteration() {
    let (mut solver, mut field) = explicit_solver();
    field.conserved.density[4] = 1.0e-12;

    let err = solver.iterate(&mut field).unwrap_err();
    assert!(err.is_fatal(), "真空密度必须致命: {}", err);
    let message = err.to_string();
    assert!(message.contains("density"), "{}", message);
    assert!(message.contains("point 4"), "未指认出错点: {}", message);
}

#[test]
fn test_nan_state_aborts_iteration() {
    let (mut solver, mut field) = explicit_solver();
    field.conserved.energy[2] = f64::NAN;

    let err = solver.iterate(&mut field).unwrap_err();
    assert!(err.is_fatal());
    let message = err.to_string();
    assert!(message.contains("Invalid conserved"), "{}", message);
    assert!(message.contains("point 2"), "未指认出错点: {}", message);
}

#[test]
fn test_negative_pressure_aborts_iteration() {
    let (mut solver, mut field) = explicit_solver();
    // 动能超过总能，压力转负
    let kinetic = 0.5 * field.conserved.density[3]
        * field.velocity[3].length_squared();
    field.conserved.energy[3] = 0.9 * kinetic;

    let err = solver.iterate(&mut field).unwrap_err();
    assert!(err.is_fatal());
    let message = err.to_string();
    assert!(message.contains("pressure"), "{}", message);
    assert!(message.contains("point 3"), "未指认出错点: {}", message);
}

// ============================================================
// halo 协议违例
// ============================================================

#[test]
fn test_truncated_halo_packet_aborts_iteration() {
    let (mut solver, mut field) = partitioned_solver(Arc::new(ShortChannel));

    let err = solver.iterate(&mut field).unwrap_err();
    assert!(err.is_fatal());
    assert!(
        err.to_string().contains("halo 包长度"),
        "应报告包长度不符: {}",
        err
    );
}

#[test]
fn test_missing_halo_packet_aborts_iteration() {
    let (mut solver, mut field) = partitioned_solver(Arc::new(SilentChannel));

    let err = solver.iterate(&mut field).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("未收到"), "应报告缺失的邻分区: {}", err);
}
