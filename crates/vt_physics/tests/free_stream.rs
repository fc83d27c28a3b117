// tests/free_stream.rs

//! 自由来流保持验证
//!
//! 均匀来流是守恒格式的底线算例：周期域或相容弱边界下装配出的
//! 残差必须是机器零，解逐轮不动。
//!
//! # 测试覆盖
//!
//! - 对流格式 × 时间推进的全组合（周期域）
//! - 远场方腔
//! - 进出口 + 对称面槽道

use std::sync::Arc;

use glam::DVec2;
use vt_mesh::generation::{cartesian, cartesian_periodic, CartesianConfig};
use vt_mesh::MarkerKind;
use vt_physics::{
    BoundaryCondition, ConvectiveKind, FlowSolver, PrimitiveState, ReconstructionOrder,
    TimeSchemeKind, UpwindKind, N_VARS,
};

// ============================================================
// 测试辅助函数
// ============================================================

fn free_stream() -> PrimitiveState {
    PrimitiveState::new(1.2, DVec2::new(70.0, -10.0), 1.0e5)
}

/// 迭代若干轮，检查残差量级与状态漂移
fn assert_holds_uniform(mut solver: FlowSolver, state: PrimitiveState, n_iter: usize, label: &str) {
    let gas = solver.options().gas;
    let mut field = solver.allocate_field();
    field.initialize_uniform(state, &gas);
    let reference = state.to_conserved(&gas).to_array();

    for _ in 0..n_iter {
        let report = solver
            .iterate(&mut field)
            .unwrap_or_else(|e| panic!("{} 迭代失败: {}", label, e));
        assert!(
            report.worst_rms_log10() < -6.0,
            "{} 残差不是机器零: {}",
            label,
            report.summary()
        );
    }

    for p in 0..field.n_owned() {
        let u = field.conserved.get(p).to_array();
        for k in 0..N_VARS {
            let scale = reference[k].abs().max(1.0);
            assert!(
                (u[k] - reference[k]).abs() < 1e-8 * scale,
                "{} 点 {} 分量 {} 漂移: {:.15e} != {:.15e}",
                label,
                p,
                k,
                u[k],
                reference[k]
            );
        }
    }
}

// ============================================================
// 周期域：格式组合矩阵
// ============================================================

#[test]
fn test_periodic_scheme_matrix() {
    let convectives = [
        (
            ConvectiveKind::Upwind {
                scheme: UpwindKind::Roe,
                order: ReconstructionOrder::FirstOrder,
            },
            "Roe一阶",
        ),
        (
            ConvectiveKind::Upwind {
                scheme: UpwindKind::Roe,
                order: ReconstructionOrder::SecondOrder,
            },
            "Roe二阶",
        ),
        (
            ConvectiveKind::Upwind {
                scheme: UpwindKind::Rusanov,
                order: ReconstructionOrder::FirstOrder,
            },
            "Rusanov一阶",
        ),
        (ConvectiveKind::central_default(), "JST中心"),
    ];
    let time_schemes = [
        TimeSchemeKind::ExplicitEuler,
        TimeSchemeKind::RungeKutta3,
        TimeSchemeKind::ImplicitEuler,
    ];

    for (convective, name) in convectives {
        for scheme in time_schemes {
            let mesh = Arc::new(cartesian_periodic(4, 4, 2.0, 2.0).unwrap());
            let cfl = if scheme.is_implicit() { 5.0 } else { 0.8 };
            let solver = FlowSolver::builder()
                .with_convective(convective)
                .with_time_scheme(scheme)
                .with_cfl(cfl)
                .build(mesh)
                .unwrap();
            assert_holds_uniform(solver, free_stream(), 3, &format!("{}/{}", name, scheme));
        }
    }
}

// ============================================================
// 弱边界
// ============================================================

#[test]
fn test_far_field_box() {
    let state = free_stream();
    let config = CartesianConfig::new(4, 4, 2.0, 2.0)
        .with_x_boundaries(MarkerKind::FarField, MarkerKind::FarField)
        .with_y_boundaries(MarkerKind::FarField, MarkerKind::FarField);
    let mesh = Arc::new(cartesian(&config).unwrap());

    let solver = FlowSolver::builder()
        .with_time_scheme(TimeSchemeKind::ImplicitEuler)
        .with_cfl(5.0)
        .with_boundary("west", BoundaryCondition::FarField { state })
        .with_boundary("east", BoundaryCondition::FarField { state })
        .with_boundary("south", BoundaryCondition::FarField { state })
        .with_boundary("north", BoundaryCondition::FarField { state })
        .build(mesh)
        .unwrap();

    assert_holds_uniform(solver, state, 3, "远场方腔");
}

#[test]
fn test_channel_with_symmetry_planes() {
    // 水平来流与对称面相切，法向速度为零，均匀解精确满足全部边界
    let config = CartesianConfig::new(6, 3, 3.0, 1.5)
        .with_x_boundaries(MarkerKind::Inlet, MarkerKind::Outlet)
        .with_y_boundaries(MarkerKind::Symmetry, MarkerKind::Symmetry);
    let mesh = Arc::new(cartesian(&config).unwrap());

    let state = PrimitiveState::new(1.2, DVec2::new(80.0, 0.0), 1.0e5);
    let solver = FlowSolver::builder()
        .with_time_scheme(TimeSchemeKind::RungeKutta3)
        .with_cfl(0.8)
        .with_boundary(
            "west",
            BoundaryCondition::InletMassFlow {
                density: 1.2,
                velocity: DVec2::new(80.0, 0.0),
            },
        )
        .with_boundary("east", BoundaryCondition::Outlet { back_pressure: 1.0e5 })
        .with_boundary("south", BoundaryCondition::Symmetry)
        .with_boundary("north", BoundaryCondition::Symmetry)
        .build(mesh)
        .unwrap();

    assert_holds_uniform(solver, state, 3, "对称槽道");
}
