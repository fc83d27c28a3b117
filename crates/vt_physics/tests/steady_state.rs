// tests/steady_state.rs

//! 隐式收敛验证
//!
//! 定常路径：扰动场在隐式 Euler 下应以数量级速度收敛回均匀态。
//! 非定常路径：双重时间步的内迭代收敛后推进物理时间层，
//! 均匀流在任意物理步长下保持不动。

use std::sync::Arc;

use glam::DVec2;
use vt_mesh::generation::cartesian_periodic;
use vt_physics::{
    ConvectiveKind, DualTimeScheme, FlowField, FlowSolver, PrimitiveState, ReconstructionOrder,
    SolverConfig, TimeSchemeKind, UpwindKind,
};

// ============================================================
// 测试辅助函数
// ============================================================

fn first_order_roe() -> ConvectiveKind {
    ConvectiveKind::Upwind {
        scheme: UpwindKind::Roe,
        order: ReconstructionOrder::FirstOrder,
    }
}

/// 均匀来流叠加光滑扰动，物理时间层一并刷新
fn perturbed_field(solver: &FlowSolver, amplitude: f64) -> FlowField {
    let gas = solver.options().gas;
    let mut field = solver.allocate_field();
    field.initialize_uniform(PrimitiveState::new(1.2, DVec2::new(60.0, 20.0), 1.0e5), &gas);

    let mesh = solver.mesh();
    let tau = 2.0 * std::f64::consts::PI;
    for p in 0..mesh.n_points() {
        let x = mesh.coords(p);
        let bump = amplitude * (tau * x.x).sin() * (tau * x.y).sin();
        let state = PrimitiveState::new(
            1.2 * (1.0 + bump),
            DVec2::new(60.0, 20.0),
            1.0e5 * (1.0 + bump),
        );
        field.conserved.set(p, state.to_conserved(&gas));
    }
    field.time_n.copy_from(&field.conserved);
    field.time_n1.copy_from(&field.conserved);
    field
}

fn density_spread(field: &FlowField) -> f64 {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for p in 0..field.n_owned() {
        let rho = field.conserved.get(p).density;
        min = min.min(rho);
        max = max.max(rho);
    }
    max - min
}

fn total_mass(field: &FlowField, solver: &FlowSolver) -> f64 {
    let mesh = solver.mesh();
    (0..mesh.n_owned())
        .map(|p| mesh.volume(p) * field.conserved.get(p).density)
        .sum()
}

// ============================================================
// 定常收敛
// ============================================================

#[test]
fn test_implicit_converges_to_steady_state() {
    let mesh = Arc::new(cartesian_periodic(5, 5, 1.0, 1.0).unwrap());
    let mut solver = FlowSolver::builder()
        .with_convective(first_order_roe())
        .with_time_scheme(TimeSchemeKind::ImplicitEuler)
        .with_cfl(10.0)
        .build(mesh)
        .unwrap();

    let mut field = perturbed_field(&solver, 0.02);
    let initial_spread = density_spread(&field);

    let first = solver.iterate(&mut field).unwrap();
    let first_rms = first.worst_rms_log10();
    assert!(first_rms > -2.0, "初始残差量级异常: {}", first.summary());

    let mut last_rms = first_rms;
    for _ in 0..29 {
        let report = solver.iterate(&mut field).unwrap();
        last_rms = report.worst_rms_log10();
        assert!(
            report.linear.as_ref().is_some_and(|s| s.converged),
            "线性求解未收敛: {}",
            report.summary()
        );
    }

    println!("残差下降: log10 {:.2} -> {:.2}", first_rms, last_rms);
    assert!(
        last_rms < first_rms - 3.0,
        "隐式迭代未收敛: log10 {:.2} -> {:.2}",
        first_rms,
        last_rms
    );
    assert!(
        density_spread(&field) < 0.01 * initial_spread,
        "密度未回到均匀态: 极差 {:.3e}",
        density_spread(&field)
    );
}

// ============================================================
// 双重时间步
// ============================================================

#[test]
fn test_dual_time_holds_uniform_flow() {
    let mesh = Arc::new(cartesian_periodic(4, 4, 1.0, 1.0).unwrap());
    let mut solver = FlowSolver::builder()
        .with_convective(first_order_roe())
        .with_time_scheme(TimeSchemeKind::ImplicitEuler)
        .with_dual_time(DualTimeScheme::Bdf2, 1.0e-3)
        .with_cfl(5.0)
        .build(mesh)
        .unwrap();

    let state = PrimitiveState::new(1.2, DVec2::new(60.0, 20.0), 1.0e5);
    let gas = solver.options().gas;
    let mut field = solver.allocate_field();
    field.initialize_uniform(state, &gas);

    for _step in 0..2 {
        for _inner in 0..3 {
            let report = solver.iterate(&mut field).unwrap();
            assert!(report.linear.is_some(), "双重时间步必须走隐式路径");
        }
        field.advance_physical_time();
    }

    for p in 0..field.n_owned() {
        let rho = field.conserved.get(p).density;
        assert!(
            (rho - 1.2).abs() < 1e-9 * 1.2,
            "点 {} 均匀流被物理时间项破坏: rho={:.15}",
            p,
            rho
        );
    }
}

#[test]
fn test_dual_time_marches_perturbation() {
    let mesh = Arc::new(cartesian_periodic(4, 4, 1.0, 1.0).unwrap());
    let mut solver = FlowSolver::builder()
        .with_convective(first_order_roe())
        .with_time_scheme(TimeSchemeKind::ImplicitEuler)
        .with_dual_time(DualTimeScheme::Bdf2, 1.0e-3)
        .with_linear(SolverConfig::new(1e-10, 500))
        .with_cfl(5.0)
        .build(mesh)
        .unwrap();

    let mut field = perturbed_field(&solver, 0.03);
    let initial_mass = total_mass(&field, &solver);

    for _step in 0..3 {
        for _inner in 0..4 {
            let report = solver.iterate(&mut field).unwrap();
            assert!(report.worst_rms_log10().is_finite());
        }
        field.advance_physical_time();
    }

    // 隐式更新的守恒性受线性容差限制，紧容差下漂移应远小于扰动本身
    let drift = (total_mass(&field, &solver) - initial_mass).abs() / initial_mass;
    println!("质量漂移: {:.2e}", drift);
    assert!(drift < 1e-5, "双重时间步质量漂移过大: {:.2e}", drift);

    for p in 0..field.n_owned() {
        let u = field.conserved.get(p);
        assert!(u.is_finite(), "点 {} 状态非有限", p);
        assert!(u.density > 1.0 && u.density < 1.4, "点 {} 密度异常: {}", p, u.density);
    }
}
