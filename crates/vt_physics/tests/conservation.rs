// tests/conservation.rs

//! 全局守恒验证
//!
//! 周期域上所有面通量成对抵消。配合全局时间步的显式推进，
//! 总质量、总动量与总能量的漂移只能来自舍入误差；迎风耗散
//! 同时应把光滑扰动拉回均匀态。

use std::sync::Arc;

use glam::DVec2;
use vt_mesh::generation::cartesian_periodic;
use vt_physics::{
    ConvectiveKind, FlowField, FlowSolver, PrimitiveState, ReconstructionOrder, TimeSchemeKind,
    TimeStepMode, UpwindKind, N_VARS,
};

// ============================================================
// 测试辅助函数
// ============================================================

/// 控制体加权的全场守恒量合计
fn totals(field: &FlowField, solver: &FlowSolver) -> [f64; N_VARS] {
    let mesh = solver.mesh();
    let mut sum = [0.0; N_VARS];
    for p in 0..mesh.n_owned() {
        let u = field.conserved.get(p).to_array();
        let vol = mesh.volume(p);
        for k in 0..N_VARS {
            sum[k] += vol * u[k];
        }
    }
    sum
}

/// 均匀来流叠加光滑的密度/压力扰动
fn perturbed_field(solver: &FlowSolver, amplitude: f64) -> FlowField {
    let gas = solver.options().gas;
    let mut field = solver.allocate_field();
    field.initialize_uniform(PrimitiveState::new(1.2, DVec2::new(60.0, 20.0), 1.0e5), &gas);

    let mesh = solver.mesh();
    let tau = 2.0 * std::f64::consts::PI;
    for p in 0..mesh.n_points() {
        let x = mesh.coords(p);
        let bump = amplitude * (tau * x.x).sin() * (tau * x.y).cos();
        let state = PrimitiveState::new(
            1.2 * (1.0 + bump),
            DVec2::new(60.0, 20.0),
            1.0e5 * (1.0 + bump),
        );
        field.conserved.set(p, state.to_conserved(&gas));
    }
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

// ============================================================
// 守恒性
// ============================================================

#[test]
fn test_explicit_global_dt_conserves_totals() {
    let mesh = Arc::new(cartesian_periodic(6, 6, 1.0, 1.0).unwrap());
    let mut solver = FlowSolver::builder()
        .with_convective(ConvectiveKind::Upwind {
            scheme: UpwindKind::Roe,
            order: ReconstructionOrder::SecondOrder,
        })
        .with_time_scheme(TimeSchemeKind::RungeKutta3)
        .with_time_step_mode(TimeStepMode::Global)
        .with_cfl(0.5)
        .build(mesh)
        .unwrap();

    let mut field = perturbed_field(&solver, 0.04);
    let before = totals(&field, &solver);

    for _ in 0..20 {
        let report = solver.iterate(&mut field).unwrap();
        assert_eq!(report.dt_min, report.dt_max, "全局模式的步长必须一致");
    }

    let after = totals(&field, &solver);
    println!(
        "守恒量漂移: 质量={:.2e} 能量={:.2e}",
        (after[0] - before[0]).abs() / before[0].abs(),
        (after[3] - before[3]).abs() / before[3].abs()
    );
    for k in 0..N_VARS {
        let scale = before[k].abs().max(1.0);
        assert!(
            (after[k] - before[k]).abs() < 1e-9 * scale,
            "分量 {} 不守恒: {:.15e} -> {:.15e}",
            k,
            before[k],
            after[k]
        );
    }
}

#[test]
fn test_jst_global_dt_conserves_totals() {
    // 中心格式的人工耗散同样按边成对累加，不破坏守恒
    let mesh = Arc::new(cartesian_periodic(5, 5, 1.0, 1.0).unwrap());
    let mut solver = FlowSolver::builder()
        .with_convective(ConvectiveKind::central_default())
        .with_time_scheme(TimeSchemeKind::RungeKutta3)
        .with_time_step_mode(TimeStepMode::Global)
        .with_cfl(0.5)
        .build(mesh)
        .unwrap();

    let mut field = perturbed_field(&solver, 0.03);
    let before = totals(&field, &solver);

    for _ in 0..15 {
        solver.iterate(&mut field).unwrap();
    }

    let after = totals(&field, &solver);
    for k in 0..N_VARS {
        let scale = before[k].abs().max(1.0);
        assert!(
            (after[k] - before[k]).abs() < 1e-9 * scale,
            "分量 {} 不守恒: {:.15e} -> {:.15e}",
            k,
            before[k],
            after[k]
        );
    }
}

// ============================================================
// 扰动衰减
// ============================================================

#[test]
fn test_perturbation_decays_toward_uniform() {
    let mesh = Arc::new(cartesian_periodic(6, 6, 1.0, 1.0).unwrap());
    let mut solver = FlowSolver::builder()
        .with_convective(ConvectiveKind::Upwind {
            scheme: UpwindKind::Roe,
            order: ReconstructionOrder::FirstOrder,
        })
        .with_time_scheme(TimeSchemeKind::RungeKutta3)
        .with_cfl(0.9)
        .build(mesh)
        .unwrap();

    let mut field = perturbed_field(&solver, 0.04);
    let initial_spread = density_spread(&field);
    assert!(initial_spread > 0.05, "初始扰动幅度异常: {}", initial_spread);

    for _ in 0..40 {
        solver.iterate(&mut field).unwrap();
    }

    let final_spread = density_spread(&field);
    println!("密度极差: {:.3e} -> {:.3e}", initial_spread, final_spread);
    assert!(
        final_spread < 0.8 * initial_spread,
        "迎风耗散未衰减扰动: {:.3e} -> {:.3e}",
        initial_spread,
        final_spread
    );
    for p in 0..field.n_owned() {
        let rho = field.conserved.get(p).density;
        assert!(
            rho > 1.0 && rho < 1.4,
            "点 {} 密度越出物理范围: {}",
            p,
            rho
        );
    }
}
