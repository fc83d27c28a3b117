// crates/vt_physics/src/assembly/aux_fields.rs

//! JST 中心格式的辅助场
//!
//! 中心路径在通量扫描前需要两个整场量：
//!
//! - **无除拉普拉斯** L_i = Σ_j (U_j - U_i)，能量分量按 ρH 差分，
//!   供四阶耗散使用
//! - **压力开关传感器** s_i = |Σ_j (p_j - p_i)| / Σ_j (p_j + p_i)，
//!   激波附近趋近 1，光滑区趋近 0，驱动二阶/四阶耗散切换
//!
//! 两个量只对拥有点计算；halo 点由分区同步填充，随后才能进入
//! 边扫描。

use rayon::prelude::*;
use vt_mesh::SolverMesh;

use crate::state::{ConservedState, FlowField};
use crate::types::NumericalParams;

/// 刷新拥有点的拉普拉斯与压力传感器
pub fn compute_jst_fields(mesh: &SolverMesh, field: &mut FlowField, params: &NumericalParams) {
    debug_assert_eq!(field.n_points(), mesh.n_points());
    let n_owned = mesh.n_owned();

    let FlowField {
        ref conserved,
        ref pressure,
        ref mut laplacian,
        ref mut sensor,
        ..
    } = *field;

    let point_values = |p: usize| -> (ConservedState, f64) {
        let u_i = conserved.get(p);
        let p_i = pressure[p];
        let rho_h_i = u_i.energy + p_i;

        let mut lap = ConservedState::ZERO;
        let mut dp_sum = 0.0;
        let mut p_sum = 0.0;
        for other in mesh.neighbors(p) {
            let u_j = conserved.get(other);
            lap.density += u_j.density - u_i.density;
            lap.momentum_x += u_j.momentum_x - u_i.momentum_x;
            lap.momentum_y += u_j.momentum_y - u_i.momentum_y;
            lap.energy += (u_j.energy + pressure[other]) - rho_h_i;
            dp_sum += pressure[other] - p_i;
            p_sum += pressure[other] + p_i;
        }
        let s = if p_sum > 0.0 {
            (dp_sum / p_sum).abs()
        } else {
            0.0
        };
        (lap, s)
    };

    if params.parallel && n_owned >= params.parallel_threshold {
        let values: Vec<(ConservedState, f64)> =
            (0..n_owned).into_par_iter().map(point_values).collect();
        for (p, (lap, s)) in values.into_iter().enumerate() {
            laplacian.set(p, lap);
            sensor[p] = s;
        }
    } else {
        for p in 0..n_owned {
            let (lap, s) = point_values(p);
            laplacian.set(p, lap);
            sensor[p] = s;
        }
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PrimitiveState;
    use crate::types::GasModel;
    use glam::DVec2;
    use vt_mesh::generation::cartesian_periodic;

    fn serial_params() -> NumericalParams {
        NumericalParams {
            parallel: false,
            ..NumericalParams::default()
        }
    }

    #[test]
    fn test_constant_pressure_zero_sensor() {
        let gas = GasModel::AIR;
        let mesh = cartesian_periodic(4, 4, 4.0, 4.0).unwrap();
        let mut field = FlowField::new(mesh.n_points(), mesh.n_owned());
        field.initialize_uniform(
            PrimitiveState::new(1.2, DVec2::new(50.0, 0.0), 1.0e5),
            &gas,
        );

        compute_jst_fields(&mesh, &mut field, &serial_params());

        for p in 0..mesh.n_owned() {
            assert_eq!(field.sensor[p], 0.0, "均匀压力下传感器应为零");
            let lap = field.laplacian.get(p);
            assert!(lap.density.abs() < 1e-12 && lap.energy.abs() < 1e-9);
        }
    }

    #[test]
    fn test_pressure_jump_activates_sensor() {
        let gas = GasModel::AIR;
        let mesh = cartesian_periodic(4, 4, 4.0, 4.0).unwrap();
        let mut field = FlowField::new(mesh.n_points(), mesh.n_owned());
        field.initialize_uniform(
            PrimitiveState::new(1.2, DVec2::ZERO, 1.0e5),
            &gas,
        );
        // 在一个点放置压力间断
        let spike = 5;
        let high = PrimitiveState::new(1.2, DVec2::ZERO, 4.0e5).to_conserved(&gas);
        field.conserved.set(spike, high);
        field
            .update_primitives(&gas, &serial_params())
            .expect("状态应物理");

        compute_jst_fields(&mesh, &mut field, &serial_params());

        // 间断点本身 |Σdp|/Σ(p+p) = 4·3e5 / (4·5e5) = 0.6
        assert!(
            (field.sensor[spike] - 0.6).abs() < 1e-12,
            "传感器 {} 应为 0.6",
            field.sensor[spike]
        );
        // 远离间断的点不受影响
        assert_eq!(field.sensor[15], 0.0);
    }

    #[test]
    fn test_laplacian_energy_uses_total_enthalpy() {
        let gas = GasModel::AIR;
        let mesh = cartesian_periodic(4, 4, 4.0, 4.0).unwrap();
        let mut field = FlowField::new(mesh.n_points(), mesh.n_owned());
        field.initialize_uniform(PrimitiveState::new(1.0, DVec2::ZERO, 1.0e5), &gas);

        let spike = 5;
        let bumped = PrimitiveState::new(1.0, DVec2::ZERO, 1.2e5).to_conserved(&gas);
        field.conserved.set(spike, bumped);
        field
            .update_primitives(&gas, &serial_params())
            .expect("状态应物理");

        compute_jst_fields(&mesh, &mut field, &serial_params());

        // 邻点看到的能量差分为 Δ(ρE+p)，而非 Δ(ρE)
        let neighbor = 6;
        let lap = field.laplacian.get(neighbor);
        let rho_h_spike = bumped.energy + 1.2e5;
        let rho_h_base = PrimitiveState::new(1.0, DVec2::ZERO, 1.0e5)
            .to_conserved(&gas)
            .energy
            + 1.0e5;
        assert!(
            (lap.energy - (rho_h_spike - rho_h_base)).abs() < 1e-6,
            "拉普拉斯能量分量 {} 应为 ρH 差分 {}",
            lap.energy,
            rho_h_spike - rho_h_base
        );
        assert_eq!(lap.density, 0.0);
    }

    #[test]
    fn test_linear_field_zero_laplacian() {
        let gas = GasModel::AIR;
        // 周期网格上用插值节点验证内点：改用带标记网格避免环绕边破坏线性
        let mesh = vt_mesh::generation::cartesian(&vt_mesh::generation::CartesianConfig::new(
            5, 5, 5.0, 5.0,
        ))
        .unwrap();
        let mut field = FlowField::new(mesh.n_points(), mesh.n_owned());
        for p in 0..mesh.n_points() {
            let c = mesh.coords(p);
            let q = PrimitiveState::new(1.0 + 0.01 * c.x, DVec2::ZERO, 1.0e5);
            field.conserved.set(p, q.to_conserved(&gas));
        }
        field
            .update_primitives(&gas, &serial_params())
            .expect("状态应物理");

        compute_jst_fields(&mesh, &mut field, &serial_params());

        // 内点（四邻域完整）的线性场二阶差分为零
        let center = 12;
        let lap = field.laplacian.get(center);
        assert!(lap.density.abs() < 1e-12, "线性场拉普拉斯 {}", lap.density);
    }
}
