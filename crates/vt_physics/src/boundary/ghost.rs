// crates/vt_physics/src/boundary/ghost.rs

//! 虚元状态构造
//!
//! 弱边界按"虚元"方式施加：在边界面外侧虚构一个状态，使
//! (内点, 虚元) 对满足边界条件，再用普通界面格式求通量。
//! 这样边界与内部共用同一套数值格式。
//!
//! 所有函数约定 `unit_normal` 为指向域外的单位法向。滑移壁与
//! 对称面不经过虚元路径，直接给出解析压力通量及其雅可比。

use glam::DVec2;

use crate::numerics::Block4;
use crate::schemes::flux::pressure_derivative;
use crate::state::{Flux, PrimitiveState};
use crate::types::GasModel;

// ============================================================
// 反射与对称
// ============================================================

/// 法向反射速度：v - 2(v·n̂)n̂，切向分量保持
#[inline]
pub fn reflect_velocity(velocity: DVec2, unit_normal: DVec2) -> DVec2 {
    velocity - 2.0 * velocity.dot(unit_normal) * unit_normal
}

/// 对称面虚元：密度压力照抄，速度法向反射
pub fn symmetry_ghost(inside: &PrimitiveState, unit_normal: DVec2) -> PrimitiveState {
    PrimitiveState::new(
        inside.density,
        reflect_velocity(inside.velocity, unit_normal),
        inside.pressure,
    )
}

// ============================================================
// 远场
// ============================================================

/// 远场虚元：特征 Riemann 不变量混合内部与自由来流
///
/// 以来流法向马赫数区分超音速分支；亚音速时由
/// R⁺ = u_n + 2c/(γ-1)（内部）与 R⁻ = u_n - 2c/(γ-1)（来流）
/// 解出边界法向速度与声速，熵和切向速度取上游一侧。
pub fn far_field_ghost(
    inside: &PrimitiveState,
    free_stream: &PrimitiveState,
    unit_normal: DVec2,
    gas: &GasModel,
) -> PrimitiveState {
    let gm1 = gas.gamma_minus_one();
    let un_inf = free_stream.velocity.dot(unit_normal);
    let c_inf = free_stream.sound_speed(gas);

    // 超音速出流：全部信息来自域内
    if un_inf >= c_inf {
        return *inside;
    }
    // 超音速入流：全部信息来自来流
    if un_inf <= -c_inf {
        return *free_stream;
    }

    let un_in = inside.velocity.dot(unit_normal);
    let c_in = inside.sound_speed(gas);
    let r_plus = un_in + 2.0 * c_in / gm1;
    let r_minus = un_inf - 2.0 * c_inf / gm1;
    let un_b = 0.5 * (r_plus + r_minus);
    let c_b = 0.25 * gm1 * (r_plus - r_minus);

    // u_n > 0 为出流，熵与切向速度取域内，否则取来流
    let (entropy, velocity) = if un_b > 0.0 {
        (
            inside.pressure / inside.density.powf(gas.gamma),
            inside.velocity + (un_b - un_in) * unit_normal,
        )
    } else {
        (
            free_stream.pressure / free_stream.density.powf(gas.gamma),
            free_stream.velocity + (un_b - un_inf) * unit_normal,
        )
    };

    let density = (c_b * c_b / (gas.gamma * entropy)).powf(1.0 / gm1);
    let pressure = density * c_b * c_b / gas.gamma;
    PrimitiveState::new(density, velocity, pressure)
}

// ============================================================
// 入口
// ============================================================

/// 总条件入口虚元（亚音速）
///
/// 由域内出射不变量 R⁺ = u_n + 2c/(γ-1) 与总声速关系
/// c₀² = c² + (γ-1)q²/2 解边界声速的二次方程（取大根），
/// 再按等熵关系从 (p₀, T₀) 回推静参数。
///
/// `direction` 指向域内且非零（注册时已校验），内部归一化。
pub fn inlet_total_ghost(
    inside: &PrimitiveState,
    total_pressure: f64,
    total_temperature: f64,
    direction: DVec2,
    unit_normal: DVec2,
    gas: &GasModel,
) -> PrimitiveState {
    let gm1 = gas.gamma_minus_one();
    let dir = direction.normalize();
    let alpha = dir.dot(unit_normal);

    let c0_sq = gas.gamma * gas.gas_constant * total_temperature;
    let riemann = inside.velocity.dot(unit_normal) + 2.0 * inside.sound_speed(gas) / gm1;

    // (2 + (γ-1)α²)·c² - 2(γ-1)R·c + ((γ-1)²R²/2 - (γ-1)α²c₀²) = 0
    let aa = 2.0 + gm1 * alpha * alpha;
    let bb = -2.0 * gm1 * riemann;
    let cc = 0.5 * gm1 * gm1 * riemann * riemann - gm1 * alpha * alpha * c0_sq;
    let disc = (bb * bb - 4.0 * aa * cc).max(0.0);
    let c_b = (-bb + disc.sqrt()) / (2.0 * aa);

    let speed_sq = (2.0 * (c0_sq - c_b * c_b) / gm1).max(0.0);
    let speed = speed_sq.sqrt();

    let temperature = c_b * c_b / (gas.gamma * gas.gas_constant);
    let pressure =
        total_pressure * (temperature / total_temperature).powf(gas.gamma / gm1);
    let density = pressure / (gas.gas_constant * temperature);
    PrimitiveState::new(density, speed * dir, pressure)
}

/// 质量流入口虚元：密度与速度给定，压力由域内外推
pub fn inlet_mass_flow_ghost(
    inside: &PrimitiveState,
    density: f64,
    velocity: DVec2,
) -> PrimitiveState {
    PrimitiveState::new(density, velocity, inside.pressure)
}

// ============================================================
// 出口
// ============================================================

/// 出口虚元：亚音速定背压，超音速全外推
///
/// 亚音速分支保持出射特征：密度按等熵关系缩放，
/// 法向速度按 (p - p_b)/(ρc) 修正。
pub fn outlet_ghost(
    inside: &PrimitiveState,
    back_pressure: f64,
    unit_normal: DVec2,
    gas: &GasModel,
) -> PrimitiveState {
    let c = inside.sound_speed(gas);
    let un = inside.velocity.dot(unit_normal);
    if un >= c {
        return *inside;
    }

    let density = inside.density * (back_pressure / inside.pressure).powf(1.0 / gas.gamma);
    let velocity =
        inside.velocity + (inside.pressure - back_pressure) / (inside.density * c) * unit_normal;
    PrimitiveState::new(density, velocity, back_pressure)
}

// ============================================================
// 滑移壁压力通量
// ============================================================

/// 滑移壁面通量：法向不穿透，只剩压力做功于动量方程
///
/// 单位面积通量 [0, p·n̂ₓ, p·n̂ᵧ, 0]，由装配层乘以面面积。
pub fn wall_pressure_flux(inside: &PrimitiveState, unit_normal: DVec2) -> Flux {
    Flux::new(
        0.0,
        inside.pressure * unit_normal.x,
        inside.pressure * unit_normal.y,
        0.0,
    )
}

/// 滑移壁面通量对守恒变量的雅可比
///
/// 动量两行为 n̂ᵢ·∂p/∂U，质量与能量行为零。
pub fn wall_pressure_jacobian(
    inside: &PrimitiveState,
    gas: &GasModel,
    unit_normal: DVec2,
) -> Block4 {
    let dp = pressure_derivative(inside, gas);
    let mut m = [[0.0; 4]; 4];
    for k in 0..4 {
        m[1][k] = unit_normal.x * dp[k];
        m[2][k] = unit_normal.y * dp[k];
    }
    Block4::new(m)
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::N_VARS;

    fn assert_close(a: f64, b: f64, tol: f64, what: &str) {
        let scale = 1.0_f64.max(a.abs()).max(b.abs());
        assert!(
            (a - b).abs() <= tol * scale,
            "{}: {} vs {} (容差 {})",
            what,
            a,
            b,
            tol
        );
    }

    fn assert_states_close(a: &PrimitiveState, b: &PrimitiveState, tol: f64) {
        assert_close(a.density, b.density, tol, "密度");
        assert_close(a.velocity.x, b.velocity.x, tol, "速度x");
        assert_close(a.velocity.y, b.velocity.y, tol, "速度y");
        assert_close(a.pressure, b.pressure, tol, "压力");
    }

    #[test]
    fn test_reflect_velocity() {
        let n = DVec2::new(0.0, 1.0);
        let reflected = reflect_velocity(DVec2::new(3.0, 4.0), n);
        assert_close(reflected.x, 3.0, 1e-14, "切向分量");
        assert_close(reflected.y, -4.0, 1e-14, "法向分量");

        // 纯切向速度不受影响
        let tangent = reflect_velocity(DVec2::new(5.0, 0.0), n);
        assert_close(tangent.x, 5.0, 1e-14, "切向速度x");
        assert_close(tangent.y, 0.0, 1e-14, "切向速度y");
    }

    #[test]
    fn test_symmetry_ghost() {
        let inside = PrimitiveState::new(1.2, DVec2::new(3.0, 4.0), 1.0e5);
        let ghost = symmetry_ghost(&inside, DVec2::new(0.0, 1.0));
        assert_eq!(ghost.density, inside.density);
        assert_eq!(ghost.pressure, inside.pressure);
        assert_close(ghost.velocity.y, -4.0, 1e-14, "反射后法向速度");
    }

    #[test]
    fn test_far_field_free_stream_preserved() {
        let gas = GasModel::AIR;
        let infty = PrimitiveState::new(1.225, DVec2::new(100.0, 10.0), 101325.0);
        // 均匀流下任意朝向的边界都应精确还原来流
        for n in [
            DVec2::new(1.0, 0.0),
            DVec2::new(-1.0, 0.0),
            DVec2::new(0.6, 0.8),
        ] {
            let ghost = far_field_ghost(&infty, &infty, n, &gas);
            assert_states_close(&ghost, &infty, 1e-10);
        }
    }

    #[test]
    fn test_far_field_supersonic_outflow() {
        let gas = GasModel::AIR;
        let infty = PrimitiveState::new(1.0, DVec2::new(700.0, 0.0), 1.0e5);
        let inside = PrimitiveState::new(0.9, DVec2::new(650.0, 5.0), 0.9e5);
        // 来流法向马赫数 > 1 且出流，虚元完全取域内
        let ghost = far_field_ghost(&inside, &infty, DVec2::new(1.0, 0.0), &gas);
        assert_states_close(&ghost, &inside, 1e-14);
    }

    #[test]
    fn test_far_field_supersonic_inflow() {
        let gas = GasModel::AIR;
        let infty = PrimitiveState::new(1.0, DVec2::new(700.0, 0.0), 1.0e5);
        let inside = PrimitiveState::new(0.9, DVec2::new(650.0, 5.0), 0.9e5);
        // 同一来流，西侧边界（外法向 -x）为超音速入流
        let ghost = far_field_ghost(&inside, &infty, DVec2::new(-1.0, 0.0), &gas);
        assert_states_close(&ghost, &infty, 1e-14);
    }

    #[test]
    fn test_far_field_subsonic_inflow_entropy() {
        let gas = GasModel::AIR;
        let infty = PrimitiveState::new(1.225, DVec2::new(100.0, 0.0), 101325.0);
        let inside = PrimitiveState::new(1.1, DVec2::new(90.0, 3.0), 0.95e5);
        let n = DVec2::new(-1.0, 0.0);
        let ghost = far_field_ghost(&inside, &infty, n, &gas);

        // 入流一侧的熵来自来流
        let s_ghost = ghost.pressure / ghost.density.powf(gas.gamma);
        let s_infty = infty.pressure / infty.density.powf(gas.gamma);
        assert_close(s_ghost, s_infty, 1e-10, "虚元熵");

        // 法向速度等于不变量平均
        let r_plus = inside.velocity.dot(n) + 2.0 * inside.sound_speed(&gas) / 0.4;
        let r_minus = infty.velocity.dot(n) - 2.0 * infty.sound_speed(&gas) / 0.4;
        assert_close(
            ghost.velocity.dot(n),
            0.5 * (r_plus + r_minus),
            1e-10,
            "边界法向速度",
        );
    }

    #[test]
    fn test_inlet_total_consistency() {
        let gas = GasModel::AIR;
        // 由静参数构造总参数，虚元应还原同一状态
        let temperature = 288.15;
        let speed = 100.0;
        let pressure = 101325.0;
        let density = pressure / (gas.gas_constant * temperature);
        let inside = PrimitiveState::new(density, DVec2::new(speed, 0.0), pressure);

        let t_total = temperature + speed * speed / (2.0 * gas.cp());
        let p_total =
            pressure * (t_total / temperature).powf(gas.gamma / gas.gamma_minus_one());

        let ghost = inlet_total_ghost(
            &inside,
            p_total,
            t_total,
            DVec2::new(1.0, 0.0),
            DVec2::new(-1.0, 0.0),
            &gas,
        );
        assert_states_close(&ghost, &inside, 1e-8);
    }

    #[test]
    fn test_inlet_total_stagnation_bound() {
        let gas = GasModel::AIR;
        let inside = PrimitiveState::new(1.2, DVec2::new(50.0, 0.0), 1.0e5);
        let ghost = inlet_total_ghost(
            &inside,
            1.2e5,
            300.0,
            DVec2::new(1.0, 0.0),
            DVec2::new(-1.0, 0.0),
            &gas,
        );
        // 静压静温不超过总参数
        assert!(ghost.pressure <= 1.2e5 + 1e-9, "p={}", ghost.pressure);
        assert!(ghost.temperature(&gas) <= 300.0 + 1e-12);
        assert!(ghost.density > 0.0 && ghost.pressure > 0.0);
    }

    #[test]
    fn test_inlet_mass_flow() {
        let inside = PrimitiveState::new(1.0, DVec2::new(10.0, 0.0), 0.97e5);
        let ghost = inlet_mass_flow_ghost(&inside, 1.3, DVec2::new(80.0, 5.0));
        assert_eq!(ghost.density, 1.3);
        assert_eq!(ghost.velocity, DVec2::new(80.0, 5.0));
        assert_eq!(ghost.pressure, 0.97e5);
    }

    #[test]
    fn test_outlet_subsonic_back_pressure() {
        let gas = GasModel::AIR;
        let inside = PrimitiveState::new(1.2, DVec2::new(100.0, 0.0), 1.0e5);
        let n = DVec2::new(1.0, 0.0);
        let ghost = outlet_ghost(&inside, 0.9e5, n, &gas);

        assert_eq!(ghost.pressure, 0.9e5);
        // 背压低于内压，流动经出口加速
        assert!(ghost.velocity.dot(n) > inside.velocity.dot(n));
        // 密度按等熵关系缩放
        let expected = 1.2 * (0.9_f64).powf(1.0 / gas.gamma);
        assert_close(ghost.density, expected, 1e-12, "出口密度");
    }

    #[test]
    fn test_outlet_supersonic_extrapolation() {
        let gas = GasModel::AIR;
        let inside = PrimitiveState::new(1.0, DVec2::new(600.0, 0.0), 1.0e5);
        let ghost = outlet_ghost(&inside, 0.5e5, DVec2::new(1.0, 0.0), &gas);
        assert_states_close(&ghost, &inside, 1e-14);
    }

    #[test]
    fn test_wall_pressure_flux() {
        let inside = PrimitiveState::new(1.2, DVec2::new(30.0, 10.0), 1.0e5);
        let n = DVec2::new(0.6, 0.8);
        let flux = wall_pressure_flux(&inside, n);
        assert_eq!(flux.mass, 0.0);
        assert_eq!(flux.energy, 0.0);
        assert_close(flux.momentum_x, 0.6e5, 1e-12, "壁面压力通量x");
        assert_close(flux.momentum_y, 0.8e5, 1e-12, "壁面压力通量y");
    }

    #[test]
    fn test_wall_pressure_jacobian_matches_difference() {
        let gas = GasModel::AIR;
        let inside = PrimitiveState::new(1.2, DVec2::new(50.0, -20.0), 1.0e5);
        let n = DVec2::new(0.6, 0.8);
        let jac = wall_pressure_jacobian(&inside, &gas, n);

        let u0 = inside.to_conserved(&gas).to_array();
        let f0 = wall_pressure_flux(&inside, n).to_array();
        for col in 0..N_VARS {
            let h = 1e-6 * u0[col].abs().max(1e-3);
            let mut up = u0;
            up[col] += h;
            let qp = PrimitiveState::from_conserved(
                crate::state::ConservedState::from_array(up),
                &gas,
            );
            let fp = wall_pressure_flux(&qp, n).to_array();
            for row in 0..N_VARS {
                let fd = (fp[row] - f0[row]) / h;
                assert!(
                    (jac.m[row][col] - fd).abs() <= 1e-4 * fd.abs().max(1.0),
                    "雅可比 ({},{}) 解析 {} 差分 {}",
                    row,
                    col,
                    jac.m[row][col],
                    fd
                );
            }
        }
    }
}
