// crates/vt_physics/src/schemes/flux/physical.rs

//! 精确欧拉通量及其解析雅可比
//!
//! 给定界面单位法向量 n，欧拉方程的投影通量为
//!
//! ```text
//! F·n = [ρ u_n, ρ u u_n + p n_x, ρ v u_n + p n_y, ρ H u_n]
//! ```
//!
//! 其中 u_n = v·n 为法向速度，H 为总焓。通量对守恒变量
//! U = [ρ, ρu, ρv, ρE] 是一次齐次的，即 F·n = A(U)·U，
//! A 为投影通量雅可比。本模块同时提供压力对守恒变量的
//! 导数行向量，供壁面边界的隐式处理复用。

use glam::DVec2;

use crate::numerics::Block4;
use crate::state::{Flux, PrimitiveState, N_VARS};
use crate::types::GasModel;

/// 计算单位面积投影通量 F·n
#[inline]
pub fn normal_flux(q: &PrimitiveState, gas: &GasModel, unit_normal: DVec2) -> Flux {
    let un = q.velocity.dot(unit_normal);
    let mass = q.density * un;
    let enthalpy = q.total_enthalpy(gas);

    Flux::new(
        mass,
        mass * q.velocity.x + q.pressure * unit_normal.x,
        mass * q.velocity.y + q.pressure * unit_normal.y,
        q.density * enthalpy * un,
    )
}

/// 计算投影通量雅可比 A = ∂(F·n)/∂U
///
/// 解析形式，按守恒变量 [ρ, ρu, ρv, ρE] 排列。
pub fn flux_jacobian(q: &PrimitiveState, gas: &GasModel, unit_normal: DVec2) -> Block4 {
    let gm1 = gas.gamma_minus_one();
    let (nx, ny) = (unit_normal.x, unit_normal.y);
    let (u, v) = (q.velocity.x, q.velocity.y);
    let un = q.velocity.dot(unit_normal);
    let q2 = q.velocity.length_squared();
    let phi = 0.5 * gm1 * q2;
    let enthalpy = q.total_enthalpy(gas);

    Block4::new([
        [0.0, nx, ny, 0.0],
        [
            phi * nx - u * un,
            un + u * nx - gm1 * u * nx,
            u * ny - gm1 * v * nx,
            gm1 * nx,
        ],
        [
            phi * ny - v * un,
            v * nx - gm1 * u * ny,
            un + v * ny - gm1 * v * ny,
            gm1 * ny,
        ],
        [
            (phi - enthalpy) * un,
            enthalpy * nx - gm1 * u * un,
            enthalpy * ny - gm1 * v * un,
            gas.gamma * un,
        ],
    ])
}

/// 压力对守恒变量的导数行向量
///
/// ∂p/∂U = (γ-1) [q²/2, -u, -v, 1]
#[inline]
pub fn pressure_derivative(q: &PrimitiveState, gas: &GasModel) -> [f64; N_VARS] {
    let gm1 = gas.gamma_minus_one();
    [
        0.5 * gm1 * q.velocity.length_squared(),
        -gm1 * q.velocity.x,
        -gm1 * q.velocity.y,
        gm1,
    ]
}

/// 界面谱半径 |u_n| + c
#[inline]
pub fn spectral_radius(q: &PrimitiveState, gas: &GasModel, unit_normal: DVec2) -> f64 {
    q.velocity.dot(unit_normal).abs() + q.sound_speed(gas)
}
