// crates/vt_physics/src/state.rs

//! 可压缩流状态管理
//!
//! 本模块提供求解器的全场状态仓库，包括：
//! - ConservedState: 单点守恒状态 (ρ, ρu, ρv, ρE)
//! - PrimitiveState: 单点原始状态 (ρ, u, v, p)
//! - Flux: 数值通量
//! - FlowField: 全场状态仓库（SoA 布局）
//! - Residual: 残差累加器
//!
//! # 布局设计
//!
//! 采用 SoA (Structure of Arrays) 布局以优化缓存性能：
//! ```text
//! density:    [ρ_0,  ρ_1,  ρ_2,  ...]
//! momentum_x: [ρu_0, ρu_1, ρu_2, ...]
//! momentum_y: [ρv_0, ρv_1, ρv_2, ...]
//! energy:     [ρE_0, ρE_1, ρE_2, ...]
//! ```
//!
//! 点区间 `[0, n_owned)` 为本分区拥有的内部点，`[n_owned, n_points)`
//! 为 halo 镜像点，其值仅由同步例程写入。所有数组在构造期一次分配，
//! 迭代期只覆写不增长。

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::types::{GasModel, NumericalParams};

/// 守恒方程数量
pub const N_VARS: usize = 4;

/// 原始变量分量次序：密度
pub const PRIM_DENSITY: usize = 0;
/// 原始变量分量次序：x 速度
pub const PRIM_VELOCITY_X: usize = 1;
/// 原始变量分量次序：y 速度
pub const PRIM_VELOCITY_Y: usize = 2;
/// 原始变量分量次序：压力
pub const PRIM_PRESSURE: usize = 3;

/// 方程名（用于收敛报告与诊断信息）
pub const EQUATION_NAMES: [&str; N_VARS] = ["mass", "momentum_x", "momentum_y", "energy"];

// ============================================================
// 守恒状态
// ============================================================

/// 单点守恒状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConservedState {
    /// 密度 ρ [kg/m³]
    pub density: f64,
    /// x 方向动量密度 ρu [kg/(m²·s)]
    pub momentum_x: f64,
    /// y 方向动量密度 ρv [kg/(m²·s)]
    pub momentum_y: f64,
    /// 总能密度 ρE [J/m³]
    pub energy: f64,
}

impl ConservedState {
    /// 创建新的守恒状态
    #[inline]
    pub const fn new(density: f64, momentum_x: f64, momentum_y: f64, energy: f64) -> Self {
        Self {
            density,
            momentum_x,
            momentum_y,
            energy,
        }
    }

    /// 零状态
    pub const ZERO: Self = Self {
        density: 0.0,
        momentum_x: 0.0,
        momentum_y: 0.0,
        energy: 0.0,
    };

    /// 动量密度矢量
    #[inline]
    pub fn momentum(&self) -> DVec2 {
        DVec2::new(self.momentum_x, self.momentum_y)
    }

    /// 转换为数组（线性代数层的打包次序）
    #[inline]
    pub fn to_array(self) -> [f64; N_VARS] {
        [self.density, self.momentum_x, self.momentum_y, self.energy]
    }

    /// 从数组转换
    #[inline]
    pub fn from_array(a: [f64; N_VARS]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    /// 所有分量是否有限
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.density.is_finite()
            && self.momentum_x.is_finite()
            && self.momentum_y.is_finite()
            && self.energy.is_finite()
    }
}

impl Add for ConservedState {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            density: self.density + rhs.density,
            momentum_x: self.momentum_x + rhs.momentum_x,
            momentum_y: self.momentum_y + rhs.momentum_y,
            energy: self.energy + rhs.energy,
        }
    }
}

impl Sub for ConservedState {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            density: self.density - rhs.density,
            momentum_x: self.momentum_x - rhs.momentum_x,
            momentum_y: self.momentum_y - rhs.momentum_y,
            energy: self.energy - rhs.energy,
        }
    }
}

impl Mul<f64> for ConservedState {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self {
            density: self.density * rhs,
            momentum_x: self.momentum_x * rhs,
            momentum_y: self.momentum_y * rhs,
            energy: self.energy * rhs,
        }
    }
}

impl AddAssign for ConservedState {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.density += rhs.density;
        self.momentum_x += rhs.momentum_x;
        self.momentum_y += rhs.momentum_y;
        self.energy += rhs.energy;
    }
}

impl SubAssign for ConservedState {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.density -= rhs.density;
        self.momentum_x -= rhs.momentum_x;
        self.momentum_y -= rhs.momentum_y;
        self.energy -= rhs.energy;
    }
}

// ============================================================
// 原始状态
// ============================================================

/// 单点原始状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveState {
    /// 密度 ρ [kg/m³]
    pub density: f64,
    /// 速度 [m/s]
    pub velocity: DVec2,
    /// 压力 p [Pa]
    pub pressure: f64,
}

impl PrimitiveState {
    /// 创建新的原始状态
    #[inline]
    pub const fn new(density: f64, velocity: DVec2, pressure: f64) -> Self {
        Self {
            density,
            velocity,
            pressure,
        }
    }

    /// 由守恒状态换算
    ///
    /// 不做物理性检查，调用方负责在换算后验证密度与压力。
    #[inline]
    pub fn from_conserved(u: ConservedState, gas: &GasModel) -> Self {
        let velocity = u.momentum() / u.density;
        let kinetic = 0.5 * u.density * velocity.length_squared();
        let pressure = gas.gamma_minus_one() * (u.energy - kinetic);
        Self {
            density: u.density,
            velocity,
            pressure,
        }
    }

    /// 换算为守恒状态
    #[inline]
    pub fn to_conserved(&self, gas: &GasModel) -> ConservedState {
        let kinetic = 0.5 * self.density * self.velocity.length_squared();
        ConservedState {
            density: self.density,
            momentum_x: self.density * self.velocity.x,
            momentum_y: self.density * self.velocity.y,
            energy: self.pressure / gas.gamma_minus_one() + kinetic,
        }
    }

    /// 声速
    #[inline]
    pub fn sound_speed(&self, gas: &GasModel) -> f64 {
        gas.sound_speed(self.density, self.pressure)
    }

    /// 温度
    #[inline]
    pub fn temperature(&self, gas: &GasModel) -> f64 {
        gas.temperature(self.density, self.pressure)
    }

    /// 总焓 H = (ρE + p)/ρ
    #[inline]
    pub fn total_enthalpy(&self, gas: &GasModel) -> f64 {
        let rho_e = self.pressure / gas.gamma_minus_one()
            + 0.5 * self.density * self.velocity.length_squared();
        (rho_e + self.pressure) / self.density
    }

    /// 马赫数
    #[inline]
    pub fn mach(&self, gas: &GasModel) -> f64 {
        self.velocity.length() / self.sound_speed(gas)
    }

    /// 按 PRIM_* 次序取分量
    #[inline]
    pub fn component(&self, k: usize) -> f64 {
        match k {
            PRIM_DENSITY => self.density,
            PRIM_VELOCITY_X => self.velocity.x,
            PRIM_VELOCITY_Y => self.velocity.y,
            _ => self.pressure,
        }
    }
}

// ============================================================
// 数值通量
// ============================================================

/// 数值通量（四个守恒方程的面通量分量）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Flux {
    /// 质量通量
    pub mass: f64,
    /// x 动量通量
    pub momentum_x: f64,
    /// y 动量通量
    pub momentum_y: f64,
    /// 能量通量
    pub energy: f64,
}

impl Flux {
    /// 创建新通量
    #[inline]
    pub const fn new(mass: f64, momentum_x: f64, momentum_y: f64, energy: f64) -> Self {
        Self {
            mass,
            momentum_x,
            momentum_y,
            energy,
        }
    }

    /// 零通量
    pub const ZERO: Self = Self {
        mass: 0.0,
        momentum_x: 0.0,
        momentum_y: 0.0,
        energy: 0.0,
    };

    /// 从数组转换
    #[inline]
    pub fn from_array(a: [f64; N_VARS]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    /// 转换为数组
    #[inline]
    pub fn to_array(self) -> [f64; N_VARS] {
        [self.mass, self.momentum_x, self.momentum_y, self.energy]
    }

    /// 缩放通量
    #[inline]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            mass: self.mass * factor,
            momentum_x: self.momentum_x * factor,
            momentum_y: self.momentum_y * factor,
            energy: self.energy * factor,
        }
    }

    /// 检查通量是否有效
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.mass.is_finite()
            && self.momentum_x.is_finite()
            && self.momentum_y.is_finite()
            && self.energy.is_finite()
    }
}

impl Add for Flux {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            mass: self.mass + rhs.mass,
            momentum_x: self.momentum_x + rhs.momentum_x,
            momentum_y: self.momentum_y + rhs.momentum_y,
            energy: self.energy + rhs.energy,
        }
    }
}

impl AddAssign for Flux {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.mass += rhs.mass;
        self.momentum_x += rhs.momentum_x;
        self.momentum_y += rhs.momentum_y;
        self.energy += rhs.energy;
    }
}

impl Sub for Flux {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            mass: self.mass - rhs.mass,
            momentum_x: self.momentum_x - rhs.momentum_x,
            momentum_y: self.momentum_y - rhs.momentum_y,
            energy: self.energy - rhs.energy,
        }
    }
}

impl SubAssign for Flux {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.mass -= rhs.mass;
        self.momentum_x -= rhs.momentum_x;
        self.momentum_y -= rhs.momentum_y;
        self.energy -= rhs.energy;
    }
}

impl Neg for Flux {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            mass: -self.mass,
            momentum_x: -self.momentum_x,
            momentum_y: -self.momentum_y,
            energy: -self.energy,
        }
    }
}

impl Mul<f64> for Flux {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        self.scale(rhs)
    }
}

impl Mul<Flux> for f64 {
    type Output = Flux;
    #[inline]
    fn mul(self, rhs: Flux) -> Flux {
        rhs.scale(self)
    }
}

// ============================================================
// 守恒变量场 (SoA)
// ============================================================

/// 全场守恒变量（SoA 布局）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConservedField {
    /// 密度 [kg/m³]
    pub density: Vec<f64>,
    /// x 动量密度 [kg/(m²·s)]
    pub momentum_x: Vec<f64>,
    /// y 动量密度 [kg/(m²·s)]
    pub momentum_y: Vec<f64>,
    /// 总能密度 [J/m³]
    pub energy: Vec<f64>,
}

impl ConservedField {
    /// 创建零初始化场
    pub fn new(n_points: usize) -> Self {
        Self {
            density: vec![0.0; n_points],
            momentum_x: vec![0.0; n_points],
            momentum_y: vec![0.0; n_points],
            energy: vec![0.0; n_points],
        }
    }

    /// 点数量
    #[inline]
    pub fn len(&self) -> usize {
        self.density.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// 获取单点状态
    #[inline]
    pub fn get(&self, idx: usize) -> ConservedState {
        ConservedState::new(
            self.density[idx],
            self.momentum_x[idx],
            self.momentum_y[idx],
            self.energy[idx],
        )
    }

    /// 设置单点状态
    #[inline]
    pub fn set(&mut self, idx: usize, state: ConservedState) {
        self.density[idx] = state.density;
        self.momentum_x[idx] = state.momentum_x;
        self.momentum_y[idx] = state.momentum_y;
        self.energy[idx] = state.energy;
    }

    /// 从另一场复制数据
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.len(), other.len());
        self.density.copy_from_slice(&other.density);
        self.momentum_x.copy_from_slice(&other.momentum_x);
        self.momentum_y.copy_from_slice(&other.momentum_y);
        self.energy.copy_from_slice(&other.energy);
    }

    /// 重置为零
    pub fn reset(&mut self) {
        self.density.fill(0.0);
        self.momentum_x.fill(0.0);
        self.momentum_y.fill(0.0);
        self.energy.fill(0.0);
    }
}

// ============================================================
// 梯度场与限制器场
// ============================================================

/// 原始变量梯度场
///
/// 分量按 `PRIM_*` 次序索引：`[ρ, u, v, p]`。MUSCL 重构与黏性通量
/// 共用此场。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientField {
    /// 各分量梯度
    pub comp: [Vec<DVec2>; N_VARS],
}

impl GradientField {
    /// 创建零初始化梯度场
    pub fn new(n_points: usize) -> Self {
        Self {
            comp: std::array::from_fn(|_| vec![DVec2::ZERO; n_points]),
        }
    }

    /// 点数量
    #[inline]
    pub fn len(&self) -> usize {
        self.comp[0].len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.comp[0].is_empty()
    }

    /// 获取单点全部分量梯度
    #[inline]
    pub fn get(&self, idx: usize) -> [DVec2; N_VARS] {
        [
            self.comp[0][idx],
            self.comp[1][idx],
            self.comp[2][idx],
            self.comp[3][idx],
        ]
    }

    /// 重置为零
    pub fn reset(&mut self) {
        for g in self.comp.iter_mut() {
            g.fill(DVec2::ZERO);
        }
    }
}

/// 限制器场
///
/// 每原始分量一个 φ ∈ [0,1]，以及限制器计算所用的邻域最小/最大包络。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterField {
    /// 限制器系数
    pub phi: [Vec<f64>; N_VARS],
    /// 邻域最小值包络
    pub env_min: [Vec<f64>; N_VARS],
    /// 邻域最大值包络
    pub env_max: [Vec<f64>; N_VARS],
}

impl LimiterField {
    /// 创建限制器场（φ 初始化为 1，即不限制）
    pub fn new(n_points: usize) -> Self {
        Self {
            phi: std::array::from_fn(|_| vec![1.0; n_points]),
            env_min: std::array::from_fn(|_| vec![0.0; n_points]),
            env_max: std::array::from_fn(|_| vec![0.0; n_points]),
        }
    }

    /// 点数量
    #[inline]
    pub fn len(&self) -> usize {
        self.phi[0].len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.phi[0].is_empty()
    }

    /// 获取单点全部分量限制器
    #[inline]
    pub fn get(&self, idx: usize) -> [f64; N_VARS] {
        [
            self.phi[0][idx],
            self.phi[1][idx],
            self.phi[2][idx],
            self.phi[3][idx],
        ]
    }

    /// 重置为不限制
    pub fn reset(&mut self) {
        for phi in self.phi.iter_mut() {
            phi.fill(1.0);
        }
    }
}

// ============================================================
// 残差累加器
// ============================================================

/// 残差累加器
///
/// 约定 R_i = Σ 流出通量 − 源项·体积，即 dU/dt = −R/V。
/// 每轮装配前必须 [`Residual::reset`]。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Residual {
    /// 质量方程残差
    pub mass: Vec<f64>,
    /// x 动量方程残差
    pub momentum_x: Vec<f64>,
    /// y 动量方程残差
    pub momentum_y: Vec<f64>,
    /// 能量方程残差
    pub energy: Vec<f64>,
}

impl Residual {
    /// 创建零初始化残差
    pub fn new(n_points: usize) -> Self {
        Self {
            mass: vec![0.0; n_points],
            momentum_x: vec![0.0; n_points],
            momentum_y: vec![0.0; n_points],
            energy: vec![0.0; n_points],
        }
    }

    /// 点数量
    #[inline]
    pub fn len(&self) -> usize {
        self.mass.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    /// 重置为零
    pub fn reset(&mut self) {
        self.mass.fill(0.0);
        self.momentum_x.fill(0.0);
        self.momentum_y.fill(0.0);
        self.energy.fill(0.0);
    }

    /// 获取单点残差
    #[inline]
    pub fn get(&self, idx: usize) -> [f64; N_VARS] {
        [
            self.mass[idx],
            self.momentum_x[idx],
            self.momentum_y[idx],
            self.energy[idx],
        ]
    }

    /// 累加通量贡献（流出为正）
    #[inline]
    pub fn add_flux(&mut self, idx: usize, flux: Flux) {
        self.mass[idx] += flux.mass;
        self.momentum_x[idx] += flux.momentum_x;
        self.momentum_y[idx] += flux.momentum_y;
        self.energy[idx] += flux.energy;
    }

    /// 扣除通量贡献（对端流入）
    #[inline]
    pub fn sub_flux(&mut self, idx: usize, flux: Flux) {
        self.mass[idx] -= flux.mass;
        self.momentum_x[idx] -= flux.momentum_x;
        self.momentum_y[idx] -= flux.momentum_y;
        self.energy[idx] -= flux.energy;
    }

    /// 清零单点动量行（强边界条件约束用）
    #[inline]
    pub fn clear_momentum(&mut self, idx: usize) {
        self.momentum_x[idx] = 0.0;
        self.momentum_y[idx] = 0.0;
    }
}

// ============================================================
// 全场状态仓库
// ============================================================

/// 全场状态仓库
///
/// 守恒变量为真值，原始变量、梯度、限制器、辅助场均为派生缓存，
/// 由各计算阶段按固定次序刷新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowField {
    /// 总点数（含 halo）
    n_points: usize,
    /// 本分区拥有的点数
    n_owned: usize,

    /// 当前守恒变量
    pub conserved: ConservedField,
    /// 外迭代起点快照
    pub old: ConservedField,
    /// 物理时间层 U^n（双重时间步）
    pub time_n: ConservedField,
    /// 物理时间层 U^{n-1}（双重时间步）
    pub time_n1: ConservedField,

    /// 原始速度 [m/s]
    pub velocity: Vec<DVec2>,
    /// 原始压力 [Pa]
    pub pressure: Vec<f64>,

    /// 原始变量梯度
    pub gradient: GradientField,
    /// 限制器
    pub limiter: LimiterField,

    /// 无除拉普拉斯辅助场（中心格式四阶耗散用）
    pub laplacian: ConservedField,
    /// 压力开关传感器（中心格式二阶耗散用）
    pub sensor: Vec<f64>,

    /// 残差累加器
    pub residual: Residual,
    /// 局部时间步 [s]
    pub local_dt: Vec<f64>,
}

impl FlowField {
    /// 创建全场状态
    ///
    /// 所有数组按 `n_points` 分配并零初始化（限制器初始化为 1）。
    pub fn new(n_points: usize, n_owned: usize) -> Self {
        debug_assert!(n_owned <= n_points);
        Self {
            n_points,
            n_owned,
            conserved: ConservedField::new(n_points),
            old: ConservedField::new(n_points),
            time_n: ConservedField::new(n_points),
            time_n1: ConservedField::new(n_points),
            velocity: vec![DVec2::ZERO; n_points],
            pressure: vec![0.0; n_points],
            gradient: GradientField::new(n_points),
            limiter: LimiterField::new(n_points),
            laplacian: ConservedField::new(n_points),
            sensor: vec![0.0; n_points],
            residual: Residual::new(n_points),
            local_dt: vec![0.0; n_points],
        }
    }

    /// 总点数（含 halo）
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

    /// 获取单点守恒状态
    #[inline]
    pub fn conserved_state(&self, idx: usize) -> ConservedState {
        self.conserved.get(idx)
    }

    /// 获取单点原始状态（读派生缓存）
    #[inline]
    pub fn primitive_state(&self, idx: usize) -> PrimitiveState {
        PrimitiveState {
            density: self.conserved.density[idx],
            velocity: self.velocity[idx],
            pressure: self.pressure[idx],
        }
    }

    /// 全场置为均匀状态并刷新所有历史层
    pub fn initialize_uniform(&mut self, state: PrimitiveState, gas: &GasModel) {
        let u = state.to_conserved(gas);
        for idx in 0..self.n_points {
            self.conserved.set(idx, u);
            self.velocity[idx] = state.velocity;
            self.pressure[idx] = state.pressure;
        }
        self.old.copy_from(&self.conserved);
        self.time_n.copy_from(&self.conserved);
        self.time_n1.copy_from(&self.conserved);
    }

    /// 由守恒变量刷新原始变量缓存
    ///
    /// 覆盖全部点（含 halo，同步后其守恒值已是新值）。检测到非物理
    /// 状态立即返回错误，绝不钳位修正。
    pub fn update_primitives(
        &mut self,
        gas: &GasModel,
        params: &NumericalParams,
    ) -> Result<(), StateError> {
        for idx in 0..self.n_points {
            let u = self.conserved.get(idx);
            if !u.is_finite() {
                return Err(StateError::InvalidValue {
                    field: "conserved",
                    point: idx,
                    value: u.density,
                });
            }
            if u.density < params.density_min {
                return Err(StateError::NegativeDensity {
                    point: idx,
                    value: u.density,
                });
            }
            let velocity = u.momentum() / u.density;
            let pressure =
                gas.gamma_minus_one() * (u.energy - 0.5 * u.density * velocity.length_squared());
            if !pressure.is_finite() {
                return Err(StateError::InvalidValue {
                    field: "pressure",
                    point: idx,
                    value: pressure,
                });
            }
            if pressure < params.pressure_min {
                return Err(StateError::NegativePressure {
                    point: idx,
                    value: pressure,
                });
            }
            self.velocity[idx] = velocity;
            self.pressure[idx] = pressure;
        }
        Ok(())
    }

    /// 快照当前解为外迭代起点
    pub fn snapshot_old(&mut self) {
        self.old.copy_from(&self.conserved);
    }

    /// 推进物理时间层：U^{n-1} ← U^n，U^n ← U
    pub fn advance_physical_time(&mut self) {
        self.time_n1.copy_from(&self.time_n);
        self.time_n.copy_from(&self.conserved);
    }

    /// 原始变量只读视图
    #[inline]
    pub fn primitive_view(&self) -> PrimitiveView<'_> {
        PrimitiveView {
            density: &self.conserved.density,
            velocity: &self.velocity,
            pressure: &self.pressure,
        }
    }

    /// 分离借用：原始变量视图 + 可变梯度场
    pub fn split_gradient_mut(&mut self) -> (PrimitiveView<'_>, &mut GradientField) {
        (
            PrimitiveView {
                density: &self.conserved.density,
                velocity: &self.velocity,
                pressure: &self.pressure,
            },
            &mut self.gradient,
        )
    }

    /// 分离借用：原始变量视图 + 梯度场 + 可变限制器场
    pub fn split_limiter_mut(&mut self) -> (PrimitiveView<'_>, &GradientField, &mut LimiterField) {
        (
            PrimitiveView {
                density: &self.conserved.density,
                velocity: &self.velocity,
                pressure: &self.pressure,
            },
            &self.gradient,
            &mut self.limiter,
        )
    }
}

// ============================================================
// 原始变量视图
// ============================================================

/// 原始变量只读视图
///
/// 把 SoA 存储的原始变量拼成按 `PRIM_*` 次序的统一分量访问接口，
/// 供梯度、限制器与重构引擎逐分量遍历。
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveView<'a> {
    /// 密度
    pub density: &'a [f64],
    /// 速度
    pub velocity: &'a [DVec2],
    /// 压力
    pub pressure: &'a [f64],
}

impl PrimitiveView<'_> {
    /// 点数量
    #[inline]
    pub fn len(&self) -> usize {
        self.density.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// 按 `PRIM_*` 次序读取分量
    #[inline]
    pub fn component(&self, point: usize, k: usize) -> f64 {
        match k {
            PRIM_DENSITY => self.density[point],
            PRIM_VELOCITY_X => self.velocity[point].x,
            PRIM_VELOCITY_Y => self.velocity[point].y,
            _ => self.pressure[point],
        }
    }

    /// 单点原始状态
    #[inline]
    pub fn state(&self, point: usize) -> PrimitiveState {
        PrimitiveState {
            density: self.density[point],
            velocity: self.velocity[point],
            pressure: self.pressure[point],
        }
    }
}

// ============================================================
// 错误类型
// ============================================================

/// 状态错误（数值发散检测）
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    /// 无效值 (NaN/Inf)
    #[error("Invalid {field} at point {point} (value={value})")]
    InvalidValue {
        /// 出错的字段
        field: &'static str,
        /// 点索引
        point: usize,
        /// 出错的值
        value: f64,
    },
    /// 密度低于发散阈值
    #[error("Non-physical density at point {point} (rho={value})")]
    NegativeDensity {
        /// 点索引
        point: usize,
        /// 出错的值
        value: f64,
    },
    /// 压力低于发散阈值
    #[error("Non-physical pressure at point {point} (p={value})")]
    NegativePressure {
        /// 点索引
        point: usize,
        /// 出错的值
        value: f64,
    },
}

impl From<StateError> for vt_foundation::VtError {
    fn from(err: StateError) -> Self {
        let point = match &err {
            StateError::InvalidValue { point, .. }
            | StateError::NegativeDensity { point, .. }
            | StateError::NegativePressure { point, .. } => *point,
        };
        vt_foundation::VtError::numerical(err.to_string(), format!("point {}", point))
    }
}

// ============================================================
// 单元测试
// ============================================================
