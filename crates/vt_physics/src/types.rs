// crates/vt_physics/src/types.rs

//! 物理与数值公共类型
//!
//! 本模块定义求解器的配置词汇表：
//! - [`GasModel`]: 完全气体热力学模型
//! - [`NumericalParams`]: 数值阈值与保护参数
//! - [`PhysicsModel`] / [`ViscosityLaw`]: 物理模型标签
//! - 格式选择枚举（梯度、限制器、对流格式、时间推进）
//!
//! 物理行为由带标签的配置变体加策略对象组合而成，装配期一次选定，
//! 装配循环本身保持物理无关。

use serde::{Deserialize, Serialize};

// ============================================================
// 气体模型
// ============================================================

/// 完全气体热力学模型
///
/// p = (γ-1)·(ρE - ½ρ|u|²)，T = p/(ρR)。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasModel {
    /// 比热比 γ
    pub gamma: f64,
    /// 气体常数 R [J/(kg·K)]
    pub gas_constant: f64,
}

impl Default for GasModel {
    fn default() -> Self {
        Self::AIR
    }
}

impl GasModel {
    /// 标准空气
    pub const AIR: Self = Self {
        gamma: 1.4,
        gas_constant: 287.058,
    };

    /// 创建气体模型
    pub fn new(gamma: f64, gas_constant: f64) -> Self {
        Self {
            gamma,
            gas_constant,
        }
    }

    /// γ - 1
    #[inline]
    pub fn gamma_minus_one(&self) -> f64 {
        self.gamma - 1.0
    }

    /// 定压比热 cp = γR/(γ-1)
    #[inline]
    pub fn cp(&self) -> f64 {
        self.gamma * self.gas_constant / self.gamma_minus_one()
    }

    /// 声速 c = sqrt(γ p / ρ)
    #[inline]
    pub fn sound_speed(&self, density: f64, pressure: f64) -> f64 {
        (self.gamma * pressure / density).sqrt()
    }

    /// 温度 T = p/(ρR)
    #[inline]
    pub fn temperature(&self, density: f64, pressure: f64) -> f64 {
        pressure / (density * self.gas_constant)
    }

    /// 由温度反出压力 p = ρRT
    #[inline]
    pub fn pressure_from_temperature(&self, density: f64, temperature: f64) -> f64 {
        density * self.gas_constant * temperature
    }
}

// ============================================================
// 数值参数
// ============================================================

/// 数值阈值与保护参数
///
/// 这里的下限是发散检测阈值而非钳位值：重构或更新产生低于阈值的
/// 密度/压力时按数值发散处理，绝不静默修正。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericalParams {
    /// 密度发散检测下限 [kg/m³]
    pub density_min: f64,
    /// 压力发散检测下限 [Pa]
    pub pressure_min: f64,
    /// Venkatakrishnan 限制器锐度系数 K
    pub venkat_k: f64,
    /// Roe 格式熵修正比例
    pub entropy_fix_ratio: f64,
    /// 最小二乘法方程奇异性判据
    pub det_min: f64,
    /// 点循环是否并行
    pub parallel: bool,
    /// 并行阈值（低于该点数走串行路径）
    pub parallel_threshold: usize,
}

impl Default for NumericalParams {
    fn default() -> Self {
        Self {
            density_min: 1e-10,
            pressure_min: 1e-10,
            venkat_k: 0.3,
            entropy_fix_ratio: 0.1,
            det_min: 1e-12,
            parallel: true,
            parallel_threshold: 1000,
        }
    }
}

// ============================================================
// 物理模型
// ============================================================

/// 动力黏性计算方式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ViscosityLaw {
    /// 常黏性 μ [Pa·s]
    Constant(f64),
    /// Sutherland 公式
    Sutherland {
        /// 参考黏性 μ_ref [Pa·s]
        mu_ref: f64,
        /// 参考温度 T_ref [K]
        t_ref: f64,
        /// Sutherland 常数 S [K]
        s: f64,
    },
}

impl Default for ViscosityLaw {
    fn default() -> Self {
        // 空气的 Sutherland 参数
        Self::Sutherland {
            mu_ref: 1.716e-5,
            t_ref: 273.15,
            s: 110.4,
        }
    }
}

impl ViscosityLaw {
    /// 计算动力黏性
    #[inline]
    pub fn dynamic_viscosity(&self, temperature: f64) -> f64 {
        match *self {
            Self::Constant(mu) => mu,
            Self::Sutherland { mu_ref, t_ref, s } => {
                mu_ref * (temperature / t_ref).powf(1.5) * (t_ref + s) / (temperature + s)
            }
        }
    }
}

/// 物理模型标签
///
/// 选定一次后，装配循环通过策略接口调用对应的通量/源项行为。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PhysicsModel {
    /// 无黏 Euler 方程
    #[default]
    Euler,
    /// 层流 Navier-Stokes 方程
    NavierStokes {
        /// 黏性律
        viscosity: ViscosityLaw,
        /// Prandtl 数
        prandtl: f64,
    },
}

impl PhysicsModel {
    /// 层流 NS，空气默认 Prandtl 数
    pub fn navier_stokes(viscosity: ViscosityLaw) -> Self {
        Self::NavierStokes {
            viscosity,
            prandtl: 0.72,
        }
    }

    /// 是否包含黏性通量
    #[inline]
    pub fn is_viscous(&self) -> bool {
        matches!(self, Self::NavierStokes { .. })
    }
}

// ============================================================
// 格式选择
// ============================================================

/// 梯度计算方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientKind {
    /// Green-Gauss 面积分
    #[default]
    GreenGauss,
    /// 加权最小二乘
    LeastSquares,
}

impl std::fmt::Display for GradientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GreenGauss => write!(f, "Green-Gauss"),
            Self::LeastSquares => write!(f, "Least-Squares"),
        }
    }
}

/// 斜率限制器选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LimiterKind {
    /// 不限制（配合一阶重构）
    None,
    /// Venkatakrishnan 光滑限制器
    #[default]
    Venkatakrishnan,
    /// Minmod 限制器
    Minmod,
}

/// 空间重构阶数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReconstructionOrder {
    /// 一阶（直接取点值）
    FirstOrder,
    /// 二阶（限制的线性外推）
    #[default]
    SecondOrder,
}

/// 迎风格式选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpwindKind {
    /// Roe 近似黎曼求解器（带熵修正）
    #[default]
    Roe,
    /// Rusanov / 局部 Lax-Friedrichs
    Rusanov,
}

/// 对流格式选择
///
/// 中心与迎风路径互斥，装配期一次选定。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConvectiveKind {
    /// 迎风路径：限制的 MUSCL 重构 + 近似黎曼求解
    Upwind {
        /// 黎曼求解器
        scheme: UpwindKind,
        /// 重构阶数
        order: ReconstructionOrder,
    },
    /// 中心路径：算术平均通量 + JST 人工耗散
    Central {
        /// 二阶耗散系数 κ₂
        kappa2: f64,
        /// 四阶耗散系数 κ₄
        kappa4: f64,
    },
}

impl Default for ConvectiveKind {
    fn default() -> Self {
        Self::Upwind {
            scheme: UpwindKind::Roe,
            order: ReconstructionOrder::SecondOrder,
        }
    }
}

impl ConvectiveKind {
    /// JST 中心格式的常用系数
    pub fn central_default() -> Self {
        Self::Central {
            kappa2: 0.5,
            kappa4: 0.02,
        }
    }

    /// 是否为中心路径
    #[inline]
    pub fn is_central(&self) -> bool {
        matches!(self, Self::Central { .. })
    }

    /// 是否使用二阶重构
    #[inline]
    pub fn uses_reconstruction(&self) -> bool {
        matches!(
            self,
            Self::Upwind {
                order: ReconstructionOrder::SecondOrder,
                ..
            }
        )
    }
}

// ============================================================
// 时间推进
// ============================================================

/// 时间推进格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeSchemeKind {
    /// 显式 Euler（单级）
    ExplicitEuler,
    /// 三级显式 Runge-Kutta
    RungeKutta3,
    /// 隐式 Euler（装配 Jacobian + 线性求解）
    #[default]
    ImplicitEuler,
}

impl TimeSchemeKind {
    /// 各级系数表
    ///
    /// 显式级更新: U = U_old - α_s·(Δt/V)·R。
    pub fn stage_coefficients(&self) -> &'static [f64] {
        match self {
            Self::ExplicitEuler => &[1.0],
            Self::RungeKutta3 => &[0.6667, 0.6667, 1.0],
            Self::ImplicitEuler => &[1.0],
        }
    }

    /// 是否为隐式路径
    #[inline]
    pub fn is_implicit(&self) -> bool {
        matches!(self, Self::ImplicitEuler)
    }
}

impl std::fmt::Display for TimeSchemeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExplicitEuler => write!(f, "ExplicitEuler"),
            Self::RungeKutta3 => write!(f, "RungeKutta3"),
            Self::ImplicitEuler => write!(f, "ImplicitEuler"),
        }
    }
}

/// 时间步选取方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeStepMode {
    /// 局部时间步（定常加速收敛）
    #[default]
    Local,
    /// 全局时间步（取全场最小，时间精确）
    Global,
}

/// 双重时间步的物理时间导数格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DualTimeScheme {
    /// 定常运行，无物理时间项
    #[default]
    None,
    /// 一阶向后差分
    Bdf1,
    /// 二阶向后差分
    Bdf2,
}

impl DualTimeScheme {
    /// BDF 系数 (c0, c1, c2): dU/dt ≈ (c0·U - c1·U^n + c2·U^{n-1}) / Δt
    pub fn coefficients(&self) -> (f64, f64, f64) {
        match self {
            Self::None => (0.0, 0.0, 0.0),
            Self::Bdf1 => (1.0, 1.0, 0.0),
            Self::Bdf2 => (1.5, 2.0, 0.5),
        }
    }
}

// ============================================================
// 测试
// ============================================================
