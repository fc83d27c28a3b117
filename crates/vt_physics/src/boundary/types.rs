// crates/vt_physics/src/boundary/types.rs

//! 边界条件类型与注册表
//!
//! 本模块定义可压缩流求解的边界条件配置：
//! - [`BoundaryCondition`]: 条件枚举（弱虚元通量 / 强直接施加）
//! - [`BoundarySet`]: 按标记名称注册的条件集合
//! - [`ResolvedBoundaries`]: 对网格校验后的标记-条件绑定表
//!
//! 网格标记只携带几何与类型标签；物理参数（远场状态、背压、
//! 总温总压）在这里按标记名称注册，装配前统一校验。

use std::collections::HashMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use vt_foundation::{VtError, VtResult};
use vt_mesh::{MarkerKind, SolverMesh};

use crate::state::PrimitiveState;

// ============================================================
// 边界条件枚举
// ============================================================

/// 边界条件配置
///
/// 除无滑移壁采用强施加外，其余条件均走弱虚元通量路径：
/// 按条件构造虚元状态，跨 (内点, 虚元) 求解边界通量。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    /// 滑移固壁（Euler 壁）：法向不穿透，只贡献压力通量
    EulerWall,
    /// 无滑移固壁（绝热）：动量强制为零，动量方程行换为单位阵
    NoSlipWall,
    /// 对称面：法向速度反射，切向保持
    Symmetry,
    /// 远场：特征 Riemann 不变量混合内部与自由来流
    FarField {
        /// 自由来流状态
        state: PrimitiveState,
    },
    /// 总条件入口（亚音速）
    InletTotal {
        /// 总压 p₀ [Pa]
        total_pressure: f64,
        /// 总温 T₀ [K]
        total_temperature: f64,
        /// 来流方向（指向域内，注册时归一化）
        direction: DVec2,
    },
    /// 给定密度与速度的入口，压力由内部外推
    InletMassFlow {
        /// 入口密度 [kg/m³]
        density: f64,
        /// 入口速度 [m/s]
        velocity: DVec2,
    },
    /// 出口：亚音速定背压，超音速全外推
    Outlet {
        /// 背压 [Pa]
        back_pressure: f64,
    },
}

impl BoundaryCondition {
    /// 条件名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::EulerWall => "EulerWall",
            Self::NoSlipWall => "NoSlipWall",
            Self::Symmetry => "Symmetry",
            Self::FarField { .. } => "FarField",
            Self::InletTotal { .. } => "InletTotal",
            Self::InletMassFlow { .. } => "InletMassFlow",
            Self::Outlet { .. } => "Outlet",
        }
    }

    /// 是否走强施加路径
    #[inline]
    pub fn is_strong(&self) -> bool {
        matches!(self, Self::NoSlipWall)
    }

    /// 条件是否与标记类型相容
    pub fn accepts(&self, kind: MarkerKind) -> bool {
        match self {
            Self::EulerWall | Self::NoSlipWall => kind == MarkerKind::Wall,
            Self::Symmetry => kind == MarkerKind::Symmetry,
            Self::FarField { .. } => kind == MarkerKind::FarField,
            Self::InletTotal { .. } | Self::InletMassFlow { .. } => kind == MarkerKind::Inlet,
            Self::Outlet { .. } => kind == MarkerKind::Outlet,
        }
    }

    /// 校验条件参数
    pub fn validate(&self) -> VtResult<()> {
        match *self {
            Self::EulerWall | Self::NoSlipWall | Self::Symmetry => Ok(()),
            Self::FarField { state } => {
                if !(state.density > 0.0) || !(state.pressure > 0.0) {
                    return Err(VtError::config(format!(
                        "远场状态非物理: ρ={:e}, p={:e}",
                        state.density, state.pressure
                    )));
                }
                if !state.velocity.is_finite() {
                    return Err(VtError::config("远场速度非有限".to_string()));
                }
                Ok(())
            }
            Self::InletTotal {
                total_pressure,
                total_temperature,
                direction,
            } => {
                if !(total_pressure > 0.0) || !(total_temperature > 0.0) {
                    return Err(VtError::config(format!(
                        "入口总条件非物理: p₀={:e}, T₀={:e}",
                        total_pressure, total_temperature
                    )));
                }
                if !direction.is_finite() || direction.length_squared() < 1e-24 {
                    return Err(VtError::config("入口方向向量为零或非有限".to_string()));
                }
                Ok(())
            }
            Self::InletMassFlow { density, velocity } => {
                if !(density > 0.0) || !velocity.is_finite() {
                    return Err(VtError::config(format!(
                        "入口质量流参数非物理: ρ={:e}",
                        density
                    )));
                }
                Ok(())
            }
            Self::Outlet { back_pressure } => {
                if !(back_pressure > 0.0) {
                    return Err(VtError::config(format!("出口背压非物理: {:e}", back_pressure)));
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================
// 条件注册表
// ============================================================

/// 按标记名称注册的边界条件集合
///
/// 注册顺序无关紧要；[`BoundarySet::resolve`] 按网格标记顺序
/// 生成绑定表并完成全部校验。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoundarySet {
    conditions: HashMap<String, BoundaryCondition>,
}

impl BoundarySet {
    /// 创建空集合
    pub fn new() -> Self {
        Self {
            conditions: HashMap::new(),
        }
    }

    /// 注册条件，同名覆盖
    pub fn register(&mut self, marker: impl Into<String>, condition: BoundaryCondition) {
        self.conditions.insert(marker.into(), condition);
    }

    /// 链式注册
    pub fn with(mut self, marker: impl Into<String>, condition: BoundaryCondition) -> Self {
        self.register(marker, condition);
        self
    }

    /// 查询标记的条件
    pub fn get(&self, marker: &str) -> Option<&BoundaryCondition> {
        self.conditions.get(marker)
    }

    /// 已注册条件数量
    #[inline]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// 对网格校验并生成绑定表
    ///
    /// 校验规则：
    /// 1. 每个注册的名称必须对应网格中的标记
    /// 2. 条件参数合法且与标记类型相容
    /// 3. 每个需要条件的标记（分区除外）必须有注册条件
    /// 4. 周期标记应已由网格提供方解析为内部边，残留者视为配置错误
    pub fn resolve(&self, mesh: &SolverMesh) -> VtResult<ResolvedBoundaries> {
        for name in self.conditions.keys() {
            if mesh.marker_by_name(name).is_none() {
                return Err(VtError::config(format!(
                    "边界条件指向不存在的标记 \"{}\"",
                    name
                )));
            }
        }

        let mut bindings = Vec::new();
        for (index, marker) in mesh.markers().iter().enumerate() {
            if marker.kind == MarkerKind::Periodic {
                return Err(VtError::config(format!(
                    "周期标记 \"{}\" 未解析为内部边",
                    marker.name
                )));
            }
            if !marker.kind.requires_condition() {
                continue;
            }
            let condition = self.conditions.get(&marker.name).ok_or_else(|| {
                VtError::config(format!(
                    "标记 \"{}\" ({}) 缺少边界条件",
                    marker.name, marker.kind
                ))
            })?;
            condition.validate()?;
            if !condition.accepts(marker.kind) {
                return Err(VtError::config(format!(
                    "条件 {} 不适用于标记 \"{}\" ({})",
                    condition, marker.name, marker.kind
                )));
            }
            bindings.push(BoundaryBinding {
                marker: index,
                condition: *condition,
            });
        }

        Ok(ResolvedBoundaries { bindings })
    }
}

// ============================================================
// 绑定表
// ============================================================

/// 单个标记-条件绑定
#[derive(Debug, Clone, Copy)]
pub struct BoundaryBinding {
    /// 网格标记索引
    pub marker: usize,
    /// 施加的条件
    pub condition: BoundaryCondition,
}

/// 校验后的标记-条件绑定表
///
/// 按网格标记顺序排列，装配层直接遍历。
#[derive(Debug, Clone, Default)]
pub struct ResolvedBoundaries {
    bindings: Vec<BoundaryBinding>,
}

impl ResolvedBoundaries {
    /// 绑定迭代器
    pub fn iter(&self) -> impl Iterator<Item = &BoundaryBinding> {
        self.bindings.iter()
    }

    /// 绑定数量
    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 是否存在强施加条件
    pub fn has_strong(&self) -> bool {
        self.bindings.iter().any(|b| b.condition.is_strong())
    }
}

// ============================================================
// 测试
// ============================================================
