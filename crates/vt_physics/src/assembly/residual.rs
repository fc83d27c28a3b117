// crates/vt_physics/src/assembly/residual.rs

//! 残差与雅可比装配器
//!
//! 求解的半离散形式为 `V_i·dU_i/dt + R_i = 0`，其中
//! `R_i = Σ_边 ±F·A + Σ_边界顶点 F_b·A - S_i·V_i`。装配器按固定
//! 次序执行五个阶段：
//!
//! 1. 强边界施加：无滑移壁的动量与速度缓存清零
//! 2. 残差清零、矩阵块清零
//! 3. 内部边扫描：重构、对流通量、黏性通量，按 i→j 方向
//!    `residual[i] += F·A`、`residual[j] -= F·A`，隐式路径散射
//!    四个雅可比块
//! 4. 弱边界通量与体积源项
//! 5. 强约束行收尾：动量残差行清零、矩阵行换单位行
//!
//! # 前置条件
//!
//! - 原始变量缓存与守恒量一致（[`FlowField::update_primitives`]）
//! - halo 点的守恒量、梯度、限制器已同步
//! - 中心路径还要求拉普拉斯与传感器已刷新并同步
//!
//! 隐式矩阵只装配空间项；`V/Δt` 对角增广与双重时间步的物理时间
//! 导数由时间推进层追加。halo 行的单位化同样由隐式求解端处理。

use glam::DVec2;
use rayon::prelude::*;
use vt_foundation::{VtError, VtResult};
use vt_mesh::SolverMesh;

use crate::boundary::{
    far_field_ghost, inlet_mass_flow_ghost, inlet_total_ghost, outlet_ghost, symmetry_ghost,
    wall_pressure_flux, wall_pressure_jacobian, BoundaryCondition, ResolvedBoundaries,
};
use crate::numerics::BsrMatrix;
use crate::schemes::flux::{
    create_upwind_scheme, spectral_radius, FluxJacobians, JstEdgeData, JstScheme, UpwindScheme,
};
use crate::schemes::ViscousScheme;
use crate::state::{
    ConservedField, FlowField, Flux, GradientField, LimiterField, PrimitiveState, PrimitiveView,
    Residual,
};
use crate::types::{
    ConvectiveKind, GasModel, NumericalParams, PhysicsModel, ReconstructionOrder, UpwindKind,
};

use super::reconstruction::muscl_pair;
use super::sources::{SourceContribution, SourceTerm};

// ============================================================
// 装配报告
// ============================================================

/// 一轮装配的诊断信息
#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblyReport {
    /// 全场最大界面波速 [m/s]（含边界面）
    pub max_wave_speed: f64,
}

// ============================================================
// 对流算子
// ============================================================

/// 装配期选定的对流离散路径
enum ConvectiveOperator {
    /// 迎风：MUSCL 重构 + 近似黎曼求解
    Upwind {
        scheme: Box<dyn UpwindScheme>,
        order: ReconstructionOrder,
    },
    /// 中心：JST 人工耗散，直接使用点值
    Central { scheme: JstScheme },
}

/// 单条边的装配贡献（已乘面积）
#[derive(Debug, Clone, Copy)]
struct EdgeContribution {
    i: usize,
    j: usize,
    flux: Flux,
    jacobians: Option<FluxJacobians>,
    wave_speed: f64,
}

/// 边扫描的只读上下文
#[derive(Clone, Copy)]
struct EdgeContext<'a> {
    mesh: &'a SolverMesh,
    primitives: PrimitiveView<'a>,
    gradient: &'a GradientField,
    limiter: &'a LimiterField,
    laplacian: &'a ConservedField,
    sensor: &'a [f64],
    with_jacobian: bool,
}

// ============================================================
// 装配器
// ============================================================

/// 残差与雅可比装配器
///
/// 装配期一次选定对流路径、黏性模型与源项列表，装配循环本身
/// 保持配置无关。
pub struct ResidualAssembler {
    gas: GasModel,
    params: NumericalParams,
    operator: ConvectiveOperator,
    /// 弱边界通量格式：迎风路径复用同款，中心路径配 Rusanov
    boundary_scheme: Box<dyn UpwindScheme>,
    viscous: Option<ViscousScheme>,
    sources: Vec<Box<dyn SourceTerm>>,
}

impl ResidualAssembler {
    /// 按配置创建装配器
    pub fn new(
        gas: GasModel,
        convective: ConvectiveKind,
        physics: &PhysicsModel,
        params: NumericalParams,
    ) -> Self {
        let operator = match convective {
            ConvectiveKind::Upwind { scheme, order } => ConvectiveOperator::Upwind {
                scheme: create_upwind_scheme(scheme, gas, &params),
                order,
            },
            ConvectiveKind::Central { kappa2, kappa4 } => ConvectiveOperator::Central {
                scheme: JstScheme::new(gas, kappa2, kappa4),
            },
        };
        let boundary_kind = match convective {
            ConvectiveKind::Upwind { scheme, .. } => scheme,
            ConvectiveKind::Central { .. } => UpwindKind::Rusanov,
        };

        let boundary_scheme = create_upwind_scheme(boundary_kind, gas, &params);

        Self {
            gas,
            params,
            operator,
            boundary_scheme,
            viscous: ViscousScheme::from_model(gas, physics),
            sources: Vec::new(),
        }
    }

    /// 追加一个体积源项
    pub fn push_source(&mut self, source: Box<dyn SourceTerm>) {
        self.sources.push(source);
    }

    /// 中心路径需要拉普拉斯与传感器辅助场
    #[inline]
    pub fn needs_aux_fields(&self) -> bool {
        matches!(self.operator, ConvectiveOperator::Central { .. })
    }

    /// 是否使用二阶 MUSCL 重构
    #[inline]
    pub fn uses_reconstruction(&self) -> bool {
        matches!(
            self.operator,
            ConvectiveOperator::Upwind {
                order: ReconstructionOrder::SecondOrder,
                ..
            }
        )
    }

    /// 是否需要原始变量梯度（重构或黏性通量）
    #[inline]
    pub fn needs_gradients(&self) -> bool {
        self.uses_reconstruction() || self.viscous.is_some()
    }

    /// 是否包含黏性通量
    #[inline]
    pub fn is_viscous(&self) -> bool {
        self.viscous.is_some()
    }

    /// 装配空间残差，隐式路径同时装配雅可比矩阵
    ///
    /// 残差写入 `field.residual`；`matrix` 给定时按同一扫描填充
    /// 块值。返回装配诊断。
    pub fn assemble(
        &self,
        mesh: &SolverMesh,
        field: &mut FlowField,
        boundaries: &ResolvedBoundaries,
        mut matrix: Option<&mut BsrMatrix>,
    ) -> VtResult<AssemblyReport> {
        debug_assert_eq!(field.n_points(), mesh.n_points());
        let with_jacobian = matrix.is_some();

        // 强施加先行，边扫描读到的是约束后的状态
        self.enforce_strong_states(mesh, field, boundaries);

        field.residual.reset();
        if let Some(mat) = matrix.as_deref_mut() {
            mat.clear_values();
        }

        let FlowField {
            ref conserved,
            ref velocity,
            ref pressure,
            ref gradient,
            ref limiter,
            ref laplacian,
            ref sensor,
            ref mut residual,
            ..
        } = *field;
        let ctx = EdgeContext {
            mesh,
            primitives: PrimitiveView {
                density: &conserved.density,
                velocity,
                pressure,
            },
            gradient,
            limiter,
            laplacian,
            sensor,
            with_jacobian,
        };

        let mut report = AssemblyReport::default();

        // 内部边扫描：先算后累加，并行路径收集每边贡献再串行散射
        let n_edges = mesh.n_edges();
        if self.params.parallel && n_edges >= self.params.parallel_threshold {
            let contributions: VtResult<Vec<EdgeContribution>> = (0..n_edges)
                .into_par_iter()
                .map(|e| self.edge_contribution(&ctx, e))
                .collect();
            for contribution in contributions? {
                Self::scatter_edge(residual, matrix.as_deref_mut(), &contribution, &mut report);
            }
        } else {
            for e in 0..n_edges {
                let contribution = self.edge_contribution(&ctx, e)?;
                Self::scatter_edge(residual, matrix.as_deref_mut(), &contribution, &mut report);
            }
        }

        self.apply_weak_boundaries(mesh, &ctx.primitives, boundaries, residual, &mut matrix, &mut report)?;
        self.apply_sources(mesh, &ctx.primitives, residual, &mut matrix, with_jacobian)?;
        Self::clear_strong_rows(mesh, residual, &mut matrix, boundaries);

        Ok(report)
    }

    // --------------------------------------------------------
    // 边贡献
    // --------------------------------------------------------

    fn edge_contribution(&self, ctx: &EdgeContext<'_>, e: usize) -> VtResult<EdgeContribution> {
        let edge = ctx.mesh.edge(e);
        let (i, j) = (edge.i as usize, edge.j as usize);
        let area = edge.area();
        let normal = edge.unit_normal();
        let location = || format!("边 {} (点 {} → 点 {})", e, i, j);

        let result = match &self.operator {
            ConvectiveOperator::Upwind { scheme, order } => {
                let (left, right) = match order {
                    ReconstructionOrder::FirstOrder => {
                        (ctx.primitives.state(i), ctx.primitives.state(j))
                    }
                    ReconstructionOrder::SecondOrder => {
                        let (left, right) = muscl_pair(
                            &ctx.primitives,
                            ctx.gradient,
                            ctx.limiter,
                            i,
                            j,
                            ctx.mesh.coords(i),
                            ctx.mesh.coords(j),
                        );
                        self.check_reconstructed(&left, e, i)?;
                        self.check_reconstructed(&right, e, j)?;
                        (left, right)
                    }
                };
                scheme.evaluate(&left, &right, normal, ctx.with_jacobian)
            }
            ConvectiveOperator::Central { scheme } => {
                let data = JstEdgeData {
                    laplacian_left: ctx.laplacian.get(i),
                    laplacian_right: ctx.laplacian.get(j),
                    sensor_left: ctx.sensor[i],
                    sensor_right: ctx.sensor[j],
                    neighbors_left: ctx.mesh.incident_edges(i).len() as u32,
                    neighbors_right: ctx.mesh.incident_edges(j).len() as u32,
                };
                scheme.evaluate(
                    &ctx.primitives.state(i),
                    &ctx.primitives.state(j),
                    &data,
                    normal,
                    ctx.with_jacobian,
                )
            }
        };
        let result = result.map_err(|err| VtError::numerical(err.to_string(), location()))?;

        let mut flux = result.flux;
        let mut jacobians = result.jacobians;

        // 黏性通量沿扩散方向输运，从对流通量中减去
        if let Some(viscous) = &self.viscous {
            let edge_vector = ctx.mesh.coords(j) - ctx.mesh.coords(i);
            let vis = viscous
                .evaluate(
                    &ctx.primitives.state(i),
                    &ctx.primitives.state(j),
                    ctx.gradient.get(i),
                    ctx.gradient.get(j),
                    edge_vector,
                    normal,
                    ctx.with_jacobian,
                )
                .map_err(|err| VtError::numerical(err.to_string(), location()))?;
            flux -= vis.flux;
            if let (Some(total), Some(vis_jac)) = (jacobians.as_mut(), vis.jacobians) {
                total.left -= vis_jac.left;
                total.right -= vis_jac.right;
            }
        }

        let flux = flux.scale(area);
        if !flux.is_valid() {
            return Err(VtError::numerical("通量非有限", location()));
        }

        Ok(EdgeContribution {
            i,
            j,
            flux,
            jacobians: jacobians.map(|jac| FluxJacobians::new(jac.left * area, jac.right * area)),
            wave_speed: result.max_wave_speed,
        })
    }

    fn check_reconstructed(&self, q: &PrimitiveState, e: usize, point: usize) -> VtResult<()> {
        if !(q.density >= self.params.density_min) || !(q.pressure >= self.params.pressure_min) {
            return Err(VtError::numerical(
                format!("重构状态非物理: ρ={:e} p={:e}", q.density, q.pressure),
                format!("边 {} 点 {}", e, point),
            ));
        }
        Ok(())
    }

    fn scatter_edge(
        residual: &mut Residual,
        matrix: Option<&mut BsrMatrix>,
        contribution: &EdgeContribution,
        report: &mut AssemblyReport,
    ) {
        let EdgeContribution {
            i,
            j,
            flux,
            jacobians,
            wave_speed,
        } = *contribution;

        residual.add_flux(i, flux);
        residual.sub_flux(j, flux);
        report.max_wave_speed = report.max_wave_speed.max(wave_speed);

        if let Some(mat) = matrix {
            if let Some(jac) = jacobians {
                let ok = mat.add_block(i, i, jac.left)
                    && mat.add_block(i, j, jac.right)
                    && mat.add_block(j, i, -jac.left)
                    && mat.add_block(j, j, -jac.right);
                debug_assert!(ok, "稀疏模式缺少边 ({}, {}) 的块位置", i, j);
            }
        }
    }

    // --------------------------------------------------------
    // 边界
    // --------------------------------------------------------

    /// 无滑移壁的强施加：动量与速度缓存清零，压力缓存随之刷新
    ///
    /// 更新基准 `old` 与物理时间层同步清零。推进器一律从 `old`
    /// 出发重建解，历史层若残留切向动量，清过的行会被加回去。
    fn enforce_strong_states(
        &self,
        mesh: &SolverMesh,
        field: &mut FlowField,
        boundaries: &ResolvedBoundaries,
    ) {
        if !boundaries.has_strong() {
            return;
        }
        let gm1 = self.gas.gamma_minus_one();
        for binding in boundaries.iter() {
            if !binding.condition.is_strong() {
                continue;
            }
            let marker = &mesh.markers()[binding.marker];
            for vertex in marker.vertices() {
                if !mesh.is_owned(vertex.point) {
                    continue;
                }
                let p = vertex.point;
                field.conserved.momentum_x[p] = 0.0;
                field.conserved.momentum_y[p] = 0.0;
                field.old.momentum_x[p] = 0.0;
                field.old.momentum_y[p] = 0.0;
                field.time_n.momentum_x[p] = 0.0;
                field.time_n.momentum_y[p] = 0.0;
                field.time_n1.momentum_x[p] = 0.0;
                field.time_n1.momentum_y[p] = 0.0;
                field.velocity[p] = DVec2::ZERO;
                // 动量为零时 p = (γ-1)·ρE
                field.pressure[p] = gm1 * field.conserved.energy[p];
            }
        }
    }

    /// 弱边界通量：Euler 壁走解析压力通量，其余条件构造虚元
    /// 过迎风格式；隐式路径虚元对内点导数冻结，只装配对角块
    fn apply_weak_boundaries(
        &self,
        mesh: &SolverMesh,
        primitives: &PrimitiveView<'_>,
        boundaries: &ResolvedBoundaries,
        residual: &mut Residual,
        matrix: &mut Option<&mut BsrMatrix>,
        report: &mut AssemblyReport,
    ) -> VtResult<()> {
        let with_jacobian = matrix.is_some();
        for binding in boundaries.iter() {
            let condition = binding.condition;
            if condition.is_strong() {
                continue;
            }
            let marker = &mesh.markers()[binding.marker];
            for vertex in marker.vertices() {
                if !mesh.is_owned(vertex.point) {
                    continue;
                }
                let inside = primitives.state(vertex.point);
                let location = || format!("标记 {} 点 {}", marker.name, vertex.point);

                let (flux, jacobian, wave_speed) =
                    if matches!(condition, BoundaryCondition::EulerWall) {
                        let flux = wall_pressure_flux(&inside, vertex.normal);
                        let jac = with_jacobian
                            .then(|| wall_pressure_jacobian(&inside, &self.gas, vertex.normal));
                        let speed = spectral_radius(&inside, &self.gas, vertex.normal);
                        (flux, jac, speed)
                    } else {
                        let ghost = match condition {
                            BoundaryCondition::Symmetry => symmetry_ghost(&inside, vertex.normal),
                            BoundaryCondition::FarField { state } => {
                                far_field_ghost(&inside, &state, vertex.normal, &self.gas)
                            }
                            BoundaryCondition::InletTotal {
                                total_pressure,
                                total_temperature,
                                direction,
                            } => inlet_total_ghost(
                                &inside,
                                total_pressure,
                                total_temperature,
                                direction,
                                vertex.normal,
                                &self.gas,
                            ),
                            BoundaryCondition::InletMassFlow { density, velocity } => {
                                inlet_mass_flow_ghost(&inside, density, velocity)
                            }
                            BoundaryCondition::Outlet { back_pressure } => {
                                outlet_ghost(&inside, back_pressure, vertex.normal, &self.gas)
                            }
                            // 壁面条件已在前分支与强路径处理
                            BoundaryCondition::EulerWall | BoundaryCondition::NoSlipWall => {
                                continue
                            }
                        };
                        let result = self
                            .boundary_scheme
                            .evaluate(&inside, &ghost, vertex.normal, with_jacobian)
                            .map_err(|err| VtError::numerical(err.to_string(), location()))?;
                        (
                            result.flux,
                            result.jacobians.map(|jac| jac.left),
                            result.max_wave_speed,
                        )
                    };

                let flux = flux.scale(vertex.area);
                if !flux.is_valid() {
                    return Err(VtError::numerical("边界通量非有限", location()));
                }
                residual.add_flux(vertex.point, flux);
                report.max_wave_speed = report.max_wave_speed.max(wave_speed);

                if let Some(mat) = matrix.as_deref_mut() {
                    if let Some(jac) = jacobian {
                        mat.add_block(vertex.point, vertex.point, jac * vertex.area);
                    }
                }
            }
        }
        Ok(())
    }

    /// 强约束行收尾：动量残差行清零，矩阵行换单位行
    fn clear_strong_rows(
        mesh: &SolverMesh,
        residual: &mut Residual,
        matrix: &mut Option<&mut BsrMatrix>,
        boundaries: &ResolvedBoundaries,
    ) {
        if !boundaries.has_strong() {
            return;
        }
        for binding in boundaries.iter() {
            if !binding.condition.is_strong() {
                continue;
            }
            for vertex in mesh.markers()[binding.marker].vertices() {
                if !mesh.is_owned(vertex.point) {
                    continue;
                }
                residual.clear_momentum(vertex.point);
                if let Some(mat) = matrix.as_deref_mut() {
                    mat.set_equation_identity(vertex.point, 1);
                    mat.set_equation_identity(vertex.point, 2);
                }
            }
        }
    }

    // --------------------------------------------------------
    // 源项
    // --------------------------------------------------------

    fn apply_sources(
        &self,
        mesh: &SolverMesh,
        primitives: &PrimitiveView<'_>,
        residual: &mut Residual,
        matrix: &mut Option<&mut BsrMatrix>,
        with_jacobian: bool,
    ) -> VtResult<()> {
        if self.sources.is_empty() {
            return Ok(());
        }
        for p in 0..mesh.n_owned() {
            let state = primitives.state(p);
            let coords = mesh.coords(p);
            let mut total = SourceContribution::ZERO;
            for source in &self.sources {
                if !source.is_enabled() {
                    continue;
                }
                total.accumulate(&source.evaluate(p, coords, &state, &self.gas, with_jacobian));
            }
            if !total.is_valid() {
                return Err(VtError::numerical("源项非有限", format!("点 {}", p)));
            }

            let volume = mesh.volume(p);
            residual.sub_flux(p, total.rate.scale(volume));
            if let Some(mat) = matrix.as_deref_mut() {
                if let Some(jac) = total.jacobian {
                    mat.add_block(p, p, -(jac * volume));
                }
            }
        }
        Ok(())
    }
}

// ============================================================
// 测试
// ============================================================
