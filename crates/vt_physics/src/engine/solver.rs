// crates/vt_physics/src/engine/solver.rs

//! 流动求解器
//!
//! 把网格、流场、空间装配与时间推进编排成固定相位的外迭代。
//! 每轮 [`FlowSolver::iterate`]：
//!
//! 1. 快照外迭代起点，同步守恒量并刷新原始变量
//! 2. 计算局部时间步
//! 3. 按需计算并同步梯度、限制器、中心格式辅助场
//! 4. 残差装配，随后显式多级推进或隐式线性求解
//! 5. 推进后再同步并刷新，返回收敛报告
//!
//! 配置经 [`SolverBuilder`] 一次校验成型，运行期不再变形；
//! 报告按轮返回，绝不原地累积。

use std::sync::Arc;

use vt_foundation::{ensure, VtError, VtResult};
use vt_mesh::SolverMesh;

use crate::assembly::{compute_jst_fields, ResidualAssembler, SourceTerm};
use crate::boundary::{BoundaryCondition, BoundarySet, ResolvedBoundaries};
use crate::halo::{HaloChannel, HaloExchange, HaloField};
use crate::numerics::{
    create_gradient_method, BsrMatrix, BsrPattern, GradientMethod, LimiterEngine, SolverConfig,
};
use crate::state::FlowField;
use crate::types::{
    ConvectiveKind, DualTimeScheme, GasModel, GradientKind, LimiterKind, NumericalParams,
    PhysicsModel, TimeSchemeKind, TimeStepMode, ViscosityLaw,
};

use super::convergence::IterationReport;
use super::explicit::ExplicitUpdater;
use super::implicit::ImplicitUpdater;
use super::timestep::TimeStepController;

// ============================================================
// 配置
// ============================================================

/// 求解器配置
///
/// 全量可序列化，供外层驱动存档再现。
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SolverOptions {
    /// 气体模型
    pub gas: GasModel,
    /// 物理模型
    pub physics: PhysicsModel,
    /// 数值参数
    pub params: NumericalParams,
    /// 对流格式
    pub convective: ConvectiveKind,
    /// 梯度方法
    pub gradient: GradientKind,
    /// 限制器
    pub limiter: LimiterKind,
    /// 时间推进格式
    pub time_scheme: TimeSchemeKind,
    /// 时间步选取方式
    pub time_step_mode: TimeStepMode,
    /// CFL 数
    pub cfl: f64,
    /// 双重时间步格式
    pub dual_time: DualTimeScheme,
    /// 物理时间步长 [s]，双重时间步时使用
    pub physical_dt: f64,
    /// 隐式路径的线性求解配置
    pub linear: SolverConfig,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            gas: GasModel::AIR,
            physics: PhysicsModel::default(),
            params: NumericalParams::default(),
            convective: ConvectiveKind::default(),
            gradient: GradientKind::default(),
            limiter: LimiterKind::default(),
            time_scheme: TimeSchemeKind::default(),
            time_step_mode: TimeStepMode::default(),
            cfl: 1.0,
            dual_time: DualTimeScheme::None,
            physical_dt: 0.0,
            linear: SolverConfig::default(),
        }
    }
}

impl SolverOptions {
    fn validate(&self) -> VtResult<()> {
        ensure!(
            self.cfl.is_finite() && self.cfl > 0.0,
            VtError::config(format!("CFL 数非法: {}", self.cfl))
        );
        if self.dual_time != DualTimeScheme::None {
            ensure!(
                self.physical_dt.is_finite() && self.physical_dt > 0.0,
                VtError::config(format!(
                    "双重时间步要求正的物理时间步长, 实际 {}",
                    self.physical_dt
                ))
            );
            ensure!(
                self.time_scheme.is_implicit(),
                VtError::config(format!(
                    "双重时间步要求隐式时间推进, 实际 {}",
                    self.time_scheme
                ))
            );
        }
        if let ConvectiveKind::Central { kappa2, kappa4 } = self.convective {
            ensure!(
                kappa2 >= 0.0 && kappa4 >= 0.0,
                VtError::config(format!(
                    "JST 耗散系数必须非负: κ2={}, κ4={}",
                    kappa2, kappa4
                ))
            );
        }
        if let PhysicsModel::NavierStokes { viscosity, prandtl } = self.physics {
            ensure!(
                prandtl.is_finite() && prandtl > 0.0,
                VtError::config(format!("Prandtl 数非法: {}", prandtl))
            );
            let mu_ok = match viscosity {
                ViscosityLaw::Constant(mu) => mu.is_finite() && mu > 0.0,
                ViscosityLaw::Sutherland { mu_ref, t_ref, s } => {
                    mu_ref > 0.0 && t_ref > 0.0 && s > 0.0
                }
            };
            ensure!(mu_ok, VtError::config("黏性律参数必须为正"));
        }
        Ok(())
    }
}

// ============================================================
// 构建器
// ============================================================

/// 求解器构建器
///
/// 配置、边界条件与源项一处收集，`build` 时对网格统一校验。
pub struct SolverBuilder {
    options: SolverOptions,
    boundaries: BoundarySet,
    sources: Vec<Box<dyn SourceTerm>>,
    channel: Option<Arc<dyn HaloChannel>>,
}

impl SolverBuilder {
    fn new() -> Self {
        Self {
            options: SolverOptions::default(),
            boundaries: BoundarySet::new(),
            sources: Vec::new(),
            channel: None,
        }
    }

    /// 整体替换配置
    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_gas(mut self, gas: GasModel) -> Self {
        self.options.gas = gas;
        self
    }

    pub fn with_physics(mut self, physics: PhysicsModel) -> Self {
        self.options.physics = physics;
        self
    }

    pub fn with_params(mut self, params: NumericalParams) -> Self {
        self.options.params = params;
        self
    }

    pub fn with_convective(mut self, convective: ConvectiveKind) -> Self {
        self.options.convective = convective;
        self
    }

    pub fn with_gradient(mut self, gradient: GradientKind) -> Self {
        self.options.gradient = gradient;
        self
    }

    pub fn with_limiter(mut self, limiter: LimiterKind) -> Self {
        self.options.limiter = limiter;
        self
    }

    pub fn with_time_scheme(mut self, scheme: TimeSchemeKind) -> Self {
        self.options.time_scheme = scheme;
        self
    }

    pub fn with_time_step_mode(mut self, mode: TimeStepMode) -> Self {
        self.options.time_step_mode = mode;
        self
    }

    pub fn with_cfl(mut self, cfl: f64) -> Self {
        self.options.cfl = cfl;
        self
    }

    /// 启用双重时间步
    pub fn with_dual_time(mut self, scheme: DualTimeScheme, physical_dt: f64) -> Self {
        self.options.dual_time = scheme;
        self.options.physical_dt = physical_dt;
        self
    }

    /// 线性求解配置（隐式路径）
    pub fn with_linear(mut self, config: SolverConfig) -> Self {
        self.options.linear = config;
        self
    }

    /// 注册边界条件，同名覆盖
    pub fn with_boundary(
        mut self,
        marker: impl Into<String>,
        condition: BoundaryCondition,
    ) -> Self {
        self.boundaries.register(marker, condition);
        self
    }

    /// 追加体积源项
    pub fn with_source(mut self, source: Box<dyn SourceTerm>) -> Self {
        self.sources.push(source);
        self
    }

    /// 多分区运行的 halo 传输通道
    pub fn with_halo_channel(mut self, channel: Arc<dyn HaloChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// 对网格完成校验并生成求解器
    pub fn build(self, mesh: Arc<SolverMesh>) -> VtResult<FlowSolver> {
        let Self {
            options,
            boundaries,
            sources,
            channel,
        } = self;

        options.validate()?;
        let resolved = boundaries.resolve(&mesh)?;
        ensure!(
            mesh.halo().links.is_empty() || channel.is_some(),
            VtError::config(format!(
                "分区 {} 含 {} 个邻分区链接但未配置 halo 传输通道",
                mesh.halo().rank,
                mesh.halo().links.len()
            ))
        );

        let mut assembler = ResidualAssembler::new(
            options.gas,
            options.convective,
            &options.physics,
            options.params.clone(),
        );
        for source in sources {
            assembler.push_source(source);
        }

        let gradient_method = create_gradient_method(options.gradient, &options.params);
        let limiter_engine = LimiterEngine::new(options.limiter, &options.params);
        let timestep = TimeStepController::new(
            options.gas,
            &options.physics,
            options.cfl,
            options.time_step_mode,
            &options.params,
        );
        let explicit = ExplicitUpdater::new(&options.params);

        let implicit = if options.time_scheme.is_implicit() {
            let pattern = BsrPattern::from_edges(
                mesh.n_points(),
                (0..mesh.n_edges()).map(|e| {
                    let edge = mesh.edge(e);
                    (edge.i as usize, edge.j as usize)
                }),
            );
            Some((
                ImplicitUpdater::new(options.linear.clone()),
                BsrMatrix::from_pattern(pattern),
            ))
        } else {
            None
        };

        let halo = match channel {
            Some(channel) => HaloExchange::networked(channel),
            None => HaloExchange::local(),
        };

        log::debug!(
            "求解器就绪: {} 点 ({} 拥有), {} 边, {} 边界绑定, 时间推进 {}",
            mesh.n_points(),
            mesh.n_owned(),
            mesh.n_edges(),
            resolved.len(),
            options.time_scheme
        );

        Ok(FlowSolver {
            mesh,
            options,
            boundaries: resolved,
            assembler,
            gradient_method,
            limiter_engine,
            timestep,
            explicit,
            implicit,
            halo,
            iteration: 0,
        })
    }
}

// ============================================================
// 求解器
// ============================================================

/// 流动求解器
///
/// 持有全部运行期组件；流场作为外部数据按轮传入，便于外层驱动
/// 做存档与多分区管理。
pub struct FlowSolver {
    mesh: Arc<SolverMesh>,
    options: SolverOptions,
    boundaries: ResolvedBoundaries,
    assembler: ResidualAssembler,
    gradient_method: Box<dyn GradientMethod>,
    limiter_engine: LimiterEngine,
    timestep: TimeStepController,
    explicit: ExplicitUpdater,
    implicit: Option<(ImplicitUpdater, BsrMatrix)>,
    halo: HaloExchange,
    iteration: usize,
}

impl std::fmt::Debug for FlowSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowSolver")
            .field("options", &self.options)
            .field("iteration", &self.iteration)
            .finish_non_exhaustive()
    }
}

impl FlowSolver {
    /// 创建构建器
    pub fn builder() -> SolverBuilder {
        SolverBuilder::new()
    }

    /// 网格
    #[inline]
    pub fn mesh(&self) -> &SolverMesh {
        &self.mesh
    }

    /// 配置
    #[inline]
    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// 已完成的外迭代轮数
    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// 调整 CFL 数（外层驱动的爬升策略用）
    pub fn set_cfl(&mut self, cfl: f64) {
        self.timestep.set_cfl(cfl);
        self.options.cfl = self.timestep.cfl();
    }

    /// 按网格尺寸分配流场
    pub fn allocate_field(&self) -> FlowField {
        FlowField::new(self.mesh.n_points(), self.mesh.n_owned())
    }

    /// 完成一轮外迭代并返回收敛报告
    pub fn iterate(&mut self, field: &mut FlowField) -> VtResult<IterationReport> {
        debug_assert_eq!(field.n_points(), self.mesh.n_points());

        // 快照与状态刷新
        field.snapshot_old();
        self.halo
            .synchronize(&self.mesh, field, HaloField::Conserved)?;
        field.update_primitives(&self.options.gas, &self.options.params)?;

        // 局部时间步
        let dt_summary = self.timestep.compute(&self.mesh, field)?;

        // 重构与中心格式准备
        self.refresh_spatial_caches(field)?;

        // 装配与推进
        let linear = if let Some((implicit, matrix)) = self.implicit.as_mut() {
            self.assembler
                .assemble(&self.mesh, field, &self.boundaries, Some(&mut *matrix))?;
            let stats = implicit.advance(
                &self.mesh,
                field,
                matrix,
                self.options.dual_time,
                self.options.physical_dt,
            );
            self.halo
                .synchronize(&self.mesh, field, HaloField::Conserved)?;
            field.update_primitives(&self.options.gas, &self.options.params)?;
            Some(stats)
        } else {
            let stages = self.options.time_scheme.stage_coefficients();
            for (stage, &alpha) in stages.iter().enumerate() {
                if stage > 0 {
                    // 上一级更新后的状态参与本级装配，梯度与限制器冻结
                    self.halo
                        .synchronize(&self.mesh, field, HaloField::Conserved)?;
                    field.update_primitives(&self.options.gas, &self.options.params)?;
                }
                self.assembler
                    .assemble(&self.mesh, field, &self.boundaries, None)?;
                self.explicit.apply_stage(&self.mesh, field, alpha);
            }
            self.halo
                .synchronize(&self.mesh, field, HaloField::Conserved)?;
            field.update_primitives(&self.options.gas, &self.options.params)?;
            None
        };

        // 报告
        let mut report = IterationReport::from_residual(
            self.iteration,
            &field.residual,
            self.mesh.n_owned(),
            dt_summary,
        );
        if let Some(stats) = linear {
            report = report.with_linear(stats);
        }
        self.iteration += 1;
        Ok(report)
    }

    /// 刷新梯度、限制器与中心格式辅助场并同步 halo 区
    fn refresh_spatial_caches(&self, field: &mut FlowField) -> VtResult<()> {
        if self.assembler.needs_gradients() {
            let (primitives, gradient) = field.split_gradient_mut();
            self.gradient_method.compute(&self.mesh, primitives, gradient);
            self.halo
                .synchronize(&self.mesh, field, HaloField::Gradient)?;

            if self.assembler.uses_reconstruction() {
                let (primitives, gradient, limiter) = field.split_limiter_mut();
                self.limiter_engine
                    .compute(&self.mesh, primitives, gradient, limiter);
                self.halo
                    .synchronize(&self.mesh, field, HaloField::Limiter)?;
            }
        }

        if self.assembler.needs_aux_fields() {
            compute_jst_fields(&self.mesh, field, &self.options.params);
            self.halo.synchronize(&self.mesh, field, HaloField::JstAux)?;
        }
        Ok(())
    }
}

// ============================================================
// 测试
// ============================================================
