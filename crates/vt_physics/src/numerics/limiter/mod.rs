// crates/vt_physics/src/numerics/limiter/mod.rs

//! 斜率限制器模块
//!
//! 控制二阶重构在间断附近的振荡:
//!
//! - [`SlopeLimiter`]: 限制器接口
//! - [`NoLimiter`]: 不限制（一阶或光滑流动）
//! - [`Venkatakrishnan`]: 光滑限制器，定常收敛性好（默认）
//! - [`Minmod`]: 最耗散，稳定性最好
//! - [`LimiterEngine`]: 包络收集与逐边限制的驱动
//!
//! | 限制器 | 耗散性 | 光滑性 | 适用场景 |
//! |--------|--------|--------|----------|
//! | Venkatakrishnan | 低 | 光滑 | 通用推荐 |
//! | Minmod | 高 | 不光滑 | 强激波 |

mod engine;
mod minmod;
mod traits;
mod venkatakrishnan;

pub use engine::LimiterEngine;
pub use minmod::Minmod;
pub use traits::{LimiterContext, NoLimiter, SlopeLimiter};
pub use venkatakrishnan::Venkatakrishnan;

use crate::types::{LimiterKind, NumericalParams};

/// 根据配置创建限制器实例
pub fn create_limiter(kind: LimiterKind, params: &NumericalParams) -> Box<dyn SlopeLimiter> {
    match kind {
        LimiterKind::None => Box::new(NoLimiter::new()),
        LimiterKind::Venkatakrishnan => Box::new(Venkatakrishnan::new(params.venkat_k)),
        LimiterKind::Minmod => Box::new(Minmod::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_limiter() {
        let params = NumericalParams::default();
        assert_eq!(create_limiter(LimiterKind::None, &params).name(), "None");
        assert_eq!(
            create_limiter(LimiterKind::Venkatakrishnan, &params).name(),
            "Venkatakrishnan"
        );
        assert_eq!(create_limiter(LimiterKind::Minmod, &params).name(), "Minmod");
    }

    #[test]
    fn test_create_limiter_zero_delta() {
        let params = NumericalParams::default();
        let ctx = LimiterContext::new(1.0, 0.0, 0.5, 1.5, 1.0);
        for kind in [
            LimiterKind::None,
            LimiterKind::Venkatakrishnan,
            LimiterKind::Minmod,
        ] {
            assert_eq!(create_limiter(kind, &params).compute(&ctx), 1.0);
        }
    }
}
