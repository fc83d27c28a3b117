// crates/vt_foundation/src/lib.rs

//! Ventus 基础设施层
//!
//! 提供整个工作空间共享的基础类型：
//! - [`error`]: 统一错误类型 `VtError` 与结果别名 `VtResult`
//! - `ensure!` / `require!` 校验宏
//!
//! 本层不依赖任何上层 crate，保持最小依赖面。

#![warn(missing_docs)]

pub mod error;

pub use error::{VtError, VtResult};

/// 条件校验宏
///
/// 条件不满足时提前返回给定错误。
///
/// # 示例
///
/// ```
/// use vt_foundation::{ensure, VtError, VtResult};
///
/// fn check_positive(x: f64) -> VtResult<()> {
///     ensure!(x > 0.0, VtError::invalid_input("x 必须为正"));
///     Ok(())
/// }
///
/// assert!(check_positive(1.0).is_ok());
/// assert!(check_positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err);
        }
    };
}

/// Option 解包宏
///
/// `None` 时提前返回给定错误。
///
/// # 示例
///
/// ```
/// use vt_foundation::{require, VtError, VtResult};
///
/// fn first(values: &[f64]) -> VtResult<f64> {
///     let v = require!(values.first(), VtError::not_found("values"));
///     Ok(*v)
/// }
///
/// assert!(first(&[]).is_err());
/// ```
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err),
        }
    };
}

/// 常用导出集合
pub mod prelude {
    pub use crate::error::{VtError, VtResult};
    pub use crate::{ensure, require};
}
