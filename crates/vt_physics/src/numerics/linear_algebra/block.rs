// crates/vt_physics/src/numerics/linear_algebra/block.rs

//! 4×4 稠密块
//!
//! 块稀疏矩阵的基本单元：每个网格点对应一个 4×4 块（四个守恒方程）。
//! 提供块-块乘法、块-向量乘法与带选主元的 Gauss-Jordan 求逆。

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// 求逆时的主元下限（仅拦截精确奇异）
const MIN_PIVOT: f64 = 1e-300;

/// 4×4 稠密块（行优先）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block4 {
    /// 行优先存储 m[row][col]
    pub m: [[f64; 4]; 4],
}

impl Default for Block4 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Block4 {
    /// 零块
    pub const ZERO: Self = Self { m: [[0.0; 4]; 4] };

    /// 单位块
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// 从行优先数组创建
    #[inline]
    pub const fn new(m: [[f64; 4]; 4]) -> Self {
        Self { m }
    }

    /// 标量对角块 s·I
    #[inline]
    pub fn from_scalar_diagonal(s: f64) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = s;
        }
        Self { m }
    }

    /// 对角块 diag(d)
    #[inline]
    pub fn from_diagonal(d: [f64; 4]) -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = d[i];
        }
        Self { m }
    }

    /// 块-向量乘法 y = B·x
    #[inline]
    pub fn mul_vec(&self, x: [f64; 4]) -> [f64; 4] {
        let mut y = [0.0; 4];
        for i in 0..4 {
            y[i] = self.m[i][0] * x[0]
                + self.m[i][1] * x[1]
                + self.m[i][2] * x[2]
                + self.m[i][3] * x[3];
        }
        y
    }

    /// 块-块乘法 C = A·B
    pub fn mul_block(&self, other: &Self) -> Self {
        let mut c = [[0.0; 4]; 4];
        for i in 0..4 {
            for k in 0..4 {
                let aik = self.m[i][k];
                if aik != 0.0 {
                    for j in 0..4 {
                        c[i][j] += aik * other.m[k][j];
                    }
                }
            }
        }
        Self { m: c }
    }

    /// 转置
    pub fn transpose(&self) -> Self {
        let mut t = [[0.0; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                t[j][i] = self.m[i][j];
            }
        }
        Self { m: t }
    }

    /// 带选主元的 Gauss-Jordan 求逆
    ///
    /// # 返回
    ///
    /// 奇异块返回 `None`（调用方决定回退策略）。
    pub fn invert(&self) -> Option<Self> {
        let mut a = self.m;
        let mut inv = Self::IDENTITY.m;

        for col in 0..4 {
            // 列选主元
            let mut pivot_row = col;
            let mut pivot_abs = a[col][col].abs();
            for row in (col + 1)..4 {
                if a[row][col].abs() > pivot_abs {
                    pivot_row = row;
                    pivot_abs = a[row][col].abs();
                }
            }
            if pivot_abs < MIN_PIVOT || !pivot_abs.is_finite() {
                return None;
            }
            if pivot_row != col {
                a.swap(pivot_row, col);
                inv.swap(pivot_row, col);
            }

            let inv_pivot = 1.0 / a[col][col];
            for j in 0..4 {
                a[col][j] *= inv_pivot;
                inv[col][j] *= inv_pivot;
            }

            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor != 0.0 {
                    for j in 0..4 {
                        a[row][j] -= factor * a[col][j];
                        inv[row][j] -= factor * inv[col][j];
                    }
                }
            }
        }

        Some(Self { m: inv })
    }

    /// 所有元素是否有限
    pub fn is_finite(&self) -> bool {
        self.m.iter().all(|row| row.iter().all(|v| v.is_finite()))
    }
}

impl Add for Block4 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut c = self.m;
        for i in 0..4 {
            for j in 0..4 {
                c[i][j] += rhs.m[i][j];
            }
        }
        Self { m: c }
    }
}

impl Sub for Block4 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let mut c = self.m;
        for i in 0..4 {
            for j in 0..4 {
                c[i][j] -= rhs.m[i][j];
            }
        }
        Self { m: c }
    }
}

impl AddAssign for Block4 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        for i in 0..4 {
            for j in 0..4 {
                self.m[i][j] += rhs.m[i][j];
            }
        }
    }
}

impl SubAssign for Block4 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        for i in 0..4 {
            for j in 0..4 {
                self.m[i][j] -= rhs.m[i][j];
            }
        }
    }
}

impl Mul<f64> for Block4 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        let mut c = self.m;
        for row in c.iter_mut() {
            for v in row.iter_mut() {
                *v *= rhs;
            }
        }
        Self { m: c }
    }
}

impl Neg for Block4 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self * -1.0
    }
}
