// crates/vt_physics/src/numerics/linear_algebra/bsr.rs

//! 块压缩稀疏行（BSR）矩阵格式
//!
//! Jacobian 矩阵的存储格式：每个网格点一个块行，块行内包含对角块
//! 与每条关联边一个的邻居块。与 CSR 的区别仅在于非零元是 4×4 块。
//!
//! # 模式与值分离
//!
//! [`BsrPattern`] 在装配器构造期由网格拓扑构建一次，此后不可变；
//! [`BsrMatrix`] 复用同一模式，每轮装配只 [`BsrMatrix::clear_values`]
//! 后重填块值。装配循环通过二分查找定位 (row, col) 块。
//!
//! # 格式说明
//!
//! - `row_ptr`: 块行指针，长度 n_rows + 1
//! - `col_idx`: 块列索引，行内升序
//! - `diag_idx`: 每行对角块在 values 中的索引（构建期缓存）
//! - `values`: 块值数组

use super::block::Block4;

// ============================================================
// 稀疏模式
// ============================================================

/// BSR 矩阵的稀疏模式（不可变）
#[derive(Debug, Clone)]
pub struct BsrPattern {
    /// 块行数
    n_rows: usize,
    /// 块行指针
    row_ptr: Vec<usize>,
    /// 块列索引（行内升序）
    col_idx: Vec<usize>,
    /// 对角块索引缓存
    diag_idx: Vec<usize>,
}

impl BsrPattern {
    /// 由边拓扑构建模式
    ///
    /// 每个点的块行包含对角块与所有边邻居块。边以 (i, j) 点对给出，
    /// 重复边只产生一个块位置。
    pub fn from_edges(n_points: usize, edges: impl Iterator<Item = (usize, usize)>) -> Self {
        let mut rows: Vec<Vec<usize>> = (0..n_points).map(|i| vec![i]).collect();
        for (i, j) in edges {
            debug_assert!(i < n_points && j < n_points);
            rows[i].push(j);
            rows[j].push(i);
        }

        let mut row_ptr = Vec::with_capacity(n_points + 1);
        let mut col_idx = Vec::new();
        let mut diag_idx = Vec::with_capacity(n_points);
        row_ptr.push(0);

        for (i, mut cols) in rows.into_iter().enumerate() {
            cols.sort_unstable();
            cols.dedup();
            let start = col_idx.len();
            // 对角块按构造必然存在
            let local = cols.binary_search(&i).unwrap_or(0);
            diag_idx.push(start + local);
            col_idx.extend_from_slice(&cols);
            row_ptr.push(col_idx.len());
        }

        Self {
            n_rows: n_points,
            row_ptr,
            col_idx,
            diag_idx,
        }
    }

    /// 块行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 非零块数量
    #[inline]
    pub fn nnz_blocks(&self) -> usize {
        self.col_idx.len()
    }

    /// 第 row 行的块列索引
    #[inline]
    pub fn row_indices(&self, row: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]]
    }

    /// 查找 (row, col) 对应的块索引
    ///
    /// 列索引行内有序，使用二分查找。
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_idx[start..end].binary_search(&col) {
            Ok(local) => Some(start + local),
            Err(_) => None,
        }
    }

    /// 第 row 行对角块的块索引
    #[inline]
    pub fn diag_index(&self, row: usize) -> usize {
        self.diag_idx[row]
    }
}

// ============================================================
// BSR 矩阵主体
// ============================================================

/// BSR 格式块稀疏矩阵
#[derive(Debug, Clone)]
pub struct BsrMatrix {
    /// 稀疏模式（不可变）
    pattern: BsrPattern,
    /// 块值（可变）
    values: Vec<Block4>,
}

impl BsrMatrix {
    /// 从稀疏模式创建零矩阵
    pub fn from_pattern(pattern: BsrPattern) -> Self {
        let nnz = pattern.nnz_blocks();
        Self {
            pattern,
            values: vec![Block4::ZERO; nnz],
        }
    }

    /// 块行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows()
    }

    /// 标量未知量总数
    #[inline]
    pub fn n_scalar_rows(&self) -> usize {
        self.pattern.n_rows() * 4
    }

    /// 稀疏模式引用
    #[inline]
    pub fn pattern(&self) -> &BsrPattern {
        &self.pattern
    }

    /// 将所有块清零（保持模式不变）
    pub fn clear_values(&mut self) {
        self.values.fill(Block4::ZERO);
    }

    /// 获取 (row, col) 的块（不存在返回零块）
    #[inline]
    pub fn get_block(&self, row: usize, col: usize) -> Block4 {
        self.pattern
            .find_index(row, col)
            .map_or(Block4::ZERO, |idx| self.values[idx])
    }

    /// 累加到 (row, col) 块
    ///
    /// # 返回
    ///
    /// 位置不在模式内时返回 `false` 且不做修改。
    #[inline]
    pub fn add_block(&mut self, row: usize, col: usize, block: Block4) -> bool {
        if let Some(idx) = self.pattern.find_index(row, col) {
            self.values[idx] += block;
            true
        } else {
            false
        }
    }

    /// 对角块引用
    #[inline]
    pub fn diagonal_block(&self, row: usize) -> Block4 {
        self.values[self.pattern.diag_index(row)]
    }

    /// 对角块累加标量 s·I
    #[inline]
    pub fn add_to_diagonal(&mut self, row: usize, s: f64) {
        let idx = self.pattern.diag_index(row);
        for k in 0..4 {
            self.values[idx].m[k][k] += s;
        }
    }

    /// 整行置为单位行：行内块全部清零，对角块置 I
    ///
    /// 用于固定未知量（强边界约束、halo 行）。
    pub fn set_row_identity(&mut self, row: usize) {
        let start = self.pattern.row_ptr[row];
        let end = self.pattern.row_ptr[row + 1];
        for idx in start..end {
            self.values[idx] = Block4::ZERO;
        }
        self.values[self.pattern.diag_index(row)] = Block4::IDENTITY;
    }

    /// 行内单个方程置为单位行（块粒度的行约束）
    ///
    /// 第 row 块行中第 eq 个标量方程：所有块的该行清零，对角块
    /// 该行的对角元置 1。
    pub fn set_equation_identity(&mut self, row: usize, eq: usize) {
        debug_assert!(eq < 4);
        let start = self.pattern.row_ptr[row];
        let end = self.pattern.row_ptr[row + 1];
        for idx in start..end {
            self.values[idx].m[eq] = [0.0; 4];
        }
        self.values[self.pattern.diag_index(row)].m[eq][eq] = 1.0;
    }

    /// 块矩阵-向量乘法 y = A·x
    ///
    /// `x`、`y` 为按点分块的扁平向量，长度 4·n_rows。
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.n_scalar_rows());
        debug_assert_eq!(y.len(), self.n_scalar_rows());

        for row in 0..self.pattern.n_rows {
            let start = self.pattern.row_ptr[row];
            let end = self.pattern.row_ptr[row + 1];

            let mut sum = [0.0; 4];
            for idx in start..end {
                let col = self.pattern.col_idx[idx];
                let xb = [x[4 * col], x[4 * col + 1], x[4 * col + 2], x[4 * col + 3]];
                let prod = self.values[idx].mul_vec(xb);
                for k in 0..4 {
                    sum[k] += prod[k];
                }
            }
            y[4 * row..4 * row + 4].copy_from_slice(&sum);
        }
    }

    /// 所有块值是否有限
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|b| b.is_finite())
    }
}
