//! Dense kernels for the row-major blocks of block-sparse tensors.
//!
//! Blocks are contiguous row-major rectangles inside a flat `f64` buffer.
//! faer stores matrices column-major, so a row-major `m x n` block is fed to
//! faer zero-copy as the column-major `n x m` view of its transpose; for the
//! matrix product the operands are swapped (`C^T = B^T A^T`), which keeps
//! [`multiply`] a single faer `matmul` call with no copies.

use faer::linalg::matmul::matmul;
use faer::{Accum, MatMut, MatRef, Par};

/// Immutable row-major matrix view over a block.
#[derive(Clone, Copy, Debug)]
pub struct DenseMat<'a> {
    data: &'a [f64],
    rows: usize,
    cols: usize,
}

impl<'a> DenseMat<'a> {
    /// View `data` as a `rows x cols` row-major matrix.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn new(data: &'a [f64], rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn data(&self) -> &'a [f64] {
        self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// Column-major faer view of the transpose (zero-copy).
    fn as_faer_t(&self) -> MatRef<'a, f64> {
        MatRef::from_column_major_slice(self.data, self.cols, self.rows)
    }
}

/// Mutable row-major matrix view over a block.
#[derive(Debug)]
pub struct DenseMatMut<'a> {
    data: &'a mut [f64],
    rows: usize,
    cols: usize,
}

impl<'a> DenseMatMut<'a> {
    /// View `data` as a mutable `rows x cols` row-major matrix.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn new(data: &'a mut [f64], rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        self.data[i * self.cols + j] = v;
    }

    /// Reborrow as an immutable view.
    pub fn as_ref(&self) -> DenseMat<'_> {
        DenseMat {
            data: self.data,
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn as_faer_t_mut(&mut self) -> MatMut<'_, f64> {
        MatMut::from_column_major_slice_mut(self.data, self.cols, self.rows)
    }
}

/// `x *= alpha`.
pub fn scale(x: &mut [f64], alpha: f64) {
    for v in x.iter_mut() {
        *v *= alpha;
    }
}

/// `y += alpha * x` over equal-length slices.
pub fn axpy(y: &mut [f64], x: &[f64], alpha: f64) {
    debug_assert_eq!(y.len(), x.len());
    for (yv, xv) in y.iter_mut().zip(x) {
        *yv += alpha * xv;
    }
}

/// `c += alpha * a * b`.
///
/// # Panics
///
/// Panics if the inner or outer dimensions disagree.
pub fn multiply(a: DenseMat<'_>, b: DenseMat<'_>, c: &mut DenseMatMut<'_>, alpha: f64) {
    assert_eq!(a.cols(), b.rows());
    assert_eq!(c.rows(), a.rows());
    assert_eq!(c.cols(), b.cols());
    matmul(
        c.as_faer_t_mut(),
        Accum::Add,
        b.as_faer_t(),
        a.as_faer_t(),
        alpha,
        Par::Seq,
    );
}

/// Accumulate `alpha * (a (x) b)` into the sub-rectangle of `c` whose top-left
/// corner is `(row_off, col_off)`.
///
/// The outer product of an `am x an` block with a `bm x bn` block occupies
/// `am*bm` rows by `an*bn` columns of `c`, with `c`'s own column count as the
/// destination row stride.
pub fn outer_embed(
    a: DenseMat<'_>,
    b: DenseMat<'_>,
    c: &mut DenseMatMut<'_>,
    alpha: f64,
    row_off: usize,
    col_off: usize,
) {
    debug_assert!(row_off + a.rows() * b.rows() <= c.rows());
    debug_assert!(col_off + a.cols() * b.cols() <= c.cols());
    for i in 0..a.rows() {
        for j in 0..a.cols() {
            let factor = alpha * a.get(i, j);
            if factor == 0.0 {
                continue;
            }
            for k in 0..b.rows() {
                let row = row_off + i * b.rows() + k;
                let col = col_off + j * b.cols();
                let dst = row * c.cols + col;
                axpy(
                    &mut c.data[dst..dst + b.cols()],
                    &b.data()[k * b.cols()..(k + 1) * b.cols()],
                    factor,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scale_axpy() {
        let mut x = vec![1.0, 2.0, 3.0];
        scale(&mut x, 2.0);
        assert_eq!(x, vec![2.0, 4.0, 6.0]);
        let mut y = vec![1.0, 1.0, 1.0];
        axpy(&mut y, &x, 0.5);
        assert_eq!(y, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_multiply_accumulates() {
        // A = [[1 2], [3 4]], B = [[5 6], [7 8]]
        let a_data = vec![1.0, 2.0, 3.0, 4.0];
        let b_data = vec![5.0, 6.0, 7.0, 8.0];
        let mut c_data = vec![1.0; 4];
        let a = DenseMat::new(&a_data, 2, 2);
        let b = DenseMat::new(&b_data, 2, 2);
        let mut c = DenseMatMut::new(&mut c_data, 2, 2);
        multiply(a, b, &mut c, 1.0);
        // A*B = [[19 22], [43 50]], plus the existing ones.
        assert_relative_eq!(c.get(0, 0), 20.0);
        assert_relative_eq!(c.get(0, 1), 23.0);
        assert_relative_eq!(c.get(1, 0), 44.0);
        assert_relative_eq!(c.get(1, 1), 51.0);
    }

    #[test]
    fn test_multiply_rectangular() {
        // (2x3) * (3x1) with alpha = 2.
        let a_data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b_data = vec![1.0, 0.0, -1.0];
        let mut c_data = vec![0.0; 2];
        let a = DenseMat::new(&a_data, 2, 3);
        let b = DenseMat::new(&b_data, 3, 1);
        let mut c = DenseMatMut::new(&mut c_data, 2, 1);
        multiply(a, b, &mut c, 2.0);
        assert_relative_eq!(c.get(0, 0), 2.0 * (1.0 - 3.0));
        assert_relative_eq!(c.get(1, 0), 2.0 * (4.0 - 6.0));
    }

    #[test]
    fn test_outer_embed() {
        // a = [[2]], b = [[1 2], [3 4]] embedded at (1, 1) of a 3x3 target.
        let a_data = vec![2.0];
        let b_data = vec![1.0, 2.0, 3.0, 4.0];
        let mut c_data = vec![0.0; 9];
        let a = DenseMat::new(&a_data, 1, 1);
        let b = DenseMat::new(&b_data, 2, 2);
        let mut c = DenseMatMut::new(&mut c_data, 3, 3);
        outer_embed(a, b, &mut c, 1.0, 1, 1);
        let expected = [
            0.0, 0.0, 0.0, //
            0.0, 2.0, 4.0, //
            0.0, 6.0, 8.0,
        ];
        assert_eq!(c_data, expected);
    }

    #[test]
    fn test_outer_embed_kron_order() {
        // Rows of the embedded product run a-major: row i*bm + k.
        let a_data = vec![1.0, 10.0];
        let b_data = vec![1.0, 2.0];
        let mut c_data = vec![0.0; 4];
        let a = DenseMat::new(&a_data, 2, 1);
        let b = DenseMat::new(&b_data, 2, 1);
        let mut c = DenseMatMut::new(&mut c_data, 4, 1);
        outer_embed(a, b, &mut c, 1.0, 0, 0);
        assert_eq!(c_data, vec![1.0, 2.0, 10.0, 20.0]);
    }
}
