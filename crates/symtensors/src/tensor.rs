//! Arena-backed block-sparse tensors.
//!
//! A [`BlockSparseTensor`] is a handle into a [`StackArena`] plus a shared
//! [`BlockLayout`] describing which sector pair each stored rectangle
//! belongs to. The numeric buffer is not owned: tensors are allocated and
//! released in stack order alongside the sweep that uses them, and several
//! tensors may alias one buffer (a primitive operator reused under two
//! flow labels differs only in layout and scalar factor).
//!
//! The scalar `factor` is lazy: scaling a tensor multiplies the factor, not
//! the buffer. Kernels fold it in when they consume the tensor.

use std::rc::Rc;

use rand::Rng;

use crate::arena::{ArenaHandle, StackArena};
use crate::dense::{DenseMat, DenseMatMut};
use crate::error::TensorError;
use crate::layout::BlockLayout;
use crate::quantum::QuantumLabel;

/// Block-sparse tensor: shared layout, arena handle, lazy scalar factor.
#[derive(Clone, Debug)]
pub struct BlockSparseTensor {
    layout: Rc<BlockLayout>,
    handle: ArenaHandle,
    /// Lazy scalar multiplier applied to every element.
    pub factor: f64,
    /// Marks the operand as conjugated; contraction kernels reject it.
    pub conj: bool,
}

impl BlockSparseTensor {
    /// Allocate a zeroed buffer for `layout` from the top of `arena`.
    pub fn allocate(
        layout: Rc<BlockLayout>,
        arena: &mut StackArena<f64>,
    ) -> Result<Self, TensorError> {
        let handle = arena.allocate(layout.total_elements())?;
        arena.slice_mut(handle).fill(0.0);
        Ok(Self {
            layout,
            handle,
            factor: 1.0,
            conj: false,
        })
    }

    /// View an existing buffer through `layout` without copying.
    pub fn alias(layout: Rc<BlockLayout>, handle: ArenaHandle) -> Result<Self, TensorError> {
        if handle.len() != layout.total_elements() {
            return Err(TensorError::BufferSizeMismatch {
                expected: layout.total_elements(),
                actual: handle.len(),
            });
        }
        Ok(Self {
            layout,
            handle,
            factor: 1.0,
            conj: false,
        })
    }

    /// Release the buffer. Must be the top allocation of `arena`.
    pub fn deallocate(&self, arena: &mut StackArena<f64>) -> Result<(), TensorError> {
        arena.deallocate(self.handle)
    }

    #[inline]
    pub fn layout(&self) -> &Rc<BlockLayout> {
        &self.layout
    }

    #[inline]
    pub fn handle(&self) -> ArenaHandle {
        self.handle
    }

    #[inline]
    pub fn total_elements(&self) -> usize {
        self.handle.len()
    }

    /// Dense row-major view of block `idx` (bra rows, ket columns).
    pub fn block<'a>(
        &self,
        arena: &'a StackArena<f64>,
        idx: usize,
    ) -> Result<DenseMat<'a>, TensorError> {
        let e = self.entry_checked(idx)?;
        let data = &arena.slice(self.handle)[e.offset as usize..e.offset as usize + e.elements()];
        Ok(DenseMat::new(data, e.bra_dim as usize, e.ket_dim as usize))
    }

    /// Mutable dense view of block `idx`.
    pub fn block_mut<'a>(
        &self,
        arena: &'a mut StackArena<f64>,
        idx: usize,
    ) -> Result<DenseMatMut<'a>, TensorError> {
        let e = *self.entry_checked(idx)?;
        let data =
            &mut arena.slice_mut(self.handle)[e.offset as usize..e.offset as usize + e.elements()];
        Ok(DenseMatMut::new(
            data,
            e.bra_dim as usize,
            e.ket_dim as usize,
        ))
    }

    /// Dense view of the block with stored sector-pair label `q`.
    pub fn block_by_label<'a>(
        &self,
        arena: &'a StackArena<f64>,
        q: QuantumLabel,
    ) -> Result<DenseMat<'a>, TensorError> {
        let idx = self
            .layout
            .find_block(q, 0)
            .ok_or_else(|| TensorError::BlockNotFound {
                label: q.to_string(),
            })?;
        self.block(arena, idx)
    }

    /// Copy the raw buffer of `other` into this tensor.
    pub fn copy_data_from(
        &self,
        arena: &mut StackArena<f64>,
        other: &BlockSparseTensor,
    ) -> Result<(), TensorError> {
        if other.handle.len() != self.handle.len() {
            return Err(TensorError::BufferSizeMismatch {
                expected: self.handle.len(),
                actual: other.handle.len(),
            });
        }
        let (src, dst) = arena.read_write(other.handle, self.handle)?;
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Fill the buffer with uniform values in `[0, 1)`.
    pub fn randomize<R: Rng>(&self, arena: &mut StackArena<f64>, rng: &mut R) {
        for v in arena.slice_mut(self.handle) {
            *v = rng.random();
        }
    }

    fn entry_checked(&self, idx: usize) -> Result<&crate::layout::BlockEntry, TensorError> {
        if idx >= self.layout.len() {
            return Err(TensorError::BlockOutOfRange {
                index: idx,
                n: self.layout.len(),
            });
        }
        Ok(self.layout.entry(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateSpace;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn basis() -> StateSpace {
        StateSpace::new(vec![
            (QuantumLabel::new(0, 0, 0), 2),
            (QuantumLabel::new(1, 1, 0), 3),
        ])
    }

    fn identity_layout() -> Rc<BlockLayout> {
        let b = basis();
        Rc::new(BlockLayout::build(
            &b,
            &b,
            QuantumLabel::vacuum(),
            false,
            false,
        ))
    }

    #[test]
    fn test_allocate_zeroed_blocks() {
        let mut arena = StackArena::with_capacity(64);
        let t = BlockSparseTensor::allocate(identity_layout(), &mut arena).unwrap();
        assert_eq!(t.total_elements(), 4 + 9);
        for i in 0..t.layout().len() {
            let b = t.block(&arena, i).unwrap();
            for r in 0..b.rows() {
                for c in 0..b.cols() {
                    assert_eq!(b.get(r, c), 0.0);
                }
            }
        }
    }

    #[test]
    fn test_block_mut_and_label_lookup() {
        let mut arena = StackArena::with_capacity(64);
        let t = BlockSparseTensor::allocate(identity_layout(), &mut arena).unwrap();
        {
            let mut b = t.block_mut(&mut arena, 1).unwrap();
            b.set(2, 1, 7.0);
        }
        let q = t.layout().entry(1).label;
        let b = t.block_by_label(&arena, q).unwrap();
        assert_eq!(b.get(2, 1), 7.0);

        assert!(matches!(
            t.block(&arena, 5),
            Err(TensorError::BlockOutOfRange { index: 5, n: 2 })
        ));
        assert!(matches!(
            t.block_by_label(&arena, QuantumLabel::new(9, 1, 0)),
            Err(TensorError::BlockNotFound { .. })
        ));
    }

    #[test]
    fn test_alias_shares_buffer() {
        let mut arena = StackArena::with_capacity(64);
        let layout = identity_layout();
        let t = BlockSparseTensor::allocate(layout.clone(), &mut arena).unwrap();
        {
            let mut b = t.block_mut(&mut arena, 0).unwrap();
            b.set(0, 0, 3.5);
        }
        let view = BlockSparseTensor::alias(layout, t.handle()).unwrap();
        assert_eq!(view.block(&arena, 0).unwrap().get(0, 0), 3.5);
    }

    #[test]
    fn test_alias_size_mismatch() {
        let mut arena: StackArena<f64> = StackArena::with_capacity(64);
        let h = arena.allocate(5).unwrap();
        assert!(matches!(
            BlockSparseTensor::alias(identity_layout(), h),
            Err(TensorError::BufferSizeMismatch { expected: 13, actual: 5 })
        ));
    }

    #[test]
    fn test_copy_data_from() {
        let mut arena = StackArena::with_capacity(64);
        let layout = identity_layout();
        let a = BlockSparseTensor::allocate(layout.clone(), &mut arena).unwrap();
        let b = BlockSparseTensor::allocate(layout, &mut arena).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        a.randomize(&mut arena, &mut rng);
        b.copy_data_from(&mut arena, &a).unwrap();
        assert_eq!(arena.slice(a.handle()), arena.slice(b.handle()));
    }

    #[test]
    fn test_randomize_range() {
        let mut arena = StackArena::with_capacity(64);
        let t = BlockSparseTensor::allocate(identity_layout(), &mut arena).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        t.randomize(&mut arena, &mut rng);
        let data = arena.slice(t.handle());
        assert!(data.iter().all(|&v| (0.0..1.0).contains(&v)));
        assert!(data.iter().any(|&v| v != 0.0));
    }
}
