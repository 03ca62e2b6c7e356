//! Stack-discipline arena allocator.
//!
//! Sector tables, layouts and tensors in a sweep are built and torn down in
//! strict nesting order, so their buffers live in a bump arena that only
//! frees from the top. Allocations are identified by opaque [`ArenaHandle`]s
//! rather than raw pointers; out-of-order deallocation is a reported error,
//! never silent corruption.
//!
//! `reallocate` keeps the performance contract explicit: resizing the top
//! allocation is O(1) and leaves the handle offset unchanged, while resizing
//! an interior allocation relocates it. A sequence of reallocations over
//! successively later blocks compacts the arena in a single left-to-right
//! pass (the running `shift` below), which is how a layout shrinks to its
//! final block count after a scratch table above it is released.

use crate::error::TensorError;

/// Opaque handle to an arena allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaHandle {
    offset: usize,
    len: usize,
}

impl ArenaHandle {
    /// Offset of the allocation in elements from the arena base.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the allocation in elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for zero-length allocations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn end(&self) -> usize {
        self.offset + self.len
    }

    fn overlaps(&self, other: &ArenaHandle) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Bump arena with last-in-first-out deallocation.
#[derive(Debug)]
pub struct StackArena<T> {
    data: Vec<T>,
    used: usize,
    shift: isize,
}

impl<T: Copy + Default> StackArena<T> {
    /// Create an arena holding at most `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity],
            used: 0,
            shift: 0,
        }
    }

    /// Number of elements currently allocated.
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total capacity in elements.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Allocate `len` elements from the top of the arena.
    ///
    /// The returned slice keeps whatever was last written at that region;
    /// callers that need zeroed memory clear it through [`Self::slice_mut`].
    pub fn allocate(&mut self, len: usize) -> Result<ArenaHandle, TensorError> {
        if self.shift != 0 {
            return Err(TensorError::ArenaShiftPending { shift: self.shift });
        }
        if self.used + len > self.data.len() {
            return Err(TensorError::ArenaExhausted {
                requested: len,
                used: self.used,
                capacity: self.data.len(),
            });
        }
        let handle = ArenaHandle {
            offset: self.used,
            len,
        };
        self.used += len;
        Ok(handle)
    }

    /// Release an allocation. Must be the most recently allocated block.
    pub fn deallocate(&mut self, handle: ArenaHandle) -> Result<(), TensorError> {
        if handle.len == 0 {
            return Ok(());
        }
        if self.used < handle.len || handle.offset != self.used - handle.len {
            return Err(TensorError::ArenaOrderViolation {
                offset: handle.offset,
                len: handle.len,
                used: self.used,
            });
        }
        self.used -= handle.len;
        Ok(())
    }

    /// Resize an allocation.
    ///
    /// If `handle` is the top allocation the block grows or shrinks in
    /// place and the returned handle has the same offset. Otherwise the
    /// retained prefix is relocated downward by the running compaction
    /// shift; interleaving a plain `allocate` before the compaction reaches
    /// the top again is rejected by [`Self::allocate`].
    pub fn reallocate(
        &mut self,
        handle: ArenaHandle,
        new_len: usize,
    ) -> Result<ArenaHandle, TensorError> {
        if handle.end() > self.data.len() {
            return Err(TensorError::HandleOutOfBounds {
                offset: handle.offset,
                len: handle.len,
                capacity: self.data.len(),
            });
        }
        let dst = handle.offset as isize + self.shift;
        debug_assert!(dst >= 0);
        let dst = dst as usize;
        let new_used = self.used as isize + new_len as isize - handle.len as isize;
        if new_used < 0 || dst + new_len > self.data.len() {
            return Err(TensorError::ArenaExhausted {
                requested: new_len,
                used: self.used,
                capacity: self.data.len(),
            });
        }
        if dst != handle.offset {
            let keep = handle.len.min(new_len);
            self.data
                .copy_within(handle.offset..handle.offset + keep, dst);
        }
        self.shift += new_len as isize - handle.len as isize;
        self.used = new_used as usize;
        if dst + new_len == self.used {
            // Compaction has reached the top of the arena again.
            self.shift = 0;
        }
        Ok(ArenaHandle {
            offset: dst,
            len: new_len,
        })
    }

    /// Shared view of an allocation.
    #[inline]
    pub fn slice(&self, handle: ArenaHandle) -> &[T] {
        &self.data[handle.offset..handle.end()]
    }

    /// Mutable view of an allocation.
    #[inline]
    pub fn slice_mut(&mut self, handle: ArenaHandle) -> &mut [T] {
        &mut self.data[handle.offset..handle.end()]
    }

    /// Simultaneous read view of `read` and write view of `write`.
    ///
    /// Errors if the two ranges overlap.
    pub fn read_write(
        &mut self,
        read: ArenaHandle,
        write: ArenaHandle,
    ) -> Result<(&[T], &mut [T]), TensorError> {
        self.check_bounds(read)?;
        self.check_bounds(write)?;
        if read.overlaps(&write) {
            return Err(TensorError::OverlappingViews {
                offset: write.offset,
                len: write.len,
            });
        }
        let base = self.data.as_mut_ptr();
        // Safety: both ranges are in bounds and disjoint, so the shared and
        // exclusive views never alias.
        unsafe {
            let r = std::slice::from_raw_parts(base.add(read.offset), read.len);
            let w = std::slice::from_raw_parts_mut(base.add(write.offset), write.len);
            Ok((r, w))
        }
    }

    /// Two read views plus one write view, for contraction kernels.
    ///
    /// The read handles may alias each other (a tensor aliased to a
    /// primitive operator buffer is legal); the write handle must be
    /// disjoint from both.
    pub fn contraction_views(
        &mut self,
        read_a: ArenaHandle,
        read_b: ArenaHandle,
        write: ArenaHandle,
    ) -> Result<(&[T], &[T], &mut [T]), TensorError> {
        self.check_bounds(read_a)?;
        self.check_bounds(read_b)?;
        self.check_bounds(write)?;
        if write.overlaps(&read_a) || write.overlaps(&read_b) {
            return Err(TensorError::OverlappingViews {
                offset: write.offset,
                len: write.len,
            });
        }
        let base = self.data.as_mut_ptr();
        // Safety: all ranges are in bounds and the exclusive range is
        // disjoint from both shared ranges.
        unsafe {
            let a = std::slice::from_raw_parts(base.add(read_a.offset), read_a.len);
            let b = std::slice::from_raw_parts(base.add(read_b.offset), read_b.len);
            let w = std::slice::from_raw_parts_mut(base.add(write.offset), write.len);
            Ok((a, b, w))
        }
    }

    fn check_bounds(&self, handle: ArenaHandle) -> Result<(), TensorError> {
        if handle.end() > self.data.len() {
            Err(TensorError::HandleOutOfBounds {
                offset: handle.offset,
                len: handle.len,
                capacity: self.data.len(),
            })
        } else {
            Ok(())
        }
    }
}
