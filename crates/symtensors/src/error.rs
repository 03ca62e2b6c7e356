//! Error types for symtensors.

use thiserror::Error;

/// Errors that can occur in block-sparse tensor operations.
///
/// Selection-rule misses (triangle violations, absent sectors) are not
/// errors: they mean "zero contribution" and are represented as `None` or
/// skipped iterations. The variants here are invariant violations where
/// silent continuation would corrupt later allocations or produce
/// physically wrong numbers.
#[derive(Debug, Error)]
pub enum TensorError {
    /// Arena capacity would be exceeded by an allocation.
    #[error("arena exhausted: requested {requested} elements with {used}/{capacity} in use")]
    ArenaExhausted {
        requested: usize,
        used: usize,
        capacity: usize,
    },

    /// Deallocation not in reverse allocation order.
    #[error(
        "deallocation not in reverse order: block at offset {offset} (len {len}) \
         is not the top of the arena (used = {used})"
    )]
    ArenaOrderViolation {
        offset: usize,
        len: usize,
        used: usize,
    },

    /// Allocation attempted while a reallocation compaction is in flight.
    #[error("allocation with pending reallocation shift {shift}")]
    ArenaShiftPending { shift: isize },

    /// Arena handle does not lie inside the arena.
    #[error("handle at offset {offset} (len {len}) out of bounds for arena of capacity {capacity}")]
    HandleOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// The write view of a contraction overlaps one of its read views.
    #[error("write block at offset {offset} (len {len}) overlaps a read block")]
    OverlappingViews { offset: usize, len: usize },

    /// Two buffers expected to be commensurate have different lengths.
    #[error("buffer length mismatch: expected {expected} elements, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Block index out of range for a layout.
    #[error("block {index} out of range for layout with {n} blocks")]
    BlockOutOfRange { index: usize, n: usize },

    /// Block label not present in a layout.
    #[error("block {label} not found in layout")]
    BlockNotFound { label: String },

    /// An accumulation target must carry a unit scalar factor.
    #[error("contraction output has non-unit factor {factor}")]
    FactorNotNormalized { factor: f64 },

    /// Conjugated operands are not supported by the contraction kernels.
    #[error("conjugated operand not implemented in {kernel}")]
    ConjNotImplemented { kernel: &'static str },
}
