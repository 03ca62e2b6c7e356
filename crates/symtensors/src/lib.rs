//! symtensors - symmetry-adapted block-sparse tensor algebra
//!
//! This crate provides the tensor core of a spin-adapted renormalization
//! sweep over fermionic lattice models: quantum number labels with SU(2)
//! coupling arithmetic, Wigner/Racah recoupling coefficients, symmetry
//! sector enumeration, arena-backed block-sparse storage, and the recoupled
//! contraction kernels that combine operators across adjacent spaces.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Symbolic layer (expr module)
//!     → OpExpr, operator sums and products
//!
//! Level 2: Block-sparse engine (layout, tensor, contract)
//!     → BlockLayout, BlockSparseTensor, OperatorFunctions
//!
//! Level 3: Foundations (quantum, cg, state, arena, dense)
//!     → labels, recoupling coefficients, sector tables,
//!       stack arena, faer-backed dense kernels
//! ```
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use symtensors::{
//!     BlockLayout, BlockSparseTensor, ClebschGordan, OperatorFunctions,
//!     QuantumLabel, StackArena, StateSpace,
//! };
//!
//! // One fermionic orbital: vacuum, singly occupied (spin 1/2), doubly
//! // occupied.
//! let site = StateSpace::new(vec![
//!     (QuantumLabel::new(0, 0, 0), 1),
//!     (QuantumLabel::new(1, 1, 0), 1),
//!     (QuantumLabel::new(2, 0, 0), 1),
//! ]);
//!
//! // Identity operator: diagonal blocks, all 1.
//! let mut arena = StackArena::with_capacity(1 << 10);
//! let layout = Rc::new(BlockLayout::build(
//!     &site, &site, QuantumLabel::vacuum(), false, false,
//! ));
//! let ident = BlockSparseTensor::allocate(layout, &mut arena).unwrap();
//! for i in 0..ident.layout().len() {
//!     ident.block_mut(&mut arena, i).unwrap().set(0, 0, 1.0);
//! }
//!
//! // I * I = I under the recoupled operator product.
//! let funcs = OperatorFunctions::new(Rc::new(ClebschGordan::new(20)));
//! let out = BlockSparseTensor::allocate(ident.layout().clone(), &mut arena).unwrap();
//! funcs.product(&mut arena, &ident, &ident, &out, 1.0).unwrap();
//! for i in 0..out.layout().len() {
//!     assert!((out.block(&arena, i).unwrap().get(0, 0) - 1.0).abs() < 1e-12);
//! }
//! ```

pub mod arena;
pub mod cg;
pub mod contract;
pub mod dense;
pub mod error;
pub mod expr;
pub mod layout;
pub mod quantum;
pub mod state;
pub mod tensor;

pub use arena::{ArenaHandle, StackArena};
pub use cg::ClebschGordan;
pub use contract::{OperatorFunctions, TINY};
pub use error::TensorError;
pub use expr::{OpElement, OpExpr, OpName, OpProduct};
pub use layout::{BlockEntry, BlockLayout};
pub use quantum::QuantumLabel;
pub use state::{Sector, StateSpace};
pub use tensor::BlockSparseTensor;
