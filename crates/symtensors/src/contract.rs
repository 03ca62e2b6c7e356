//! Recoupled contractions of block-sparse operators.
//!
//! [`OperatorFunctions`] implements the three operations a renormalization
//! sweep needs: in-place accumulation (`iadd`), the recoupled outer product
//! of two operators acting on adjacent spaces (`tensor_product`), and the
//! operator product over a shared intermediate space (`product`). Spin
//! recoupling enters through Wigner 9j and Racah coefficients; fermionic
//! anticommutation enters as a sign when an operator crosses an odd-particle
//! sector.
//!
//! Selection-rule misses contribute zero and are skipped silently. Errors
//! are reserved for structural misuse: mismatched buffers, an output with a
//! pending scalar factor, or conjugated operands (not implemented).

use std::rc::Rc;

use crate::arena::StackArena;
use crate::cg::ClebschGordan;
use crate::dense::{self, DenseMat, DenseMatMut};
use crate::error::TensorError;
use crate::tensor::BlockSparseTensor;

/// Scales below this magnitude contribute nothing measurable.
pub const TINY: f64 = 1e-20;

/// Contraction engine holding the shared recoupling-coefficient table.
#[derive(Debug)]
pub struct OperatorFunctions {
    cg: Rc<ClebschGordan>,
}

impl OperatorFunctions {
    pub fn new(cg: Rc<ClebschGordan>) -> Self {
        Self { cg }
    }

    #[inline]
    pub fn cg(&self) -> &Rc<ClebschGordan> {
        &self.cg
    }

    /// `a += scale * b`, folding both lazy factors in.
    ///
    /// `a`'s factor is normalized to 1 by rescaling its buffer first, so
    /// repeated accumulation targets stay factor-free.
    pub fn iadd(
        &self,
        arena: &mut StackArena<f64>,
        a: &mut BlockSparseTensor,
        b: &BlockSparseTensor,
        scale: f64,
    ) -> Result<(), TensorError> {
        if a.total_elements() != b.total_elements() {
            return Err(TensorError::BufferSizeMismatch {
                expected: a.total_elements(),
                actual: b.total_elements(),
            });
        }
        if a.factor != 1.0 {
            dense::scale(arena.slice_mut(a.handle()), a.factor);
            a.factor = 1.0;
        }
        if scale != 0.0 {
            let (src, dst) = arena.read_write(b.handle(), a.handle())?;
            dense::axpy(dst, src, scale * b.factor);
        }
        Ok(())
    }

    /// `c += scale * (a (x) b)`, recoupled into `c`'s sector structure.
    ///
    /// `a` acts on the first factor space and `b` on the second; each
    /// output sector pair receives the outer products of all compatible
    /// `(a, b)` block pairs, weighted by the 9j recoupling coefficient in
    /// textbook Clebsch-Gordan normalization and embedded at the running
    /// row/column offsets of the composite ordering.
    pub fn tensor_product(
        &self,
        arena: &mut StackArena<f64>,
        a: &BlockSparseTensor,
        b: &BlockSparseTensor,
        c: &BlockSparseTensor,
        scale: f64,
    ) -> Result<(), TensorError> {
        let scale = scale * a.factor * b.factor;
        if c.factor != 1.0 {
            return Err(TensorError::FactorNotNormalized { factor: c.factor });
        }
        if a.conj || b.conj {
            return Err(TensorError::ConjNotImplemented {
                kernel: "tensor_product",
            });
        }
        if scale.abs() < TINY {
            return Ok(());
        }
        let (alay, blay, clay) = (a.layout().clone(), b.layout().clone(), c.layout().clone());
        let (adq, bdq, cdq) = (alay.flow(), blay.flow(), clay.flow());
        let (adata, bdata, cdata) =
            arena.contraction_views(a.handle(), b.handle(), c.handle())?;
        for ic in 0..clay.len() {
            let ce = clay.entry(ic);
            let cq = ce.label.get_bra(cdq);
            let cqprime = ce.label.get_ket();
            // Running offsets follow the composite-basis enumeration order:
            // b-sector major, then each discrete a-sector candidate, whether
            // or not it contributes.
            let mut row_stride = 0usize;
            let mut col_stride = 0usize;
            for ib in 0..blay.len() {
                let be = blay.entry(ib);
                let bq = be.label.get_bra(bdq);
                let bqprime = be.label.get_ket();
                let aqs = cq - bq;
                let aqps = cqprime - bqprime;
                for k in 0..aqs.count() {
                    let aq = aqs.get(k);
                    let aqpds = aq - adq;
                    let mut n_bra = 0usize;
                    for l in 0..aqpds.count() {
                        let aqprime = aqpds.get(l);
                        let mut n_ket = 0usize;
                        if aqps.find(aqprime).is_some() {
                            if let Some(al) = adq.combine(aq, aqprime) {
                                if let Some(ia) = alay.find_block(al, 0) {
                                    let ae = alay.entry(ia);
                                    n_bra = ae.bra_dim as usize;
                                    n_ket = ae.ket_dim as usize;
                                    let mut factor = self.cg.wigner_9j(
                                        aqprime.twos,
                                        bqprime.twos,
                                        cqprime.twos,
                                        adq.twos,
                                        bdq.twos,
                                        cdq.twos,
                                        aq.twos,
                                        bq.twos,
                                        cq.twos,
                                    );
                                    factor *= f64::sqrt(
                                        ((cdq.twos + 1) as f64)
                                            * ((cqprime.twos + 1) as f64)
                                            * ((aq.twos + 1) as f64)
                                            * ((bq.twos + 1) as f64),
                                    );
                                    if blay.is_fermion() && aqprime.n & 1 != 0 {
                                        factor = -factor;
                                    }
                                    let ablock = DenseMat::new(
                                        &adata[ae.offset as usize
                                            ..ae.offset as usize + ae.elements()],
                                        n_bra,
                                        n_ket,
                                    );
                                    let bblock = DenseMat::new(
                                        &bdata[be.offset as usize
                                            ..be.offset as usize + be.elements()],
                                        be.bra_dim as usize,
                                        be.ket_dim as usize,
                                    );
                                    let mut cblock = DenseMatMut::new(
                                        &mut cdata[ce.offset as usize
                                            ..ce.offset as usize + ce.elements()],
                                        ce.bra_dim as usize,
                                        ce.ket_dim as usize,
                                    );
                                    dense::outer_embed(
                                        ablock,
                                        bblock,
                                        &mut cblock,
                                        scale * factor,
                                        row_stride,
                                        col_stride,
                                    );
                                }
                            }
                        }
                        col_stride += n_ket * be.ket_dim as usize;
                    }
                    row_stride += n_bra * be.bra_dim as usize;
                }
            }
        }
        Ok(())
    }

    /// `c += scale * a * b`, contracting over the shared intermediate
    /// sector between `a`'s ket side and `b`'s bra side.
    pub fn product(
        &self,
        arena: &mut StackArena<f64>,
        a: &BlockSparseTensor,
        b: &BlockSparseTensor,
        c: &BlockSparseTensor,
        scale: f64,
    ) -> Result<(), TensorError> {
        let scale = scale * a.factor * b.factor;
        if c.factor != 1.0 {
            return Err(TensorError::FactorNotNormalized { factor: c.factor });
        }
        if a.conj || b.conj {
            return Err(TensorError::ConjNotImplemented { kernel: "product" });
        }
        if scale.abs() < TINY {
            return Ok(());
        }
        let (alay, blay, clay) = (a.layout().clone(), b.layout().clone(), c.layout().clone());
        let (adq, bdq, cdq) = (alay.flow(), blay.flow(), clay.flow());
        let (adata, bdata, cdata) =
            arena.contraction_views(a.handle(), b.handle(), c.handle())?;
        for ic in 0..clay.len() {
            let ce = clay.entry(ic);
            let cq = ce.label.get_bra(cdq);
            let cqprime = ce.label.get_ket();
            let aps = cq - adq;
            for k in 0..aps.count() {
                let aqprime = aps.get(k);
                let mut ac = aqprime;
                ac.twos_low = cq.twos;
                let Some(ia) = alay.find_block(ac, 0) else {
                    continue;
                };
                let Some(bl) = bdq.combine(aqprime, cqprime) else {
                    continue;
                };
                let Some(ib) = blay.find_block(bl, 0) else {
                    continue;
                };
                let mut factor = self.cg.racah(
                    cqprime.twos,
                    bdq.twos,
                    cq.twos,
                    adq.twos,
                    aqprime.twos,
                    cdq.twos,
                );
                factor *= f64::sqrt(((cdq.twos + 1) * (aqprime.twos + 1)) as f64);
                if (adq.twos + bdq.twos - cdq.twos) & 2 != 0 {
                    factor = -factor;
                }
                let ae = alay.entry(ia);
                let be = blay.entry(ib);
                let ablock = DenseMat::new(
                    &adata[ae.offset as usize..ae.offset as usize + ae.elements()],
                    ae.bra_dim as usize,
                    ae.ket_dim as usize,
                );
                let bblock = DenseMat::new(
                    &bdata[be.offset as usize..be.offset as usize + be.elements()],
                    be.bra_dim as usize,
                    be.ket_dim as usize,
                );
                let mut cblock = DenseMatMut::new(
                    &mut cdata[ce.offset as usize..ce.offset as usize + ce.elements()],
                    ce.bra_dim as usize,
                    ce.ket_dim as usize,
                );
                dense::multiply(ablock, bblock, &mut cblock, scale * factor);
            }
        }
        Ok(())
    }
}
