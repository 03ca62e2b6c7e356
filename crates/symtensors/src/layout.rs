//! Block layouts for symmetry-adapted sparse tensors.
//!
//! A [`BlockLayout`] lists the nonzero sectors of an operator or
//! wavefunction between a bra and a ket state space under a fixed flow
//! label, together with the dense dimensions of each block and its offset in
//! a flat buffer. Layouts are immutable after [`BlockLayout::build`] and are
//! shared across tensors via `Rc`: every primitive operator with the same
//! flow label over the same spaces aliases one layout.
//!
//! Each stored entry label is the ket-side label with `twos_low` repurposed
//! to hold the bra spin, so one label fully identifies the sector pair (see
//! [`QuantumLabel::combine`]). For wavefunction layouts the conjugated ket
//! label is stored instead, which keeps the coupled bra x ket pairing a
//! single sorted index.

use std::fmt;

use crate::quantum::QuantumLabel;
use crate::state::StateSpace;

/// One nonzero sector pair of a layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockEntry {
    /// Ket label with `twos_low` holding the bra spin (conjugated for
    /// wavefunction layouts).
    pub label: QuantumLabel,
    /// Bra-side dense dimension.
    pub bra_dim: u16,
    /// Ket-side dense dimension.
    pub ket_dim: u16,
    /// Element offset of this block in the flat buffer.
    pub offset: u32,
}

impl BlockEntry {
    /// Dense element count of this block.
    #[inline]
    pub fn elements(&self) -> usize {
        self.bra_dim as usize * self.ket_dim as usize
    }
}

/// Sector-pair layout of a block-sparse tensor.
#[derive(Debug)]
pub struct BlockLayout {
    flow: QuantumLabel,
    fermion: bool,
    wavefunction: bool,
    entries: Vec<BlockEntry>,
}

impl BlockLayout {
    /// Enumerate the sector pairs connected by `flow` between `bra` and
    /// `ket` and lay their blocks out contiguously in label order.
    ///
    /// A wavefunction layout pairs the target-sector bra with conjugated
    /// ket labels; `fermion` records whether the operator changes particle
    /// number parity (it drives sign bookkeeping during recoupled
    /// contractions, not the layout itself).
    pub fn build(
        bra: &StateSpace,
        ket: &StateSpace,
        flow: QuantumLabel,
        fermion: bool,
        wavefunction: bool,
    ) -> Self {
        let mut labels = Vec::with_capacity(ket.len());
        for s in ket.sectors() {
            let q = if wavefunction { -s.label } else { s.label };
            let bs = flow + q;
            for k in 0..bs.count() {
                if bra.find_state(bs.get(k)).is_some() {
                    let mut stored = q;
                    stored.twos_low = bs.get(k).twos;
                    labels.push(stored);
                }
            }
        }
        labels.sort();
        let mut entries = Vec::with_capacity(labels.len());
        let mut offset = 0u32;
        for label in labels {
            let ket_label = if wavefunction {
                -label.get_ket()
            } else {
                label.get_ket()
            };
            // Both lookups succeed: the labels were produced from these
            // tables above.
            let ket_dim = ket
                .find_state(ket_label)
                .map(|i| ket.multiplicity(i))
                .unwrap_or(0);
            let bra_dim = bra
                .find_state(label.get_bra(flow))
                .map(|i| bra.multiplicity(i))
                .unwrap_or(0);
            entries.push(BlockEntry {
                label,
                bra_dim,
                ket_dim,
                offset,
            });
            offset += bra_dim as u32 * ket_dim as u32;
        }
        Self {
            flow,
            fermion,
            wavefunction,
            entries,
        }
    }

    /// Flow label connecting ket sectors to bra sectors.
    #[inline]
    pub fn flow(&self) -> QuantumLabel {
        self.flow
    }

    #[inline]
    pub fn is_fermion(&self) -> bool {
        self.fermion
    }

    #[inline]
    pub fn is_wavefunction(&self) -> bool {
        self.wavefunction
    }

    /// Number of blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entry(&self, i: usize) -> &BlockEntry {
        &self.entries[i]
    }

    #[inline]
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Binary search for a stored sector-pair label, restricted to entries
    /// at or after `start`.
    pub fn find_block(&self, q: QuantumLabel, start: usize) -> Option<usize> {
        match self.entries[start..].binary_search_by(|e| e.label.cmp(&q)) {
            Ok(i) => Some(start + i),
            Err(_) => None,
        }
    }

    /// Total element count of the flat buffer backing this layout.
    pub fn total_elements(&self) -> usize {
        match self.entries.last() {
            None => 0,
            Some(e) => e.offset as usize + e.elements(),
        }
    }
}

impl fmt::Display for BlockLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "DQ={} N={} SIZE={}",
            self.flow,
            self.entries.len(),
            self.total_elements()
        )?;
        for e in &self.entries {
            writeln!(
                f,
                "BRA {} KET {} [ {}x{} ]",
                e.label.get_bra(self.flow),
                if self.wavefunction {
                    -e.label.get_ket()
                } else {
                    e.label.get_ket()
                },
                e.bra_dim,
                e.ket_dim
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> StateSpace {
        StateSpace::new(vec![
            (QuantumLabel::new(0, 0, 0), 1),
            (QuantumLabel::new(1, 1, 0), 1),
            (QuantumLabel::new(2, 0, 0), 1),
        ])
    }

    #[test]
    fn test_identity_layout_is_diagonal() {
        let basis = site();
        let layout = BlockLayout::build(&basis, &basis, QuantumLabel::vacuum(), false, false);
        assert_eq!(layout.len(), 3);
        for (e, s) in layout.entries().iter().zip(basis.sectors()) {
            assert_eq!(e.label.get_ket(), s.label);
            assert_eq!(e.label.get_bra(layout.flow()), s.label);
            assert_eq!((e.bra_dim, e.ket_dim), (1, 1));
        }
        assert_eq!(layout.total_elements(), 3);
    }

    #[test]
    fn test_creation_layout() {
        let basis = site();
        // Creation operator: adds one particle with spin 1/2.
        let flow = QuantumLabel::new(1, 1, 0);
        let layout = BlockLayout::build(&basis, &basis, flow, true, false);
        // vacuum -> (1, 1/2) and (1, 1/2) -> (2, 0).
        assert_eq!(layout.len(), 2);
        assert_eq!(layout.entry(0).label.get_ket(), QuantumLabel::new(0, 0, 0));
        assert_eq!(
            layout.entry(0).label.get_bra(flow),
            QuantumLabel::new(1, 1, 0)
        );
        assert_eq!(layout.entry(1).label.get_ket(), QuantumLabel::new(1, 1, 0));
        assert_eq!(
            layout.entry(1).label.get_bra(flow),
            QuantumLabel::new(2, 0, 0)
        );
        assert!(layout.is_fermion());
    }

    #[test]
    fn test_offsets_are_prefix_sums() {
        let big = StateSpace::new(vec![
            (QuantumLabel::new(0, 0, 0), 2),
            (QuantumLabel::new(1, 1, 0), 3),
            (QuantumLabel::new(2, 0, 0), 4),
        ]);
        let layout = BlockLayout::build(&big, &big, QuantumLabel::vacuum(), false, false);
        let mut expected = 0u32;
        for e in layout.entries() {
            assert_eq!(e.offset, expected);
            expected += e.elements() as u32;
        }
        assert_eq!(layout.total_elements(), expected as usize);
        assert_eq!(layout.total_elements(), 4 + 9 + 16);
    }

    #[test]
    fn test_wavefunction_layout_conjugates_ket() {
        let target = QuantumLabel::new(2, 0, 0);
        let mut left = site();
        let mut right = site();
        // Prune both sides against the target before laying out.
        StateSpace::filter(&mut left, &mut right, target);
        let layout = BlockLayout::build(&left, &right, target, false, true);
        // Each surviving pair couples a left sector with the conjugated
        // right sector reaching the target.
        assert!(!layout.is_empty());
        for e in layout.entries() {
            let bra = e.label.get_bra(target);
            let ket = -e.label.get_ket();
            assert!(left.find_state(bra).is_some());
            assert!(right.find_state(ket).is_some());
            // The coupled pair must reach the target sector.
            assert!((bra + ket).find(target).is_some());
        }
        assert!(layout.is_wavefunction());
    }

    #[test]
    fn test_find_block_with_start() {
        let basis = site();
        let layout = BlockLayout::build(&basis, &basis, QuantumLabel::vacuum(), false, false);
        let q = layout.entry(1).label;
        assert_eq!(layout.find_block(q, 0), Some(1));
        assert_eq!(layout.find_block(q, 1), Some(1));
        assert_eq!(layout.find_block(q, 2), None);
    }
}
