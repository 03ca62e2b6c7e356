//! Symmetry sector tables.
//!
//! A [`StateSpace`] lists the symmetry sectors spanned by a set of many-body
//! basis states: a sorted table of discrete [`QuantumLabel`]s with the number
//! of states carrying each label. Composite spaces are built by coupling two
//! tables with [`StateSpace::tensor_product`] and pruned against a target
//! sector with [`StateSpace::filter`].
//!
//! Multiplicities are `u16` and saturate at 65535 rather than overflow; the
//! saturated count only feeds truncation decisions, never block dimensions of
//! allocated tensors.

use std::fmt;

use crate::quantum::QuantumLabel;

/// One symmetry sector: a discrete label and its state count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sector {
    pub label: QuantumLabel,
    pub multiplicity: u16,
}

/// Sorted table of symmetry sectors with multiplicities.
///
/// # Example
///
/// ```
/// use symtensors::{QuantumLabel, StateSpace};
///
/// // Single fermionic site: vacuum, one electron (spin 1/2), doubly occupied.
/// let site = StateSpace::new(vec![
///     (QuantumLabel::new(0, 0, 0), 1),
///     (QuantumLabel::new(1, 1, 0), 1),
///     (QuantumLabel::new(2, 0, 0), 1),
/// ]);
/// assert_eq!(site.total(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StateSpace {
    sectors: Vec<Sector>,
    total: u32,
}

impl StateSpace {
    /// Table from `(label, multiplicity)` pairs; sorts and recomputes the
    /// total, without merging duplicates.
    pub fn new(pairs: Vec<(QuantumLabel, u16)>) -> Self {
        let mut space = Self {
            sectors: pairs
                .into_iter()
                .map(|(label, multiplicity)| Sector {
                    label,
                    multiplicity,
                })
                .collect(),
            total: 0,
        };
        space.sort_states();
        space
    }

    /// Table holding a single sector with one state.
    pub fn single(label: QuantumLabel) -> Self {
        Self {
            sectors: vec![Sector {
                label,
                multiplicity: 1,
            }],
            total: 1,
        }
    }

    /// Number of sectors.
    #[inline]
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Total state count across all sectors.
    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[inline]
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    #[inline]
    pub fn label(&self, i: usize) -> QuantumLabel {
        self.sectors[i].label
    }

    #[inline]
    pub fn multiplicity(&self, i: usize) -> u16 {
        self.sectors[i].multiplicity
    }

    /// Binary search for a discrete label.
    pub fn find_state(&self, q: QuantumLabel) -> Option<usize> {
        self.sectors
            .binary_search_by(|s| s.label.cmp(&q))
            .ok()
    }

    fn sort_states(&mut self) {
        self.sectors.sort_by_key(|s| s.label);
        self.total = self
            .sectors
            .iter()
            .map(|s| s.multiplicity as u32)
            .sum();
    }

    /// Merge duplicate labels (saturating), drop empty sectors and labels
    /// above `target`, and recompute the total.
    pub fn collect(&mut self, target: QuantumLabel) {
        let keep = self.sectors.partition_point(|s| s.label <= target);
        self.sectors.truncate(keep);
        let mut k: Option<usize> = None;
        let mut out = 0usize;
        for i in 0..self.sectors.len() {
            let s = self.sectors[i];
            if s.multiplicity == 0 {
                continue;
            }
            match k {
                Some(j) if self.sectors[j].label == s.label => {
                    self.sectors[j].multiplicity =
                        self.sectors[j].multiplicity.saturating_add(s.multiplicity);
                }
                _ => {
                    self.sectors[out] = s;
                    k = Some(out);
                    out += 1;
                }
            }
        }
        self.sectors.truncate(out);
        self.sectors.shrink_to_fit();
        self.total = self
            .sectors
            .iter()
            .map(|s| s.multiplicity as u32)
            .sum();
    }

    /// Couple every sector pair of `a` and `b`, expanding each spin
    /// multiplet into its discrete members, then merge and discard sectors
    /// above `target`.
    pub fn tensor_product(a: &StateSpace, b: &StateSpace, target: QuantumLabel) -> StateSpace {
        let mut sectors = Vec::new();
        for sa in &a.sectors {
            for sb in &b.sectors {
                let qc = sa.label + sb.label;
                let nprod = sa.multiplicity as u32 * sb.multiplicity as u32;
                let multiplicity = nprod.min(u16::MAX as u32) as u16;
                for k in 0..qc.count() {
                    sectors.push(Sector {
                        label: qc.get(k),
                        multiplicity,
                    });
                }
            }
        }
        let mut c = StateSpace { sectors, total: 0 };
        c.sort_states();
        c.collect(target);
        c
    }

    /// Two-sided consistency pruning: cap each sector's multiplicity by the
    /// number of complementary-side states that can pair with it to reach
    /// `target`. Idempotent.
    pub fn filter(a: &mut StateSpace, b: &mut StateSpace, target: QuantumLabel) {
        Self::filter_one_side(a, b, target);
        Self::filter_one_side(b, a, target);
    }

    fn filter_one_side(a: &mut StateSpace, b: &StateSpace, target: QuantumLabel) {
        a.total = 0;
        for s in &mut a.sectors {
            let qb = target - s.label;
            let mut reachable = 0u32;
            for k in 0..qb.count() {
                if let Some(idx) = b.find_state(qb.get(k)) {
                    reachable += b.sectors[idx].multiplicity as u32;
                }
            }
            s.multiplicity = (s.multiplicity as u32).min(reachable) as u16;
            a.total += s.multiplicity as u32;
        }
    }
}

impl fmt::Display for StateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.sectors {
            writeln!(f, "{} : {}", s.label, s.multiplicity)?;
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
    fn test_new_sorts_and_totals() {
        let s = StateSpace::new(vec![
            (QuantumLabel::new(2, 0, 0), 3),
            (QuantumLabel::new(0, 0, 0), 1),
            (QuantumLabel::new(1, 1, 0), 2),
        ]);
        assert_eq!(s.label(0), QuantumLabel::new(0, 0, 0));
        assert_eq!(s.label(2), QuantumLabel::new(2, 0, 0));
        assert_eq!(s.total(), 6);
    }

    #[test]
    fn test_find_state() {
        let s = site();
        assert_eq!(s.find_state(QuantumLabel::new(1, 1, 0)), Some(1));
        assert_eq!(s.find_state(QuantumLabel::new(1, 1, 1)), None);
    }

    #[test]
    fn test_tensor_product_two_sites() {
        let target = QuantumLabel::new(4, 4, 0);
        let c = StateSpace::tensor_product(&site(), &site(), target);
        // 16 Fock states grouped into 10 multiplets over 6 sectors.
        let expected = [
            (QuantumLabel::new(0, 0, 0), 1),
            (QuantumLabel::new(1, 1, 0), 2),
            (QuantumLabel::new(2, 0, 0), 3),
            (QuantumLabel::new(2, 2, 0), 1),
            (QuantumLabel::new(3, 1, 0), 2),
            (QuantumLabel::new(4, 0, 0), 1),
        ];
        assert_eq!(c.len(), expected.len());
        for (i, (q, m)) in expected.iter().enumerate() {
            assert_eq!(c.label(i), *q);
            assert_eq!(c.multiplicity(i), *m);
        }
        assert_eq!(c.total(), 10);
    }

    #[test]
    fn test_tensor_product_target_cutoff() {
        // Labels above the target sector are discarded.
        let target = QuantumLabel::new(2, 0, 0);
        let c = StateSpace::tensor_product(&site(), &site(), target);
        assert_eq!(c.len(), 3);
        assert_eq!(c.label(c.len() - 1), QuantumLabel::new(2, 0, 0));
    }

    #[test]
    fn test_collect_merges_and_saturates() {
        let mut s = StateSpace::new(vec![
            (QuantumLabel::new(0, 0, 0), 40000),
            (QuantumLabel::new(0, 0, 0), 40000),
            (QuantumLabel::new(1, 1, 0), 0),
            (QuantumLabel::new(2, 0, 0), 2),
        ]);
        s.collect(QuantumLabel::new(9, 9, 0));
        assert_eq!(s.len(), 2);
        assert_eq!(s.multiplicity(0), u16::MAX);
        assert_eq!(s.label(1), QuantumLabel::new(2, 0, 0));
        assert_eq!(s.total(), u16::MAX as u32 + 2);
    }

    #[test]
    fn test_filter_against_target() {
        let target = QuantumLabel::new(2, 0, 0);
        let mut left = StateSpace::tensor_product(&site(), &site(), target);
        let mut right = StateSpace::single(QuantumLabel::vacuum());
        StateSpace::filter(&mut left, &mut right, target);
        // Only the target sector itself can pair with the vacuum.
        let alive: Vec<_> = left
            .sectors()
            .iter()
            .filter(|s| s.multiplicity > 0)
            .collect();
        assert_eq!(alive.len(), 1);
        assert_eq!(alive[0].label, target);
        assert_eq!(left.total(), alive[0].multiplicity as u32);
        assert_eq!(right.total(), 1);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let target = QuantumLabel::new(2, 0, 0);
        let mut a = StateSpace::tensor_product(&site(), &site(), target);
        let mut b = site();
        StateSpace::filter(&mut a, &mut b, target);
        let (a1, b1) = (a.clone(), b.clone());
        StateSpace::filter(&mut a, &mut b, target);
        assert_eq!(a.sectors(), a1.sectors());
        assert_eq!(b.sectors(), b1.sectors());
        assert_eq!(a.total(), a1.total());
        assert_eq!(b.total(), b1.total());
    }

    #[test]
    fn test_display() {
        let s = StateSpace::single(QuantumLabel::new(1, 1, 0));
        assert_eq!(s.to_string(), "< N=1 S=1/2 PG=0 > : 1\n");
    }
}
