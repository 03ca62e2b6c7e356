//! Quantum number labels for SU(2) x U(1) x point-group symmetry.
//!
//! A [`QuantumLabel`] carries particle number `n`, total spin as a doubled
//! integer `twos` (so spin 1/2 is `twos = 1`), and an abelian point-group
//! irrep `pg` combined by XOR. Because SU(2) coupling of two spins yields a
//! range of total spins, a label is in general a *multiplet range*
//! `twos_low ..= twos` stepping by 2; a label with `twos_low == twos` is a
//! single discrete value.
//!
//! Labels stored in block layouts reuse the `twos_low` field to remember the
//! bra-side spin of a sector pair (see [`QuantumLabel::combine`]), in which
//! case `twos_low` may exceed `twos`.

use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Symmetry label: particle number, spin multiplet range, point-group irrep.
///
/// # Example
///
/// ```
/// use symtensors::QuantumLabel;
///
/// let a = QuantumLabel::new(1, 1, 0);
/// let ab = a + a;
/// assert_eq!(ab, QuantumLabel::ranged(2, 0, 2, 0));
/// assert_eq!(ab.count(), 2);
/// assert_eq!(ab.get(1), QuantumLabel::new(2, 2, 0));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuantumLabel {
    /// Particle number.
    pub n: i16,
    /// Lowest doubled spin of the multiplet range.
    pub twos_low: i16,
    /// Highest doubled spin of the multiplet range.
    pub twos: i16,
    /// Point-group irrep, combined by XOR.
    pub pg: u8,
}

impl QuantumLabel {
    /// Single-valued label with spin `twos`.
    pub const fn new(n: i16, twos: i16, pg: u8) -> Self {
        Self {
            n,
            twos_low: twos,
            twos,
            pg,
        }
    }

    /// Multiplet-range label covering `twos_low, twos_low + 2, ..., twos`.
    pub const fn ranged(n: i16, twos_low: i16, twos: i16, pg: u8) -> Self {
        Self {
            n,
            twos_low,
            twos,
            pg,
        }
    }

    /// The vacuum label.
    pub const fn vacuum() -> Self {
        Self::new(0, 0, 0)
    }

    /// Number of discrete labels in the multiplet range.
    #[inline]
    pub fn count(&self) -> usize {
        ((self.twos - self.twos_low) / 2 + 1) as usize
    }

    /// The `i`-th discrete label, ascending from `twos_low`.
    #[inline]
    pub fn get(&self, i: usize) -> QuantumLabel {
        QuantumLabel::new(self.n, self.twos_low + 2 * i as i16, self.pg)
    }

    /// Position of the single-valued label `x` in this range.
    pub fn find(&self, x: QuantumLabel) -> Option<usize> {
        if x.n != self.n
            || x.pg != self.pg
            || x.twos != x.twos_low
            || (x.twos - self.twos) % 2 != 0
            || x.twos < self.twos_low
            || x.twos > self.twos
        {
            None
        } else {
            Some(((x.twos - self.twos_low) / 2) as usize)
        }
    }

    /// Ket label of a stored sector pair (spin taken from `twos`).
    #[inline]
    pub fn get_ket(&self) -> QuantumLabel {
        QuantumLabel::new(self.n, self.twos, self.pg)
    }

    /// Bra label of a stored sector pair under the flow label `dq`
    /// (spin taken from `twos_low`).
    #[inline]
    pub fn get_bra(&self, dq: QuantumLabel) -> QuantumLabel {
        QuantumLabel::new(self.n + dq.n, self.twos_low, self.pg ^ dq.pg)
    }

    /// Compose a sector-pair label for `bra <- ket` under this flow label.
    ///
    /// Returns the ket label with `twos_low` set to the bra spin, or `None`
    /// when `bra` is not reachable from `ket` through this flow (wrong
    /// particle number or irrep, or triangle violation).
    pub fn combine(&self, bra: QuantumLabel, ket: QuantumLabel) -> Option<QuantumLabel> {
        let q = QuantumLabel {
            n: ket.n,
            twos_low: bra.twos,
            twos: ket.twos,
            pg: ket.pg,
        };
        if q.get_bra(*self) != bra || !crate::cg::triangle(ket.twos, self.twos, bra.twos) {
            None
        } else {
            Some(q)
        }
    }

    fn fmt_spin(f: &mut fmt::Formatter<'_>, twos: i16) -> fmt::Result {
        if twos & 1 != 0 {
            write!(f, "{}/2", twos)
        } else {
            write!(f, "{}", twos / 2)
        }
    }
}

impl Add for QuantumLabel {
    type Output = QuantumLabel;

    /// Couple two labels: `n` adds, `pg` XORs, and the spin becomes the
    /// full multiplet range allowed by angular momentum addition.
    fn add(self, other: QuantumLabel) -> QuantumLabel {
        QuantumLabel {
            n: self.n + other.n,
            twos_low: i16::min(
                (self.twos - other.twos_low).abs(),
                (other.twos - self.twos_low).abs(),
            ),
            twos: self.twos + other.twos,
            pg: self.pg ^ other.pg,
        }
    }
}

impl Neg for QuantumLabel {
    type Output = QuantumLabel;

    /// Conjugate label: particle number flips, spin and irrep are self-dual.
    fn neg(self) -> QuantumLabel {
        QuantumLabel {
            n: -self.n,
            ..self
        }
    }
}

impl Sub for QuantumLabel {
    type Output = QuantumLabel;

    fn sub(self, other: QuantumLabel) -> QuantumLabel {
        self + (-other)
    }
}

impl fmt::Display for QuantumLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "< N={} S=", self.n)?;
        if self.twos_low != self.twos {
            Self::fmt_spin(f, self.twos_low)?;
            write!(f, "~")?;
        }
        Self::fmt_spin(f, self.twos)?;
        write!(f, " PG={} >", self.pg)
    }
}
