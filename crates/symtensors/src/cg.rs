//! Wigner 3j/6j/9j symbols and Racah coefficients.
//!
//! All angular momenta are doubled integers (`twos` convention: spin 1/2 is
//! `1`, spin 1 is `2`), so half-integer momenta never leave integer
//! arithmetic. The alternating finite sums follow Messiah, *Quantum
//! Mechanics* Vol. 2, Eqs. (C.21), (C.36) and (C.41), evaluated over a
//! precomputed table of square roots of factorials so each term is a single
//! product of table entries.
//!
//! Every function returns exactly `0.0` when a selection rule fails; callers
//! treat zero as "no contribution", never as an error.

/// Triangle condition for three doubled momenta, including the integer
/// perimeter (parity) requirement.
#[inline]
pub fn triangle(tja: i16, tjb: i16, tjc: i16) -> bool {
    (tja + tjb + tjc) & 1 == 0 && tjc <= tja + tjb && tjc >= (tja - tjb).abs()
}

/// Precomputed recoupling coefficient evaluator.
///
/// The factorial table is sized by `max_twoj`, the largest doubled momentum
/// any argument may take. 9j evaluation couples through an internal momentum
/// up to `2 * max_twoj`, which bounds the largest factorial index at
/// `(5 * max_twoj) / 2 + 1`.
///
/// # Example
///
/// ```
/// use symtensors::ClebschGordan;
///
/// let cg = ClebschGordan::new(40);
/// // {1/2 1/2 0; 1/2 1/2 1} = 1/2
/// assert!((cg.wigner_6j(1, 1, 0, 1, 1, 2) - 0.5).abs() < 1e-14);
/// ```
#[derive(Debug)]
pub struct ClebschGordan {
    sqrt_fact: Vec<f64>,
    max_twoj: i16,
}

impl ClebschGordan {
    /// Build the factorial table for momenta up to `max_twoj`.
    pub fn new(max_twoj: i16) -> Self {
        let n_sf = (5 * max_twoj as usize) / 2 + 2;
        let mut sqrt_fact = vec![1.0; n_sf];
        for i in 1..n_sf {
            sqrt_fact[i] = sqrt_fact[i - 1] * (i as f64).sqrt();
        }
        Self {
            sqrt_fact,
            max_twoj,
        }
    }

    /// Largest doubled momentum supported by the table.
    #[inline]
    pub fn max_twoj(&self) -> i16 {
        self.max_twoj
    }

    #[inline]
    fn sf(&self, i: i16) -> f64 {
        self.sqrt_fact[i as usize]
    }

    /// `sqrt(Delta(a b c))` of the triangle coefficient.
    fn sqrt_delta(&self, tja: i16, tjb: i16, tjc: i16) -> f64 {
        self.sf((tja + tjb - tjc) >> 1) * self.sf((tja - tjb + tjc) >> 1)
            * self.sf((-tja + tjb + tjc) >> 1)
            / self.sf((tja + tjb + tjc + 2) >> 1)
    }

    /// Clebsch-Gordan coefficient `<ja ma; jb mb | jc mc>`.
    pub fn cg(&self, tja: i16, tjb: i16, tjc: i16, tma: i16, tmb: i16, tmc: i16) -> f64 {
        let sign = if (tmc + tja - tjb) & 2 != 0 { -1.0 } else { 1.0 };
        sign * f64::sqrt((tjc + 1) as f64) * self.wigner_3j(tja, tjb, tjc, tma, tmb, -tmc)
    }

    /// Wigner 3j symbol (Messiah C.21).
    pub fn wigner_3j(&self, tja: i16, tjb: i16, tjc: i16, tma: i16, tmb: i16, tmc: i16) -> f64 {
        if tma + tmb + tmc != 0
            || !triangle(tja, tjb, tjc)
            || (tja + tma) & 1 != 0
            || (tjb + tmb) & 1 != 0
            || (tjc + tmc) & 1 != 0
        {
            return 0.0;
        }
        let alpha1 = (tjb - tjc - tma) >> 1;
        let alpha2 = (tja - tjc + tmb) >> 1;
        let beta1 = (tja + tjb - tjc) >> 1;
        let beta2 = (tja - tma) >> 1;
        let beta3 = (tjb + tmb) >> 1;
        let max_alpha = 0.max(alpha1).max(alpha2);
        let min_beta = beta1.min(beta2).min(beta3);
        if max_alpha > min_beta {
            return 0.0;
        }
        let mut factor = if ((tja - tjb - tmc) & 2 != 0) != (max_alpha & 1 != 0) {
            -1.0
        } else {
            1.0
        };
        factor *= self.sqrt_delta(tja, tjb, tjc)
            * self.sf((tja + tma) >> 1)
            * self.sf((tja - tma) >> 1)
            * self.sf((tjb + tmb) >> 1)
            * self.sf((tjb - tmb) >> 1)
            * self.sf((tjc + tmc) >> 1)
            * self.sf((tjc - tmc) >> 1);
        let mut r = 0.0;
        for t in max_alpha..=min_beta {
            let rst = self.sf(t)
                * self.sf(t - alpha1)
                * self.sf(t - alpha2)
                * self.sf(beta1 - t)
                * self.sf(beta2 - t)
                * self.sf(beta3 - t);
            r += factor / (rst * rst);
            factor = -factor;
        }
        r
    }

    /// Wigner 6j symbol (Messiah C.36).
    pub fn wigner_6j(&self, tja: i16, tjb: i16, tjc: i16, tjd: i16, tje: i16, tjf: i16) -> f64 {
        if !triangle(tja, tjb, tjc)
            || !triangle(tja, tje, tjf)
            || !triangle(tjd, tjb, tjf)
            || !triangle(tjd, tje, tjc)
        {
            return 0.0;
        }
        let alpha1 = (tja + tjb + tjc) >> 1;
        let alpha2 = (tja + tje + tjf) >> 1;
        let alpha3 = (tjd + tjb + tjf) >> 1;
        let alpha4 = (tjd + tje + tjc) >> 1;
        let beta1 = (tja + tjb + tjd + tje) >> 1;
        let beta2 = (tjb + tjc + tje + tjf) >> 1;
        let beta3 = (tja + tjc + tjd + tjf) >> 1;
        let max_alpha = alpha1.max(alpha2).max(alpha3).max(alpha4);
        let min_beta = beta1.min(beta2).min(beta3);
        if max_alpha > min_beta {
            return 0.0;
        }
        let mut factor = if max_alpha & 1 != 0 { -1.0 } else { 1.0 };
        factor *= self.sqrt_delta(tja, tjb, tjc)
            * self.sqrt_delta(tja, tje, tjf)
            * self.sqrt_delta(tjd, tjb, tjf)
            * self.sqrt_delta(tjd, tje, tjc);
        let mut r = 0.0;
        for t in max_alpha..=min_beta {
            let rst = self.sf(t - alpha1)
                * self.sf(t - alpha2)
                * self.sf(t - alpha3)
                * self.sf(t - alpha4)
                * self.sf(beta1 - t)
                * self.sf(beta2 - t)
                * self.sf(beta3 - t);
            let top = self.sf(t + 1);
            r += factor * top * top / (rst * rst);
            factor = -factor;
        }
        r
    }

    /// Wigner 9j symbol (Messiah C.41), a sum of 6j triples over the
    /// internal coupling momentum.
    #[allow(clippy::too_many_arguments)]
    pub fn wigner_9j(
        &self,
        tja: i16,
        tjb: i16,
        tjc: i16,
        tjd: i16,
        tje: i16,
        tjf: i16,
        tjg: i16,
        tjh: i16,
        tji: i16,
    ) -> f64 {
        if !triangle(tja, tjb, tjc)
            || !triangle(tjd, tje, tjf)
            || !triangle(tjg, tjh, tji)
            || !triangle(tja, tjd, tjg)
            || !triangle(tjb, tje, tjh)
            || !triangle(tjc, tjf, tji)
        {
            return 0.0;
        }
        let max_alpha = (tja - tji)
            .abs()
            .max((tjd - tjh).abs())
            .max((tjb - tjf).abs());
        let min_beta = (tja + tji).min(tjd + tjh).min(tjb + tjf);
        let mut r = 0.0;
        let mut tg = max_alpha;
        while tg <= min_beta {
            r += (tg + 1) as f64
                * self.wigner_6j(tja, tjb, tjc, tjf, tji, tg)
                * self.wigner_6j(tjd, tje, tjf, tjb, tg, tjh)
                * self.wigner_6j(tjg, tjh, tji, tg, tja, tjd);
            tg += 2;
        }
        if max_alpha & 1 != 0 {
            -r
        } else {
            r
        }
    }

    /// Racah coefficient `W(a b c d; e f)` (Brink & Satchler, p. 142).
    pub fn racah(&self, ta: i16, tb: i16, tc: i16, td: i16, te: i16, tf: i16) -> f64 {
        let sign = if (ta + tb + tc + td) & 2 != 0 { -1.0 } else { 1.0 };
        sign * self.wigner_6j(ta, tb, te, td, tc, tf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cg() -> ClebschGordan {
        ClebschGordan::new(20)
    }

    #[test]
    fn test_triangle() {
        assert!(triangle(1, 1, 2));
        assert!(triangle(1, 1, 0));
        assert!(triangle(2, 2, 2));
        // Perimeter parity.
        assert!(!triangle(1, 1, 1));
        // Inequality.
        assert!(!triangle(1, 1, 4));
        assert!(!triangle(0, 0, 2));
    }

    #[test]
    fn test_wigner_3j_known_values() {
        let t = cg();
        // (1/2 1/2 0; 1/2 -1/2 0) = 1/sqrt(2)
        assert_relative_eq!(
            t.wigner_3j(1, 1, 0, 1, -1, 0),
            1.0 / 2.0_f64.sqrt(),
            max_relative = 1e-12
        );
        // (1/2 1/2 1; 1/2 -1/2 0) = 1/sqrt(6)
        assert_relative_eq!(
            t.wigner_3j(1, 1, 2, 1, -1, 0),
            1.0 / 6.0_f64.sqrt(),
            max_relative = 1e-12
        );
        // (1 1 2; 1 1 -2) = 1/sqrt(5)
        assert_relative_eq!(
            t.wigner_3j(2, 2, 4, 2, 2, -4),
            1.0 / 5.0_f64.sqrt(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_wigner_3j_selection_rules() {
        let t = cg();
        assert_eq!(t.wigner_3j(1, 1, 2, 1, 1, 0), 0.0); // m-sum != 0
        assert_eq!(t.wigner_3j(1, 1, 4, 1, -1, 0), 0.0); // triangle
        assert_eq!(t.wigner_3j(1, 1, 2, 0, 0, 0), 0.0); // m-parity
    }

    #[test]
    fn test_wigner_3j_orthogonality() {
        let t = cg();
        // sum_jc (2jc+1) |3j|^2 = 1 for fixed ma, mb.
        let (tja, tjb, tma, tmb): (i16, i16, i16, i16) = (3, 2, 1, -2);
        let mut s = 0.0;
        let mut tjc = (tja - tjb).abs();
        while tjc <= tja + tjb {
            let w = t.wigner_3j(tja, tjb, tjc, tma, tmb, -tma - tmb);
            s += (tjc + 1) as f64 * w * w;
            tjc += 2;
        }
        assert_relative_eq!(s, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_wigner_6j_known_values() {
        let t = cg();
        // {1/2 1/2 0; 1/2 1/2 1} = +1/2
        assert_relative_eq!(t.wigner_6j(1, 1, 0, 1, 1, 2), 0.5, max_relative = 1e-12);
        // {1/2 1/2 1; 1/2 1/2 1} = 1/6
        assert_relative_eq!(
            t.wigner_6j(1, 1, 2, 1, 1, 2),
            1.0 / 6.0,
            max_relative = 1e-12
        );
        // {a a 0; e e f} = (-1)^(a+e+f) / sqrt((2a+1)(2e+1))
        assert_relative_eq!(
            t.wigner_6j(2, 2, 0, 2, 2, 4),
            1.0 / 3.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_wigner_6j_column_symmetry() {
        let t = cg();
        let a = t.wigner_6j(2, 4, 2, 2, 2, 4);
        // 6j is invariant under any permutation of its columns.
        assert_relative_eq!(a, t.wigner_6j(4, 2, 2, 2, 2, 4), max_relative = 1e-12);
        assert_relative_eq!(a, t.wigner_6j(2, 2, 4, 2, 4, 2), max_relative = 1e-12);
    }

    #[test]
    fn test_wigner_6j_triangle_violation() {
        assert_eq!(cg().wigner_6j(1, 1, 4, 1, 1, 2), 0.0);
    }

    #[test]
    fn test_wigner_9j_known_values() {
        let t = cg();
        // Zero bottom row: {a b c; a b c; 0 0 0} = 1/sqrt((2a+1)(2b+1)(2c+1)).
        assert_relative_eq!(
            t.wigner_9j(1, 1, 2, 1, 1, 2, 0, 0, 0),
            1.0 / 12.0_f64.sqrt(),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            t.wigner_9j(1, 1, 0, 1, 1, 0, 0, 0, 0),
            0.5,
            max_relative = 1e-12
        );
        assert_eq!(t.wigner_9j(1, 1, 2, 1, 1, 2, 0, 0, 2), 0.0);
    }

    #[test]
    fn test_wigner_9j_row_swap_phase() {
        let t = cg();
        // Swapping two rows multiplies by (-1)^(sum of all nine momenta).
        let a = t.wigner_9j(1, 1, 2, 1, 1, 2, 2, 2, 0);
        let b = t.wigner_9j(1, 1, 2, 2, 2, 0, 1, 1, 2);
        // Sum of momenta = (1+1+2+1+1+2+2+2+0)/2 = 6, even: symmetric.
        assert_relative_eq!(a, b, max_relative = 1e-12);
    }

    #[test]
    fn test_racah() {
        let t = cg();
        // W(1/2 1/2 1/2 1/2; 0 1) = +1/2
        assert_relative_eq!(t.racah(1, 1, 1, 1, 0, 2), 0.5, max_relative = 1e-12);
        // Phase relative to the plain 6j.
        assert_relative_eq!(
            t.racah(1, 1, 1, 1, 2, 2),
            t.wigner_6j(1, 1, 2, 1, 1, 2),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_cg_known_values() {
        let t = cg();
        // <1/2 1/2; 1/2 -1/2 | 0 0> = 1/sqrt(2)
        assert_relative_eq!(
            t.cg(1, 1, 0, 1, -1, 0),
            1.0 / 2.0_f64.sqrt(),
            max_relative = 1e-12
        );
        // Stretched state: <1/2 1/2; 1/2 1/2 | 1 1> = 1
        assert_relative_eq!(t.cg(1, 1, 2, 1, 1, 2), 1.0, max_relative = 1e-12);
        // <1/2 -1/2; 1/2 1/2 | 0 0> = -1/sqrt(2)
        assert_relative_eq!(
            t.cg(1, 1, 0, -1, 1, 0),
            -1.0 / 2.0_f64.sqrt(),
            max_relative = 1e-12
        );
    }
}
