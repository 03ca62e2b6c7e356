//! Symbolic operator expressions.
//!
//! Renormalization drivers describe the operators they need symbolically
//! before any numeric tensor exists: a named elementary operator on one or
//! more sites, a scalar-weighted product of such operators, or a sum of
//! products. [`OpExpr`] is the closed expression type consumers build with
//! `+` and `*`; the algebra keeps expressions in flattened sum-of-products
//! form, with every scalar folded into the product factor so elementary
//! operators inside a product always carry factor 1.

use std::fmt;
use std::ops::{Add, Mul};

use crate::quantum::QuantumLabel;

/// Names of the elementary operators of the fermionic operator alphabet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpName {
    /// Hamiltonian.
    H,
    /// Identity.
    I,
    /// Particle number.
    N,
    /// Particle number squared.
    NN,
    /// Doubly-occupied projector.
    Nud,
    /// Creation.
    C,
    /// Annihilation.
    D,
    /// One-index complementary (annihilation side).
    R,
    /// One-index complementary (creation side).
    Rd,
    /// Pair annihilation.
    A,
    /// Pair creation.
    Ad,
    /// Two-index complementary pair (annihilation side).
    P,
    /// Two-index complementary pair (creation side).
    Pd,
    /// Particle-hole pair.
    B,
    /// Two-index complementary particle-hole.
    Q,
}

impl fmt::Display for OpName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpName::H => "H",
            OpName::I => "I",
            OpName::N => "N",
            OpName::NN => "NN",
            OpName::Nud => "NUD",
            OpName::C => "C",
            OpName::D => "D",
            OpName::R => "R",
            OpName::Rd => "RD",
            OpName::A => "A",
            OpName::Ad => "AD",
            OpName::P => "P",
            OpName::Pd => "PD",
            OpName::B => "B",
            OpName::Q => "Q",
        };
        f.write_str(s)
    }
}

/// A named elementary operator with site indices, a scalar factor and the
/// flow label of the sectors it connects.
#[derive(Clone, Debug)]
pub struct OpElement {
    pub name: OpName,
    pub site_index: Vec<u8>,
    pub factor: f64,
    pub q_label: QuantumLabel,
}

impl OpElement {
    pub fn new(name: OpName, site_index: Vec<u8>, q_label: QuantumLabel) -> Self {
        Self {
            name,
            site_index,
            factor: 1.0,
            q_label,
        }
    }

    /// The factor-stripped form.
    pub fn abs(&self) -> OpElement {
        OpElement {
            factor: 1.0,
            ..self.clone()
        }
    }
}

/// Identity ignores the flow label: two mentions of `C0` are the same
/// operator regardless of where the label was attached.
impl PartialEq for OpElement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.site_index == other.site_index
            && self.factor == other.factor
    }
}

impl Mul<f64> for OpElement {
    type Output = OpElement;

    fn mul(self, d: f64) -> OpElement {
        OpElement {
            factor: self.factor * d,
            ..self
        }
    }
}

impl fmt::Display for OpElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factor != 1.0 {
            return write!(f, "({} {})", self.factor, self.abs());
        }
        match self.site_index.len() {
            0 => write!(f, "{}", self.name),
            1 => write!(f, "{}{}", self.name, self.site_index[0]),
            _ => {
                write!(f, "{}[", self.name)?;
                for i in &self.site_index {
                    write!(f, " {i}")?;
                }
                write!(f, " ]")
            }
        }
    }
}

/// Scalar-weighted product of elementary operators.
///
/// Element factors are folded into the product factor on construction, so
/// `ops` always holds factor-free elements.
#[derive(Clone, Debug, PartialEq)]
pub struct OpProduct {
    pub factor: f64,
    pub ops: Vec<OpElement>,
}

impl OpProduct {
    pub fn new(ops: Vec<OpElement>, factor: f64) -> Self {
        let factor = ops.iter().fold(factor, |f, e| f * e.factor);
        Self {
            factor,
            ops: ops.iter().map(OpElement::abs).collect(),
        }
    }

    pub fn abs(&self) -> OpProduct {
        OpProduct {
            factor: 1.0,
            ops: self.ops.clone(),
        }
    }

    /// The single element of a length-one product.
    ///
    /// # Panics
    ///
    /// Panics if the product holds more than one element.
    pub fn op(&self) -> &OpElement {
        assert_eq!(self.ops.len(), 1);
        &self.ops[0]
    }
}

impl Mul<f64> for OpProduct {
    type Output = OpProduct;

    fn mul(self, d: f64) -> OpProduct {
        OpProduct {
            factor: self.factor * d,
            ops: self.ops,
        }
    }
}

impl fmt::Display for OpProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factor != 1.0 {
            return write!(f, "({} {})", self.factor, self.abs());
        }
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

/// Operator expression in flattened sum-of-products form.
#[derive(Clone, Debug, PartialEq)]
pub enum OpExpr {
    Zero,
    Elem(OpElement),
    Product(OpProduct),
    Sum(Vec<OpProduct>),
}

impl OpExpr {
    /// The factor-stripped form of the whole expression.
    pub fn abs(&self) -> OpExpr {
        match self {
            OpExpr::Zero => OpExpr::Zero,
            OpExpr::Elem(e) => OpExpr::Elem(e.abs()),
            OpExpr::Product(p) => OpExpr::Product(p.abs()),
            OpExpr::Sum(ps) => OpExpr::Sum(ps.iter().map(OpProduct::abs).collect()),
        }
    }

    /// Flattened sum of a list of expressions.
    pub fn sum(xs: Vec<OpExpr>) -> OpExpr {
        let mut strs = Vec::new();
        for x in xs {
            strs.extend(x.into_products());
        }
        OpExpr::Sum(strs)
    }

    fn into_products(self) -> Vec<OpProduct> {
        match self {
            OpExpr::Zero => Vec::new(),
            OpExpr::Elem(e) => vec![OpProduct::new(vec![e], 1.0)],
            OpExpr::Product(p) => vec![p],
            OpExpr::Sum(ps) => ps,
        }
    }
}

impl From<OpElement> for OpExpr {
    fn from(e: OpElement) -> OpExpr {
        OpExpr::Elem(e)
    }
}

impl Add for OpExpr {
    type Output = OpExpr;

    fn add(self, rhs: OpExpr) -> OpExpr {
        match (self, rhs) {
            (OpExpr::Zero, x) | (x, OpExpr::Zero) => x,
            (a, b) => {
                let mut strs = a.into_products();
                strs.extend(b.into_products());
                OpExpr::Sum(strs)
            }
        }
    }
}

impl Mul<f64> for OpExpr {
    type Output = OpExpr;

    fn mul(self, d: f64) -> OpExpr {
        if d == 0.0 {
            return OpExpr::Zero;
        }
        match self {
            OpExpr::Zero => OpExpr::Zero,
            OpExpr::Elem(e) => OpExpr::Elem(e * d),
            OpExpr::Product(p) => OpExpr::Product(p * d),
            OpExpr::Sum(ps) => OpExpr::Sum(ps.into_iter().map(|p| p * d).collect()),
        }
    }
}

impl Mul for OpExpr {
    type Output = OpExpr;

    /// Operator product, distributed over sums. Factors multiply; element
    /// order is preserved (the algebra is noncommutative).
    fn mul(self, rhs: OpExpr) -> OpExpr {
        if self == OpExpr::Zero || rhs == OpExpr::Zero {
            return OpExpr::Zero;
        }
        let single = !matches!(self, OpExpr::Sum(_)) && !matches!(rhs, OpExpr::Sum(_));
        let pa = self.into_products();
        let pb = rhs.into_products();
        let mut strs = Vec::with_capacity(pa.len() * pb.len());
        for a in &pa {
            for b in &pb {
                let mut ops = a.ops.clone();
                ops.extend(b.ops.iter().cloned());
                strs.push(OpProduct {
                    factor: a.factor * b.factor,
                    ops,
                });
            }
        }
        if single {
            // Elem * Elem and friends stay a plain product.
            OpExpr::Product(strs.pop().unwrap_or_else(|| OpProduct::new(Vec::new(), 1.0)))
        } else {
            OpExpr::Sum(strs)
        }
    }
}

impl fmt::Display for OpExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpExpr::Zero => write!(f, "0"),
            OpExpr::Elem(e) => write!(f, "{e}"),
            OpExpr::Product(p) => write!(f, "{p}"),
            OpExpr::Sum(ps) => {
                for (i, p) in ps.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{p}")?;
                }
                Ok(())
            }
        }
    }
}
