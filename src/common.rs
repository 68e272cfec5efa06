//! Vocabulary shared by the parser and the roller.

use std::fmt;
use std::num::{NonZeroU32, NonZeroUsize};
use std::str::FromStr;
pub use vec1::vec1;

pub type Int = i64;
pub type UInt = u32;
pub type NonZeroUInt = NonZeroU32;
pub type Float = f64;

/// How many dice one literal rolls.
pub type Num = NonZeroUsize;

pub type NonEmpty<T> = vec1::Vec1<T>;

/// Whether the leading d20 of an expression is rolled twice, keeping the
/// higher (`Adv`) or lower (`Dis`) result.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum AdvType {
    #[default]
    None = 0,
    Adv = 1,
    Dis = -1,
}

impl AdvType {
    /// The keep operator an advantaged `1d20` is rolled with, if any.
    pub(crate) fn keep_operator(self) -> Option<Operator> {
        let selector = match self {
            Self::None => return None,
            Self::Adv => Selector::Highest(1),
            Self::Dis => Selector::Lowest(1),
        };
        Some(Operator::selecting(OperatorKind::Keep, vec1![selector]))
    }
}

/// The faces of a die. `d%` keeps its own variant so it prints back as `%`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Sides {
    Poly(NonZeroUInt),
    Percentile,
}

impl Sides {
    pub(crate) fn is_d20(self) -> bool {
        self == Self::Poly(NonZeroUInt::MIN.saturating_add(19))
    }
}

impl fmt::Display for Sides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Poly(n) => write!(f, "{}", n),
            Self::Percentile => f.write_str("%"),
        }
    }
}

impl TryFrom<Int> for Sides {
    type Error = std::num::TryFromIntError;

    fn try_from(value: Int) -> Result<Self, Self::Error> {
        NonZeroUInt::try_from(UInt::try_from(value)?).map(Self::Poly)
    }
}

impl FromStr for Sides {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "%" => Ok(Self::Percentile),
            _ => s.parse().map(Self::Poly),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UnaryOperator {
    Pos,
    Neg,
}

impl UnaryOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Pos => "+",
            Self::Neg => "-",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Flr,
    Rem,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinaryOperator {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Flr => "//",
            Self::Rem => "%",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }

    /// Binding strength, tighter binding higher. Every level is
    /// left-associative.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Lt | Self::Gt | Self::Le | Self::Ge | Self::Eq | Self::Ne => 0,
            Self::Add | Self::Sub => 1,
            Self::Mul | Self::Div | Self::Flr | Self::Rem => 2,
        }
    }

    /// The sign this operator stands for in prefix position.
    pub const fn as_prefix(self) -> Option<UnaryOperator> {
        match self {
            Self::Add => Some(UnaryOperator::Pos),
            Self::Sub => Some(UnaryOperator::Neg),
            _ => None,
        }
    }
}

macro_rules! display_symbol {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.symbol())
            }
        }
    )*};
}

display_symbol!(UnaryOperator, BinaryOperator);

/// What an operator written after dice (or a set) does.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OperatorKind {
    Keep,
    Drop,
    Reroll,
    RerollOnce,
    Explode,
    ExplodeOnce,
    Minimum,
    Maximum,
}

impl OperatorKind {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Keep => "k",
            Self::Drop => "p",
            Self::Reroll => "rr",
            Self::RerollOnce => "ro",
            Self::Explode => "e",
            Self::ExplodeOnce => "ra",
            Self::Minimum => "mi",
            Self::Maximum => "ma",
        }
    }

    /// Sets can only have members picked out, never rolled again.
    pub const fn applies_to_sets(self) -> bool {
        matches!(self, Self::Keep | Self::Drop)
    }

    /// `mi` and `ma` take one bare number instead of selectors.
    pub const fn is_clamp(self) -> bool {
        matches!(self, Self::Minimum | Self::Maximum)
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.symbol())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Operand {
    Selectors(NonEmpty<Selector>),
    Bound(Int),
}

/// One operator as written, e.g. `kh1` or `mi3`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Operator {
    pub kind: OperatorKind,
    pub operand: Operand,
}

impl Operator {
    pub fn selecting(kind: OperatorKind, selectors: NonEmpty<Selector>) -> Self {
        Self {
            kind,
            operand: Operand::Selectors(selectors),
        }
    }

    pub fn bounding(kind: OperatorKind, bound: Int) -> Self {
        Self {
            kind,
            operand: Operand::Bound(bound),
        }
    }

    /// Folds each run of same-kind selecting operators into one, so `kh1kl1`
    /// keeps both the highest and the lowest die. Clamps stay separate and apply in
    /// turn.
    pub fn merge_runs(ops: Vec<Self>) -> Vec<Self> {
        let mut merged: Vec<Self> = Vec::with_capacity(ops.len());
        for op in ops {
            let kind = op.kind;
            match (merged.last_mut(), op.operand) {
                (
                    Some(Self {
                        kind: last,
                        operand: Operand::Selectors(into),
                    }),
                    Operand::Selectors(from),
                ) if *last == kind => into.append(&mut from.into_vec()),
                (_, operand) => merged.push(Self { kind, operand }),
            }
        }
        merged
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.kind.symbol();
        match &self.operand {
            Operand::Selectors(selectors) => selectors
                .iter()
                .try_for_each(|sel| write!(f, "{}{}", symbol, sel)),
            Operand::Bound(bound) => write!(f, "{}{}", symbol, bound),
        }
    }
}

/// Picks members of a dice pool or set. A bare number selects equal values.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Selector {
    Highest(usize),
    Lowest(usize),
    Less(Int),
    Greater(Int),
    Equal(Int),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, n) = match *self {
            Self::Highest(n) => ("h", n as Int),
            Self::Lowest(n) => ("l", n as Int),
            Self::Less(x) => ("<", x),
            Self::Greater(x) => (">", x),
            Self::Equal(x) => ("", x),
        };
        write!(f, "{}{}", prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep(selectors: NonEmpty<Selector>) -> Operator {
        Operator::selecting(OperatorKind::Keep, selectors)
    }

    #[test]
    fn test_merge_runs() {
        let ops = vec![
            keep(vec1![Selector::Highest(1)]),
            keep(vec1![Selector::Lowest(1)]),
            Operator::bounding(OperatorKind::Minimum, 3),
            Operator::bounding(OperatorKind::Minimum, 4),
            Operator::selecting(OperatorKind::Explode, vec1![Selector::Equal(6)]),
            keep(vec1![Selector::Greater(2)]),
        ];
        assert_eq!(
            Operator::merge_runs(ops),
            vec![
                keep(vec1![Selector::Highest(1), Selector::Lowest(1)]),
                Operator::bounding(OperatorKind::Minimum, 3),
                Operator::bounding(OperatorKind::Minimum, 4),
                Operator::selecting(OperatorKind::Explode, vec1![Selector::Equal(6)]),
                keep(vec1![Selector::Greater(2)]),
            ]
        );
    }

    #[test]
    fn test_operators_print_as_written() {
        let op = keep(vec1![Selector::Highest(1), Selector::Less(3)]);
        assert_eq!(op.to_string(), "kh1k<3");
        assert_eq!(Operator::bounding(OperatorKind::Maximum, 5).to_string(), "ma5");
        assert_eq!(OperatorKind::ExplodeOnce.to_string(), "'ra'");
        assert_eq!(BinaryOperator::Flr.to_string(), "//");
    }

    #[test]
    fn test_sides() {
        assert!(Sides::try_from(20).unwrap().is_d20());
        assert!(!Sides::Percentile.is_d20());
        assert_eq!("%".parse::<Sides>().unwrap(), Sides::Percentile);
        assert!("0".parse::<Sides>().is_err());
        assert!(Sides::try_from(-4).is_err());
        assert_eq!(Sides::try_from(6).unwrap().to_string(), "6");
    }

    #[test]
    fn test_advantage_keep_operator() {
        assert_eq!(AdvType::None.keep_operator(), None);
        assert_eq!(
            AdvType::Dis.keep_operator(),
            Some(keep(vec1![Selector::Lowest(1)]))
        );
    }
}
