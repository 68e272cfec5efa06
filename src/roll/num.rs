use crate::common::*;
use std::fmt;

#[derive(Debug, Copy, Clone)]
pub enum Number {
    Int(Int),
    Float(Float),
}

impl Number {
    pub(crate) const ZERO: Self = Self::Int(0);

    /// The integer part, truncated towards zero.
    pub fn as_int(self) -> Int {
        match self {
            Self::Int(x) => x,
            Self::Float(x) => x as Int,
        }
    }

    pub fn as_float(self) -> Float {
        match self {
            Self::Int(x) => x as Float,
            Self::Float(x) => x,
        }
    }

    pub(crate) fn is_zero(self) -> bool {
        match self {
            Self::Int(x) => x == 0,
            Self::Float(x) => x == 0.0,
        }
    }

    pub(crate) fn floor(self) -> Self {
        match self {
            Self::Int(_) => self,
            Self::Float(x) => Self::Float(x.floor()),
        }
    }

    /// True division; always produces a float.
    pub(crate) fn true_div(self, rhs: Self) -> Self {
        Self::Float(self.as_float() / rhs.as_float())
    }

    /// Floor division; integral operands stay integral.
    pub(crate) fn floor_div(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Int(x), Self::Int(y)) => match (x.checked_div(y), x.checked_rem(y)) {
                (Some(q), Some(r)) if r != 0 && (r < 0) != (y < 0) => Self::Int(q - 1),
                (Some(q), Some(_)) => Self::Int(q),
                _ => Self::Float((x as Float / y as Float).floor()),
            },
            (x, y) => x.true_div(y).floor(),
        }
    }

    pub(crate) fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_float().total_cmp(&other.as_float())
    }
}

impl std::ops::Neg for Number {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Self::Int(x) => x
                .checked_neg()
                .map_or_else(|| Self::Float(-(x as Float)), Self::Int),
            Self::Float(x) => Self::Float(-x),
        }
    }
}

// Integer arithmetic falls back to floats instead of overflowing.
macro_rules! num_impl_bin_op {
    ($Name:ident, $fn_name:ident, $checked:ident) => {
        impl std::ops::$Name for Number {
            type Output = Self;

            fn $fn_name(self, rhs: Self) -> Self::Output {
                match (self, rhs) {
                    (Self::Int(x), Self::Int(y)) => x.$checked(y).map_or_else(
                        || Self::Float((x as Float).$fn_name(y as Float)),
                        Self::Int,
                    ),
                    (x, y) => Self::Float(x.as_float().$fn_name(y.as_float())),
                }
            }
        }
    };
}

num_impl_bin_op!(Add, add, checked_add);
num_impl_bin_op!(Sub, sub, checked_sub);
num_impl_bin_op!(Mul, mul, checked_mul);
num_impl_bin_op!(Rem, rem, checked_rem);

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(x), Self::Int(y)) => x == y,
            (x, y) => x.as_float().eq(&y.as_float()),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Self::Int(x), Self::Int(y)) => x.partial_cmp(y),
            (x, y) => x.as_float().partial_cmp(&y.as_float()),
        }
    }
}

impl From<Int> for Number {
    fn from(x: Int) -> Self {
        Self::Int(x)
    }
}

impl From<Float> for Number {
    fn from(x: Float) -> Self {
        Self::Float(x)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => fmt::Display::fmt(x, f),
            Self::Float(x) => fmt::Debug::fmt(x, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_ops_stay_integral() {
        assert!(matches!(Number::Int(2) + Number::Int(3), Number::Int(5)));
        assert!(matches!(-Number::Int(2), Number::Int(-2)));
        assert!(matches!(Number::Int(7).floor_div(Number::Int(2)), Number::Int(3)));
        assert_eq!(Number::Int(-7).floor_div(Number::Int(2)), Number::Int(-4));
        assert_eq!(Number::Int(7).floor_div(Number::Int(-2)), Number::Int(-4));
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let big = Number::Int(Int::MAX);
        assert!(matches!(big + Number::Int(1), Number::Float(_)));
        assert!(matches!(big * Number::Int(2), Number::Float(_)));
    }

    #[test]
    fn test_true_div_and_truncation() {
        let x = Number::Int(7).true_div(Number::Int(2));
        assert_eq!(x, Number::Float(3.5));
        assert_eq!(x.as_int(), 3);
        assert_eq!((-x).as_int(), -3);
        assert_eq!(x.to_string(), "3.5");
    }
}
