use crate::common::*;

/// A compiled dice expression: the root node and the trailing comment, if any.
///
/// Expressions are never modified once parsed, so one expression can be
/// evaluated any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression<'a> {
    pub(crate) root: Node<'a>,
    pub(crate) comment: Option<&'a str>,
}

impl<'a> Expression<'a> {
    pub fn root(&self) -> &Node<'a> {
        &self.root
    }

    pub fn comment(&self) -> Option<&'a str> {
        self.comment
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    Int(Int),
    Float(Float),
    Dice(Dice),
    Set(Set<'a>),
    Group(Box<Node<'a>>),
    Unary(UnaryOperator, Box<Node<'a>>),
    Binary(Box<Node<'a>>, BinaryOperator, Box<Node<'a>>),
    Annotated(Box<Node<'a>>, Vec<&'a str>),
}

impl<'a> Node<'a> {
    pub fn unary(op: UnaryOperator, operand: Self) -> Self {
        Self::Unary(op, Box::new(operand))
    }

    pub fn binary(lhs: Self, op: BinaryOperator, rhs: Self) -> Self {
        Self::Binary(Box::new(lhs), op, Box::new(rhs))
    }
}

/// `(a, b, ...)` followed by keep/drop operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Set<'a> {
    pub items: Vec<Node<'a>>,
    pub ops: Vec<Operator>,
}

impl<'a> Set<'a> {
    pub fn new(items: Vec<Node<'a>>, ops: Vec<Operator>) -> Self {
        Self {
            items,
            ops: Operator::merge_runs(ops),
        }
    }
}

/// An `NdS` literal and the operators written after it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Dice {
    pub num: Num,
    pub sides: Sides,
    pub ops: Vec<Operator>,
}

impl Dice {
    pub fn new(num: Num, sides: Sides, ops: Vec<Operator>) -> Self {
        Self {
            num,
            sides,
            ops: Operator::merge_runs(ops),
        }
    }

    /// Splits the text of a dice token into its count (1 if omitted) and
    /// sides.
    pub fn parse_literal(s: &str) -> Result<(Num, Sides), std::num::ParseIntError> {
        let (num, sides) = s.split_once('d').unwrap_or(("", s));
        let num = match num {
            "" => Num::MIN,
            _ => num.parse()?,
        };
        Ok((num, sides.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal() {
        let d20 = (Num::MIN, Sides::try_from(20).unwrap());
        assert_eq!(Dice::parse_literal("1d20").unwrap(), d20);
        assert_eq!(Dice::parse_literal("d20").unwrap(), d20);
        assert_eq!(Dice::parse_literal("2d%").unwrap().1, Sides::Percentile);
        assert!(Dice::parse_literal("2dx").is_err());
        assert!(Dice::parse_literal("99999999999d6").is_ok());
        assert!(Dice::parse_literal("1d99999999999").is_err());
    }

    #[test]
    fn test_operator_runs_merge_on_construction() {
        let keep = |s| Operator::selecting(OperatorKind::Keep, vec1![s]);
        let dice = Dice::new(
            Num::new(2).unwrap(),
            Sides::try_from(20).unwrap(),
            vec![keep(Selector::Highest(1)), keep(Selector::Lowest(1))],
        );
        assert_eq!(dice.ops.len(), 1);
        assert_eq!(dice.ops[0].to_string(), "kh1kl1");

        let set = Set::new(vec![Node::Int(1)], vec![keep(Selector::Equal(1))]);
        assert_eq!(set.ops.len(), 1);
    }
}
