use super::{error::RollError, num::Number, roller::Roller, tree::*, RResult};
use crate::common::*;
use crate::parse::ast;
use tracing::trace;

/// Bookkeeping shared by every evaluation of one invocation.
///
/// The context counts the dice rolled so far against a ceiling. The count is
/// never reset between evaluations, so a multi-roll shares one budget of dice
/// across all of its iterations.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RollContext {
    max_rolls: Option<usize>,
    rolls: usize,
}

impl RollContext {
    pub const DEFAULT_MAX_ROLLS: usize = 1000;

    pub fn new(max_rolls: Option<usize>) -> Self {
        Self { max_rolls, rolls: 0 }
    }

    pub fn new_bounded(max_rolls: usize) -> Self {
        Self::new(Some(max_rolls))
    }

    pub fn new_unbounded() -> Self {
        Self::new(None)
    }

    /// Dice rolled through this context so far.
    pub fn rolls(&self) -> usize {
        self.rolls
    }

    pub fn max_rolls(&self) -> Option<usize> {
        self.max_rolls
    }

    pub fn reset(&mut self) {
        self.rolls = 0;
    }

    fn count_rolls(&mut self, n: usize) -> RResult<()> {
        self.rolls = self.rolls.saturating_add(n);
        if self.max_rolls.map_or(false, |max| self.rolls > max) {
            Err(RollError::TooManyRolls)
        } else {
            Ok(())
        }
    }

    /// Evaluates `expr` once, drawing faces from `roller`.
    ///
    /// With advantage, a leading plain `1d20` is rolled as `2d20kh1` (or
    /// `2d20kl1` for disadvantage) for this evaluation only. The expression
    /// itself is left untouched.
    pub fn eval<'a, R: Roller + ?Sized>(
        &mut self,
        expr: &ast::Expression<'a>,
        adv: AdvType,
        roller: &mut R,
    ) -> RResult<Roll<'a>> {
        let mut evaluator = Evaluator {
            ctx: self,
            roller,
            adv,
        };
        let tree = evaluator.eval(expr.root())?;
        trace!(rolls = self.rolls, "evaluated expression");
        Ok(Roll {
            tree,
            comment: expr.comment(),
        })
    }
}

impl Default for RollContext {
    fn default() -> Self {
        Self::new_bounded(Self::DEFAULT_MAX_ROLLS)
    }
}

/// Walks an AST, rolling dice as it goes.
pub(crate) struct Evaluator<'c, R: ?Sized> {
    ctx: &'c mut RollContext,
    roller: &'c mut R,
    adv: AdvType,
}

impl<R: Roller + ?Sized> Evaluator<'_, R> {
    pub(crate) fn roll(&mut self, num: usize, sides: Sides) -> RResult<Vec<Int>> {
        self.ctx.count_rolls(num)?;
        Ok(match sides {
            Sides::Poly(x) => self
                .roller
                .roll_n(num, x)
                .into_iter()
                .map(Int::from)
                .collect(),
            Sides::Percentile => self
                .roller
                .roll_n(num, percentile_die())
                .into_iter()
                .map(|x| Int::from(x) * 10)
                .collect(),
        })
    }

    pub(crate) fn roll_one(&mut self, sides: Sides) -> RResult<Int> {
        self.ctx.count_rolls(1)?;
        Ok(match sides {
            Sides::Poly(x) => Int::from(self.roller.roll(x)),
            Sides::Percentile => Int::from(self.roller.roll(percentile_die())) * 10,
        })
    }

    // Advantage only ever applies to the first leaf reached.
    fn take_adv(&mut self) -> AdvType {
        std::mem::take(&mut self.adv)
    }

    fn eval<'a>(&mut self, node: &ast::Node<'a>) -> RResult<RollTree<'a>> {
        let node = match node {
            ast::Node::Int(x) => self.literal(Number::from(*x)),
            ast::Node::Float(x) => self.literal(Number::from(*x)),
            ast::Node::Dice(dice) => RollNode::Dice(self.dice(dice)?),
            ast::Node::Set(set) => RollNode::Set(self.set(set)?),
            ast::Node::Group(inner) => RollNode::Grouping(Grouping(Box::new(self.eval(inner)?))),
            ast::Node::Unary(op, operand) => RollNode::Unary(Unary {
                op: *op,
                operand: Box::new(self.eval(operand)?),
            }),
            ast::Node::Binary(lhs, op, rhs) => {
                let lhs = Box::new(self.eval(lhs)?);
                let rhs = Box::new(self.eval(rhs)?);
                RollNode::Binary(Binary { lhs, op: *op, rhs })
            }
            ast::Node::Annotated(inner, annotations) => {
                return Ok(self.eval(inner)?.annotated(annotations.clone()));
            }
        };
        Ok(RollTree::new(node))
    }

    fn literal<'a>(&mut self, value: Number) -> RollNode<'a> {
        self.take_adv();
        RollNode::Literal(Literal(value))
    }

    fn set<'a>(&mut self, set: &ast::Set<'a>) -> RResult<Set<'a>> {
        if set.items.is_empty() {
            self.take_adv();
        }
        let items = set
            .items
            .iter()
            .map(|item| self.eval(item))
            .collect::<RResult<_>>()?;
        Set::select_from(items, set.ops.clone())
    }

    /// A plain `1d20` under advantage becomes `2d20` kept high (or low).
    fn dice(&mut self, dice: &ast::Dice) -> RResult<Dice> {
        let keep = self
            .take_adv()
            .keep_operator()
            .filter(|_| dice.num == Num::MIN && dice.sides.is_d20());
        let (num, ops) = match keep {
            Some(keep) => {
                let ops = std::iter::once(keep).chain(dice.ops.iter().cloned()).collect();
                (Num::MIN.saturating_add(1), ops)
            }
            None => (dice.num, dice.ops.clone()),
        };
        Dice::roll(self, num, dice.sides, ops)
    }
}

fn percentile_die() -> NonZeroUInt {
    NonZeroUInt::MIN.saturating_add(9)
}
