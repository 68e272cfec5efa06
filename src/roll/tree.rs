use super::{ctx::Evaluator, error::RollError, num::Number, roller::Roller, RResult, Stringify};
use crate::common::*;
use std::collections::BTreeSet;

/// A rolled value that may be dropped from its parent's total.
#[enum_dispatch::enum_dispatch]
pub trait Eval {
    fn kept(&self) -> bool {
        true
    }

    fn discard(&mut self) {}

    /// The value regardless of whether it is kept.
    fn value(&self) -> RResult<Number>;

    /// What this contributes to its parent.
    fn total(&self) -> RResult<Number> {
        if self.kept() {
            self.value()
        } else {
            Ok(Number::ZERO)
        }
    }
}

/// Dispatches a node to the matching `str_*` method of a stringifier.
#[enum_dispatch::enum_dispatch]
pub trait Render: Eval {
    fn render<S: Stringify + ?Sized>(&self, s: &mut S) -> RResult<String>;
}

/// The result of evaluating one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Roll<'a> {
    pub(crate) tree: RollTree<'a>,
    pub(crate) comment: Option<&'a str>,
}

impl<'a> Roll<'a> {
    pub fn total(&self) -> Result<Number, RollError> {
        self.tree.total()
    }

    pub fn comment(&self) -> Option<&'a str> {
        self.comment
    }
}

impl Eval for Roll<'_> {
    fn value(&self) -> RResult<Number> {
        self.tree.total()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollTree<'a> {
    pub node: RollNode<'a>,
    pub annotations: Vec<&'a str>,
    kept: bool,
}

impl<'a> RollTree<'a> {
    pub fn new(node: RollNode<'a>) -> Self {
        Self {
            node,
            annotations: Vec::new(),
            kept: true,
        }
    }

    pub fn annotated(mut self, annotations: Vec<&'a str>) -> Self {
        self.annotations = annotations;
        self
    }
}

impl Eval for RollTree<'_> {
    fn kept(&self) -> bool {
        self.kept
    }

    fn discard(&mut self) {
        self.kept = false;
    }

    fn value(&self) -> RResult<Number> {
        self.node.total()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch::enum_dispatch(Eval, Render)]
pub enum RollNode<'a> {
    Literal(Literal),
    Set(Set<'a>),
    Dice(Dice),
    Grouping(Grouping<'a>),
    Unary(Unary<'a>),
    Binary(Binary<'a>),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Literal(pub Number);

impl Eval for Literal {
    fn value(&self) -> RResult<Number> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Set<'a> {
    pub items: Vec<RollTree<'a>>,
    pub ops: Vec<Operator>,
}

impl<'a> Set<'a> {
    /// Builds the set and applies its keep/drop operators in order.
    pub(crate) fn select_from(items: Vec<RollTree<'a>>, ops: Vec<Operator>) -> RResult<Self> {
        let mut set = Self { items, ops };
        for op in &set.ops {
            if let Operand::Selectors(selectors) = &op.operand {
                match op.kind {
                    OperatorKind::Keep => keep_matching(&mut set.items, selectors)?,
                    OperatorKind::Drop => drop_matching(&mut set.items, selectors)?,
                    _ => {}
                }
            }
        }
        Ok(set)
    }
}

impl Eval for Set<'_> {
    fn value(&self) -> RResult<Number> {
        sum(&self.items)
    }
}

/// One face a die showed. A clamped face remembers what it was forced from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Face {
    pub history: NonEmpty<Int>,
    pub kept: bool,
    pub exploded: bool,
}

impl Face {
    fn new(value: Int) -> Self {
        Self {
            history: vec1![value],
            kept: true,
            exploded: false,
        }
    }

    pub fn value(&self) -> Int {
        *self.history.last()
    }
}

/// One physical die. Rerolling keeps the earlier faces, discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Die {
    pub sides: Sides,
    pub faces: NonEmpty<Face>,
    kept: bool,
}

impl Die {
    fn new(sides: Sides, value: Int) -> Self {
        Self {
            sides,
            faces: vec1![Face::new(value)],
            kept: true,
        }
    }

    fn face_mut(&mut self) -> &mut Face {
        self.faces.last_mut()
    }

    fn reroll<R: Roller + ?Sized>(&mut self, ev: &mut Evaluator<'_, R>) -> RResult<()> {
        let value = ev.roll_one(self.sides)?;
        self.face_mut().kept = false;
        self.faces.push(Face::new(value));
        Ok(())
    }
}

impl Eval for Die {
    fn kept(&self) -> bool {
        self.kept
    }

    fn discard(&mut self) {
        self.kept = false;
    }

    fn value(&self) -> RResult<Number> {
        Ok(self.faces.last().value().into())
    }
}

/// `NdS` with its operators applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Dice {
    pub num: Num,
    pub sides: Sides,
    pub rolled: Vec<Die>,
    pub ops: Vec<Operator>,
}

impl Dice {
    /// Rolls `num` dice and applies `ops` left to right.
    ///
    /// Every die is charged to the evaluator's context before it is rolled, so
    /// an oversized pool fails with [`RollError::TooManyRolls`] up front.
    pub(crate) fn roll<R: Roller + ?Sized>(
        ev: &mut Evaluator<'_, R>,
        num: Num,
        sides: Sides,
        ops: Vec<Operator>,
    ) -> RResult<Self> {
        let mut dice = Self {
            num,
            sides,
            rolled: Vec::new(),
            ops: Vec::new(),
        };
        dice.roll_more(ev, num.get())?;
        for op in &ops {
            dice.apply(ev, op)?;
        }
        dice.ops = ops;
        Ok(dice)
    }

    fn roll_more<R: Roller + ?Sized>(&mut self, ev: &mut Evaluator<'_, R>, n: usize) -> RResult<()> {
        let sides = self.sides;
        let faces = ev.roll(n, sides)?;
        self.rolled
            .extend(faces.into_iter().map(|value| Die::new(sides, value)));
        Ok(())
    }

    fn apply<R: Roller + ?Sized>(&mut self, ev: &mut Evaluator<'_, R>, op: &Operator) -> RResult<()> {
        let selectors = match &op.operand {
            Operand::Selectors(selectors) => selectors,
            Operand::Bound(bound) => {
                self.clamp(op.kind, *bound);
                return Ok(());
            }
        };
        match op.kind {
            OperatorKind::Keep => keep_matching(&mut self.rolled, selectors),
            OperatorKind::Drop => drop_matching(&mut self.rolled, selectors),
            OperatorKind::Reroll => self.reroll(ev, selectors, false),
            OperatorKind::RerollOnce => self.reroll(ev, selectors, true),
            OperatorKind::Explode => self.explode(ev, selectors, false),
            OperatorKind::ExplodeOnce => self.explode(ev, selectors, true),
            OperatorKind::Minimum | OperatorKind::Maximum => Ok(()),
        }
    }

    fn clamp(&mut self, kind: OperatorKind, bound: Int) {
        for die in self.rolled.iter_mut().filter(|die| die.kept) {
            let face = die.face_mut();
            let out_of_range = match kind {
                OperatorKind::Minimum => face.value() < bound,
                OperatorKind::Maximum => face.value() > bound,
                _ => false,
            };
            if out_of_range {
                face.history.push(bound);
            }
        }
    }

    // Unbounded rerolls stop once nothing matches or the context runs dry.
    fn reroll<R: Roller + ?Sized>(
        &mut self,
        ev: &mut Evaluator<'_, R>,
        selectors: &[Selector],
        once: bool,
    ) -> RResult<()> {
        let mut targets = select(&self.rolled, selectors, None)?;
        while !targets.is_empty() {
            for &i in &targets {
                self.rolled[i].reroll(ev)?;
            }
            if once {
                break;
            }
            targets = select(&self.rolled, selectors, None)?;
        }
        Ok(())
    }

    /// Adds a die for every match. `once` explodes at most one die and never
    /// chains; otherwise new dice may explode in turn.
    fn explode<R: Roller + ?Sized>(
        &mut self,
        ev: &mut Evaluator<'_, R>,
        selectors: &[Selector],
        once: bool,
    ) -> RResult<()> {
        let mut exploded = BTreeSet::new();
        let mut targets = select(&self.rolled, selectors, once.then(|| 1))?;
        while !targets.is_empty() {
            for &i in &targets {
                self.rolled[i].face_mut().exploded = true;
            }
            self.roll_more(ev, targets.len())?;
            if once {
                break;
            }
            exploded.append(&mut targets);
            targets = select(&self.rolled, selectors, None)?
                .difference(&exploded)
                .copied()
                .collect();
        }
        Ok(())
    }
}

impl Eval for Dice {
    fn value(&self) -> RResult<Number> {
        sum(&self.rolled)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grouping<'a>(pub Box<RollTree<'a>>);

impl Eval for Grouping<'_> {
    fn value(&self) -> RResult<Number> {
        self.0.total()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unary<'a> {
    pub op: UnaryOperator,
    pub operand: Box<RollTree<'a>>,
}

impl Eval for Unary<'_> {
    fn value(&self) -> RResult<Number> {
        let value = self.operand.total()?;
        Ok(match self.op {
            UnaryOperator::Pos => value,
            UnaryOperator::Neg => -value,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binary<'a> {
    pub lhs: Box<RollTree<'a>>,
    pub op: BinaryOperator,
    pub rhs: Box<RollTree<'a>>,
}

impl Eval for Binary<'_> {
    fn value(&self) -> RResult<Number> {
        self.op.apply(self.lhs.total()?, self.rhs.total()?)
    }
}

impl BinaryOperator {
    /// Comparisons yield 1 or 0.
    fn apply(self, lhs: Number, rhs: Number) -> RResult<Number> {
        let truth = |b: bool| Ok(Number::Int(Int::from(b)));
        match self {
            Self::Add => Ok(lhs + rhs),
            Self::Sub => Ok(lhs - rhs),
            Self::Mul => Ok(lhs * rhs),
            Self::Div | Self::Flr if rhs.is_zero() => Err(RollError::ZeroDivision),
            Self::Div => Ok(lhs.true_div(rhs)),
            Self::Flr => Ok(lhs.floor_div(rhs)),
            Self::Rem if rhs.is_zero() => Err(RollError::ZeroModulo),
            Self::Rem => Ok(lhs % rhs),
            Self::Lt => truth(lhs < rhs),
            Self::Gt => truth(lhs > rhs),
            Self::Le => truth(lhs <= rhs),
            Self::Ge => truth(lhs >= rhs),
            Self::Eq => truth(lhs == rhs),
            Self::Ne => truth(lhs != rhs),
        }
    }
}

macro_rules! render_with {
    ($($ty:ty => $method:ident),* $(,)?) => {$(
        impl Render for $ty {
            fn render<S: Stringify + ?Sized>(&self, s: &mut S) -> RResult<String> {
                s.$method(self)
            }
        }
    )*};
}

render_with! {
    Roll<'_> => str_roll,
    RollTree<'_> => str_roll_tree,
    Literal => str_literal,
    Set<'_> => str_set,
    Dice => str_dice,
    Die => str_die,
    Grouping<'_> => str_grouping,
    Unary<'_> => str_unary,
    Binary<'_> => str_binary,
}

fn sum<T: Eval>(items: &[T]) -> RResult<Number> {
    items
        .iter()
        .map(Eval::total)
        .try_fold(Number::ZERO, |acc, x| x.map(|x| acc + x))
}

/// Indices of kept members matched by any selector, at most `limit` of them.
fn select<T: Eval>(
    items: &[T],
    selectors: &[Selector],
    limit: Option<usize>,
) -> RResult<BTreeSet<usize>> {
    let mut picked = BTreeSet::new();
    for selector in selectors {
        let room = limit.map(|n| n.saturating_sub(picked.len()));
        if room == Some(0) {
            break;
        }
        picked.extend(selector.pick(items, room)?);
    }
    Ok(picked)
}

fn keep_matching<T: Eval>(items: &mut [T], selectors: &[Selector]) -> RResult<()> {
    let keep = select(items, selectors, None)?;
    for (i, item) in items.iter_mut().enumerate() {
        if item.kept() && !keep.contains(&i) {
            item.discard();
        }
    }
    Ok(())
}

fn drop_matching<T: Eval>(items: &mut [T], selectors: &[Selector]) -> RResult<()> {
    for i in select(items, selectors, None)? {
        items[i].discard();
    }
    Ok(())
}

impl Selector {
    /// Ties go to the earlier member.
    fn pick<T: Eval>(self, items: &[T], limit: Option<usize>) -> RResult<Vec<usize>> {
        let mut candidates = items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.kept())
            .map(|(i, item)| item.value().map(|v| (i, v)))
            .collect::<RResult<Vec<_>>>()?;

        match self {
            Self::Highest(n) => {
                candidates.sort_by(|(_, a), (_, b)| b.total_cmp(a));
                candidates.truncate(n);
            }
            Self::Lowest(n) => {
                candidates.sort_by(|(_, a), (_, b)| a.total_cmp(b));
                candidates.truncate(n);
            }
            Self::Less(x) => candidates.retain(|(_, v)| *v < Number::from(x)),
            Self::Greater(x) => candidates.retain(|(_, v)| *v > Number::from(x)),
            Self::Equal(x) => candidates.retain(|(_, v)| *v == Number::from(x)),
        }
        if let Some(limit) = limit {
            candidates.truncate(limit);
        }
        Ok(candidates.into_iter().map(|(i, _)| i).collect())
    }
}
