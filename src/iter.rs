//! Repeated evaluation of one compiled expression.

use crate::common::{AdvType, Int};
use crate::parse::{self, ast::Expression, ParseError};
use crate::roll::{RollContext, RollError, Roller, Stringify};
use tracing::debug;

/// Compiles `text` once for the whole invocation.
///
/// With `allow_comments`, text separated from the expression by whitespace
/// becomes the roll's comment instead of a syntax error.
pub fn compile(text: &str, allow_comments: bool) -> Result<Expression<'_>, ParseError> {
    if allow_comments {
        parse::parse_commented(text)
    } else {
        parse::parse(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollOutcome {
    /// Integer part of the evaluated total.
    pub total: Int,
    pub breakdown: String,
    pub adv: AdvType,
}

/// Evaluates `expr` once and renders the result with `stringifier`.
pub fn evaluate<R, S>(
    expr: &Expression<'_>,
    adv: AdvType,
    ctx: &mut RollContext,
    roller: &mut R,
    stringifier: &mut S,
) -> Result<RollOutcome, RollError>
where
    R: Roller + ?Sized,
    S: Stringify,
{
    let roll = ctx.eval(expr, adv, roller)?;
    Ok(RollOutcome {
        total: roll.total()?.as_int(),
        breakdown: stringifier.stringify(&roll)?,
        adv,
    })
}

/// Evaluates `expr` `iterations` times in order, all against the same context.
///
/// Each iteration sees whatever the previous one left in `ctx`. The first
/// failure aborts the loop and nothing is returned for the iterations that
/// already ran.
pub fn roll_iterations<R, S>(
    expr: &Expression<'_>,
    adv: AdvType,
    iterations: usize,
    ctx: &mut RollContext,
    roller: &mut R,
    stringifier: &mut S,
) -> Result<Vec<RollOutcome>, RollError>
where
    R: Roller + ?Sized,
    S: Stringify,
{
    let outcomes = (0..iterations)
        .map(|_| evaluate(expr, adv, ctx, roller, stringifier))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(iterations, rolls = ctx.rolls(), ?adv, "rolled iteration batch");
    Ok(outcomes)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationBatch {
    pub outcomes: Vec<RollOutcome>,
    pub dc: Option<Int>,
    /// Outcomes with `total >= dc`; `None` when there is no DC.
    pub successes: Option<usize>,
    pub sum: i64,
}

/// Counts successes against `dc` and sums the totals.
pub fn tally(outcomes: Vec<RollOutcome>, dc: Option<Int>) -> IterationBatch {
    let successes = dc.map(|dc| outcomes.iter().filter(|o| o.total >= dc).count());
    let sum = outcomes
        .iter()
        .fold(0i64, |acc, o| acc.saturating_add(o.total));
    IterationBatch {
        outcomes,
        dc,
        successes,
        sum,
    }
}
