//! The dice chat commands: `roll`, `quick_roll`, `multiroll` and `iterroll`.
//!
//! Each call is one invocation. It compiles its expression once, owns its
//! own [`RollContext`] and random source, and returns a [`Reply`] for the
//! message layer to deliver.

use crate::adv::extract_advantage;
use crate::budget::{render_batch, render_single, Budget, RenderedOutput};
use crate::common::Int;
use crate::config::DiceConfig;
use crate::iter::{compile, evaluate, roll_iterations, tally, RollOutcome};
use crate::parse::ParseError;
use crate::roll::{MarkdownStringifier, RollContext, RollError, Roller};
use crate::stats::StatsCollector;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_EXPRESSION: &str = "1d20";
pub const DIVIDE_BY_ZERO_REPLY: &str = "What do you expect me to do, destroy the universe?";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error(transparent)]
    Syntax(#[from] ParseError),
    #[error("Too many or too few iterations.")]
    IterationCountOutOfRange { requested: Int, max: usize },
    #[error(transparent)]
    Evaluation(#[from] RollError),
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum ReplyKind {
    Plain,
    /// Kept whole so the message can be re-fit once the mention is known.
    Roll { outcome: RollOutcome, budget: Budget },
    Batch,
}

/// A command's answer, before it is addressed to anyone.
///
/// `text` and `truncated` describe the unaddressed reply.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Reply {
    pub text: String,
    pub truncated: bool,
    kind: ReplyKind,
}

impl Reply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            truncated: false,
            kind: ReplyKind::Plain,
        }
    }

    fn rendered(out: RenderedOutput, kind: ReplyKind) -> Self {
        Self {
            text: out.text,
            truncated: out.truncated,
            kind,
        }
    }

    /// The reply as sent to `mention`. A single roll is fit to its budget
    /// with the mention line included.
    pub fn addressed(&self, mention: &str) -> RenderedOutput {
        match &self.kind {
            ReplyKind::Plain => RenderedOutput {
                text: self.text.clone(),
                truncated: self.truncated,
            },
            ReplyKind::Roll { outcome, budget } => {
                render_single(outcome, &format!("{}  :game_die:\n", mention), *budget)
            }
            ReplyKind::Batch => RenderedOutput {
                text: format!("{}\n{}", mention, self.text),
                truncated: self.truncated,
            },
        }
    }

    /// The final message text for `mention`.
    pub fn message(&self, mention: &str) -> String {
        self.addressed(mention).text
    }
}

/// Where an invocation's dice come from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RollerSource {
    Thread,
    Seeded(u64),
}

impl RollerSource {
    pub fn roller(self) -> Box<dyn Roller> {
        match self {
            Self::Thread => Box::new(rand::thread_rng()),
            Self::Seeded(seed) => Box::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl From<&DiceConfig> for RollerSource {
    fn from(config: &DiceConfig) -> Self {
        config.seed.map_or(Self::Thread, Self::Seeded)
    }
}

pub struct DiceCommands {
    config: DiceConfig,
    source: RollerSource,
    stats: Arc<dyn StatsCollector>,
}

impl DiceCommands {
    pub fn new(config: DiceConfig, stats: Arc<dyn StatsCollector>) -> Self {
        let source = RollerSource::from(&config);
        Self {
            config,
            source,
            stats,
        }
    }

    pub fn with_source(mut self, source: RollerSource) -> Self {
        self.source = source;
        self
    }

    pub fn config(&self) -> &DiceConfig {
        &self.config
    }

    /// `!roll [expr]`: one verbose roll. Advantage words and a trailing
    /// comment may be mixed into the expression.
    pub fn roll(&self, expr: Option<&str>) -> Result<Reply, CommandError> {
        let raw = expr.map(str::trim).filter(|s| !s.is_empty());
        let raw = raw.unwrap_or(DEFAULT_EXPRESSION);
        if raw == "0/0" {
            return Ok(Reply::plain(DIVIDE_BY_ZERO_REPLY));
        }

        let (text, adv) = extract_advantage(raw);
        let compiled = compile(&text, true)?;
        let mut ctx = self.context();
        let mut roller = self.source.roller();
        let outcome = evaluate(
            &compiled,
            adv,
            &mut ctx,
            &mut *roller,
            &mut MarkdownStringifier::verbose(),
        )?;

        let budget = self.config.single_roll_budget();
        let rendered = render_single(&outcome, "", budget);
        info!(
            expr = raw,
            ?adv,
            total = outcome.total,
            truncated = rendered.truncated,
            "roll"
        );
        self.record_stats();
        Ok(Reply::rendered(rendered, ReplyKind::Roll { outcome, budget }))
    }

    /// `!2 [mod]`: a bare d20 plus a modifier.
    pub fn quick_roll(&self, modifier: Option<&str>) -> Result<Reply, CommandError> {
        let modifier = modifier.map(str::trim).filter(|s| !s.is_empty());
        let expr = format!("1d20+{}", modifier.unwrap_or("0"));
        self.roll(Some(&expr))
    }

    /// `!rr <iterations> <expr> [args]`
    pub fn multiroll(&self, iterations: Int, expr: &str, args: &str) -> Result<Reply, CommandError> {
        self.roll_batch(iterations, expr, None, args)
    }

    /// `!rrr <iterations> <expr> [dc] [args]`; the DC defaults to 0.
    pub fn iterroll(
        &self,
        iterations: Int,
        expr: &str,
        dc: Option<Int>,
        args: &str,
    ) -> Result<Reply, CommandError> {
        self.roll_batch(iterations, expr, Some(dc.unwrap_or(0)), args)
    }

    fn roll_batch(
        &self,
        iterations: Int,
        expr: &str,
        dc: Option<Int>,
        args: &str,
    ) -> Result<Reply, CommandError> {
        let iterations = self.check_iterations(iterations)?;
        let (_, adv) = extract_advantage(args);
        let compiled = compile(expr, false)?;

        let mut ctx = self.context();
        let mut roller = self.source.roller();
        let outcomes = roll_iterations(
            &compiled,
            adv,
            iterations,
            &mut ctx,
            &mut *roller,
            &mut MarkdownStringifier::new(),
        )?;
        let batch = tally(outcomes, dc);

        let rendered = render_batch(&batch, self.config.multiroll_budget());
        info!(
            expr,
            iterations,
            ?dc,
            ?adv,
            successes = ?batch.successes,
            sum = batch.sum,
            truncated = rendered.truncated,
            "multiroll"
        );
        self.record_stats();
        Ok(Reply::rendered(rendered, ReplyKind::Batch))
    }

    fn check_iterations(&self, requested: Int) -> Result<usize, CommandError> {
        let max = self.config.max_iterations;
        match usize::try_from(requested) {
            Ok(n) if (1..=max).contains(&n) => Ok(n),
            _ => Err(CommandError::IterationCountOutOfRange { requested, max }),
        }
    }

    fn context(&self) -> RollContext {
        RollContext::new_bounded(self.config.max_rolls)
    }

    fn record_stats(&self) {
        let counter = &self.config.stat_counter;
        if let Err(e) = self.stats.increment(counter) {
            warn!(%counter, error = %e, "failed to record dice statistic");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::InMemoryStats;

    fn commands() -> (DiceCommands, Arc<InMemoryStats>) {
        let stats = Arc::new(InMemoryStats::new());
        let config = DiceConfig {
            seed: Some(7),
            ..DiceConfig::default()
        };
        (DiceCommands::new(config, stats.clone()), stats)
    }

    #[test]
    fn test_reply_addressing() {
        let (cmds, _) = commands();
        let reply = cmds.roll(Some("1d1 + 2")).unwrap();
        assert_eq!(
            reply.message("@sam"),
            "@sam  :game_die:\n**Result**: 1d1 (**1**) + 2\n**Total**: 3"
        );

        let reply = cmds.multiroll(1, "1d1", "").unwrap();
        assert_eq!(reply.message("@sam"), "@sam\nRolling 1 iterations...\n1d1 (**1**) = `1`\n1 total.");

        let reply = cmds.roll(Some("0/0")).unwrap();
        assert_eq!(reply.message("@sam"), DIVIDE_BY_ZERO_REPLY);
    }

    #[test]
    fn test_mention_counts_toward_single_roll_budget() {
        let (cmds, _) = commands();
        // 1972 characters of breakdown
        let reply = cmds.roll(Some("277d1")).unwrap();
        assert!(!reply.truncated);
        assert!(!reply.addressed("@sam").truncated);

        let mention = "<@123456789012345678>";
        let sent = reply.addressed(mention);
        assert!(sent.truncated);
        assert!(sent.text.chars().count() <= 1999);
        assert!(sent.text.starts_with("<@123456789012345678>  :game_die:\n**Result**: 277d1 ("));
        assert!(sent.text.ends_with("...\n**Total:** 277"));
        assert_eq!(reply.message(mention), sent.text);
    }

    #[test]
    fn test_iteration_bounds() {
        let (cmds, stats) = commands();
        for n in [0, -3, 101, 150] {
            assert_eq!(
                cmds.multiroll(n, "1d1", ""),
                Err(CommandError::IterationCountOutOfRange { requested: n, max: 100 })
            );
        }
        assert!(cmds.iterroll(100, "1d1", None, "").is_ok());
        assert_eq!(stats.get("dice_rolled_life"), 1);
    }

    #[test]
    fn test_iteration_bounds_checked_before_compiling() {
        let (cmds, _) = commands();
        let err = cmds.multiroll(150, "1dx", "").unwrap_err();
        assert_eq!(err.to_string(), "Too many or too few iterations.");
    }

    #[test]
    fn test_seeded_source_repeats() {
        let (cmds, _) = commands();
        let a = cmds.multiroll(10, "4d6", "adv").unwrap();
        let b = cmds.multiroll(10, "4d6", "adv").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_commands_are_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DiceCommands>();
    }

    #[test]
    fn test_quick_roll() {
        let (cmds, _) = commands();
        let reply = cmds
            .with_source(RollerSource::Seeded(1))
            .quick_roll(Some("5"))
            .unwrap();
        assert!(reply.text.starts_with("**Result**: 1d20 ("));
        assert!(reply.text.contains(") + 5\n**Total**: "));
    }
}
