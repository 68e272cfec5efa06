//! Fitting roll output into a chat message.
//!
//! Lengths are counted in characters, never bytes, and cuts always land on a
//! character boundary.

use crate::iter::{IterationBatch, RollOutcome};
use std::fmt::Write;

/// Size limits for one rendered reply.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Budget {
    /// Longest text sent in full.
    pub limit: usize,
    /// How much of a breakdown survives truncation.
    pub sample_prefix: usize,
}

impl Budget {
    pub const SINGLE_ROLL: Self = Self::new(1999, 100);
    pub const MULTIROLL: Self = Self::new(1500, 100);

    pub const fn new(limit: usize, sample_prefix: usize) -> Self {
        Self {
            limit,
            sample_prefix,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RenderedOutput {
    pub text: String,
    pub truncated: bool,
}

/// Cuts `text` to at most `prefix` characters, marking the cut with `...`.
pub fn truncate_sample(text: &str, prefix: usize) -> String {
    match text.char_indices().nth(prefix) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Renders a multi-roll: header, one line per outcome, footer.
///
/// When that is over budget only the first outcome is shown, cut to the
/// sample prefix.
pub fn render_batch(batch: &IterationBatch, budget: Budget) -> RenderedOutput {
    let iterations = batch.outcomes.len();
    let header = match batch.dc {
        Some(dc) => format!("Rolling {} iterations, DC {}...", iterations, dc),
        None => format!("Rolling {} iterations...", iterations),
    };
    let footer = match batch.successes {
        Some(successes) => format!("{} successes, {} total.", successes, batch.sum),
        None => format!("{} total.", batch.sum),
    };

    let mut text = header.clone();
    for outcome in &batch.outcomes {
        let _ = write!(text, "\n{}", outcome.breakdown);
    }
    let _ = write!(text, "\n{}", footer);

    if text.chars().count() <= budget.limit {
        return RenderedOutput {
            text,
            truncated: false,
        };
    }

    let sample = batch
        .outcomes
        .first()
        .map(|o| truncate_sample(&o.breakdown, budget.sample_prefix))
        .unwrap_or_default();
    RenderedOutput {
        text: format!("{}\n{}\n{}", header, sample, footer),
        truncated: true,
    }
}

/// Renders a single roll after `prefix`, the addressing line of the message.
///
/// The prefix counts toward the limit. An oversized breakdown is cut and the
/// total repeated on its own line.
pub fn render_single(outcome: &RollOutcome, prefix: &str, budget: Budget) -> RenderedOutput {
    let length = prefix.chars().count() + outcome.breakdown.chars().count();
    if length <= budget.limit {
        return RenderedOutput {
            text: format!("{}{}", prefix, outcome.breakdown),
            truncated: false,
        };
    }

    let head: String = outcome.breakdown.chars().take(budget.sample_prefix).collect();
    RenderedOutput {
        text: format!("{}{}...\n**Total:** {}", prefix, head, outcome.total),
        truncated: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::AdvType;
    use crate::iter::tally;

    fn outcome(total: i64, breakdown: impl Into<String>) -> RollOutcome {
        RollOutcome {
            total,
            breakdown: breakdown.into(),
            adv: AdvType::None,
        }
    }

    #[test]
    fn test_full_listing() {
        let batch = tally(
            (0..3).map(|_| outcome(1, "1d1 (**1**) = `1`")).collect(),
            None,
        );
        let out = render_batch(&batch, Budget::MULTIROLL);
        assert!(!out.truncated);
        assert_eq!(
            out.text,
            "Rolling 3 iterations...\n1d1 (**1**) = `1`\n1d1 (**1**) = `1`\n1d1 (**1**) = `1`\n3 total."
        );
    }

    #[test]
    fn test_full_listing_with_dc() {
        let batch = tally(vec![outcome(4, "a"), outcome(9, "b")], Some(5));
        let out = render_batch(&batch, Budget::MULTIROLL);
        assert_eq!(out.text, "Rolling 2 iterations, DC 5...\na\nb\n1 successes, 13 total.");
    }

    #[test]
    fn test_over_budget_shows_one_sample() {
        let long = "x".repeat(150);
        let batch = tally((0..20).map(|_| outcome(2, long.as_str())).collect(), Some(3));
        let out = render_batch(&batch, Budget::MULTIROLL);
        assert!(out.truncated);
        assert_eq!(
            out.text,
            format!(
                "Rolling 20 iterations, DC 3...\n{}...\n0 successes, 40 total.",
                "x".repeat(100)
            )
        );
    }

    #[test]
    fn test_short_sample_has_no_ellipsis() {
        let batch = tally(vec![outcome(1, "short"); 10], None);
        let out = render_batch(&batch, Budget::new(20, 100));
        assert!(out.truncated);
        assert_eq!(out.text, "Rolling 10 iterations...\nshort\n10 total.");
    }

    #[test]
    fn test_exactly_at_limit_is_not_truncated() {
        let batch = tally(vec![outcome(1, "ab")], None);
        let full = "Rolling 1 iterations...\nab\n1 total.";
        let at_limit = render_batch(&batch, Budget::new(full.chars().count(), 1));
        assert!(!at_limit.truncated);
        let over = render_batch(&batch, Budget::new(full.chars().count() - 1, 1));
        assert_eq!(over.text, "Rolling 1 iterations...\na...\n1 total.");
    }

    #[test]
    fn test_cuts_on_char_boundaries() {
        assert_eq!(truncate_sample("ééééé", 3), "ééé...");
        assert_eq!(truncate_sample("ééé", 3), "ééé");
        assert_eq!(truncate_sample("", 0), "");
    }

    #[test]
    fn test_single_roll() {
        let small = outcome(14, "**Result**: 1d20 (10) + 4\n**Total**: 14");
        let out = render_single(&small, "", Budget::SINGLE_ROLL);
        assert_eq!(out.text, small.breakdown);
        assert!(!out.truncated);

        let big = outcome(7, "y".repeat(2000));
        let out = render_single(&big, "", Budget::SINGLE_ROLL);
        assert!(out.truncated);
        assert_eq!(out.text, format!("{}...\n**Total:** 7", "y".repeat(100)));
    }

    #[test]
    fn test_single_roll_prefix_counts_toward_limit() {
        let body = outcome(3, "z".repeat(15));
        let out = render_single(&body, "@sam: ", Budget::new(21, 4));
        assert!(!out.truncated);
        assert_eq!(out.text, format!("@sam: {}", "z".repeat(15)));

        let out = render_single(&body, "@samuel: ", Budget::new(21, 4));
        assert!(out.truncated);
        assert_eq!(out.text, "@samuel: zzzz...\n**Total:** 3");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let batch = tally(vec![outcome(5, "z".repeat(300)); 8], Some(5));
        assert_eq!(
            render_batch(&batch, Budget::MULTIROLL),
            render_batch(&batch, Budget::MULTIROLL)
        );
    }
}
