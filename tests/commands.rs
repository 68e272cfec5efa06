use dicecog::commands::DIVIDE_BY_ZERO_REPLY;
use dicecog::roll::RollError;
use dicecog::stats::{StatsCollector, StatsError};
use dicecog::{CommandError, DiceCommands, DiceConfig, InMemoryStats, RollerSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const COUNTER: &str = "dice_rolled_life";

fn setup() -> (DiceCommands, Arc<InMemoryStats>) {
    let stats = Arc::new(InMemoryStats::new());
    let commands = DiceCommands::new(DiceConfig::default(), stats.clone())
        .with_source(RollerSource::Seeded(2024));
    (commands, stats)
}

/// Fails every increment, counting the attempts.
#[derive(Default)]
struct BrokenStats {
    attempts: AtomicUsize,
}

impl StatsCollector for BrokenStats {
    fn increment(&self, _counter: &str) -> Result<(), StatsError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StatsError::Backend("database is down".to_string()))
    }
}

#[test]
fn multiroll_without_dc() {
    let (commands, stats) = setup();
    let reply = commands.multiroll(3, "1d1", "").unwrap();
    assert!(!reply.truncated);
    assert_eq!(
        reply.text,
        "Rolling 3 iterations...\n1d1 (**1**) = `1`\n1d1 (**1**) = `1`\n1d1 (**1**) = `1`\n3 total."
    );
    assert_eq!(stats.get(COUNTER), 1);
}

#[test]
fn iterroll_counts_successes() {
    let (commands, stats) = setup();
    let reply = commands.iterroll(5, "1d1", Some(1), "").unwrap();
    assert!(reply.text.starts_with("Rolling 5 iterations, DC 1...\n"));
    assert!(reply.text.ends_with("\n5 successes, 5 total."));
    assert_eq!(stats.get(COUNTER), 1);
}

#[test]
fn iterroll_dc_defaults_to_zero() {
    let (commands, _) = setup();
    let reply = commands.iterroll(2, "1d1-1", None, "").unwrap();
    assert!(reply.text.starts_with("Rolling 2 iterations, DC 0...\n"));
    assert!(reply.text.ends_with("\n2 successes, 0 total."));
}

#[test]
fn divide_by_zero_joke() {
    let (commands, stats) = setup();
    let reply = commands.roll(Some("0/0")).unwrap();
    assert_eq!(reply.message("@kit"), DIVIDE_BY_ZERO_REPLY);
    assert_eq!(stats.get(COUNTER), 0);
}

#[test]
fn syntax_error_produces_no_output() {
    let (commands, stats) = setup();
    let err = commands.multiroll(3, "1dx", "").unwrap_err();
    assert!(matches!(err, CommandError::Syntax(_)), "{:?}", err);
    assert!(matches!(commands.roll(Some("1d20+")), Err(CommandError::Syntax(_))));
    assert_eq!(stats.get(COUNTER), 0);
}

#[test]
fn iteration_count_checked_first() {
    let (commands, stats) = setup();
    let err = commands.multiroll(150, "1dx", "").unwrap_err();
    assert_eq!(
        err,
        CommandError::IterationCountOutOfRange {
            requested: 150,
            max: 100
        }
    );
    assert_eq!(err.to_string(), "Too many or too few iterations.");
    assert_eq!(stats.get(COUNTER), 0);
}

#[test]
fn roll_ceiling_is_shared_across_iterations() {
    let (commands, stats) = setup();
    // 20 dice per iteration stays under the ceiling, 100 iterations does not
    assert!(commands.multiroll(1, "20d20", "").is_ok());
    assert_eq!(
        commands.multiroll(100, "20d20", ""),
        Err(CommandError::Evaluation(RollError::TooManyRolls))
    );
    assert_eq!(stats.get(COUNTER), 1);
}

#[test]
fn oversized_dice_pool_hits_the_ceiling() {
    let (commands, stats) = setup();
    assert_eq!(
        commands.roll(Some("10000000000000000000d6")),
        Err(CommandError::Evaluation(RollError::TooManyRolls))
    );
    assert_eq!(
        commands.multiroll(2, "18446744073709551615d4", ""),
        Err(CommandError::Evaluation(RollError::TooManyRolls))
    );
    assert_eq!(stats.get(COUNTER), 0);
}

#[test]
fn long_mention_truncates_single_roll() {
    let (commands, _) = setup();
    let reply = commands.roll(Some("277d1")).unwrap();
    assert!(!reply.truncated);

    let message = reply.message("<@123456789012345678>");
    assert!(message.chars().count() <= 1999);
    assert_eq!(
        message,
        format!(
            "<@123456789012345678>  :game_die:\n{}...\n**Total:** 277",
            &reply.text[..100]
        )
    );
}

#[test]
fn large_batches_are_truncated() {
    let (commands, _) = setup();
    let reply = commands.multiroll(100, "5d6", "").unwrap();
    assert!(reply.truncated);

    let lines: Vec<_> = reply.text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Rolling 100 iterations...");
    assert!(lines[1].starts_with("5d6 ("));
    assert!(lines[2].ends_with(" total."));
}

#[test]
fn advantage_from_args() {
    let (commands, _) = setup();
    let reply = commands.multiroll(4, "1d20+2", "adv").unwrap();
    let rolls: Vec<_> = reply.text.lines().skip(1).take(4).collect();
    assert!(rolls.iter().all(|line| line.starts_with("2d20kh1 (")), "{:?}", rolls);

    let reply = commands.iterroll(4, "1d20+2", Some(10), "dis").unwrap();
    assert!(reply.text.lines().nth(1).unwrap().starts_with("2d20kl1 ("));
}

#[test]
fn single_roll_with_advantage_and_comment() {
    let (commands, _) = setup();
    let reply = commands.roll(Some("1d20+5 adv Stealth")).unwrap();
    assert!(
        reply.text.starts_with("**Stealth**: 2d20kh1 ("),
        "{}",
        reply.text
    );
    assert!(reply.message("@kit").starts_with("@kit  :game_die:\n**Stealth**: "));
}

#[test]
fn default_roll_is_a_d20() {
    let (commands, _) = setup();
    let reply = commands.roll(None).unwrap();
    assert!(reply.text.starts_with("**Result**: 1d20 ("), "{}", reply.text);
}

#[test]
fn statistics_failures_are_swallowed() {
    let stats = Arc::new(BrokenStats::default());
    let commands = DiceCommands::new(DiceConfig::default(), stats.clone());

    assert!(commands.roll(Some("1d4")).is_ok());
    assert!(commands.multiroll(2, "1d4", "").is_ok());
    assert!(commands.iterroll(2, "1d4", Some(3), "").is_ok());
    assert_eq!(stats.attempts.load(Ordering::SeqCst), 3);
}

#[test]
fn configured_limits_apply() {
    let config = DiceConfig {
        max_iterations: 5,
        multiroll_budget: 40,
        sample_prefix: 4,
        ..DiceConfig::default()
    };
    let commands = DiceCommands::new(config, Arc::new(InMemoryStats::new()));

    assert!(matches!(
        commands.multiroll(6, "1d1", ""),
        Err(CommandError::IterationCountOutOfRange { requested: 6, max: 5 })
    ));

    let reply = commands.multiroll(5, "1d1", "").unwrap();
    assert!(reply.truncated);
    assert_eq!(reply.text, "Rolling 5 iterations...\n1d1 ...\n5 total.");
}
