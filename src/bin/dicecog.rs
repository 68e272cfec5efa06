//! dicecog - roll dice from the command line or an interactive prompt.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dicecog::{stats::ChannelStats, CommandError, DiceCommands, DiceConfig, InMemoryStats, Reply};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dicecog", version, about)]
struct Cli {
    /// Configuration file, layered under `DICECOG_*` environment variables.
    #[arg(long, default_value = DiceConfig::FILE)]
    config: PathBuf,

    /// Who replies are addressed to.
    #[arg(long, default_value = "@you")]
    mention: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Roll one expression, e.g. `roll 1d20+5 adv Stealth`.
    #[command(alias = "r")]
    Roll {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        expr: Vec<String>,
    },
    /// Roll an expression several times.
    #[command(alias = "rr")]
    Multiroll {
        #[arg(allow_negative_numbers = true)]
        iterations: i64,
        expr: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Roll an expression several times and count results meeting a DC.
    #[command(alias = "rrr")]
    Iterroll {
        #[arg(allow_negative_numbers = true)]
        iterations: i64,
        expr: String,
        #[arg(allow_negative_numbers = true)]
        dc: Option<i64>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Read `!r`, `!rr`, `!rrr` and `!2` commands from stdin.
    Repl,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dicecog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = DiceConfig::load_from(&cli.config)?;

    let counters = Arc::new(InMemoryStats::new());
    let (stats, drain) = ChannelStats::forward_to(counters.clone());
    let commands = DiceCommands::new(config, Arc::new(stats));

    match cli.command.unwrap_or(Command::Repl) {
        Command::Roll { expr } => {
            let expr = expr.join(" ");
            print_reply(commands.roll(Some(&expr)), &cli.mention);
        }
        Command::Multiroll {
            iterations,
            expr,
            args,
        } => print_reply(
            commands.multiroll(iterations, &expr, &args.join(" ")),
            &cli.mention,
        ),
        Command::Iterroll {
            iterations,
            expr,
            dc,
            args,
        } => print_reply(
            commands.iterroll(iterations, &expr, dc, &args.join(" ")),
            &cli.mention,
        ),
        Command::Repl => repl(&commands, &cli.mention).await?,
    }

    let counter = commands.config().stat_counter.clone();
    drop(commands);
    drain.await?;
    info!(%counter, rolled = counters.get(&counter), "session statistics");
    Ok(())
}

fn print_reply(reply: Result<Reply, CommandError>, mention: &str) {
    match reply {
        Ok(reply) => println!("{}", reply.message(mention)),
        Err(why) => eprintln!("Error: {}", why),
    }
}

async fn repl(commands: &DiceCommands, mention: &str) -> Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    stdout.write_all(b"> ").await?;
    stdout.flush().await?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if !line.is_empty() {
            match dispatch(commands, line) {
                Ok(reply) => println!("{}", reply.message(mention)),
                Err(why) => eprintln!("Error: {}", why),
            }
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }
    Ok(())
}

/// Runs one `!command args...` line.
fn dispatch(commands: &DiceCommands, line: &str) -> Result<Reply, String> {
    let command = line
        .strip_prefix('!')
        .ok_or_else(|| format!("commands start with '!': {:?}", line))?;
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .unwrap_or((command, ""));
    let rest = rest.trim();

    let reply = match name {
        "r" | "roll" => commands.roll(Some(rest)),
        "2" => commands.quick_roll(Some(rest)),
        "rr" | "multiroll" => {
            let (iterations, expr, args) = split_batch_args(rest)
                .ok_or("usage: !rr <iterations> <expr> [args]")?;
            commands.multiroll(iterations, expr, &args.join(" "))
        }
        "rrr" | "iterroll" => {
            let (iterations, expr, mut args) = split_batch_args(rest)
                .ok_or("usage: !rrr <iterations> <expr> [dc] [args]")?;
            let dc = args.first().and_then(|x| x.parse().ok());
            if dc.is_some() {
                args.remove(0);
            }
            commands.iterroll(iterations, expr, dc, &args.join(" "))
        }
        _ => return Err(format!("unknown command {:?}", name)),
    };
    reply.map_err(|e| e.to_string())
}

fn split_batch_args(rest: &str) -> Option<(i64, &str, Vec<&str>)> {
    let mut words = rest.split_whitespace();
    let iterations = words.next()?.parse().ok()?;
    let expr = words.next()?;
    Some((iterations, expr, words.collect()))
}
