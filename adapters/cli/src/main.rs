#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the Temporal Bot puzzle.

mod config;
mod play;
mod render;
mod replay_transfer;
mod scores;
mod session;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use temporal_bot_level::{LevelDefinition, LevelPack};
use temporal_bot_system_scoring::format_time;
use temporal_bot_world::{query, SharedWorld, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::replay_transfer::ReplayScript;

#[derive(Debug, Parser)]
#[command(
    name = "temporal-bot",
    about = "Grid puzzle where every rewind adds another robot to the same timeline",
    version
)]
struct Cli {
    /// Log world events at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file overriding `tick_period_ms`, `animation_length_ms` or `particle_lifetime_ms`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// TOML level pack to use instead of the bundled levels.
    #[arg(long, global = true)]
    pack: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print a level's board and goals
    Show {
        /// Level id
        #[arg(short, long, default_value_t = 1)]
        level: u32,
    },

    /// Play a level with line-based input on stdin
    Play {
        /// Level id
        #[arg(short, long, default_value_t = 1)]
        level: u32,

        /// Score file updated when the level is completed
        #[arg(long)]
        scores: Option<PathBuf>,
    },

    /// Replay a script or replay code and print the final state
    Replay {
        /// Level id used with --script
        #[arg(short, long, default_value_t = 1)]
        level: u32,

        /// Steps such as `right@0,rewind@120,up@130` (times in milliseconds)
        #[arg(long, conflicts_with = "code")]
        script: Option<String>,

        /// Replay code printed at the end of `play`
        #[arg(long)]
        code: Option<String>,

        /// Score file updated when the replay completes the level
        #[arg(long)]
        scores: Option<PathBuf>,
    },

    /// List best scores against each level's goals
    Scores {
        /// Score file to read
        #[arg(long, default_value = "temporal-bot-scores.toml")]
        scores: PathBuf,
    },
}

/// Entry point for the Temporal Bot command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load(cli.config.as_deref())?;
    let pack = load_pack(cli.pack.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Show { level } => {
            let definition = find_level(&pack, level)?;
            let world = World::new(definition.layout()?, config);
            writeln!(out, "{} {}", definition.id(), definition.name())?;
            if let Some(instruction) = definition.instruction() {
                writeln!(out, "{instruction}")?;
            }
            write!(out, "{}", render::board(&world))?;
            writeln!(
                out,
                "goal: {} with {} robot(s)",
                format_time(definition.target_time()),
                definition.target_robots()
            )?;
        }
        Commands::Play { level, scores } => {
            let definition = find_level(&pack, level)?;
            let shared = SharedWorld::new(World::new(definition.layout()?, config));
            let stdin = io::stdin();
            let outcome = play::run(&shared, level, stdin.lock(), &mut out)?;

            writeln!(out, "replay code: {}", outcome.script.encode()?)?;
            if let (Some(result), Some(path)) = (outcome.result, scores.as_deref()) {
                report_record(&mut out, scores::record(path, level, &result)?)?;
            }
        }
        Commands::Replay {
            level,
            script,
            code,
            scores,
        } => {
            let script = match (code, script) {
                (Some(code), _) => ReplayScript::decode(&code)?,
                (None, Some(text)) => ReplayScript::parse(level, &text)?,
                (None, None) => bail!("provide either --script or --code"),
            };
            let definition = find_level(&pack, script.level)?;
            info!(level = script.level, steps = script.steps.len(), "replaying");

            let (world, _) = session::run_script(definition.layout()?, config, &script);
            write!(out, "{}", render::board(&world))?;
            writeln!(out, "{}", render::status(&world))?;
            writeln!(out, "script: {script}")?;
            writeln!(out, "code: {}", script.encode()?)?;
            writeln!(out, "fingerprint: {}", session::fingerprint(&world))?;
            if let (Some(result), Some(path)) = (query::result(&world), scores.as_deref()) {
                report_record(&mut out, scores::record(path, script.level, &result)?)?;
            }
        }
        Commands::Scores { scores } => {
            let book = scores::load(&scores)?;
            write!(out, "{}", scores::report(&pack, &book))?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_pack(path: Option<&Path>) -> Result<LevelPack> {
    let Some(path) = path else {
        return Ok(LevelPack::builtin()?);
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level pack {}", path.display()))?;
    LevelPack::from_toml_str(&contents)
        .with_context(|| format!("failed to load level pack {}", path.display()))
}

fn find_level(pack: &LevelPack, id: u32) -> Result<&LevelDefinition> {
    pack.get(id)
        .with_context(|| format!("level {id} is not part of the pack"))
}

fn report_record(out: &mut impl Write, improved: bool) -> Result<()> {
    if improved {
        writeln!(out, "new best score recorded")?;
    } else {
        writeln!(out, "score not improved")?;
    }
    Ok(())
}
