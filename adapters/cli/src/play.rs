use std::{
    io::{BufRead, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use temporal_bot_core::{Command, Event, GameResult};
use temporal_bot_world::{query, SharedWorld};
use tracing::{debug, info};

use crate::{
    render,
    replay_transfer::{ReplayAction, ReplayScript, ReplayStep},
};

const HELP: &str =
    "w/a/s/d move, z rewind, t restart timeline, x restart level, p pause, empty line redraws, q quits";

/// What an interactive session leaves behind.
#[derive(Debug)]
pub(crate) struct PlayOutcome {
    /// Inputs accepted since the last full restart.
    pub(crate) script: ReplayScript,
    /// Latest win summary, if the level was completed.
    pub(crate) result: Option<GameResult>,
}

/// Runs an interactive session until `quit` or the end of input.
///
/// A driver thread ticks the shared world at the configured period while
/// this thread turns input lines into commands.
pub(crate) fn run(
    shared: &SharedWorld,
    level: u32,
    input: impl BufRead,
    output: &mut impl Write,
) -> Result<PlayOutcome> {
    let period = shared.read(|world| query::config(world).tick_period());
    let stop = Arc::new(AtomicBool::new(false));
    let driver = {
        let shared = shared.clone();
        let stop = Arc::clone(&stop);
        thread::spawn(move || drive(&shared, &stop, period))
    };

    let outcome = read_input(shared, level, input, output);
    stop.store(true, Ordering::Release);
    driver
        .join()
        .map_err(|_| anyhow!("driver thread panicked"))?;
    outcome
}

fn drive(shared: &SharedWorld, stop: &AtomicBool, period: Duration) {
    while !stop.load(Ordering::Acquire) {
        thread::sleep(period);
        if shared.read(query::has_finished) {
            continue;
        }
        for event in shared.apply(Command::Tick { dt: period }) {
            match event {
                Event::TimeAdvanced { .. } => {}
                Event::LevelCompleted { result } => info!(
                    robots = result.robot_count,
                    timeline_ms = result.timeline_time.as_millis() as u64,
                    "level completed"
                ),
                other => debug!(event = ?other, "world event"),
            }
        }
    }
}

fn read_input(
    shared: &SharedWorld,
    level: u32,
    input: impl BufRead,
    output: &mut impl Write,
) -> Result<PlayOutcome> {
    let mut script = ReplayScript {
        level,
        steps: Vec::new(),
    };
    writeln!(output, "{}", shared.read(query::welcome_banner))?;
    writeln!(output, "{HELP}")?;
    draw(shared, output)?;

    for line in input.lines() {
        let line = line.context("failed to read input")?;
        match line.trim() {
            "" => {}
            "q" | "quit" => break,
            "p" | "pause" => {
                let running = shared.read(query::is_running);
                let _ = shared.apply(Command::SetRunning { running: !running });
            }
            "x" | "reset" => {
                let _ = shared.apply(Command::Restart);
                script.steps.clear();
            }
            other => match other.parse::<ReplayAction>() {
                Ok(action) => {
                    let (at, events) =
                        shared.observe_and_apply(query::elapsed_time, action.command());
                    let rejection = events.iter().find_map(|event| match event {
                        Event::RewindRejected { reason } => Some(*reason),
                        _ => None,
                    });
                    match rejection {
                        Some(reason) => writeln!(output, "rewind refused: {reason:?}")?,
                        None => script.steps.push(ReplayStep::new(at, action)),
                    }
                }
                Err(error) => writeln!(output, "{error} ({HELP})")?,
            },
        }
        draw(shared, output)?;
    }

    Ok(PlayOutcome {
        script,
        result: shared.read(query::result),
    })
}

fn draw(shared: &SharedWorld, output: &mut impl Write) -> Result<()> {
    let (board, status) = shared.read(|world| (render::board(world), render::status(world)));
    write!(output, "{board}")?;
    writeln!(output, "{status}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use temporal_bot_core::{Direction, SimulationConfig};
    use temporal_bot_level::parse_layout;
    use temporal_bot_world::World;

    use super::*;

    fn shared_first_push() -> SharedWorld {
        let layout = parse_layout("11111_1>aA1_11111_").expect("valid level");
        SharedWorld::new(World::new(layout, SimulationConfig::default()))
    }

    fn session(input: &str) -> (PlayOutcome, String) {
        let shared = shared_first_push();
        let mut output = Vec::new();
        let outcome =
            run(&shared, 1, Cursor::new(input.to_owned()), &mut output).expect("session runs");
        (outcome, String::from_utf8(output).expect("utf-8 output"))
    }

    #[test]
    fn accepted_inputs_are_recorded() {
        let (outcome, output) = session("d\nq\n");

        assert_eq!(outcome.script.level, 1);
        assert_eq!(outcome.script.steps.len(), 1);
        assert_eq!(
            outcome.script.steps[0].action,
            ReplayAction::Move(Direction::Right)
        );
        assert!(output.starts_with("Welcome to Temporal Bot."));
    }

    #[test]
    fn refused_rewinds_are_reported_and_not_recorded() {
        let (outcome, output) = session("z\n");

        assert!(outcome.script.steps.is_empty());
        assert!(output.contains("rewind refused: SpawnOccupied"));
    }

    #[test]
    fn unknown_input_prints_help() {
        let (outcome, output) = session("jump\nq\n");

        assert!(outcome.script.steps.is_empty());
        assert!(output.contains("unknown action 'jump'"));
    }

    #[test]
    fn full_restart_discards_the_recording() {
        let (outcome, _) = session("d\nx\n");
        assert!(outcome.script.steps.is_empty());
    }
}
