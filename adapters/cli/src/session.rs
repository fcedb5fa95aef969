use std::time::Duration;

use sha2::{Digest, Sha256};
use temporal_bot_core::{Command, Event, LevelLayout, SimulationConfig};
use temporal_bot_world::{self as world, query, World};
use tracing::debug;

use crate::replay_transfer::ReplayScript;

/// Simulated time a replay keeps ticking after its final step before giving up.
const SETTLE_LIMIT: Duration = Duration::from_secs(5);

/// Replays a recorded script against a fresh world.
///
/// Steps due at the current clock are applied before each tick, matching
/// the order in which a live session observes them.
pub(crate) fn run_script(
    layout: LevelLayout,
    config: SimulationConfig,
    script: &ReplayScript,
) -> (World, Vec<Event>) {
    let mut world = World::new(layout, config);
    let mut events = Vec::new();
    let mut steps = script.steps.iter().peekable();
    let deadline = script
        .steps
        .last()
        .map_or(Duration::ZERO, |step| step.at())
        + SETTLE_LIMIT;

    loop {
        while let Some(step) = steps.next_if(|step| step.at() <= query::elapsed_time(&world)) {
            debug!(%step, "replaying step");
            world::apply(&mut world, step.action.command(), &mut events);
        }

        let settled = steps.peek().is_none()
            && (query::has_finished(&world) || query::elapsed_time(&world) >= deadline);
        if settled {
            break;
        }

        world::apply(
            &mut world,
            Command::Tick {
                dt: config.tick_period(),
            },
            &mut events,
        );
    }

    (world, events)
}

/// SHA-256 digest of the logical state that determinism guarantees cover.
pub(crate) fn fingerprint(world: &World) -> String {
    let mut hasher = Sha256::new();
    for robot in query::robots(world) {
        hasher.update(robot.id.get().to_le_bytes());
        hasher.update(robot.cell.column().to_le_bytes());
        hasher.update(robot.cell.row().to_le_bytes());
        hasher.update([robot.facing.quarter_turns(), u8::from(robot.visible)]);
    }
    for pushable in query::boxes(world) {
        hasher.update(pushable.id.get().to_le_bytes());
        hasher.update(pushable.cell.column().to_le_bytes());
        hasher.update(pushable.cell.row().to_le_bytes());
        hasher.update([u8::from(pushable.visible)]);
    }
    hasher.update([u8::from(query::has_won(world))]);

    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use temporal_bot_level::parse_layout;

    fn first_push() -> LevelLayout {
        parse_layout("11111_1>aA1_11111_").expect("valid level")
    }

    #[test]
    fn scripted_push_completes_the_level() {
        let script = ReplayScript::parse(1, "right@0").expect("script parses");
        let (world, events) = run_script(first_push(), SimulationConfig::default(), &script);

        assert!(query::has_finished(&world));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::LevelCompleted { .. })));
        let result = query::result(&world).expect("result");
        assert_eq!(result.robot_count, 1);
    }

    #[test]
    fn unfinished_script_stops_after_settling() {
        let script = ReplayScript::parse(1, "left@0").expect("script parses");
        let (world, _) = run_script(first_push(), SimulationConfig::default(), &script);

        assert!(!query::has_won(&world));
        assert!(query::elapsed_time(&world) >= SETTLE_LIMIT);
    }

    #[test]
    fn fingerprint_is_stable_and_state_sensitive() {
        let winning = ReplayScript::parse(1, "right@0").expect("script parses");
        let idle = ReplayScript::default();

        let (first, _) = run_script(first_push(), SimulationConfig::default(), &winning);
        let (second, _) = run_script(first_push(), SimulationConfig::default(), &winning);
        let (third, _) = run_script(first_push(), SimulationConfig::default(), &idle);

        assert_eq!(fingerprint(&first), fingerprint(&second));
        assert_ne!(fingerprint(&first), fingerprint(&third));
        assert_eq!(fingerprint(&first).len(), 64);
    }
}
