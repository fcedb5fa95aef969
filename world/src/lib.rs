#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Temporal Bot.

mod movable;
mod particles;
mod push;
mod shared;
mod timeline;

use std::time::Duration;

use temporal_bot_core::{
    BoxId, BoxSnapshot, Command, Event, GameResult, Intent, LevelLayout, MovableId,
    RewindRejection, RobotId, SimulationConfig, WELCOME_BANNER,
};
use tracing::{debug, info};

pub use shared::SharedWorld;

use movable::PushBox;
use particles::Particle;
use push::{Bodies, Resolution};
use timeline::Robot;

/// Represents the authoritative Temporal Bot world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SimulationConfig,
    layout: LevelLayout,
    robots: Vec<Robot>,
    boxes: Vec<PushBox>,
    particles: Vec<Particle>,
    elapsed: Duration,
    running: bool,
    won: bool,
    can_rewind: bool,
    result: Option<GameResult>,
}

impl World {
    /// Creates a world that plays the provided level from its initial configuration.
    #[must_use]
    pub fn new(layout: LevelLayout, config: SimulationConfig) -> Self {
        let mut world = Self {
            banner: WELCOME_BANNER,
            config,
            layout,
            robots: Vec::new(),
            boxes: Vec::new(),
            particles: Vec::new(),
            elapsed: Duration::ZERO,
            running: true,
            won: false,
            can_rewind: false,
            result: None,
        };
        world.restart();
        world
    }

    fn restart(&mut self) {
        self.robots = vec![Robot::founder(RobotId::new(0), self.layout.start())];
        self.boxes = self
            .layout
            .boxes()
            .iter()
            .enumerate()
            .map(|(index, placement)| {
                PushBox::new(BoxId::new(index as u32), placement.cell, placement.color)
            })
            .collect();
        self.particles.clear();
        self.elapsed = Duration::ZERO;
        self.running = true;
        self.won = false;
        self.result = None;
        self.refresh_can_rewind();
    }

    fn active(&self) -> Option<&Robot> {
        self.robots.last()
    }

    fn rewind_rejection(&self) -> Option<RewindRejection> {
        if self.won {
            return Some(RewindRejection::LevelWon);
        }
        if !self.active().map_or(false, Robot::is_present) {
            return Some(RewindRejection::ActiveRobotAbsent);
        }
        if push::occupant(&self.robots, &self.boxes, self.layout.start().cell).is_some() {
            return Some(RewindRejection::SpawnOccupied);
        }
        None
    }

    fn refresh_can_rewind(&mut self) {
        self.can_rewind = self.rewind_rejection().is_none();
    }

    fn record_on_active(&mut self, intent: Intent, out_events: &mut Vec<Event>) {
        let now = self.elapsed;
        let Some(robot) = self.robots.last_mut() else {
            return;
        };
        robot.log.record(intent, now);
        out_events.push(Event::IntentQueued {
            robot: robot.id,
            intent,
            execute_at: now,
        });
    }

    fn spawn_successor(&mut self, out_events: &mut Vec<Event>) -> RobotId {
        let id = RobotId::new(self.robots.len() as u32);
        let start = self.layout.start();
        self.robots.push(Robot::spawn(id, start, self.elapsed));
        out_events.push(Event::RobotSpawned {
            robot: id,
            cell: start.cell,
            spawned_at: self.elapsed,
        });
        id
    }

    fn issue_rewind(&mut self, out_events: &mut Vec<Event>) {
        if let Some(reason) = self.rewind_rejection() {
            debug!(?reason, "rewind rejected");
            out_events.push(Event::RewindRejected { reason });
            return;
        }

        if let Some(cell) = self.active().map(|robot| robot.body.cell()) {
            self.particles.push(Particle::new(cell, self.elapsed));
        }
        self.record_on_active(Intent::Rewind, out_events);
        let robot = self.spawn_successor(out_events);
        info!(
            robot = robot.get(),
            elapsed_ms = self.elapsed.as_millis() as u64,
            "rewound to a new robot"
        );
        self.refresh_can_rewind();
    }

    fn restart_timeline(&mut self, out_events: &mut Vec<Event>) {
        if self.active().map_or(false, Robot::is_present) {
            self.record_on_active(Intent::Rewind, out_events);
            let _ = self.spawn_successor(out_events);
        }

        for robot in &mut self.robots {
            robot.reset();
        }
        for pushable in &mut self.boxes {
            pushable.body.reset();
        }
        self.particles.clear();
        self.elapsed = Duration::ZERO;
        self.won = false;
        self.result = None;
        self.refresh_can_rewind();

        info!(robots = self.robots.len(), "timeline restarted");
        out_events.push(Event::TimelineRestarted {
            robots: self.robots.len(),
        });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if !self.running {
            return;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        if !self.won {
            self.materialize_pending(out_events);
            self.execute_due_intents(out_events);
        }

        let now = self.elapsed;
        let animation_length = self.config.animation_length();
        for robot in &mut self.robots {
            robot.body.advance_animation(now, animation_length);
        }
        for pushable in &mut self.boxes {
            pushable.body.advance_animation(now, animation_length);
        }

        self.refresh_can_rewind();

        let lifetime = self.config.particle_lifetime();
        self.particles
            .retain(|particle| !particle.is_expired(now, lifetime));

        if !self.won {
            self.evaluate_victory(out_events);
        }
    }

    fn materialize_pending(&mut self, out_events: &mut Vec<Event>) {
        let start = self.layout.start().cell;
        for index in 0..self.robots.len() {
            if !self.robots[index].is_due_to_materialize(self.elapsed) {
                continue;
            }
            if push::occupant(&self.robots, &self.boxes, start).is_some() {
                continue;
            }

            let robot = &mut self.robots[index];
            robot.materialize();
            debug!(
                robot = robot.id.get(),
                spawned_at_ms = robot.spawned_at().as_millis() as u64,
                "replayed robot entered the timeline"
            );
            out_events.push(Event::RobotMaterialized {
                robot: robot.id,
                cell: start,
            });
        }
    }

    fn execute_due_intents(&mut self, out_events: &mut Vec<Event>) {
        let now = self.elapsed;
        for index in 0..self.robots.len() {
            let robot = &mut self.robots[index];
            if !robot.is_present() {
                continue;
            }
            let Some(intent) = robot.log.take_due(now) else {
                continue;
            };
            let id = robot.id;

            let mut bodies = Bodies {
                robots: &mut self.robots,
                boxes: &mut self.boxes,
            };
            let Some(resolution) = push::resolve(
                &mut bodies,
                self.layout.grid(),
                MovableId::Robot(id),
                intent,
                now,
            ) else {
                continue;
            };
            publish_resolution(id, intent, resolution, out_events);
        }
    }

    fn evaluate_victory(&mut self, out_events: &mut Vec<Event>) {
        let boxes: Vec<BoxSnapshot> = self.boxes.iter().map(PushBox::snapshot).collect();
        if !temporal_bot_system_victory::is_won(self.layout.targets(), &boxes) {
            return;
        }

        self.won = true;
        self.can_rewind = false;
        let result = GameResult {
            completed: true,
            elapsed_time: self.elapsed,
            timeline_time: self.timeline_time(),
            robot_count: self.robots.len() as u32,
        };
        self.result = Some(result);
        info!(
            elapsed_ms = result.elapsed_time.as_millis() as u64,
            robots = result.robot_count,
            "level completed"
        );
        out_events.push(Event::LevelCompleted { result });
    }

    fn timeline_time(&self) -> Duration {
        self.robots
            .iter()
            .filter_map(|robot| robot.log.last())
            .map(|entry| entry.execute_at)
            .sum()
    }
}

fn publish_resolution(
    robot: RobotId,
    intent: Intent,
    resolution: Resolution,
    out_events: &mut Vec<Event>,
) {
    match resolution {
        Resolution::Advanced { from, to, pushed } => {
            out_events.push(Event::Moved { robot, from, to });
            for step in pushed {
                out_events.push(Event::Pushed {
                    movable: step.movable,
                    from: step.from,
                    to: step.to,
                });
            }
        }
        Resolution::Vanished { cell } => {
            debug!(robot = robot.get(), "robot left the board");
            out_events.push(Event::RobotVanished { robot, cell });
        }
        Resolution::Blocked(reason) => {
            if let Intent::Move(direction) = intent {
                out_events.push(Event::MoveBlocked {
                    robot,
                    direction,
                    reason,
                });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { layout } => {
            world.layout = layout;
            world.restart();
            out_events.push(Event::LevelLoaded {
                columns: world.layout.grid().columns(),
                rows: world.layout.grid().rows(),
            });
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::IssueMove { direction } => {
            world.record_on_active(Intent::Move(direction), out_events);
        }
        Command::IssueRewind => world.issue_rewind(out_events),
        Command::RestartTimeline => world.restart_timeline(out_events),
        Command::Restart => {
            world.restart();
            out_events.push(Event::LevelRestarted);
        }
        Command::SetRunning { running } => {
            if world.running != running {
                world.running = running;
                out_events.push(Event::RunningChanged { running });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{push, World};
    use temporal_bot_core::{
        BoxSnapshot, CellCoord, GameResult, Grid, LevelLayout, MovableId, ParticleSnapshot,
        Placement, RobotId, RobotSnapshot, ScheduledIntent, SimulationConfig, TargetCell,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Timing parameters the world was created with.
    #[must_use]
    pub fn config(world: &World) -> SimulationConfig {
        world.config
    }

    /// Level currently installed in the world.
    #[must_use]
    pub fn layout(world: &World) -> &LevelLayout {
        &world.layout
    }

    /// Provides read-only access to the level terrain.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        world.layout.grid()
    }

    /// Colored target cells of the level.
    #[must_use]
    pub fn targets(world: &World) -> &[TargetCell] {
        world.layout.targets()
    }

    /// Cell and facing every robot spawns with.
    #[must_use]
    pub fn start(world: &World) -> Placement {
        world.layout.start()
    }

    /// Snapshots of every robot in spawn order. The last entry is the active robot.
    #[must_use]
    pub fn robots(world: &World) -> Vec<RobotSnapshot> {
        world.robots.iter().map(|robot| robot.snapshot()).collect()
    }

    /// Snapshots of every pushable box in level order.
    #[must_use]
    pub fn boxes(world: &World) -> Vec<BoxSnapshot> {
        world.boxes.iter().map(|pushable| pushable.snapshot()).collect()
    }

    /// Snapshots of the rewind particles still on the board.
    #[must_use]
    pub fn particles(world: &World) -> Vec<ParticleSnapshot> {
        let lifetime = world.config.particle_lifetime();
        world
            .particles
            .iter()
            .map(|particle| particle.snapshot(world.elapsed, lifetime))
            .collect()
    }

    /// Robot currently receiving player commands.
    #[must_use]
    pub fn active_robot(world: &World) -> Option<RobotSnapshot> {
        world.active().map(|robot| robot.snapshot())
    }

    /// Recorded intents of the provided robot in queue order.
    #[must_use]
    pub fn command_log(world: &World, robot: RobotId) -> Option<&[ScheduledIntent]> {
        world
            .robots
            .iter()
            .find(|candidate| candidate.id == robot)
            .map(|candidate| candidate.log.entries())
    }

    /// Execute time of every recorded rewind marker, in spawn order.
    #[must_use]
    pub fn rewind_marks(world: &World) -> Vec<(RobotId, Duration)> {
        world
            .robots
            .iter()
            .filter_map(|robot| robot.log.rewind_mark().map(|mark| (robot.id, mark)))
            .collect()
    }

    /// Visible movable standing on the provided cell.
    #[must_use]
    pub fn occupant(world: &World, cell: CellCoord) -> Option<MovableId> {
        push::occupant(&world.robots, &world.boxes, cell)
    }

    /// Reports whether a rewind would currently be accepted.
    #[must_use]
    pub fn can_rewind(world: &World) -> bool {
        world.can_rewind
    }

    /// Reports whether every target has been covered. Latched until a restart.
    #[must_use]
    pub fn has_won(world: &World) -> bool {
        world.won
    }

    /// Reports whether the level is won and the active robot finished animating.
    ///
    /// Drivers stop ticking once this returns `true`.
    #[must_use]
    pub fn has_finished(world: &World) -> bool {
        world.won
            && !world
                .active()
                .map_or(false, |robot| robot.body.is_animating())
    }

    /// Reports whether ticks currently advance the simulation.
    #[must_use]
    pub fn is_running(world: &World) -> bool {
        world.running
    }

    /// Simulated time elapsed since the start of the current timeline pass.
    #[must_use]
    pub fn elapsed_time(world: &World) -> Duration {
        world.elapsed
    }

    /// Summary of the latest win, if the level is won.
    #[must_use]
    pub fn result(world: &World) -> Option<GameResult> {
        world.result
    }

    /// Number of targets covered by a matching box, as `(covered, total)`.
    #[must_use]
    pub fn target_coverage(world: &World) -> (usize, usize) {
        let boxes = boxes(world);
        temporal_bot_system_victory::coverage(world.layout.targets(), &boxes)
    }
}
