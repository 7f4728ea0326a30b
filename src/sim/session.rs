/// GameSession: the run lifecycle and level progress.
///
/// ```text
///   MENU ──▶ MAP ──select──▶ RUNNING ──win/lose──▶ RESULT
///             ▲                 │  ▲                 │
///             └──── abort ──────┘  └──── retry ──────┤
///             ▲                                      │
///             └───────────────── map ────────────────┘
/// ```
///
/// Every entry into RUNNING (select, retry, restart) builds a fresh `World`
/// from the immutable template. Progress only moves on a win.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::config::PhysicsConfig;
use crate::domain::entity::FrameInput;

use super::event::GameEvent;
use super::level::LevelTemplate;
use super::snapshot::{self, Snapshot};
use super::step;
use super::world::{Outcome, World};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Map,
    Running,
    Result,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("there is no level {0}")]
    UnknownLevel(usize),
    #[error("level {0} is still locked")]
    Locked(usize),
    #[error("cannot {action} during {phase:?}")]
    WrongPhase { action: &'static str, phase: Phase },
}

/// Final report of a finished run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    pub level_index: usize,
    pub outcome: Outcome,
    /// Why the run was lost (`None` on a win).
    pub reason: Option<String>,
    pub score: u32,
    pub time_left: f32,
}

/// Which levels can be played. Lives for the session only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub unlocked_up_to: usize,
    pub completed: BTreeSet<usize>,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Progress { unlocked_up_to: 0, completed: BTreeSet::new(), total }
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        index < self.total && index <= self.unlocked_up_to
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    /// Level indices the map may offer.
    pub fn selectable(&self) -> Vec<usize> {
        (0..self.total).filter(|&i| self.is_unlocked(i)).collect()
    }

    /// Mark `index` completed. Unlocks the next level when `index` was the
    /// frontier. Returns the newly unlocked index, if any.
    pub fn record_win(&mut self, index: usize) -> Option<usize> {
        self.completed.insert(index);
        if index == self.unlocked_up_to && index + 1 < self.total {
            self.unlocked_up_to = index + 1;
            return Some(index + 1);
        }
        None
    }
}

pub struct GameSession {
    phase: Phase,
    templates: Vec<LevelTemplate>,
    physics: PhysicsConfig,
    progress: Progress,
    run: Option<World>,
    last_result: Option<RunResult>,
}

impl GameSession {
    pub fn new(templates: Vec<LevelTemplate>, physics: PhysicsConfig) -> Self {
        let progress = Progress::new(templates.len());
        GameSession {
            phase: Phase::Menu,
            templates,
            physics: physics.sanitised(),
            progress,
            run: None,
            last_result: None,
        }
    }

    // ── Queries ──

    pub fn phase(&self) -> Phase { self.phase }
    pub fn progress(&self) -> &Progress { &self.progress }
    pub fn templates(&self) -> &[LevelTemplate] { &self.templates }
    pub fn run(&self) -> Option<&World> { self.run.as_ref() }
    pub fn last_result(&self) -> Option<&RunResult> { self.last_result.as_ref() }

    pub fn selectable_levels(&self) -> Vec<usize> {
        self.progress.selectable()
    }

    /// Renderable view of the active (or just finished) run.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.run.as_ref().map(snapshot::capture)
    }

    // ── Transitions ──

    /// MENU / RESULT → MAP. Use `abort` to leave a running level.
    pub fn open_map(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Menu | Phase::Map | Phase::Result => {
                self.run = None;
                self.phase = Phase::Map;
                Ok(())
            }
            Phase::Running => Err(SessionError::WrongPhase { action: "open the map", phase: self.phase }),
        }
    }

    /// MAP / RESULT → RUNNING on level `index`.
    pub fn select_level(&mut self, index: usize) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::Map | Phase::Result) {
            return Err(SessionError::WrongPhase { action: "select a level", phase: self.phase });
        }
        if index >= self.templates.len() {
            return Err(SessionError::UnknownLevel(index));
        }
        if !self.progress.is_unlocked(index) {
            return Err(SessionError::Locked(index));
        }
        self.start(index);
        Ok(())
    }

    /// RESULT → RUNNING on the same level.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        match (self.phase, self.run.as_ref()) {
            (Phase::Result, Some(w)) => {
                let index = w.level_index;
                self.start(index);
                Ok(())
            }
            _ => Err(SessionError::WrongPhase { action: "retry", phase: self.phase }),
        }
    }

    /// RUNNING → fresh RUNNING of the same level.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Running {
            return Err(SessionError::WrongPhase { action: "restart", phase: self.phase });
        }
        self.restart_run();
        Ok(())
    }

    /// RUNNING → MAP without recording anything.
    pub fn abort(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Running {
            return Err(SessionError::WrongPhase { action: "abort", phase: self.phase });
        }
        self.leave_run();
        Ok(())
    }

    /// One frame while RUNNING. Restart and map keys are handled here; all
    /// other input goes to the simulation. No-op in any other phase.
    pub fn tick(&mut self, input: FrameInput, dt_ms: f32) -> Vec<GameEvent> {
        if self.phase != Phase::Running { return vec![]; }

        if input.restart_pressed {
            self.restart_run();
            return vec![];
        }
        if input.map_pressed {
            self.leave_run();
            return vec![];
        }

        let Some(world) = self.run.as_mut() else { return vec![] };
        let events = step::step(world, input, dt_ms);
        if world.is_over() {
            self.finish();
        }
        events
    }

    // ── Internal ──

    fn restart_run(&mut self) {
        let Some(index) = self.run.as_ref().map(|w| w.level_index) else { return };
        log::info!("restarting level {}", index + 1);
        self.start(index);
    }

    fn leave_run(&mut self) {
        if let Some(w) = self.run.take() {
            log::info!("aborted level {} with {:.1}s left", w.level_index + 1, w.time_left);
        }
        self.phase = Phase::Map;
    }

    fn start(&mut self, index: usize) {
        let template = &self.templates[index];
        log::info!("starting level {}: {}", index + 1, template.name);
        self.run = Some(World::start(index, template, &self.physics));
        self.phase = Phase::Running;
    }

    fn finish(&mut self) {
        let Some(world) = self.run.as_ref() else { return };
        let Some(outcome) = world.outcome else { return };

        let reason = match outcome {
            Outcome::Win => None,
            Outcome::Lose(r) => Some(r.to_string()),
        };
        let result = RunResult {
            level_index: world.level_index,
            outcome,
            reason,
            score: world.score(),
            time_left: world.time_left,
        };

        match outcome {
            Outcome::Win => {
                log::info!(
                    "level {} cleared: {} crystals, {:.1}s left",
                    result.level_index + 1, result.score, result.time_left
                );
                if let Some(next) = self.progress.record_win(result.level_index) {
                    log::info!("level {} unlocked", next + 1);
                }
            }
            Outcome::Lose(r) => log::info!("level {} lost: {r}", result.level_index + 1),
        }

        self.last_result = Some(result);
        self.phase = Phase::Result;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
