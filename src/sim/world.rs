/// World: the complete live state of one run.
///
/// ## Template / instance split
///
/// Two layers, never shared:
///   - `LevelTemplate` — the level as loaded. **Never mutated.**
///   - `World`         — a deep copy made by `World::start`, owned by the run.
///
/// Restart and retry go through `World::start` again, so a new attempt can
/// never see anything the previous one changed. There is no undo logic.
///
/// ## Coordinates
///
/// World units, y grows downward. The playfield is `PLAYFIELD`; player and
/// boxes are confined to it.

use std::fmt;

use crate::config::PhysicsConfig;
use crate::domain::entity::{
    Crystal, Door, HazardKind, Lever, Liquid, Mover, Platform, Plate, Player, PushBox,
};
use crate::domain::geom::{overlaps, Aabb};
use crate::domain::mechanics::{self, ControlRule, LevelMechanics, MechanicsState};
use crate::domain::trigger::{self, TriggerTable};

use super::level::LevelTemplate;

pub const PLAYFIELD: Aabb = Aabb::new(0.0, 0.0, 960.0, 540.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoseReason {
    TimeExpired,
    Hazard(HazardKind),
}

impl fmt::Display for LoseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoseReason::TimeExpired => write!(f, "time expired"),
            LoseReason::Hazard(kind) => write!(f, "fell into {}", kind.name()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Lose(LoseReason),
}

#[derive(Clone, Debug, PartialEq)]
pub struct World {
    pub level_index: usize,
    pub name: String,

    // ── Entities ──
    pub player: Player,
    pub platforms: Vec<Platform>,
    pub movers: Vec<Mover>,
    pub liquids: Vec<Liquid>,
    pub crystals: Vec<Crystal>,
    pub doors: Vec<Door>,
    pub levers: Vec<Lever>,
    pub plates: Vec<Plate>,
    pub boxes: Vec<PushBox>,

    // ── Logic ──
    pub triggers: TriggerTable,
    pub mechanics: LevelMechanics,
    pub mechanics_state: MechanicsState,

    // ── Tuning ──
    pub physics: PhysicsConfig,
    pub push_force: f32,

    // ── Meta ──
    pub time_left: f32,
    pub tick: u64,
    pub outcome: Option<Outcome>,
}

impl World {
    /// Fresh live instance of `template`. Everything mutable starts here.
    pub fn start(level_index: usize, template: &LevelTemplate, physics: &PhysicsConfig) -> Self {
        let t = template.clone();
        let mut triggers = TriggerTable::build(&t.levers, &t.plates, &t.doors);
        let mut doors = t.doors;
        trigger::recompute_doors(&mut triggers, &mut doors);

        let mut levers = t.levers;
        mechanics::sync_attached_levers(&mut levers, &t.movers);

        World {
            level_index,
            name: t.name,
            player: Player::new(t.spawn.0, t.spawn.1),
            platforms: t.platforms,
            movers: t.movers,
            liquids: t.liquids,
            crystals: t.crystals,
            doors,
            levers,
            plates: t.plates,
            boxes: t.boxes,
            triggers,
            mechanics_state: MechanicsState::new(&t.mechanics),
            mechanics: t.mechanics,
            physics: physics.clone(),
            push_force: t.push_force.unwrap_or(physics.push_force),
            time_left: t.time_limit,
            tick: 0,
            outcome: None,
        }
    }

    /// Crystals collected so far.
    pub fn score(&self) -> u32 {
        self.player.crystals
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// The control rule, if this level hands the player a mover.
    pub fn control_rule(&self) -> Option<&ControlRule> {
        match &self.mechanics {
            LevelMechanics::PlayerControlledMover(rule) => Some(rule),
            _ => None,
        }
    }

    /// Index of the mover the player is steering right now.
    pub fn controlled_mover(&self) -> Option<usize> {
        self.movers.iter().position(|m| m.controlling)
    }

    /// Levers the player is touching, in list order.
    pub fn levers_in_reach(&self) -> Vec<usize> {
        self.levers.iter()
            .enumerate()
            .filter(|(_, l)| overlaps(self.player.rect(), &l.rect))
            .map(|(i, _)| i)
            .collect()
    }
}
