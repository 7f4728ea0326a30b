/// Mover motion controller and per-level special mechanics.
///
/// Every mover runs the same small state machine (see `MoverMode`):
///
///   IDLE ──lever──▶ OSCILLATING ──lever──▶ IDLE
///   IDLE ──control lever──▶ PLAYER_CONTROLLED ──action──▶ IDLE
///
/// On top of that a level may carry ONE extra mechanic, chosen by its
/// template rather than by its position in the level list:
///
///   - `RotatingPlatform`: a platform turns 90° when the player crosses a
///     zone while an arming trigger is on, then turns back after a delay.
///   - `PlayerControlledMover`: a lever hands the player a mover to steer.
///   - `VanishCycle`: platforms from a candidate set take turns vanishing.
///
/// Rules are immutable (part of the template). `MechanicsState` is the
/// per-run half and is rebuilt on every start.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::entity::{Lever, Mover, Platform};
use super::geom::{overlaps, Aabb};
use super::trigger::TriggerTable;

// ══════════════════════════════════════════════════════════════
// Rules (immutable, resolved indices)
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum LevelMechanics {
    Standard,
    RotatingPlatform(RotationRule),
    PlayerControlledMover(ControlRule),
    VanishCycle(VanishRule),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RotationRule {
    /// Platform index that turns.
    pub platform: usize,
    /// Trigger id that arms the rotation (usually a lever).
    pub arm: String,
    /// Crossing this zone while armed fires the rotation.
    pub zone: Aabb,
    /// How long the platform stays turned.
    pub hold_ms: f32,
    /// Dead time after turning back before it can re-arm.
    pub cooldown_ms: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControlRule {
    pub mover: usize,
    pub lever: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VanishRule {
    pub candidates: Vec<usize>,
    pub hide_ms: f32,
    pub show_ms: f32,
    pub seed: u64,
}

// ══════════════════════════════════════════════════════════════
// Per-run state
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RotateState {
    Idle,
    Armed,
    Triggered { remaining_ms: f32 },
    Reverting { remaining_ms: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct VanishState {
    pub hidden: Option<usize>,
    pub last: Option<usize>,
    pub remaining_ms: f32,
    rng: Pcg32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MechanicsState {
    Standard,
    Rotating(RotateState),
    Controlled,
    Vanish(VanishState),
}

impl MechanicsState {
    pub fn new(rules: &LevelMechanics) -> Self {
        match rules {
            LevelMechanics::Standard => MechanicsState::Standard,
            LevelMechanics::RotatingPlatform(_) => MechanicsState::Rotating(RotateState::Idle),
            LevelMechanics::PlayerControlledMover(_) => MechanicsState::Controlled,
            LevelMechanics::VanishCycle(rule) => MechanicsState::Vanish(VanishState {
                hidden: None,
                last: None,
                remaining_ms: rule.show_ms,
                rng: Pcg32::seed_from_u64(rule.seed),
            }),
        }
    }
}

/// Platform-level changes made by a mechanic this tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Rotated(usize),
    Restored(usize),
    Vanished(usize),
    Reappeared(usize),
}

// ══════════════════════════════════════════════════════════════
// Movers
// ══════════════════════════════════════════════════════════════

/// Advance every oscillating mover by `units` phase units. Records each
/// mover's start-of-tick position first so riders see this tick's delta.
pub fn advance_movers(movers: &mut [Mover], units: f32) {
    for m in movers.iter_mut() {
        m.begin_tick();
        m.advance(units);
    }
}

/// Player steering: horizontal only, clamped to the playfield.
pub fn steer(mover: &mut Mover, dir: f32, speed: f32, bounds: &Aabb) {
    if !mover.controlling { return; }
    mover.rect.x += dir * speed;
    mover.rect.clamp_within(bounds);
}

/// Keep attached levers glued to their movers.
pub fn sync_attached_levers(levers: &mut [Lever], movers: &[Mover]) {
    for lever in levers.iter_mut() {
        if let Some(a) = lever.attach {
            if let Some(m) = movers.get(a.mover) {
                lever.rect.x = m.rect.x + a.dx;
                lever.rect.y = m.rect.y + a.dy;
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Platform mechanics
// ══════════════════════════════════════════════════════════════

/// Run the level's platform mechanic for one tick.
pub fn advance(
    rules: &LevelMechanics,
    state: &mut MechanicsState,
    platforms: &mut [Platform],
    table: &TriggerTable,
    player: &Aabb,
    dt_ms: f32,
) -> Option<Transition> {
    match (rules, state) {
        (LevelMechanics::RotatingPlatform(rule), MechanicsState::Rotating(rs)) => {
            advance_rotation(rule, rs, platforms, table, player, dt_ms)
        }
        (LevelMechanics::VanishCycle(rule), MechanicsState::Vanish(vs)) => {
            advance_vanish(rule, vs, platforms, dt_ms)
        }
        _ => None,
    }
}

fn advance_rotation(
    rule: &RotationRule,
    rs: &mut RotateState,
    platforms: &mut [Platform],
    table: &TriggerTable,
    player: &Aabb,
    dt_ms: f32,
) -> Option<Transition> {
    let armed = table.get(&rule.arm);
    let in_zone = overlaps(player, &rule.zone);
    let platform = platforms.get_mut(rule.platform)?;

    match *rs {
        RotateState::Idle => {
            // Arming while already inside the zone waits for the player to leave.
            if armed && !in_zone {
                *rs = RotateState::Armed;
            }
            None
        }
        RotateState::Armed => {
            if !armed {
                *rs = RotateState::Idle;
                None
            } else if in_zone {
                platform.rect = platform.home.quarter_turn();
                *rs = RotateState::Triggered { remaining_ms: rule.hold_ms };
                Some(Transition::Rotated(rule.platform))
            } else {
                None
            }
        }
        RotateState::Triggered { remaining_ms } => {
            let left = remaining_ms - dt_ms;
            if left > 0.0 {
                *rs = RotateState::Triggered { remaining_ms: left };
                return None;
            }
            platform.restore();
            *rs = RotateState::Reverting { remaining_ms: rule.cooldown_ms };
            Some(Transition::Restored(rule.platform))
        }
        RotateState::Reverting { remaining_ms } => {
            let left = remaining_ms - dt_ms;
            *rs = if left > 0.0 {
                RotateState::Reverting { remaining_ms: left }
            } else {
                RotateState::Idle
            };
            None
        }
    }
}

fn advance_vanish(
    rule: &VanishRule,
    vs: &mut VanishState,
    platforms: &mut [Platform],
    dt_ms: f32,
) -> Option<Transition> {
    vs.remaining_ms -= dt_ms;
    if vs.remaining_ms > 0.0 { return None; }

    if let Some(i) = vs.hidden.take() {
        if let Some(p) = platforms.get_mut(i) { p.restore(); }
        vs.last = Some(i);
        vs.remaining_ms = rule.show_ms;
        return Some(Transition::Reappeared(i));
    }

    let i = pick_next(&rule.candidates, vs.last, &mut vs.rng)?;
    if let Some(p) = platforms.get_mut(i) { p.hide(); }
    vs.hidden = Some(i);
    vs.remaining_ms = rule.hide_ms;
    Some(Transition::Vanished(i))
}

/// Uniform pick that never repeats `last` unless it is the only choice.
fn pick_next(candidates: &[usize], last: Option<usize>, rng: &mut Pcg32) -> Option<usize> {
    let pool: Vec<usize> = if candidates.len() > 1 {
        candidates.iter().copied().filter(|&c| Some(c) != last).collect()
    } else {
        candidates.to_vec()
    };
    if pool.is_empty() { return None; }
    Some(pool[rng.random_range(0..pool.len())])
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
