/// Snapshot: a read-only, renderable copy of a run.
///
/// The renderer only ever sees this, never `World`. Capturing is pure, so
/// equal worlds always give equal snapshots.

use std::f32::consts::TAU;

use crate::domain::entity::{HazardKind, MoverMode};
use crate::domain::geom::Aabb;
use crate::domain::mechanics::{MechanicsState, RotateState};

use super::world::{Outcome, World};

/// Flames drawn per burning box.
const FLAMES_PER_BOX: usize = 3;
/// How high a flame climbs above the box top before it restarts.
const FLAME_RISE: f32 = 18.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub level_index: usize,
    pub level_name: String,
    pub player: PlayerView,
    pub platforms: Vec<PlatformView>,
    pub movers: Vec<MoverView>,
    pub liquids: Vec<LiquidView>,
    pub crystals: Vec<CrystalView>,
    pub doors: Vec<DoorView>,
    pub levers: Vec<LeverView>,
    pub plates: Vec<PlateView>,
    pub boxes: Vec<BoxView>,
    pub fire: Vec<FireParticle>,
    pub time_left: f32,
    pub score: u32,
    pub crystals_total: usize,
    /// Short status line for the active level mechanic, if it has one.
    pub mechanic: Option<String>,
    pub outcome: Option<Outcome>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerView {
    pub rect: Aabb,
    pub on_ground: bool,
    pub alive: bool,
    pub controlling: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlatformView {
    pub rect: Aabb,
    pub tag: String,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoverView {
    pub rect: Aabb,
    pub mode: MoverMode,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LiquidView {
    pub rect: Aabb,
    pub kind: HazardKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CrystalView {
    pub rect: Aabb,
    pub collected: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DoorView {
    pub id: String,
    pub rect: Aabb,
    pub open: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeverView {
    pub id: String,
    pub rect: Aabb,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlateView {
    pub id: String,
    pub rect: Aabb,
    pub pressed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxView {
    pub rect: Aabb,
    /// Burn progress in 0..=1, `None` while intact.
    pub burn: Option<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FireParticle {
    pub x: f32,
    pub y: f32,
}

pub fn capture(w: &World) -> Snapshot {
    let burn_total = w.physics.burn_duration_ms.max(1.0);

    let boxes: Vec<BoxView> = w.boxes.iter()
        .map(|b| BoxView {
            rect: b.body.rect,
            burn: b.burn_ms.map(|left| (1.0 - left / burn_total).clamp(0.0, 1.0)),
        })
        .collect();

    let fire = boxes.iter()
        .filter_map(|b| b.burn.map(|p| flames(&b.rect, p)))
        .flatten()
        .collect();

    Snapshot {
        level_index: w.level_index,
        level_name: w.name.clone(),
        player: PlayerView {
            rect: w.player.body.rect,
            on_ground: w.player.on_ground,
            alive: w.player.alive,
            controlling: w.controlled_mover().is_some(),
        },
        platforms: w.platforms.iter()
            .map(|p| PlatformView { rect: p.rect, tag: p.tag.clone(), visible: !p.is_hidden() })
            .collect(),
        movers: w.movers.iter()
            .map(|m| MoverView { rect: m.rect, mode: m.mode() })
            .collect(),
        liquids: w.liquids.iter()
            .map(|l| LiquidView { rect: l.rect, kind: l.kind })
            .collect(),
        crystals: w.crystals.iter()
            .map(|c| CrystalView { rect: c.rect, collected: c.collected })
            .collect(),
        doors: w.doors.iter()
            .map(|d| DoorView { id: d.id.clone(), rect: d.rect, open: d.open })
            .collect(),
        levers: w.levers.iter()
            .map(|l| LeverView { id: l.id.clone(), rect: l.rect, active: l.active })
            .collect(),
        plates: w.plates.iter()
            .map(|p| PlateView { id: p.id.clone(), rect: p.rect, pressed: p.pressed })
            .collect(),
        boxes,
        fire,
        time_left: w.time_left,
        score: w.score(),
        crystals_total: w.crystals.len(),
        mechanic: mechanic_status(w),
        outcome: w.outcome,
    }
}

/// Flame positions for one box, a pure function of burn progress.
fn flames(rect: &Aabb, progress: f32) -> Vec<FireParticle> {
    (0..FLAMES_PER_BOX)
        .map(|k| {
            let lane = (k as f32 + 0.5) / FLAMES_PER_BOX as f32;
            let phase = (progress * 4.0 + k as f32 / FLAMES_PER_BOX as f32).fract();
            FireParticle {
                x: rect.x + rect.w * lane + (progress * TAU * 2.0 + k as f32).sin() * 3.0,
                y: rect.y - phase * FLAME_RISE,
            }
        })
        .collect()
}

fn mechanic_status(w: &World) -> Option<String> {
    match &w.mechanics_state {
        MechanicsState::Standard => None,
        MechanicsState::Rotating(RotateState::Idle) => Some("gears idle".into()),
        MechanicsState::Rotating(RotateState::Armed) => Some("gears armed".into()),
        MechanicsState::Rotating(RotateState::Triggered { remaining_ms }) => {
            Some(format!("bridge turned {:.1}s", remaining_ms / 1000.0))
        }
        MechanicsState::Rotating(RotateState::Reverting { remaining_ms }) => {
            Some(format!("gears cooling {:.1}s", remaining_ms / 1000.0))
        }
        MechanicsState::Controlled => Some(match w.controlled_mover() {
            Some(_) => "steering".into(),
            None => "ferry parked".into(),
        }),
        MechanicsState::Vanish(v) => Some(match v.hidden {
            Some(_) => format!("stones fading {:.1}s", v.remaining_ms / 1000.0),
            None => format!("stones steady {:.1}s", v.remaining_ms / 1000.0),
        }),
    }
}
