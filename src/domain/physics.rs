/// Kinematic body simulation — single source of truth for motion.
///
/// ## Architecture
///
/// Two stages per body per tick:
///   1. VELOCITY — input acceleration, friction, gravity, jump impulse.
///   2. MOTION   — integrate and resolve, one axis at a time.
///
/// The host runs stage 1 for the player, then lets movers advance, then runs
/// stage 2. A body that ended last tick on a mover is first carried by that
/// mover's full (dx, dy) for this tick, then integrated and resolved, so it
/// stays on a deck that drops away beneath it.
///
/// ## Axis split
///
/// X is integrated and resolved against every solid first, then Y. Resolving
/// both axes at once catches bodies on platform corners.
///
/// ## Resolution order
///
/// Platforms in list order, then movers in list order. Hidden (zero-size)
/// platforms are skipped by `geom::resolve`. Order is fixed so replays are
/// bit-identical.
///
/// All constants are per tick (see `PhysicsConfig`).

use crate::config::PhysicsConfig;

use super::entity::{Mover, Platform, Player, PushBox};
use super::geom::{self, penetration, Aabb, Body, Side};

// ══════════════════════════════════════════════════════════════
// Stage 1: velocity
// ══════════════════════════════════════════════════════════════

/// Horizontal: accelerate by intent, decay by friction, clamp.
pub fn apply_run_input(body: &mut Body, dir: f32, cfg: &PhysicsConfig) {
    body.vx += dir * cfg.move_accel;
    body.vx *= cfg.friction;
    body.vx = body.vx.clamp(-cfg.max_run_speed, cfg.max_run_speed);
}

/// Vertical: constant gravity, capped fall speed. Upward speed is unbounded.
pub fn apply_gravity(body: &mut Body, cfg: &PhysicsConfig) {
    body.vy = (body.vy + cfg.gravity).min(cfg.max_fall_speed);
}

/// Player velocity update for one tick. Returns true if a jump started.
pub fn prepare_player(player: &mut Player, dir: f32, jump: bool, cfg: &PhysicsConfig) -> bool {
    apply_run_input(&mut player.body, dir, cfg);
    apply_gravity(&mut player.body, cfg);
    if jump && player.on_ground {
        player.body.vy = -cfg.jump_impulse;
        player.on_ground = false;
        return true;
    }
    false
}

/// Box velocity update: no intent, its own friction, gravity.
pub fn prepare_box(b: &mut PushBox, cfg: &PhysicsConfig) {
    b.body.vx *= cfg.box_friction;
    apply_gravity(&mut b.body, cfg);
}

// ══════════════════════════════════════════════════════════════
// Stage 2: motion
// ══════════════════════════════════════════════════════════════

/// What a body touched while moving this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Contact {
    /// Landed on top of something (platform or mover).
    pub landed: bool,
    /// Mover index the body is standing on.
    pub riding: Option<usize>,
}

/// Resolve `body` against every solid, platforms first then movers.
/// Records landings; `riding` is the last mover landed on. A rising mover
/// can lift the body during the X pass, so both passes record landings.
fn resolve_all(body: &mut Body, platforms: &[Platform], movers: &[Mover], contact: &mut Contact) {
    let solids = platforms.iter().map(|p| (None, &p.rect))
        .chain(movers.iter().enumerate().map(|(i, m)| (Some(i), &m.rect)));

    for (mover, rect) in solids {
        if geom::resolve(body, rect) == Some(Side::Top) {
            contact.landed = true;
            if mover.is_some() { contact.riding = mover; }
        }
    }
}

/// Move a rider by its mover's displacement this tick. The carry happens
/// before integration, so walls and floors still resolve it.
pub fn carry(body: &mut Body, riding: Option<usize>, movers: &[Mover]) {
    let Some(m) = riding.and_then(|i| movers.get(i)) else { return };
    let (dx, dy) = m.displacement();
    body.rect.x += dx;
    body.rect.y += dy;
}

/// Integrate X then Y, resolving after each.
pub fn move_and_collide(body: &mut Body, platforms: &[Platform], movers: &[Mover]) -> Contact {
    let mut contact = Contact::default();

    body.rect.x += body.vx;
    resolve_all(body, platforms, movers, &mut contact);

    body.rect.y += body.vy;
    resolve_all(body, platforms, movers, &mut contact);

    contact
}

/// Player motion for one tick. Updates `on_ground` and `riding`.
pub fn integrate_player(player: &mut Player, platforms: &[Platform], movers: &[Mover]) -> Contact {
    carry(&mut player.body, player.riding, movers);
    player.on_ground = false;
    let contact = move_and_collide(&mut player.body, platforms, movers);
    player.on_ground = contact.landed;
    player.riding = contact.riding;
    contact
}

/// Box motion for one tick. Updates the riding reference.
pub fn integrate_box(b: &mut PushBox, platforms: &[Platform], movers: &[Mover]) -> Contact {
    carry(&mut b.body, b.riding, movers);
    let contact = move_and_collide(&mut b.body, platforms, movers);
    b.riding = contact.riding;
    contact
}

// ══════════════════════════════════════════════════════════════
// Player ↔ box
// ══════════════════════════════════════════════════════════════

/// Lateral push: the player is moving into the side of the box (not
/// standing on it, not under it). The player is snapped flush against the
/// box and the box gains `force` in the push direction.
pub fn push_box(player: &mut Body, crate_body: &mut Body, force: f32) -> bool {
    let Some((ox, oy)) = penetration(&player.rect, &crate_body.rect) else {
        return false;
    };
    // Vertical contact (standing on / bumping into) is not a push.
    if ox >= oy { return false; }

    let player_left_of_box = player.rect.center_x() < crate_body.rect.center_x();
    if player.vx > 0.0 && player_left_of_box {
        player.rect.x = crate_body.rect.x - player.rect.w;
        crate_body.vx += force;
        true
    } else if player.vx < 0.0 && !player_left_of_box {
        player.rect.x = crate_body.rect.right();
        crate_body.vx -= force;
        true
    } else {
        false
    }
}

/// Boxes are solid for the player: resolve against each live box.
/// Returns true if the player is standing on one.
pub fn collide_with_boxes(player: &mut Player, boxes: &[PushBox]) -> bool {
    let mut standing = false;
    for b in boxes {
        if geom::resolve(&mut player.body, &b.body.rect) == Some(Side::Top) {
            standing = true;
        }
    }
    if standing {
        player.on_ground = true;
    }
    standing
}

/// Keep a body inside the playfield; zero velocity on clamped axes.
pub fn confine(body: &mut Body, bounds: &Aabb) {
    let before = body.rect;
    if body.rect.clamp_within(bounds) {
        if body.rect.x != before.x { body.vx = 0.0; }
        if body.rect.y != before.y { body.vy = 0.0; }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
