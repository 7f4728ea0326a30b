/// Entities: Player, boxes, and every prop a chamber is built from.
///
/// Props are plain data. Behaviour that spans several entities (riding,
/// pushing, trigger evaluation) lives in `physics`, `trigger` and
/// `mechanics`; per-entity helpers live here.

use std::f32::consts::TAU;

use serde::Deserialize;

use super::geom::{Aabb, Body};

pub const PLAYER_W: f32 = 24.0;
pub const PLAYER_H: f32 = 32.0;

/// Frame input, already debounced by the host.
/// Movement = continuous (held key). Everything else = edge-triggered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub move_left: bool,
    pub move_right: bool,
    pub jump_pressed: bool,
    pub action_pressed: bool,
    pub restart_pressed: bool,
    pub map_pressed: bool,
}

impl FrameInput {
    /// -1 / 0 / +1 horizontal intent. Opposing keys cancel.
    pub fn horizontal(&self) -> f32 {
        match (self.move_left, self.move_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub body: Body,
    pub on_ground: bool,
    pub crystals: u32,
    pub alive: bool,
    /// Mover index the player ended last tick standing on.
    pub riding: Option<usize>,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            body: Body::at(x, y, PLAYER_W, PLAYER_H),
            on_ground: false,
            crystals: 0,
            alive: true,
            riding: None,
        }
    }

    #[inline]
    pub fn rect(&self) -> &Aabb { &self.body.rect }
}

/// Static platform. `home` caches the authored box so scripted transforms
/// (quarter turns, vanishing) can always be undone exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
    pub id: Option<String>,
    pub tag: String,
    pub rect: Aabb,
    pub home: Aabb,
}

impl Platform {
    pub fn new(rect: Aabb) -> Self {
        Platform { id: None, tag: String::from("stone"), rect, home: rect }
    }

    /// Hidden platforms have zero extents and are skipped by collision.
    pub fn is_hidden(&self) -> bool {
        self.rect.is_empty()
    }

    pub fn hide(&mut self) {
        self.rect.w = 0.0;
        self.rect.h = 0.0;
    }

    pub fn restore(&mut self) {
        self.rect = self.home;
    }
}

/// Motion mode of a mover, derived from its flags.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoverMode {
    /// Parked: `active == false`, phase frozen.
    Idle,
    /// Phase-driven back-and-forth between the anchors.
    Oscillating,
    /// Position follows the player's horizontal input.
    PlayerControlled,
}

/// Kinematic platform oscillating between anchor A and anchor B.
///
/// Interpolation is eased, not linear:
///   u = 0.5 - 0.5·cos(t mod 2π)
/// so the mover dwells near each anchor and is fastest mid-way.
#[derive(Clone, Debug, PartialEq)]
pub struct Mover {
    pub id: Option<String>,
    pub rect: Aabb,
    pub ax: f32,
    pub ay: f32,
    pub bx: f32,
    pub by: f32,
    pub speed: f32,
    pub t: f32,
    pub active: bool,
    pub controlling: bool,
    /// Position at the start of the current tick (rider displacement).
    pub prev_x: f32,
    pub prev_y: f32,
}

impl Mover {
    pub fn new(w: f32, h: f32, a: (f32, f32), b: (f32, f32), speed: f32) -> Self {
        let mut m = Mover {
            id: None,
            rect: Aabb::new(a.0, a.1, w, h),
            ax: a.0, ay: a.1,
            bx: b.0, by: b.1,
            speed,
            t: 0.0,
            active: true,
            controlling: false,
            prev_x: a.0,
            prev_y: a.1,
        };
        m.sync_to_phase();
        m
    }

    pub fn mode(&self) -> MoverMode {
        if self.controlling {
            MoverMode::PlayerControlled
        } else if self.active {
            MoverMode::Oscillating
        } else {
            MoverMode::Idle
        }
    }

    /// Eased interpolation factor in [0, 1] for phase `t`.
    pub fn ease(t: f32) -> f32 {
        0.5 - 0.5 * t.rem_euclid(TAU).cos()
    }

    /// Position on the A→B segment for phase `t`.
    pub fn position_at(&self, t: f32) -> (f32, f32) {
        let u = Self::ease(t);
        (self.ax + (self.bx - self.ax) * u, self.ay + (self.by - self.ay) * u)
    }

    /// Snap the box to the current phase (also resets rider displacement).
    pub fn sync_to_phase(&mut self) {
        let (x, y) = self.position_at(self.t);
        self.rect.x = x;
        self.rect.y = y;
        self.prev_x = x;
        self.prev_y = y;
    }

    /// Remember where the mover was before this tick moved it.
    pub fn begin_tick(&mut self) {
        self.prev_x = self.rect.x;
        self.prev_y = self.rect.y;
    }

    /// Advance the phase by `units` time units. No-op unless oscillating.
    pub fn advance(&mut self, units: f32) {
        if self.mode() != MoverMode::Oscillating { return; }
        self.t += self.speed * units;
        let (x, y) = self.position_at(self.t);
        self.rect.x = x;
        self.rect.y = y;
    }

    /// Displacement applied this tick (what a rider inherits).
    pub fn displacement(&self) -> (f32, f32) {
        (self.rect.x - self.prev_x, self.rect.y - self.prev_y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Lava,
    Water,
    Acid,
}

impl HazardKind {
    /// Lava sets boxes on fire. Other liquids only hurt the player.
    pub fn ignites_boxes(self) -> bool {
        matches!(self, HazardKind::Lava)
    }

    pub fn name(self) -> &'static str {
        match self {
            HazardKind::Lava => "lava",
            HazardKind::Water => "water",
            HazardKind::Acid => "acid",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Liquid {
    pub rect: Aabb,
    pub kind: HazardKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Crystal {
    pub rect: Aabb,
    pub collected: bool,
}

/// Exit door. Open iff every id in `requires` is active (AND gate).
#[derive(Clone, Debug, PartialEq)]
pub struct Door {
    pub id: String,
    pub rect: Aabb,
    pub open: bool,
    pub requires: Vec<String>,
}

/// Lever riding on a mover: position = mover position + offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attachment {
    pub mover: usize,
    pub dx: f32,
    pub dy: f32,
}

/// Toggle lever (flips on each use, not momentary).
#[derive(Clone, Debug, PartialEq)]
pub struct Lever {
    pub id: String,
    pub rect: Aabb,
    pub active: bool,
    pub toggles: Vec<String>,
    pub attach: Option<Attachment>,
}

/// Pressure plate. Level-triggered: pressed while anything stands on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Plate {
    pub id: String,
    pub rect: Aabb,
    pub pressed: bool,
    pub opens: Vec<String>,
}

impl Plate {
    /// Padded test area: reaches 2 units above the plate and 4 below it,
    /// so a body resting on the surface the plate is set into counts.
    pub fn test_rect(&self) -> Aabb {
        Aabb::new(self.rect.x, self.rect.y - 2.0, self.rect.w, self.rect.h + 6.0)
    }
}

/// Pushable box.
#[derive(Clone, Debug, PartialEq)]
pub struct PushBox {
    pub body: Body,
    pub tag: Option<String>,
    /// Mover index this box is standing on, if any.
    pub riding: Option<usize>,
    /// Remaining burn time (ms). `Some` once the box touched lava.
    pub burn_ms: Option<f32>,
}

impl PushBox {
    pub fn new(rect: Aabb) -> Self {
        PushBox {
            body: Body { rect, vx: 0.0, vy: 0.0 },
            tag: None,
            riding: None,
            burn_ms: None,
        }
    }

    pub fn is_burning(&self) -> bool {
        self.burn_ms.is_some()
    }

    /// Tick the burn timer. Returns true when the box has burned out.
    pub fn tick_burn(&mut self, dt_ms: f32) -> bool {
        match self.burn_ms.as_mut() {
            Some(left) => {
                *left -= dt_ms;
                *left <= 0.0
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lift() -> Mover {
        Mover::new(90.0, 14.0, (240.0, 470.0), (360.0, 410.0), 1.2)
    }

    #[test]
    fn mover_stays_on_segment() {
        let m = lift();
        let mut t = -20.0;
        while t < 40.0 {
            let (x, y) = m.position_at(t);
            assert!(x >= 240.0 - 1e-3 && x <= 360.0 + 1e-3, "x={x} at t={t}");
            assert!(y >= 410.0 - 1e-3 && y <= 470.0 + 1e-3, "y={y} at t={t}");
            // Collinear with A→B
            let u_x = (x - 240.0) / 120.0;
            let u_y = (y - 470.0) / -60.0;
            assert!((u_x - u_y).abs() < 1e-3);
            t += 0.37;
        }
    }

    #[test]
    fn mover_starts_and_returns_to_anchor_a() {
        let m = lift();
        let (x0, y0) = m.position_at(0.0);
        assert_eq!((x0, y0), (240.0, 470.0));
        let (x1, y1) = m.position_at(TAU);
        assert!((x1 - 240.0).abs() < 1e-3);
        assert!((y1 - 470.0).abs() < 1e-3);
        let (xh, yh) = m.position_at(TAU / 2.0);
        assert!((xh - 360.0).abs() < 1e-3);
        assert!((yh - 410.0).abs() < 1e-3);
    }

    #[test]
    fn idle_mover_does_not_advance() {
        let mut m = lift();
        m.active = false;
        m.begin_tick();
        m.advance(3.0);
        assert_eq!(m.t, 0.0);
        assert_eq!(m.displacement(), (0.0, 0.0));
        assert_eq!(m.mode(), MoverMode::Idle);
    }

    #[test]
    fn oscillating_mover_reports_displacement() {
        let mut m = lift();
        m.begin_tick();
        m.advance(1.0);
        let (dx, dy) = m.displacement();
        assert!(dx > 0.0);
        assert!(dy < 0.0);
        assert_eq!(m.mode(), MoverMode::Oscillating);
    }

    #[test]
    fn controlled_mover_ignores_phase() {
        let mut m = lift();
        m.controlling = true;
        m.advance(5.0);
        assert_eq!(m.t, 0.0);
        assert_eq!(m.mode(), MoverMode::PlayerControlled);
    }

    #[test]
    fn plate_test_rect_is_padded() {
        let p = Plate {
            id: "P1".into(),
            rect: Aabb::new(820.0, 426.0, 40.0, 6.0),
            pressed: false,
            opens: vec![],
        };
        assert_eq!(p.test_rect(), Aabb::new(820.0, 424.0, 40.0, 12.0));
    }

    #[test]
    fn burn_timer_expires() {
        let mut b = PushBox::new(Aabb::new(0.0, 0.0, 26.0, 26.0));
        assert!(!b.tick_burn(1000.0));
        b.burn_ms = Some(30.0);
        assert!(!b.tick_burn(16.0));
        assert!(b.tick_burn(16.0));
    }

    #[test]
    fn platform_hide_and_restore() {
        let mut p = Platform::new(Aabb::new(10.0, 20.0, 120.0, 16.0));
        p.hide();
        assert!(p.is_hidden());
        p.restore();
        assert_eq!(p.rect, p.home);
    }

    #[test]
    fn opposing_keys_cancel() {
        let input = FrameInput { move_left: true, move_right: true, ..Default::default() };
        assert_eq!(input.horizontal(), 0.0);
    }
}
