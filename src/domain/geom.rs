/// Axis-aligned geometry: the only collision primitive in the game.
///
/// Everything that can touch anything else (player, boxes, platforms,
/// movers, liquids, crystals, doors, levers, plates) is an `Aabb`.
///
/// ## Resolution model
///
/// `resolve()` is a minimum-translation-vector resolver. It works on boxes
/// that ALREADY overlap and pushes the moving body out along the axis of
/// smaller penetration. It is not swept: a body fast enough to pass a thin
/// obstacle in one tick tunnels through it.
///
/// Equal penetration on both axes resolves vertically.

use serde::Deserialize;

/// Top-left corner + extents. World units, y grows downward.
#[derive(Clone, Copy, PartialEq, Debug, Default, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Aabb { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> f32 { self.x + self.w }

    #[inline]
    pub fn bottom(&self) -> f32 { self.y + self.h }

    #[inline]
    pub fn center_x(&self) -> f32 { self.x + self.w / 2.0 }

    #[inline]
    pub fn center_y(&self) -> f32 { self.y + self.h / 2.0 }

    /// Zero or negative extent on either axis. Empty boxes never collide.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Strict intersection on both axes. Touching edges do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        overlaps(self, other)
    }

    /// 90° turn about the center: extents swap, center stays put.
    pub fn quarter_turn(&self) -> Aabb {
        let cx = self.center_x();
        let cy = self.center_y();
        Aabb::new(cx - self.h / 2.0, cy - self.w / 2.0, self.h, self.w)
    }

    /// Keep the box inside `bounds` (no-op on an axis where it cannot fit).
    pub fn clamp_within(&mut self, bounds: &Aabb) -> bool {
        let before = (self.x, self.y);
        if self.w <= bounds.w {
            self.x = self.x.clamp(bounds.x, bounds.right() - self.w);
        }
        if self.h <= bounds.h {
            self.y = self.y.clamp(bounds.y, bounds.bottom() - self.h);
        }
        before != (self.x, self.y)
    }
}

/// Overlap test used by every trigger, pickup and hazard check.
#[inline]
pub fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    if a.is_empty() || b.is_empty() { return false; }
    a.x < b.x + b.w && a.x + a.w > b.x && a.y < b.y + b.h && a.y + a.h > b.y
}

/// Penetration depth on each axis (center distance vs. half-extent sum).
/// `None` when either depth is non-positive or a box is empty.
pub fn penetration(a: &Aabb, b: &Aabb) -> Option<(f32, f32)> {
    if a.is_empty() || b.is_empty() { return None; }
    let dx = a.center_x() - b.center_x();
    let dy = a.center_y() - b.center_y();
    let ox = (a.w / 2.0 + b.w / 2.0) - dx.abs();
    let oy = (a.h / 2.0 + b.h / 2.0) - dy.abs();
    if ox <= 0.0 || oy <= 0.0 { None } else { Some((ox, oy)) }
}

/// Which side of the obstacle the body ended up on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    /// Body pushed out to the obstacle's left.
    Left,
    /// Body pushed out to the obstacle's right.
    Right,
    /// Body landed on top of the obstacle.
    Top,
    /// Body hit the obstacle from below.
    Bottom,
}

impl Side {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// A box with velocity (per-tick world units).
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Body {
    pub rect: Aabb,
    pub vx: f32,
    pub vy: f32,
}

impl Body {
    pub fn at(x: f32, y: f32, w: f32, h: f32) -> Self {
        Body { rect: Aabb::new(x, y, w, h), vx: 0.0, vy: 0.0 }
    }
}

/// Push `body` out of `obstacle` along the axis of smaller penetration and
/// zero the velocity on that axis. Returns the side hit, or `None` when the
/// two boxes do not overlap.
pub fn resolve(body: &mut Body, obstacle: &Aabb) -> Option<Side> {
    let (ox, oy) = penetration(&body.rect, obstacle)?;

    if ox < oy {
        body.vx = 0.0;
        if body.rect.center_x() > obstacle.center_x() {
            body.rect.x = obstacle.right();
            Some(Side::Right)
        } else {
            body.rect.x = obstacle.x - body.rect.w;
            Some(Side::Left)
        }
    } else {
        body.vy = 0.0;
        if body.rect.center_y() > obstacle.center_y() {
            body.rect.y = obstacle.bottom();
            Some(Side::Bottom)
        } else {
            body.rect.y = obstacle.y - body.rect.h;
            Some(Side::Top)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_boxes() -> Vec<Aabb> {
        let mut boxes = vec![];
        for &x in &[-8.0, 0.0, 4.0, 10.0, 16.0] {
            for &y in &[-8.0, 0.0, 6.0, 12.0] {
                for &(w, h) in &[(0.0, 8.0), (8.0, 8.0), (16.0, 4.0), (4.0, 20.0)] {
                    boxes.push(Aabb::new(x, y, w, h));
                }
            }
        }
        boxes
    }

    #[test]
    fn overlap_is_symmetric() {
        let boxes = sample_boxes();
        for a in &boxes {
            for b in &boxes {
                assert_eq!(overlaps(a, b), overlaps(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        assert!(!overlaps(&a, &b));
        let c = Aabb::new(0.0, 10.0, 10.0, 10.0);
        assert!(!overlaps(&a, &c));
    }

    #[test]
    fn zero_size_never_overlaps() {
        let big = Aabb::new(0.0, 0.0, 100.0, 100.0);
        assert!(!overlaps(&big, &Aabb::new(50.0, 50.0, 0.0, 10.0)));
        assert!(!overlaps(&big, &Aabb::new(50.0, 50.0, 10.0, 0.0)));
        assert!(!overlaps(&Aabb::new(50.0, 50.0, 0.0, 0.0), &big));
    }

    #[test]
    fn resolve_removes_overlap_and_zeroes_one_axis() {
        let obstacles = sample_boxes();
        for obstacle in &obstacles {
            for start in &obstacles {
                let mut body = Body { rect: *start, vx: 3.0, vy: 5.0 };
                if let Some(side) = resolve(&mut body, obstacle) {
                    assert!(!overlaps(&body.rect, obstacle), "{start:?} in {obstacle:?} -> {side:?}");
                    if side.is_horizontal() {
                        assert_eq!(body.vx, 0.0);
                        assert_eq!(body.vy, 5.0);
                    } else {
                        assert_eq!(body.vy, 0.0);
                        assert_eq!(body.vx, 3.0);
                    }
                }
            }
        }
    }

    #[test]
    fn resolve_lands_on_top() {
        let floor = Aabb::new(0.0, 100.0, 200.0, 20.0);
        let mut body = Body { rect: Aabb::new(50.0, 70.0, 24.0, 32.0), vx: 1.0, vy: 4.0 };
        assert_eq!(resolve(&mut body, &floor), Some(Side::Top));
        assert_eq!(body.rect.bottom(), 100.0);
        assert_eq!(body.vy, 0.0);
    }

    #[test]
    fn resolve_hits_wall_from_left() {
        let wall = Aabb::new(100.0, 0.0, 20.0, 200.0);
        let mut body = Body { rect: Aabb::new(80.0, 50.0, 24.0, 32.0), vx: 4.0, vy: 0.5 };
        assert_eq!(resolve(&mut body, &wall), Some(Side::Left));
        assert_eq!(body.rect.right(), 100.0);
        assert_eq!(body.vx, 0.0);
        assert_eq!(body.vy, 0.5);
    }

    #[test]
    fn resolve_head_bump_is_bottom() {
        let ceiling = Aabb::new(0.0, 0.0, 200.0, 20.0);
        let mut body = Body { rect: Aabb::new(50.0, 18.0, 24.0, 32.0), vx: 0.0, vy: -8.0 };
        assert_eq!(resolve(&mut body, &ceiling), Some(Side::Bottom));
        assert_eq!(body.rect.y, 20.0);
    }

    #[test]
    fn equal_penetration_resolves_vertically() {
        let obstacle = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let mut body = Body { rect: Aabb::new(-6.0, -6.0, 10.0, 10.0), vx: 1.0, vy: 1.0 };
        assert_eq!(resolve(&mut body, &obstacle), Some(Side::Top));
        assert_eq!(body.vx, 1.0);
    }

    #[test]
    fn resolve_ignores_empty_obstacle() {
        let hidden = Aabb::new(40.0, 40.0, 0.0, 0.0);
        let mut body = Body::at(30.0, 30.0, 24.0, 32.0);
        assert_eq!(resolve(&mut body, &hidden), None);
        assert_eq!(body.rect, Aabb::new(30.0, 30.0, 24.0, 32.0));
    }

    #[test]
    fn quarter_turn_keeps_center() {
        let a = Aabb::new(100.0, 200.0, 120.0, 16.0);
        let r = a.quarter_turn();
        assert_eq!((r.w, r.h), (16.0, 120.0));
        assert_eq!(r.center_x(), a.center_x());
        assert_eq!(r.center_y(), a.center_y());
        assert_eq!(r.quarter_turn(), a);
    }

    #[test]
    fn clamp_within_bounds() {
        let bounds = Aabb::new(0.0, 0.0, 960.0, 540.0);
        let mut a = Aabb::new(-5.0, 530.0, 24.0, 32.0);
        assert!(a.clamp_within(&bounds));
        assert_eq!((a.x, a.y), (0.0, 508.0));
        assert!(!a.clamp_within(&bounds));
    }
}
