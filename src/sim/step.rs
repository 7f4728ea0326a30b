/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Timer countdown (time out → lose, nothing else runs)
///   2. Action key (levers, entering/leaving platform control)
///   3. Player velocity (input, friction, gravity, jump)
///   4. Movers and level mechanics
///   5. Player motion (axis split, riding) or pinning while steering
///   6. Boxes (push, gravity, riding), player vs. boxes, playfield clamp
///   7. Plates → trigger table → doors
///   8. Burning boxes
///   9. Hazards (lose), crystals, exit door (win)
///
/// A result (win or lose) ends the tick immediately; once set, later calls
/// are no-ops, so a run can only finish once.

use crate::domain::entity::FrameInput;
use crate::domain::geom::overlaps;
use crate::domain::mechanics::{self, Transition};
use crate::domain::physics;
use crate::domain::trigger;
use super::event::GameEvent;
use super::world::{LoseReason, Outcome, World, PLAYFIELD};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// Advance one tick. `dt_ms` is wall-clock time since the previous tick; it
/// is clamped to `max_dt_ms` so a hitch cannot tunnel bodies through floors.
pub fn step(world: &mut World, input: FrameInput, dt_ms: f32) -> Vec<GameEvent> {
    if world.is_over() { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    let dt = dt_ms.clamp(0.0, world.physics.max_dt_ms);

    if resolve_timer(world, dt, &mut events) { return events; }
    world.tick += 1;

    if input.action_pressed {
        resolve_action(world, &mut events);
    }
    resolve_player_velocity(world, input);
    resolve_mechanics(world, input, dt, &mut events);
    resolve_player_motion(world);
    resolve_boxes(world);
    resolve_plates(world, &mut events);
    resolve_burning(world, dt, &mut events);
    if resolve_hazards(world, &mut events) { return events; }
    resolve_crystals(world, &mut events);
    resolve_exit(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Timer
// ══════════════════════════════════════════════════════════════

fn resolve_timer(world: &mut World, dt: f32, events: &mut Vec<GameEvent>) -> bool {
    world.time_left -= dt / 1000.0;
    if world.time_left > 0.0 { return false; }
    world.time_left = 0.0;
    lose(world, LoseReason::TimeExpired, events);
    true
}

// ══════════════════════════════════════════════════════════════
// Action key: levers and platform control
// ══════════════════════════════════════════════════════════════

fn resolve_action(world: &mut World, events: &mut Vec<GameEvent>) {
    // Leaving control works from anywhere.
    if let Some(m) = world.controlled_mover() {
        exit_control(world, m, events);
        refresh_doors(world, events);
        return;
    }

    let control = world.control_rule().map(|r| (r.lever, r.mover));
    for i in world.levers_in_reach() {
        match control {
            Some((lever, mover)) if lever == i => enter_control(world, mover, lever, events),
            _ => toggle(world, i, events),
        }
    }
    refresh_doors(world, events);
}

fn toggle(world: &mut World, i: usize, events: &mut Vec<GameEvent>) {
    let lever = &mut world.levers[i];
    let active = trigger::toggle_lever(lever, &mut world.triggers);
    events.push(GameEvent::LeverToggled { id: lever.id.clone(), active });

    if let Some(a) = lever.attach {
        if let Some(m) = world.movers.get_mut(a.mover) {
            m.active = !m.active;
            events.push(if m.active {
                GameEvent::MoverActivated { mover: a.mover }
            } else {
                GameEvent::MoverParked { mover: a.mover }
            });
        }
    }
}

fn enter_control(world: &mut World, mover: usize, lever: usize, events: &mut Vec<GameEvent>) {
    let Some(m) = world.movers.get_mut(mover) else { return };
    m.controlling = true;
    m.active = false;
    world.player.body.vx = 0.0;
    world.player.body.vy = 0.0;

    let l = &mut world.levers[lever];
    if trigger::set_lever(l, &mut world.triggers, true) {
        events.push(GameEvent::LeverToggled { id: l.id.clone(), active: true });
    }
    events.push(GameEvent::ControlEntered { mover });
}

fn exit_control(world: &mut World, mover: usize, events: &mut Vec<GameEvent>) {
    let m = &mut world.movers[mover];
    m.controlling = false;
    m.active = false;
    events.push(GameEvent::ControlExited { mover });

    if let Some(rule) = world.control_rule().cloned() {
        let l = &mut world.levers[rule.lever];
        if trigger::set_lever(l, &mut world.triggers, false) {
            events.push(GameEvent::LeverToggled { id: l.id.clone(), active: false });
        }
    }
}

/// Re-evaluate doors after trigger writes and report the flips.
fn refresh_doors(world: &mut World, events: &mut Vec<GameEvent>) {
    for (i, open) in trigger::recompute_doors(&mut world.triggers, &mut world.doors) {
        let id = world.doors[i].id.clone();
        events.push(if open { GameEvent::DoorOpened { id } } else { GameEvent::DoorClosed { id } });
    }
}

// ══════════════════════════════════════════════════════════════
// Motion
// ══════════════════════════════════════════════════════════════

fn resolve_player_velocity(world: &mut World, input: FrameInput) {
    if world.controlled_mover().is_some() { return; }
    physics::prepare_player(&mut world.player, input.horizontal(), input.jump_pressed, &world.physics);
}

fn resolve_mechanics(world: &mut World, input: FrameInput, dt: f32, events: &mut Vec<GameEvent>) {
    mechanics::advance_movers(&mut world.movers, dt / world.physics.mover_time_unit_ms);

    if let Some(m) = world.controlled_mover() {
        mechanics::steer(&mut world.movers[m], input.horizontal(), world.physics.steer_speed, &PLAYFIELD);
    }
    mechanics::sync_attached_levers(&mut world.levers, &world.movers);

    let transition = mechanics::advance(
        &world.mechanics,
        &mut world.mechanics_state,
        &mut world.platforms,
        &world.triggers,
        world.player.rect(),
        dt,
    );
    if let Some(t) = transition {
        events.push(match t {
            Transition::Rotated(platform) => GameEvent::PlatformRotated { platform },
            Transition::Restored(platform) => GameEvent::PlatformRestored { platform },
            Transition::Vanished(platform) => GameEvent::PlatformVanished { platform },
            Transition::Reappeared(platform) => GameEvent::PlatformReappeared { platform },
        });
    }
}

fn resolve_player_motion(world: &mut World) {
    match world.controlled_mover() {
        Some(m) => {
            // Pinned to the top-center of the steered mover.
            let deck = world.movers[m].rect;
            let p = &mut world.player;
            p.body.rect.x = deck.center_x() - p.body.rect.w / 2.0;
            p.body.rect.y = deck.y - p.body.rect.h;
            p.body.vx = 0.0;
            p.body.vy = 0.0;
            p.on_ground = true;
            p.riding = Some(m);
        }
        None => {
            physics::integrate_player(&mut world.player, &world.platforms, &world.movers);
        }
    }
}

fn resolve_boxes(world: &mut World) {
    let steering = world.controlled_mover().is_some();

    for b in world.boxes.iter_mut() {
        physics::prepare_box(b, &world.physics);
        if !steering {
            physics::push_box(&mut world.player.body, &mut b.body, world.push_force);
        }
        physics::integrate_box(b, &world.platforms, &world.movers);
        physics::confine(&mut b.body, &PLAYFIELD);
    }

    if !steering {
        physics::collide_with_boxes(&mut world.player, &world.boxes);
    }
    physics::confine(&mut world.player.body, &PLAYFIELD);
    if world.player.body.rect.bottom() >= PLAYFIELD.bottom() {
        world.player.on_ground = true;
    }
}

// ══════════════════════════════════════════════════════════════
// Triggers
// ══════════════════════════════════════════════════════════════

fn resolve_plates(world: &mut World, events: &mut Vec<GameEvent>) {
    let mut changed = false;
    for plate in world.plates.iter_mut() {
        let bodies = std::iter::once(world.player.rect())
            .chain(world.boxes.iter().map(|b| &b.body.rect));
        if let Some(pressed) = trigger::evaluate_plate(plate, &mut world.triggers, bodies) {
            let id = plate.id.clone();
            events.push(if pressed { GameEvent::PlatePressed { id } } else { GameEvent::PlateReleased { id } });
            changed = true;
        }
    }
    if changed {
        refresh_doors(world, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Hazards & pickups
// ══════════════════════════════════════════════════════════════

/// Burning boxes tick down and despawn; then boxes touching lava ignite.
/// A box ignites once: contact after that does not reset its timer.
fn resolve_burning(world: &mut World, dt: f32, events: &mut Vec<GameEvent>) {
    let mut burned_out = vec![];
    world.boxes.retain_mut(|b| {
        if b.tick_burn(dt) {
            burned_out.push((b.body.rect.x, b.body.rect.y));
            false
        } else {
            true
        }
    });
    for (x, y) in burned_out {
        events.push(GameEvent::BoxBurnedOut { x, y });
    }

    let burn_ms = world.physics.burn_duration_ms;
    for (index, b) in world.boxes.iter_mut().enumerate() {
        if b.is_burning() { continue; }
        let in_lava = world.liquids.iter()
            .any(|l| l.kind.ignites_boxes() && overlaps(&b.body.rect, &l.rect));
        if in_lava {
            b.burn_ms = Some(burn_ms);
            events.push(GameEvent::BoxIgnited { index, x: b.body.rect.x, y: b.body.rect.y });
        }
    }
}

fn resolve_hazards(world: &mut World, events: &mut Vec<GameEvent>) -> bool {
    let hit = world.liquids.iter()
        .find(|l| overlaps(world.player.rect(), &l.rect))
        .map(|l| l.kind);
    match hit {
        Some(kind) => {
            world.player.alive = false;
            lose(world, LoseReason::Hazard(kind), events);
            true
        }
        None => false,
    }
}

fn resolve_crystals(world: &mut World, events: &mut Vec<GameEvent>) {
    for (index, c) in world.crystals.iter_mut().enumerate() {
        if c.collected || !overlaps(world.player.rect(), &c.rect) { continue; }
        c.collected = true;
        world.player.crystals += 1;
        events.push(GameEvent::CrystalCollected { index, total: world.player.crystals });
    }
}

fn resolve_exit(world: &mut World, events: &mut Vec<GameEvent>) {
    let reached = world.doors.iter().any(|d| d.open && overlaps(world.player.rect(), &d.rect));
    if reached {
        world.outcome = Some(Outcome::Win);
        events.push(GameEvent::RunWon { score: world.score(), time_left: world.time_left });
    }
}

fn lose(world: &mut World, reason: LoseReason, events: &mut Vec<GameEvent>) {
    world.outcome = Some(Outcome::Lose(reason));
    events.push(GameEvent::RunLost { reason: reason.to_string() });
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::domain::entity::HazardKind;
    use crate::sim::level::LevelTemplate;

    const TICK: f32 = 16.0;

    const FLOOR: &str = r#"
        [[platforms]]
        x = 0
        y = 500
        w = 960
        h = 40
    "#;

    fn world_from(head: &str, body: &str) -> World {
        let text = format!("{head}\n{FLOOR}\n{body}");
        let t = LevelTemplate::from_toml(&text, "fixture.toml").unwrap();
        World::start(0, &t, &PhysicsConfig::default())
    }

    fn right() -> FrameInput {
        FrameInput { move_right: true, ..Default::default() }
    }

    fn action() -> FrameInput {
        FrameInput { action_pressed: true, ..Default::default() }
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    #[test]
    fn plate_opens_door_exactly_while_overlapped() {
        let mut w = world_from(
            "name = \"plate\"\ntime_limit = 60\nspawn = { x = 100, y = 468 }",
            r#"
            [[plates]]
            id = "P1"
            x = 300
            y = 494
            w = 40
            h = 6
            opens = ["D1"]

            [[doors]]
            id = "D1"
            x = 900
            y = 430
            w = 36
            h = 70
            requires = ["P1"]
            "#,
        );
        assert!(!w.doors[0].open);

        let mut open_ticks = 0;
        let mut was_open = false;
        for _ in 0..120 {
            let events = step(&mut w, right(), TICK);
            let on_plate = overlaps(w.player.rect(), &w.plates[0].test_rect());
            assert_eq!(w.doors[0].open, on_plate, "tick {}", w.tick);
            if w.doors[0].open != was_open {
                let expected = if on_plate {
                    GameEvent::DoorOpened { id: "D1".into() }
                } else {
                    GameEvent::DoorClosed { id: "D1".into() }
                };
                assert!(events.contains(&expected));
                was_open = w.doors[0].open;
            }
            if w.doors[0].open { open_ticks += 1; }
        }
        assert!(open_ticks > 0);
        assert!(!w.doors[0].open);
        assert!(w.player.body.rect.x > 340.0);
        assert!(!w.is_over());
    }

    const LEVER_LEVEL: &str = r#"
        [[levers]]
        id = "L1"
        x = 100
        y = 482
        toggles = ["D1"]

        [[doors]]
        id = "D1"
        x = 900
        y = 430
        w = 36
        h = 70
        requires = ["L1"]
    "#;

    #[test]
    fn lever_toggled_twice_closes_door_again() {
        let mut w = world_from("name = \"lever\"\ntime_limit = 60\nspawn = { x = 95, y = 468 }", LEVER_LEVEL);
        step(&mut w, idle(), TICK);
        assert!(!w.doors[0].open);

        let events = step(&mut w, action(), TICK);
        assert!(events.contains(&GameEvent::LeverToggled { id: "L1".into(), active: true }));
        assert!(w.doors[0].open);

        step(&mut w, action(), TICK);
        assert!(!w.levers[0].active);
        assert!(!w.doors[0].open);
    }

    #[test]
    fn action_away_from_lever_does_nothing() {
        let mut w = world_from("name = \"lever\"\ntime_limit = 60\nspawn = { x = 400, y = 468 }", LEVER_LEVEL);
        let events = step(&mut w, action(), TICK);
        assert!(events.is_empty());
        assert!(!w.levers[0].active);
    }

    #[test]
    fn pushed_box_burns_out_and_stops_being_solid() {
        let mut w = world_from(
            "name = \"burn\"\ntime_limit = 60\nspawn = { x = 40, y = 468 }",
            r#"
            [[liquids]]
            x = 180
            y = 486
            w = 100
            h = 14
            kind = "lava"

            [[boxes]]
            x = 100
            y = 474
            "#,
        );

        // Shove the box along the floor until it reaches the lava.
        let mut ignited_at = None;
        for _ in 0..120 {
            let events = step(&mut w, right(), TICK);
            if events.iter().any(|e| matches!(e, GameEvent::BoxIgnited { .. })) {
                ignited_at = Some(w.tick);
                break;
            }
        }
        let ignited_at = ignited_at.expect("box never reached the lava");
        assert!(!w.is_over());
        assert!(w.player.body.rect.right() <= w.boxes[0].body.rect.x + 1e-3);

        // Back off and let it burn.
        let left = FrameInput { move_left: true, ..Default::default() };
        let mut ignitions = 1;
        let mut burned_out = None;
        for _ in 0..200 {
            let input = if w.tick - ignited_at < 30 { left } else { idle() };
            for e in step(&mut w, input, TICK) {
                match e {
                    GameEvent::BoxIgnited { .. } => ignitions += 1,
                    GameEvent::BoxBurnedOut { x, y } => burned_out = Some((x, y, w.tick)),
                    _ => {}
                }
            }
            if burned_out.is_some() { break; }
        }
        let (bx, by, gone_at) = burned_out.expect("box never burned out");
        assert_eq!(ignitions, 1);
        assert_eq!(gone_at - ignited_at, 94, "1500 ms at 16 ms per tick");
        assert!(w.boxes.is_empty());
        assert!(!w.is_over());

        // Standing where the lid used to be, the player drops straight through.
        w.player.body.rect.x = bx;
        w.player.body.rect.y = by - w.player.body.rect.h;
        w.player.body.vx = 0.0;
        w.player.body.vy = 0.0;
        w.player.riding = None;

        step(&mut w, idle(), TICK);
        assert!(!w.player.on_ground);
        assert!(w.player.body.rect.bottom() > by);
        assert_eq!(w.player.body.rect.x, bx, "nothing pushed the player aside");

        for _ in 0..30 {
            step(&mut w, idle(), TICK);
            if w.is_over() || w.player.on_ground { break; }
        }
        assert!(w.player.body.rect.bottom() > by + 10.0);
    }

    #[test]
    fn rider_keeps_footing_on_a_sinking_lift() {
        let mut w = world_from(
            "name = \"lift\"\ntime_limit = 60\nspawn = { x = 420, y = 348 }",
            r#"
            [[movers]]
            ax = 400
            ay = 380
            bx = 400
            by = 480
            w = 90
            h = 14
            speed = 1.2
            "#,
        );
        // Down to the bottom anchor and back up again.
        for _ in 0..300 {
            step(&mut w, idle(), TICK);
            assert!(w.player.on_ground, "lost footing on tick {}", w.tick);
            assert_eq!(w.player.riding, Some(0));
            assert!((w.player.body.rect.bottom() - w.movers[0].rect.y).abs() < 1e-3);
        }
        assert!(!w.is_over());

        let events = step(&mut w, FrameInput { jump_pressed: true, ..Default::default() }, TICK);
        assert!(events.is_empty());
        assert!(!w.player.on_ground);
        assert!(w.player.body.vy < 0.0);
    }

    #[test]
    fn water_does_not_ignite_boxes() {
        let mut w = world_from(
            "name = \"wet\"\ntime_limit = 60\nspawn = { x = 600, y = 468 }",
            r#"
            [[liquids]]
            x = 90
            y = 486
            w = 100
            h = 14
            kind = "water"

            [[boxes]]
            x = 100
            y = 474
            "#,
        );
        for _ in 0..200 { step(&mut w, idle(), TICK); }
        assert_eq!(w.boxes.len(), 1);
        assert!(!w.boxes[0].is_burning());
    }

    #[test]
    fn timer_runs_out() {
        let mut w = world_from("name = \"clock\"\ntime_limit = 1\nspawn = { x = 100, y = 468 }", "");
        for _ in 0..60 { step(&mut w, idle(), TICK); }
        assert!(!w.is_over());

        let mut lost = vec![];
        for _ in 0..10 { lost.extend(step(&mut w, idle(), TICK)); }
        assert_eq!(w.outcome, Some(Outcome::Lose(LoseReason::TimeExpired)));
        assert_eq!(lost, vec![GameEvent::RunLost { reason: "time expired".into() }]);
        assert_eq!(w.time_left, 0.0);

        // Finished runs are frozen.
        let snapshot = w.clone();
        assert!(step(&mut w, right(), TICK).is_empty());
        assert_eq!(w, snapshot);
    }

    #[test]
    fn large_dt_is_clamped() {
        let mut w = world_from("name = \"hitch\"\ntime_limit = 60\nspawn = { x = 100, y = 468 }", "");
        step(&mut w, idle(), 5000.0);
        assert!((w.time_left - (60.0 - 0.05)).abs() < 1e-4);
        assert!(!w.is_over());
    }

    #[test]
    fn liquid_contact_loses_with_hazard_name() {
        let mut w = world_from(
            "name = \"acid\"\ntime_limit = 60\nspawn = { x = 200, y = 400 }",
            r#"
            [[liquids]]
            x = 150
            y = 486
            w = 150
            h = 14
            kind = "acid"

            [[crystals]]
            x = 205
            y = 488
            "#,
        );
        let mut events = vec![];
        for _ in 0..60 {
            events.extend(step(&mut w, idle(), TICK));
            if w.is_over() { break; }
        }
        assert_eq!(w.outcome, Some(Outcome::Lose(LoseReason::Hazard(HazardKind::Acid))));
        assert!(!w.player.alive);
        assert!(events.contains(&GameEvent::RunLost { reason: "fell into acid".into() }));
        // Hazard short-circuits the rest of the tick: the crystal in the pool is untouched.
        assert!(!w.crystals[0].collected);
    }

    #[test]
    fn crystals_count_once() {
        let mut w = world_from(
            "name = \"gems\"\ntime_limit = 60\nspawn = { x = 100, y = 468 }",
            r#"
            [[crystals]]
            x = 200
            y = 480

            [[crystals]]
            x = 260
            y = 480
            "#,
        );
        let mut last = 0;
        let left = FrameInput { move_left: true, ..Default::default() };
        for i in 0..160 {
            let input = if i < 80 { right() } else { left };
            step(&mut w, input, TICK);
            assert!(w.score() >= last);
            last = w.score();
        }
        assert_eq!(w.score(), 2);
        assert!(w.crystals.iter().all(|c| c.collected));
    }

    #[test]
    fn open_door_wins() {
        let mut w = world_from(
            "name = \"exit\"\ntime_limit = 60\nspawn = { x = 100, y = 468 }",
            r#"
            [[doors]]
            id = "EXIT"
            x = 150
            y = 430
            w = 36
            h = 70
            "#,
        );
        assert!(w.doors[0].open);
        let mut won = false;
        for _ in 0..60 {
            for e in step(&mut w, right(), TICK) {
                if matches!(e, GameEvent::RunWon { .. }) { won = true; }
            }
            if w.is_over() { break; }
        }
        assert!(won);
        assert_eq!(w.outcome, Some(Outcome::Win));
    }

    const FERRY: &str = r#"
        [mechanics]
        kind = "player_controlled_mover"
        mover = "ferry"
        lever = "LC"

        [[movers]]
        id = "ferry"
        ax = 200
        ay = 440
        bx = 200
        by = 440
        w = 90
        h = 14
        speed = 0
        active = false

        [[levers]]
        id = "LC"
        x = 150
        y = 482

        [[doors]]
        id = "D1"
        x = 900
        y = 430
        w = 36
        h = 70
        requires = ["LC"]
    "#;

    #[test]
    fn player_steers_mover_and_lets_go() {
        let mut w = world_from("name = \"ferry\"\ntime_limit = 60\nspawn = { x = 150, y = 468 }", FERRY);

        let events = step(&mut w, action(), TICK);
        assert!(events.contains(&GameEvent::ControlEntered { mover: 0 }));
        assert_eq!(w.controlled_mover(), Some(0));
        assert!(w.levers[0].active);
        assert!(w.doors[0].open);
        assert_eq!(w.player.body.rect.bottom(), w.movers[0].rect.y);
        assert_eq!(w.player.body.rect.center_x(), w.movers[0].rect.center_x());

        for _ in 0..10 { step(&mut w, right(), TICK); }
        assert!((w.movers[0].rect.x - 230.0).abs() < 1e-3);
        assert_eq!(w.player.body.rect.center_x(), w.movers[0].rect.center_x());
        assert_eq!(w.movers[0].rect.y, 440.0);

        // Far from the lever now; the action key still releases control.
        let events = step(&mut w, action(), TICK);
        assert!(events.contains(&GameEvent::ControlExited { mover: 0 }));
        assert_eq!(w.controlled_mover(), None);
        assert!(!w.movers[0].active);
        assert!(!w.levers[0].active);
        assert!(!w.doors[0].open);

        // Parked: stays put, and the player stands on it.
        let parked = w.movers[0].rect;
        for _ in 0..20 { step(&mut w, idle(), TICK); }
        assert_eq!(w.movers[0].rect, parked);
        assert!(w.player.on_ground);
        assert!((w.player.body.rect.bottom() - parked.y).abs() < 1e-3);
    }

    #[test]
    fn attached_lever_arms_its_mover() {
        let mut w = world_from(
            "name = \"lift\"\ntime_limit = 60\nspawn = { x = 400, y = 438 }",
            r#"
            [[movers]]
            id = "lift"
            ax = 380
            ay = 470
            bx = 380
            by = 360
            w = 80
            h = 14
            speed = 2.0
            active = false

            [[levers]]
            id = "LA"
            x = 0
            y = 0
            toggles = ["D1"]
            attach = { mover = "lift", dx = 30, dy = -18 }

            [[doors]]
            id = "D1"
            x = 900
            y = 430
            w = 36
            h = 70
            requires = ["LA"]
            "#,
        );
        // Let the player settle on the parked lift.
        for _ in 0..10 { step(&mut w, idle(), TICK); }
        assert_eq!(w.movers[0].rect.y, 470.0);

        let events = step(&mut w, action(), TICK);
        assert!(events.contains(&GameEvent::MoverActivated { mover: 0 }));
        assert!(w.doors[0].open);

        for _ in 0..30 { step(&mut w, idle(), TICK); }
        let lift = w.movers[0].rect;
        assert!(lift.y < 470.0);
        assert_eq!(w.levers[0].rect.y, lift.y - 18.0);
        assert!(w.player.on_ground);
    }
}
