/// Trigger network: named boolean signals from levers and plates, consumed
/// by door gating.
///
/// The table is rebuilt from scratch for every run. Writes report whether
/// the value actually changed so callers only recompute doors (and emit
/// events) on edges.
///
/// Door rule: open ⇔ every id in `requires` is true. An empty list is
/// vacuously true.

use std::collections::BTreeMap;

use super::entity::{Door, Lever, Plate};
use super::geom::{overlaps, Aabb};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriggerTable {
    states: BTreeMap<String, bool>,
}

impl TriggerTable {
    /// Seed the table from lever/plate/door initial states.
    pub fn build(levers: &[Lever], plates: &[Plate], doors: &[Door]) -> Self {
        let mut states = BTreeMap::new();
        for l in levers { states.insert(l.id.clone(), l.active); }
        for p in plates { states.insert(p.id.clone(), p.pressed); }
        for d in doors { states.insert(d.id.clone(), d.open); }
        TriggerTable { states }
    }

    /// Current value. Unknown ids read as false (validation rejects them
    /// at load time, so this only matters for hand-built tables).
    pub fn get(&self, id: &str) -> bool {
        self.states.get(id).copied().unwrap_or(false)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    /// Write a value. Returns true if it changed.
    pub fn set(&mut self, id: &str, value: bool) -> bool {
        match self.states.get_mut(id) {
            Some(v) if *v == value => false,
            Some(v) => {
                *v = value;
                true
            }
            None => {
                self.states.insert(id.to_string(), value);
                true
            }
        }
    }

    /// AND across `requires`. Empty ⇒ true.
    pub fn requirements_met(&self, requires: &[String]) -> bool {
        requires.iter().all(|id| self.get(id))
    }
}

/// Re-evaluate every door. Returns `(door index, now open)` for each door
/// whose state flipped. Door states are mirrored into the table.
pub fn recompute_doors(table: &mut TriggerTable, doors: &mut [Door]) -> Vec<(usize, bool)> {
    let mut changed = vec![];
    for (i, door) in doors.iter_mut().enumerate() {
        let open = table.requirements_met(&door.requires);
        if open != door.open {
            door.open = open;
            changed.push((i, open));
        }
        table.set(&door.id, open);
    }
    changed
}

/// Flip a lever and publish it. Returns the new state.
pub fn toggle_lever(lever: &mut Lever, table: &mut TriggerTable) -> bool {
    lever.active = !lever.active;
    table.set(&lever.id, lever.active);
    lever.active
}

/// Force a lever to a state (used when leaving platform control).
/// Returns true if the published value changed.
pub fn set_lever(lever: &mut Lever, table: &mut TriggerTable, active: bool) -> bool {
    lever.active = active;
    table.set(&lever.id, active)
}

/// Recompute a plate from scratch against every body that can press it.
/// Returns `Some(new state)` only on an edge.
pub fn evaluate_plate<'a>(
    plate: &mut Plate,
    table: &mut TriggerTable,
    bodies: impl IntoIterator<Item = &'a Aabb>,
) -> Option<bool> {
    let area = plate.test_rect();
    let pressed = bodies.into_iter().any(|b| overlaps(b, &area));
    if pressed == plate.pressed { return None; }
    plate.pressed = pressed;
    table.set(&plate.id, pressed);
    Some(pressed)
}
