/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (every `*.toml`, sorted by file name)
///   2. Built-in embedded levels
///
/// ## Format (TOML):
///   ```toml
///   name = "Chamber 2: The Lever"
///   time_limit = 90
///   spawn = { x = 70, y = 450 }
///   push_force = 0.6                 # optional
///
///   [mechanics]                      # optional, default = standard
///   kind = "vanish_cycle"
///   platforms = ["v1", "v2"]
///   hide_ms = 1500
///   show_ms = 2500
///
///   [[platforms]]
///   x = 0
///   y = 500
///   w = 960
///   h = 40
///
///   [[doors]]
///   id = "D2"
///   x = 900
///   y = 370
///   w = 36
///   h = 80
///   requires = ["L1"]
///   ```
///
/// Definitions are converted into a `LevelTemplate` in one place
/// (`LevelTemplate::from_def`), which resolves string references to
/// indices and rejects anything malformed. A template that exists is valid.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::GameConfig;
use crate::domain::entity::{
    Attachment, Crystal, Door, HazardKind, Lever, Liquid, Mover, Platform, Plate, PushBox,
};
use crate::domain::geom::Aabb;
use crate::domain::mechanics::{ControlRule, LevelMechanics, RotationRule, VanishRule};

// ══════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("{file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{level}: duplicate id `{id}`")]
    DuplicateId { level: String, id: String },
    #[error("{level}: door `{door}` requires unknown trigger `{id}`")]
    UnknownTrigger { level: String, door: String, id: String },
    #[error("{level}: `{owner}` gates unknown door `{id}`")]
    UnknownDoor { level: String, owner: String, id: String },
    #[error("{level}: lever `{lever}` is attached to unknown mover `{id}`")]
    UnknownMover { level: String, lever: String, id: String },
    #[error("{level}: mechanics refer to unknown {what} `{id}`")]
    UnknownReference { level: String, what: &'static str, id: String },
    #[error("{level}: {what} has negative extents")]
    NegativeExtent { level: String, what: String },
    #[error("{level}: {what} is not a finite number")]
    NonFinite { level: String, what: String },
    #[error("{level}: {what} must be positive")]
    NonPositive { level: String, what: String },
    #[error("{level}: vanish cycle has no candidate platforms")]
    EmptyVanishSet { level: String },
    #[error("no levels found")]
    NoLevels,
}

// ══════════════════════════════════════════════════════════════
// File schema
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
pub struct LevelDef {
    pub name: String,
    pub time_limit: f32,
    pub spawn: PointDef,
    #[serde(default)]
    pub push_force: Option<f32>,
    #[serde(default)]
    pub mechanics: MechanicsDef,
    #[serde(default)]
    pub platforms: Vec<PlatformDef>,
    #[serde(default)]
    pub movers: Vec<MoverDef>,
    #[serde(default)]
    pub liquids: Vec<LiquidDef>,
    #[serde(default)]
    pub crystals: Vec<CrystalDef>,
    #[serde(default)]
    pub doors: Vec<DoorDef>,
    #[serde(default)]
    pub levers: Vec<LeverDef>,
    #[serde(default)]
    pub plates: Vec<PlateDef>,
    #[serde(default)]
    pub boxes: Vec<BoxDef>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct PointDef {
    pub x: f32,
    pub y: f32,
}

#[derive(Deserialize, Debug)]
pub struct PlatformDef {
    #[serde(default)]
    pub id: Option<String>,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(default = "default_tag")]
    pub tag: String,
}

#[derive(Deserialize, Debug)]
pub struct MoverDef {
    #[serde(default)]
    pub id: Option<String>,
    pub ax: f32,
    pub ay: f32,
    pub bx: f32,
    pub by: f32,
    pub w: f32,
    pub h: f32,
    pub speed: f32,
    #[serde(default)]
    pub t: f32,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Deserialize, Debug)]
pub struct LiquidDef {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub kind: HazardKind,
}

#[derive(Deserialize, Debug)]
pub struct CrystalDef {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_crystal_size")]
    pub w: f32,
    #[serde(default = "default_crystal_size")]
    pub h: f32,
}

#[derive(Deserialize, Debug)]
pub struct DoorDef {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(default)]
    pub requires: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct LeverDef {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_lever_size")]
    pub w: f32,
    #[serde(default = "default_lever_size")]
    pub h: f32,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub toggles: Vec<String>,
    #[serde(default)]
    pub attach: Option<AttachDef>,
}

#[derive(Deserialize, Debug)]
pub struct AttachDef {
    pub mover: String,
    #[serde(default)]
    pub dx: f32,
    #[serde(default)]
    pub dy: f32,
}

#[derive(Deserialize, Debug)]
pub struct PlateDef {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(default)]
    pub opens: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct BoxDef {
    #[serde(default)]
    pub tag: Option<String>,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_box_size")]
    pub w: f32,
    #[serde(default = "default_box_size")]
    pub h: f32,
}

#[derive(Deserialize, Debug, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MechanicsDef {
    #[default]
    Standard,
    RotatingPlatform {
        platform: String,
        arm: String,
        zone: ZoneDef,
        #[serde(default = "default_hold_ms")]
        hold_ms: f32,
        #[serde(default = "default_cooldown_ms")]
        cooldown_ms: f32,
    },
    PlayerControlledMover {
        mover: String,
        lever: String,
    },
    VanishCycle {
        platforms: Vec<String>,
        #[serde(default = "default_hide_ms")]
        hide_ms: f32,
        #[serde(default = "default_show_ms")]
        show_ms: f32,
        #[serde(default)]
        seed: u64,
    },
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ZoneDef {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

fn default_tag() -> String { "stone".into() }
fn default_true() -> bool { true }
fn default_crystal_size() -> f32 { 12.0 }
fn default_lever_size() -> f32 { 18.0 }
fn default_box_size() -> f32 { 26.0 }
fn default_hold_ms() -> f32 { 2500.0 }
fn default_cooldown_ms() -> f32 { 1000.0 }
fn default_hide_ms() -> f32 { 1500.0 }
fn default_show_ms() -> f32 { 2500.0 }

// ══════════════════════════════════════════════════════════════
// Validated template
// ══════════════════════════════════════════════════════════════

/// Immutable description of one level. Never mutated at runtime; every run
/// starts from a deep copy (`World::start`).
#[derive(Clone, Debug, PartialEq)]
pub struct LevelTemplate {
    pub name: String,
    pub time_limit: f32,
    pub spawn: (f32, f32),
    pub push_force: Option<f32>,
    pub mechanics: LevelMechanics,
    pub platforms: Vec<Platform>,
    pub movers: Vec<Mover>,
    pub liquids: Vec<Liquid>,
    pub crystals: Vec<Crystal>,
    pub doors: Vec<Door>,
    pub levers: Vec<Lever>,
    pub plates: Vec<Plate>,
    pub boxes: Vec<PushBox>,
}

impl LevelTemplate {
    /// Parse and validate one TOML document. `file` names it in errors.
    pub fn from_toml(text: &str, file: &str) -> Result<Self, LevelError> {
        let def: LevelDef = toml::from_str(text).map_err(|source| LevelError::Parse {
            file: file.to_string(),
            source,
        })?;
        Self::from_def(def)
    }

    pub fn from_def(def: LevelDef) -> Result<Self, LevelError> {
        let mut v = Validator { level: def.name.clone(), ids: BTreeSet::new() };

        v.finite("time_limit", def.time_limit)?;
        if def.time_limit <= 0.0 {
            return Err(LevelError::NonPositive { level: v.level, what: "time_limit".into() });
        }
        v.finite("spawn.x", def.spawn.x)?;
        v.finite("spawn.y", def.spawn.y)?;
        if let Some(f) = def.push_force {
            v.finite("push_force", f)?;
        }

        // ── Geometry ──
        let mut platforms = Vec::with_capacity(def.platforms.len());
        for (i, p) in def.platforms.iter().enumerate() {
            let label = p.id.clone().unwrap_or_else(|| format!("platform #{i}"));
            let rect = v.rect(&label, p.x, p.y, p.w, p.h)?;
            if let Some(id) = &p.id { v.claim(id)?; }
            let mut platform = Platform::new(rect);
            platform.id = p.id.clone();
            platform.tag = p.tag.clone();
            platforms.push(platform);
        }

        let mut movers = Vec::with_capacity(def.movers.len());
        for (i, m) in def.movers.iter().enumerate() {
            let label = m.id.clone().unwrap_or_else(|| format!("mover #{i}"));
            v.rect(&label, m.ax, m.ay, m.w, m.h)?;
            v.finite(&label, m.bx)?;
            v.finite(&label, m.by)?;
            v.finite(&label, m.speed)?;
            v.finite(&label, m.t)?;
            if let Some(id) = &m.id { v.claim(id)?; }
            let mut mover = Mover::new(m.w, m.h, (m.ax, m.ay), (m.bx, m.by), m.speed);
            mover.id = m.id.clone();
            mover.t = m.t;
            mover.active = m.active;
            mover.sync_to_phase();
            movers.push(mover);
        }

        let mut liquids = Vec::with_capacity(def.liquids.len());
        for (i, l) in def.liquids.iter().enumerate() {
            let rect = v.rect(&format!("{} #{i}", l.kind.name()), l.x, l.y, l.w, l.h)?;
            liquids.push(Liquid { rect, kind: l.kind });
        }

        let mut crystals = Vec::with_capacity(def.crystals.len());
        for (i, c) in def.crystals.iter().enumerate() {
            let rect = v.rect(&format!("crystal #{i}"), c.x, c.y, c.w, c.h)?;
            crystals.push(Crystal { rect, collected: false });
        }

        let mut boxes = Vec::with_capacity(def.boxes.len());
        for (i, b) in def.boxes.iter().enumerate() {
            let rect = v.rect(&format!("box #{i}"), b.x, b.y, b.w, b.h)?;
            let mut pb = PushBox::new(rect);
            pb.tag = b.tag.clone();
            boxes.push(pb);
        }

        // ── Trigger network ──
        let mut levers = Vec::with_capacity(def.levers.len());
        for l in &def.levers {
            let rect = v.rect(&l.id, l.x, l.y, l.w, l.h)?;
            v.claim(&l.id)?;
            let attach = match &l.attach {
                Some(a) => {
                    v.finite(&l.id, a.dx)?;
                    v.finite(&l.id, a.dy)?;
                    let mover = mover_index(&movers, &a.mover).ok_or_else(|| LevelError::UnknownMover {
                        level: v.level.clone(),
                        lever: l.id.clone(),
                        id: a.mover.clone(),
                    })?;
                    Some(Attachment { mover, dx: a.dx, dy: a.dy })
                }
                None => None,
            };
            levers.push(Lever {
                id: l.id.clone(),
                rect,
                active: l.active,
                toggles: l.toggles.clone(),
                attach,
            });
        }

        let mut plates = Vec::with_capacity(def.plates.len());
        for p in &def.plates {
            let rect = v.rect(&p.id, p.x, p.y, p.w, p.h)?;
            v.claim(&p.id)?;
            plates.push(Plate { id: p.id.clone(), rect, pressed: false, opens: p.opens.clone() });
        }

        let mut doors = Vec::with_capacity(def.doors.len());
        for d in &def.doors {
            let rect = v.rect(&d.id, d.x, d.y, d.w, d.h)?;
            v.claim(&d.id)?;
            doors.push(Door { id: d.id.clone(), rect, open: false, requires: d.requires.clone() });
        }

        // Cross references: every id must exist somewhere in the trigger table.
        for d in &doors {
            for req in &d.requires {
                let known = levers.iter().any(|l| &l.id == req)
                    || plates.iter().any(|p| &p.id == req)
                    || doors.iter().any(|o| &o.id == req && o.id != d.id);
                if !known {
                    return Err(LevelError::UnknownTrigger {
                        level: v.level,
                        door: d.id.clone(),
                        id: req.clone(),
                    });
                }
            }
        }
        let gated = levers.iter().map(|l| (&l.id, &l.toggles))
            .chain(plates.iter().map(|p| (&p.id, &p.opens)));
        for (owner, targets) in gated {
            if let Some(id) = targets.iter().find(|t| !doors.iter().any(|d| &d.id == *t)) {
                return Err(LevelError::UnknownDoor {
                    level: v.level,
                    owner: owner.clone(),
                    id: id.clone(),
                });
            }
        }

        let mechanics = v.mechanics(&def.mechanics, &platforms, &movers, &levers)?;

        Ok(LevelTemplate {
            name: def.name,
            time_limit: def.time_limit,
            spawn: (def.spawn.x, def.spawn.y),
            push_force: def.push_force,
            mechanics,
            platforms,
            movers,
            liquids,
            crystals,
            doors,
            levers,
            plates,
            boxes,
        })
    }
}

fn mover_index(movers: &[Mover], id: &str) -> Option<usize> {
    movers.iter().position(|m| m.id.as_deref() == Some(id))
}

fn platform_index(platforms: &[Platform], id: &str) -> Option<usize> {
    platforms.iter().position(|p| p.id.as_deref() == Some(id))
}

struct Validator {
    level: String,
    ids: BTreeSet<String>,
}

impl Validator {
    fn finite(&self, what: &str, value: f32) -> Result<(), LevelError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(LevelError::NonFinite { level: self.level.clone(), what: what.to_string() })
        }
    }

    fn rect(&self, what: &str, x: f32, y: f32, w: f32, h: f32) -> Result<Aabb, LevelError> {
        for n in [x, y, w, h] {
            self.finite(what, n)?;
        }
        if w < 0.0 || h < 0.0 {
            return Err(LevelError::NegativeExtent { level: self.level.clone(), what: what.to_string() });
        }
        Ok(Aabb::new(x, y, w, h))
    }

    /// Every named entity shares one namespace.
    fn claim(&mut self, id: &str) -> Result<(), LevelError> {
        if self.ids.insert(id.to_string()) {
            Ok(())
        } else {
            Err(LevelError::DuplicateId { level: self.level.clone(), id: id.to_string() })
        }
    }

    fn unknown(&self, what: &'static str, id: &str) -> LevelError {
        LevelError::UnknownReference { level: self.level.clone(), what, id: id.to_string() }
    }

    fn positive(&self, what: &str, value: f32) -> Result<(), LevelError> {
        self.finite(what, value)?;
        if value > 0.0 {
            Ok(())
        } else {
            Err(LevelError::NonPositive { level: self.level.clone(), what: what.to_string() })
        }
    }

    fn mechanics(
        &self,
        def: &MechanicsDef,
        platforms: &[Platform],
        movers: &[Mover],
        levers: &[Lever],
    ) -> Result<LevelMechanics, LevelError> {
        Ok(match def {
            MechanicsDef::Standard => LevelMechanics::Standard,
            MechanicsDef::RotatingPlatform { platform, arm, zone, hold_ms, cooldown_ms } => {
                let platform_idx = platform_index(platforms, platform)
                    .ok_or_else(|| self.unknown("platform", platform))?;
                if !levers.iter().any(|l| &l.id == arm) {
                    return Err(self.unknown("lever", arm));
                }
                let zone = self.rect("rotation zone", zone.x, zone.y, zone.w, zone.h)?;
                self.positive("hold_ms", *hold_ms)?;
                self.finite("cooldown_ms", *cooldown_ms)?;
                LevelMechanics::RotatingPlatform(RotationRule {
                    platform: platform_idx,
                    arm: arm.clone(),
                    zone,
                    hold_ms: *hold_ms,
                    cooldown_ms: cooldown_ms.max(0.0),
                })
            }
            MechanicsDef::PlayerControlledMover { mover, lever } => {
                let mover_idx = mover_index(movers, mover).ok_or_else(|| self.unknown("mover", mover))?;
                let lever_idx = levers.iter().position(|l| &l.id == lever)
                    .ok_or_else(|| self.unknown("lever", lever))?;
                LevelMechanics::PlayerControlledMover(ControlRule { mover: mover_idx, lever: lever_idx })
            }
            MechanicsDef::VanishCycle { platforms: names, hide_ms, show_ms, seed } => {
                if names.is_empty() {
                    return Err(LevelError::EmptyVanishSet { level: self.level.clone() });
                }
                let mut candidates = Vec::with_capacity(names.len());
                for name in names {
                    let idx = platform_index(platforms, name)
                        .ok_or_else(|| self.unknown("platform", name))?;
                    if candidates.contains(&idx) {
                        return Err(LevelError::DuplicateId { level: self.level.clone(), id: name.clone() });
                    }
                    candidates.push(idx);
                }
                self.positive("hide_ms", *hide_ms)?;
                self.positive("show_ms", *show_ms)?;
                LevelMechanics::VanishCycle(VanishRule {
                    candidates,
                    hide_ms: *hide_ms,
                    show_ms: *show_ms,
                    seed: *seed,
                })
            }
        })
    }
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

const EMBEDDED: [(&str, &str); 5] = [
    ("01_awakening.toml", include_str!("../../levels/01_awakening.toml")),
    ("02_lever_chamber.toml", include_str!("../../levels/02_lever_chamber.toml")),
    ("03_ferry.toml", include_str!("../../levels/03_ferry.toml")),
    ("04_green_gears.toml", include_str!("../../levels/04_green_gears.toml")),
    ("05_final_chamber.toml", include_str!("../../levels/05_final_chamber.toml")),
];

/// Load every level. A `levels/` directory with `*.toml` files replaces the
/// built-in set. Any malformed file aborts the whole load.
pub fn load_levels(config: &GameConfig) -> Result<Vec<LevelTemplate>, LevelError> {
    let dir = &config.levels_dir;
    let levels = if dir.is_dir() {
        let from_dir = load_from_directory(dir)?;
        if from_dir.is_empty() {
            embedded_levels()?
        } else {
            log::info!("loaded {} levels from {}", from_dir.len(), dir.display());
            from_dir
        }
    } else {
        embedded_levels()?
    };

    if levels.is_empty() {
        return Err(LevelError::NoLevels);
    }
    Ok(levels)
}

pub fn embedded_levels() -> Result<Vec<LevelTemplate>, LevelError> {
    let levels = EMBEDDED.iter()
        .map(|(file, text)| LevelTemplate::from_toml(text, file))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("loaded {} built-in levels", levels.len());
    Ok(levels)
}

fn load_from_directory(dir: &Path) -> Result<Vec<LevelTemplate>, LevelError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LevelError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "toml"))
        .collect();
    paths.sort();

    let mut levels = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path).map_err(|source| LevelError::Io {
            path: path.clone(),
            source,
        })?;
        let file = path.file_name().unwrap_or_default().to_string_lossy().to_string();
        levels.push(LevelTemplate::from_toml(&text, &file)?);
    }
    Ok(levels)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
