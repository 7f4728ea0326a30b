/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub frame_ms: u64,
    pub levels_dir: PathBuf,
}

/// Simulation constants. Velocities and accelerations are per tick;
/// durations are milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub friction: f32,         // horizontal velocity multiplier per tick (< 1)
    pub move_accel: f32,
    pub max_run_speed: f32,
    pub max_fall_speed: f32,
    pub jump_impulse: f32,     // applied upward (negative vy)
    pub box_friction: f32,
    pub push_force: f32,       // default when a level does not set its own
    pub steer_speed: f32,      // player-controlled mover, units per tick
    pub burn_duration_ms: f32,
    pub max_dt_ms: f32,        // frame hitch clamp
    pub mover_time_unit_ms: f32, // mover phase advances `speed` per unit
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let t = TomlPhysics::default();
        PhysicsConfig {
            gravity: t.gravity,
            friction: t.friction,
            move_accel: t.move_accel,
            max_run_speed: t.max_run_speed,
            max_fall_speed: t.max_fall_speed,
            jump_impulse: t.jump_impulse,
            box_friction: t.box_friction,
            push_force: t.push_force,
            steer_speed: t.steer_speed,
            burn_duration_ms: t.burn_duration_ms,
            max_dt_ms: t.max_dt_ms,
            mover_time_unit_ms: t.mover_time_unit_ms,
        }
    }
}

impl PhysicsConfig {
    /// Replace values the simulation cannot run with by their defaults.
    /// Speeds, forces and durations must be finite and non-negative,
    /// friction multipliers must lie in [0, 1], and the two time bases
    /// must be positive.
    pub fn sanitised(self) -> Self {
        let d = PhysicsConfig::default();
        PhysicsConfig {
            gravity: non_negative("gravity", self.gravity, d.gravity),
            friction: unit_interval("friction", self.friction, d.friction),
            move_accel: non_negative("move_accel", self.move_accel, d.move_accel),
            max_run_speed: non_negative("max_run_speed", self.max_run_speed, d.max_run_speed),
            max_fall_speed: non_negative("max_fall_speed", self.max_fall_speed, d.max_fall_speed),
            jump_impulse: non_negative("jump_impulse", self.jump_impulse, d.jump_impulse),
            box_friction: unit_interval("box_friction", self.box_friction, d.box_friction),
            push_force: non_negative("push_force", self.push_force, d.push_force),
            steer_speed: non_negative("steer_speed", self.steer_speed, d.steer_speed),
            burn_duration_ms: non_negative("burn_duration_ms", self.burn_duration_ms, d.burn_duration_ms),
            max_dt_ms: if self.max_dt_ms.is_finite() { self.max_dt_ms.max(1.0) } else {
                log::warn!("physics.max_dt_ms = {} is unusable; using {}", self.max_dt_ms, d.max_dt_ms);
                d.max_dt_ms
            },
            mover_time_unit_ms: positive("mover_time_unit_ms", self.mover_time_unit_ms, d.mover_time_unit_ms),
        }
    }
}

fn non_negative(key: &str, value: f32, default: f32) -> f32 {
    if value.is_finite() && value >= 0.0 { return value; }
    log::warn!("physics.{key} = {value} must be finite and >= 0; using {default}");
    default
}

fn positive(key: &str, value: f32, default: f32) -> f32 {
    if value.is_finite() && value > 0.0 { return value; }
    log::warn!("physics.{key} = {value} must be finite and > 0; using {default}");
    default
}

fn unit_interval(key: &str, value: f32, default: f32) -> f32 {
    if (0.0..=1.0).contains(&value) { return value; }
    log::warn!("physics.{key} = {value} must lie in [0, 1]; using {default}");
    default
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_friction")]
    friction: f32,
    #[serde(default = "default_move_accel")]
    move_accel: f32,
    #[serde(default = "default_max_run")]
    max_run_speed: f32,
    #[serde(default = "default_max_fall")]
    max_fall_speed: f32,
    #[serde(default = "default_jump")]
    jump_impulse: f32,
    #[serde(default = "default_box_friction")]
    box_friction: f32,
    #[serde(default = "default_push")]
    push_force: f32,
    #[serde(default = "default_steer")]
    steer_speed: f32,
    #[serde(default = "default_burn")]
    burn_duration_ms: f32,
    #[serde(default = "default_max_dt")]
    max_dt_ms: f32,
    #[serde(default = "default_mover_unit")]
    mover_time_unit_ms: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_gravity() -> f32 { 0.75 }
fn default_friction() -> f32 { 0.85 }
fn default_move_accel() -> f32 { 0.9 }
fn default_max_run() -> f32 { 4.2 }
fn default_max_fall() -> f32 { 16.0 }
fn default_jump() -> f32 { 12.5 }
fn default_box_friction() -> f32 { 0.9 }
fn default_push() -> f32 { 0.6 }
fn default_steer() -> f32 { 3.0 }
fn default_burn() -> f32 { 1500.0 }
fn default_max_dt() -> f32 { 50.0 }
fn default_mover_unit() -> f32 { 1000.0 } // speed = radians per second
fn default_frame_ms() -> u64 { 16 }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            gravity: default_gravity(),
            friction: default_friction(),
            move_accel: default_move_accel(),
            max_run_speed: default_max_run(),
            max_fall_speed: default_max_fall(),
            jump_impulse: default_jump(),
            box_friction: default_box_friction(),
            push_force: default_push(),
            steer_speed: default_steer(),
            burn_duration_ms: default_burn(),
            max_dt_ms: default_max_dt(),
            mover_time_unit_ms: default_mover_unit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            frame_ms: default_frame_ms(),
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let p = toml_cfg.physics;
        let physics = PhysicsConfig {
            gravity: p.gravity,
            friction: p.friction,
            move_accel: p.move_accel,
            max_run_speed: p.max_run_speed,
            max_fall_speed: p.max_fall_speed,
            jump_impulse: p.jump_impulse,
            box_friction: p.box_friction,
            push_force: p.push_force,
            steer_speed: p.steer_speed,
            burn_duration_ms: p.burn_duration_ms,
            max_dt_ms: p.max_dt_ms,
            mover_time_unit_ms: p.mover_time_unit_ms,
        };
        GameConfig {
            physics: physics.sanitised(),
            frame_ms: toml_cfg.general.frame_ms.max(1),
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable (symlinks resolved)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/ruinrunner)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/ruinrunner");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory
    let sys = PathBuf::from("/usr/share/ruinrunner");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    log::info!("config loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    log::warn!("config.toml parse error: {e}; using default settings");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: TomlConfig = toml::from_str("[physics]\ngravity = 1.0\n").unwrap_or_default();
        let game = GameConfig::from_toml(cfg, &[]);
        assert_eq!(game.physics.gravity, 1.0);
        assert_eq!(game.physics.friction, 0.85);
        assert_eq!(game.frame_ms, 16);
        assert_eq!(game.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap_or_default();
        let game = GameConfig::from_toml(cfg, &[]);
        assert_eq!(game.physics, PhysicsConfig::default());
    }

    #[test]
    fn nonsense_clamps_are_sanitised() {
        let cfg: TomlConfig = toml::from_str(concat!(
            "[physics]\n",
            "max_dt_ms = 0.0\n",
            "mover_time_unit_ms = -5.0\n",
            "max_run_speed = -1.0\n",
            "max_fall_speed = -inf\n",
            "jump_impulse = inf\n",
            "gravity = nan\n",
            "steer_speed = -3.0\n",
            "friction = 1.5\n",
            "box_friction = -0.2\n",
            "[general]\n",
            "frame_ms = 0\n",
        )).unwrap();
        let game = GameConfig::from_toml(cfg, &[]);
        let d = PhysicsConfig::default();
        assert_eq!(game.physics.max_dt_ms, 1.0);
        assert_eq!(game.physics.mover_time_unit_ms, 1000.0);
        assert_eq!(game.physics.max_run_speed, d.max_run_speed);
        assert_eq!(game.physics.max_fall_speed, d.max_fall_speed);
        assert_eq!(game.physics.jump_impulse, d.jump_impulse);
        assert_eq!(game.physics.gravity, d.gravity);
        assert_eq!(game.physics.steer_speed, d.steer_speed);
        assert_eq!(game.physics.friction, d.friction);
        assert_eq!(game.physics.box_friction, d.box_friction);
        assert_eq!(game.frame_ms, 1);
    }

    #[test]
    fn edge_values_survive_sanitising() {
        let edge = PhysicsConfig { friction: 1.0, box_friction: 0.0, gravity: 0.0, ..PhysicsConfig::default() };
        assert_eq!(edge.clone().sanitised(), edge);
    }

    #[test]
    fn negative_run_speed_cannot_reach_the_simulation() {
        use crate::domain::geom::Body;
        use crate::domain::physics::apply_run_input;

        let cfg = PhysicsConfig { max_run_speed: -1.0, ..PhysicsConfig::default() }.sanitised();
        let mut body = Body::at(0.0, 0.0, 24.0, 32.0);
        apply_run_input(&mut body, 1.0, &cfg);
        assert!(body.vx > 0.0 && body.vx <= cfg.max_run_speed);
    }
}
