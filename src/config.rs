/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to the built-in game constants if the file is missing or
/// incomplete. Units are "world units" (roughly one pixel each);
/// the renderer scales them down to terminal cells.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub field: FieldConfig,
    pub player: PlayerConfig,
    pub level: LevelConfig,
    pub jump: JumpConfig,
    pub rules: RulesConfig,
    pub ui: UiConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    /// 1-based index into the active level list.
    pub start_level: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FieldConfig {
    #[serde(default = "default_field_height")]
    pub height: u32,
    #[serde(default = "default_ground_height")]
    pub ground_height: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_size")]
    pub width: u32,
    #[serde(default = "default_player_size")]
    pub height: u32,
    /// Fixed distance of the player's leading edge from the field's left edge.
    #[serde(default = "default_player_left")]
    pub left: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LevelConfig {
    #[serde(default = "default_level_height")]
    pub level_height: u32,
    #[serde(default = "default_block_width")]
    pub block_width: u32,
    #[serde(default = "default_finish_width")]
    pub finish_width: u32,
    #[serde(default = "default_level_height")]
    pub barrier_height: u32,
    /// Scroll time per block. Higher = slower game, 100 is medium.
    #[serde(default = "default_block_transition")]
    pub block_transition_ms: u64,
}

#[derive(Clone, Debug)]
pub struct JumpConfig {
    pub height: u32,
    /// Rise time; the descent takes as long again.
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RulesConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_win_threshold")]
    pub win_threshold: u32,
    #[serde(default = "default_true")]
    pub loss_on_collision: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_units_per_col")]
    pub units_per_col: u32,
    #[serde(default = "default_units_per_row")]
    pub units_per_row: u32,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GamepadConfig {
    #[serde(default = "default_pad_jump")]
    pub jump: Vec<String>,
    #[serde(default = "default_pad_quit")]
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    field: FieldConfig,
    #[serde(default)]
    player: PlayerConfig,
    #[serde(default)]
    level: LevelConfig,
    #[serde(default)]
    jump: TomlJump,
    #[serde(default)]
    rules: RulesConfig,
    #[serde(default)]
    ui: UiConfig,
    #[serde(default)]
    gamepad: GamepadConfig,
    #[serde(default)]
    general: TomlGeneral,
}

/// `duration_ms` left out follows the level speed (3 blocks' worth).
#[derive(Deserialize, Debug)]
struct TomlJump {
    #[serde(default = "default_jump_height")]
    height: u32,
    #[serde(default)]
    duration_ms: Option<u64>,
}

impl Default for TomlJump {
    fn default() -> Self {
        TomlJump { height: default_jump_height(), duration_ms: None }
    }
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_start_level")]
    start_level: usize,
}

// ── Defaults ──

fn default_field_height() -> u32 { 280 }
fn default_ground_height() -> u32 { 63 }
fn default_player_size() -> u32 { 40 }
fn default_player_left() -> u32 { 40 }
fn default_level_height() -> u32 { 60 }
fn default_block_width() -> u32 { 30 }
fn default_finish_width() -> u32 { 100 }
fn default_block_transition() -> u64 { 100 }
fn default_jump_height() -> u32 { 170 }
fn jump_duration_for(block_transition_ms: u64) -> u64 { block_transition_ms.saturating_mul(3) }
fn default_tick_interval() -> u64 { 40 }
fn default_win_threshold() -> u32 { 30 }
fn default_true() -> bool { true }
fn default_units_per_col() -> u32 { 10 }
fn default_units_per_row() -> u32 { 20 }
fn default_frame_ms() -> u64 { 5 }

fn default_pad_jump() -> Vec<String> { vec!["A".into(), "B".into(), "X".into(), "Y".into(), "Up".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_start_level() -> usize { 1 }

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            height: default_field_height(),
            ground_height: default_ground_height(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            width: default_player_size(),
            height: default_player_size(),
            left: default_player_left(),
        }
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig {
            level_height: default_level_height(),
            block_width: default_block_width(),
            finish_width: default_finish_width(),
            barrier_height: default_level_height(),
            block_transition_ms: default_block_transition(),
        }
    }
}

impl Default for JumpConfig {
    fn default() -> Self {
        JumpConfig {
            height: default_jump_height(),
            duration_ms: jump_duration_for(default_block_transition()),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            tick_interval_ms: default_tick_interval(),
            win_threshold: default_win_threshold(),
            loss_on_collision: default_true(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            units_per_col: default_units_per_col(),
            units_per_row: default_units_per_row(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: default_pad_jump(),
            quit: default_pad_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            start_level: default_start_level(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
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
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. Parse errors fall back to defaults.
    #[allow(dead_code)]
    pub fn from_str_or_default(text: &str) -> Self {
        let toml_cfg = match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("config parse error: {e}; using default settings");
                TomlConfig::default()
            }
        };
        GameConfig::from_toml(toml_cfg, &[])
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

        let mut rules = toml_cfg.rules;
        if rules.tick_interval_ms == 0 {
            log::warn!("rules.tick_interval_ms must be positive; using {}", default_tick_interval());
            rules.tick_interval_ms = default_tick_interval();
        }

        let jump = JumpConfig {
            height: toml_cfg.jump.height,
            duration_ms: toml_cfg.jump.duration_ms
                .unwrap_or_else(|| jump_duration_for(toml_cfg.level.block_transition_ms)),
        };

        GameConfig {
            field: toml_cfg.field,
            player: toml_cfg.player,
            level: toml_cfg.level,
            jump,
            rules,
            ui: UiConfig {
                units_per_col: toml_cfg.ui.units_per_col.max(1),
                units_per_row: toml_cfg.ui.units_per_row.max(1),
                frame_ms: toml_cfg.ui.frame_ms,
            },
            gamepad: toml_cfg.gamepad,
            levels_dir,
            start_level: toml_cfg.general.start_level.max(1),
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
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
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        log::debug!("loaded {}", path.display());
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
    }
    TomlConfig::default()
}
