/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   First content line: `# Level Name` (optional). A `#` anywhere
///   later is an ordinary (empty) layout symbol.
///   Remaining lines: layout symbols, concatenated in order.
///   Blank lines are ignored; a line starting with `;` is a comment.
///
/// ## Layout legend:
///   '.' = Empty        '|' = Barrier        'f' = Finish
///   anything else = Empty
///
/// A level must contain a finish symbol; files without one are skipped.

use std::path::Path;

use crate::config::GameConfig;
use crate::domain::layout::{self, Level};

/// Runtime level data (owned strings, loaded from file or embedded).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub layout: String,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// All playable levels: the levels directory if it has any, else built-ins.
pub fn load_levels(config: &GameConfig) -> Vec<LevelDef> {
    let dir = &config.levels_dir;
    if dir.is_dir() {
        let levels = load_from_directory(dir);
        if !levels.is_empty() {
            log::debug!("{} levels from {}", levels.len(), dir.display());
            return levels;
        }
    }
    embedded_levels()
}

/// Generate the level at `index` (clamped into range).
pub fn build_level(levels: &[LevelDef], index: usize, config: &GameConfig) -> (Level, usize) {
    let index = index.min(levels.len().saturating_sub(1));
    match levels.get(index) {
        Some(def) => (layout::generate(&def.name, &def.layout, &config.level), index),
        None => (layout::generate("Empty", "f", &config.level), 0),
    }
}

/// Levels compiled into the binary.
pub fn embedded_levels() -> Vec<LevelDef> {
    EMBEDDED
        .iter()
        .map(|(name, layout)| LevelDef {
            name: name.to_string(),
            layout: layout.to_string(),
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Single-level file parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
/// Returns None when no finish symbol is present.
pub fn parse_level_file(content: &str) -> Option<LevelDef> {
    let mut name = String::new();
    let mut layout = String::new();

    let mut header_allowed = true;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }
        // Only the first content line may be a name; later '#' is a symbol.
        if header_allowed {
            header_allowed = false;
            if let Some(rest) = trimmed.strip_prefix('#') {
                name = rest.trim().to_string();
                continue;
            }
        }
        layout.push_str(trimmed);
    }

    if !layout.contains('f') {
        return None;
    }

    if name.is_empty() {
        name = "Unnamed Run".to_string();
    }

    Some(LevelDef { name, layout })
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("could not read {}: {e}", dir.display());
            return vec![];
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(true, |e| e != "txt") {
            continue;
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("could not read {}: {e}", path.display());
                continue;
            }
        };
        match parse_level_file(&content) {
            Some(def) => {
                let key = path.file_name().unwrap_or_default().to_string_lossy().to_string();
                results.push((key, def));
            }
            None => log::warn!("{}: no finish 'f' in layout, skipped", path.display()),
        }
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results.into_iter().map(|(_, def)| def).collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[(&str, &str)] = &[
    (
        "Long Run",
        "........|........|........|........|............|........|.............|.......|........|........|........|............|.....f",
    ),
    (
        "Warm Up",
        "..........|..........|..........|..........f",
    ),
    (
        "Quick Feet",
        "......|.......|......|........|.......|......|.......|.......|......|.........f",
    ),
];
