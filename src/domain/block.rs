/// Block kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so block semantics are centralized here.

use crate::config::LevelConfig;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockKind {
    Empty,
    Barrier, // Must be jumped over
    Finish,  // Win line
}

impl BlockKind {
    /// Layout symbol -> kind. Anything unrecognized is empty space.
    pub fn from_symbol(ch: char) -> Self {
        match ch {
            '|' => BlockKind::Barrier,
            'f' => BlockKind::Finish,
            _ => BlockKind::Empty,
        }
    }

    /// Horizontal extent in world units. The finish is widened so the
    /// win line reads as a target.
    pub fn width(self, cfg: &LevelConfig) -> u32 {
        match self {
            BlockKind::Finish => cfg.finish_width,
            _ => cfg.block_width,
        }
    }

    /// Vertical extent above the ground in world units.
    pub fn height(self, cfg: &LevelConfig) -> u32 {
        match self {
            BlockKind::Empty => 0,
            BlockKind::Barrier => cfg.barrier_height,
            BlockKind::Finish => cfg.level_height,
        }
    }
}

/// One unit of level geometry. Immutable once generated.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LevelBlock {
    pub kind: BlockKind,
    pub width: u32,
    pub height: u32,
}

impl LevelBlock {
    pub fn new(kind: BlockKind, cfg: &LevelConfig) -> Self {
        LevelBlock {
            kind,
            width: kind.width(cfg),
            height: kind.height(cfg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_map_to_kinds() {
        assert_eq!(BlockKind::from_symbol('.'), BlockKind::Empty);
        assert_eq!(BlockKind::from_symbol('|'), BlockKind::Barrier);
        assert_eq!(BlockKind::from_symbol('f'), BlockKind::Finish);
        assert_eq!(BlockKind::from_symbol('x'), BlockKind::Empty);
        assert_eq!(BlockKind::from_symbol('F'), BlockKind::Empty);
    }

    #[test]
    fn finish_is_wider_than_standard_blocks() {
        let cfg = LevelConfig::default();
        let finish = LevelBlock::new(BlockKind::Finish, &cfg);
        let barrier = LevelBlock::new(BlockKind::Barrier, &cfg);
        assert_eq!(finish.width, 100);
        assert_eq!(barrier.width, 30);
        assert!(finish.width > barrier.width);
    }

    #[test]
    fn every_kind_has_a_defined_height() {
        let cfg = LevelConfig::default();
        assert_eq!(BlockKind::Empty.height(&cfg), 0);
        assert_eq!(BlockKind::Barrier.height(&cfg), 60);
        assert_eq!(BlockKind::Finish.height(&cfg), 60);
    }
}
