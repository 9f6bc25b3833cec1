/// Layout generator: turns a descriptor string into a `Level`.
///
/// ## Descriptor legend:
///   '.' = Empty        '|' = Barrier        'f' = Finish
///   anything else = Empty (permissive, never an error)
///
/// Blocks keep descriptor order; each block's left edge is the sum of
/// the widths before it. Positions are in world units measured from the
/// level's left edge.

use crate::config::LevelConfig;
use crate::domain::block::{BlockKind, LevelBlock};

/// Horizontal/vertical extent of one barrier, as read by the evaluator.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BarrierGeom {
    pub x: u32,
    pub width: u32,
    pub height: u32,
}

/// A generated level. Read-only after `generate`.
#[derive(Clone, Debug)]
pub struct Level {
    pub name: String,
    pub blocks: Vec<LevelBlock>,
    /// Left edge of each block (cumulative widths).
    pub offsets: Vec<u32>,
    /// Barrier geometry in level order.
    pub barriers: Vec<BarrierGeom>,
    /// Index of the first finish block, if any.
    pub finish_index: Option<usize>,
    pub total_width: u32,
}

/// Build a level from a descriptor.
pub fn generate(name: &str, descriptor: &str, cfg: &LevelConfig) -> Level {
    let mut blocks = Vec::with_capacity(descriptor.len());
    let mut offsets = Vec::with_capacity(descriptor.len());
    let mut barriers = vec![];
    let mut finish_index = None;
    let mut x = 0u32;

    for (i, ch) in descriptor.chars().enumerate() {
        let block = LevelBlock::new(BlockKind::from_symbol(ch), cfg);
        match block.kind {
            BlockKind::Barrier => barriers.push(BarrierGeom {
                x,
                width: block.width,
                height: block.height,
            }),
            BlockKind::Finish if finish_index.is_none() => finish_index = Some(i),
            _ => {}
        }
        offsets.push(x);
        blocks.push(block);
        x = x.saturating_add(block.width);
    }

    Level {
        name: name.to_string(),
        blocks,
        offsets,
        barriers,
        finish_index,
        total_width: x,
    }
}

impl Level {
    /// Left edge of the win line.
    pub fn finish_x(&self) -> Option<u32> {
        self.finish_index.map(|i| self.offsets[i])
    }

    pub fn barrier_count(&self) -> usize {
        self.barriers.len()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Index of the block covering world x, if inside the level.
    pub fn block_at(&self, x: u32) -> Option<usize> {
        if x >= self.total_width {
            return None;
        }
        // offsets are sorted ascending
        match self.offsets.binary_search(&x) {
            Ok(i) => Some(i),
            Err(i) => Some(i - 1),
        }
    }
}
