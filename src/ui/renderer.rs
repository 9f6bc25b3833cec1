/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// World units map to terminal cells through `ui.units_per_col` and
/// `ui.units_per_row`. The field is drawn bottom-up from the ground line;
/// the level is shifted left by the session's scroll offset while the
/// player stays at a fixed column.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::GameConfig;
use crate::domain::block::BlockKind;
use crate::domain::rules::Outcome;
use crate::sim::session::{Session, SessionState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for all "empty" terminal cells, so inter-row
    /// gaps match the cell colour on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Fill a whole row with one background colour.
    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    /// Write a string centered horizontally on row y.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const FIELD_ROW: usize = 2;

const SKY_BG: Color = Color::Rgb { r: 24, g: 30, b: 60 };
const GROUND_BG: Color = Color::Rgb { r: 70, g: 48, b: 30 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };

/// Background slide speed: one column per this many ms.
const BG_SLIDE_MS: u64 = 120;

/// Terminal-cell geometry derived from config.
#[derive(Clone, Copy, Debug)]
struct Scale {
    units_per_col: u32,
    units_per_row: u32,
    field_rows: usize,
    ground_rows: usize,
    player_left: u32,
    player_width: u32,
    player_height: u32,
}

impl Scale {
    fn from_config(cfg: &GameConfig) -> Self {
        let upr = cfg.ui.units_per_row;
        Scale {
            units_per_col: cfg.ui.units_per_col,
            units_per_row: upr,
            field_rows: (cfg.field.height / upr).max(2) as usize,
            ground_rows: (cfg.field.ground_height / upr).max(1) as usize,
            player_left: cfg.player.left,
            player_width: cfg.player.width,
            player_height: cfg.player.height,
        }
    }

    /// First ground row (screen row).
    fn ground_row(&self) -> usize {
        FIELD_ROW + self.field_rows.saturating_sub(self.ground_rows)
    }

    /// Screen row holding elevation `e` above the ground, if on screen.
    fn row_for_elevation(&self, e: u32) -> Option<usize> {
        let up = (e / self.units_per_row) as usize + 1;
        self.ground_row().checked_sub(up).filter(|&r| r >= FIELD_ROW)
    }

    /// Rows covered by an object from elevation `bottom` with `height`.
    fn rows_for_span(&self, bottom: u32, height: u32) -> Vec<usize> {
        if height == 0 {
            return vec![];
        }
        let top = bottom.saturating_add(height - 1);
        let mut rows = vec![];
        let mut e = bottom - bottom % self.units_per_row;
        while e <= top {
            // Above the field: nothing higher is visible either.
            let Some(r) = self.row_for_elevation(e) else { break };
            rows.push(r);
            match e.checked_add(self.units_per_row) {
                Some(next) => e = next,
                None => break,
            }
        }
        rows
    }
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_state: Option<SessionState>,
    scale: Scale,
}

impl Renderer {
    pub fn new(cfg: &GameConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_state: None,
            scale: Scale::from_config(cfg),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, session: &Session, level_count: usize) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // State change → clear for a clean transition
        if self.last_state != Some(session.state()) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_state = Some(session.state());
        }

        self.front.clear();
        self.compose_hud(session, level_count);
        self.compose_field(session);
        self.compose_player(session);
        match session.state() {
            SessionState::Idle => self.compose_title(session),
            SessionState::Running => {}
            SessionState::Ended(outcome) => self.compose_ended(outcome),
        }
        self.compose_help();

        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours, never ResetColor (terminal default may
        // differ from BASE_BG and leave line artifacts).
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, s: &Session, level_count: usize) {
        let level = s.level();
        let state = match s.state() {
            SessionState::Idle => "READY",
            SessionState::Running => "RUN",
            SessionState::Ended(Outcome::Win) => "FINISHED",
            SessionState::Ended(Outcome::Loss) => "CRASHED",
        };
        let hud = format!(
            " {} ({}/{})  Progress:{:>3}%  Barriers:{}/{}  Time:{:>5.1}s  {} ",
            level.name,
            s.level_index() + 1,
            level_count.max(1),
            s.progress_percent(),
            s.cursor().index(),
            level.barrier_count(),
            s.elapsed_ms() as f64 / 1000.0,
            state,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_field(&mut self, s: &Session) {
        let sc = self.scale;
        let width = self.front.width;
        let ground_row = sc.ground_row();
        let bg_shift = (s.elapsed_ms() / BG_SLIDE_MS) as usize;
        let scroll = s.scroll_offset();
        let level = s.level();

        // Sky with a sliding star pattern; stops when the run ends.
        for row in FIELD_ROW..ground_row {
            for col in 0..width {
                let k = col + bg_shift;
                let ch = if (k * 7 + row * 13) % 47 == 0 { '·' } else { ' ' };
                self.front.set(col, row, Cell::new(ch, Color::Rgb { r: 140, g: 140, b: 190 }, SKY_BG));
            }
        }

        // Ground moves with the level.
        for row in ground_row..FIELD_ROW + sc.field_rows {
            for col in 0..width {
                let wx = col as u64 * sc.units_per_col as u64 + scroll as u64;
                let k = (wx / sc.units_per_col as u64) as usize;
                let ch = if row == ground_row {
                    '▀'
                } else if (k + row) % 5 == 0 {
                    '░'
                } else {
                    ' '
                };
                let fg = if row == ground_row { Color::Rgb { r: 90, g: 170, b: 70 } } else { Color::Rgb { r: 110, g: 80, b: 50 } };
                self.front.set(col, row, Cell::new(ch, fg, GROUND_BG));
            }
        }

        // Blocks in view.
        for col in 0..width {
            let wx = col as u64 * sc.units_per_col as u64 + scroll as u64;
            if wx > u32::MAX as u64 { break; }
            let idx = match level.block_at(wx as u32) {
                Some(i) => i,
                None => continue,
            };
            let block = level.blocks[idx];
            let (fg, bg) = match block.kind {
                BlockKind::Empty => continue,
                BlockKind::Barrier => (Color::Rgb { r: 255, g: 90, b: 70 }, Color::Rgb { r: 150, g: 30, b: 30 }),
                BlockKind::Finish => (Color::White, Color::Rgb { r: 20, g: 20, b: 20 }),
            };
            for (i, row) in sc.rows_for_span(0, block.height).into_iter().enumerate() {
                let ch = match block.kind {
                    BlockKind::Finish if (col + i) % 2 == 0 => '▚',
                    BlockKind::Finish => '▞',
                    _ => '▓',
                };
                self.front.set(col, row, Cell::new(ch, fg, bg));
            }
        }
    }

    fn compose_player(&mut self, s: &Session) {
        let sc = self.scale;
        let (fg, bg) = match s.state() {
            SessionState::Ended(Outcome::Win) => (Color::Black, Color::Rgb { r: 80, g: 220, b: 80 }),
            SessionState::Ended(Outcome::Loss) => (Color::White, Color::Rgb { r: 220, g: 50, b: 50 }),
            _ => (Color::Black, Color::Rgb { r: 255, g: 210, b: 60 }),
        };
        let face = match s.state() {
            SessionState::Ended(Outcome::Loss) => 'x',
            SessionState::Ended(Outcome::Win) => '^',
            _ => 'o',
        };

        let first_col = (sc.player_left / sc.units_per_col) as usize;
        let cols = sc.player_width.div_ceil(sc.units_per_col).max(1) as usize;
        let rows = sc.rows_for_span(s.player_elevation(), sc.player_height);
        let top = rows.last().copied();

        for row in rows {
            for col in first_col..first_col + cols {
                let ch = if Some(row) == top && col + 1 == first_col + cols { face } else { ' ' };
                self.front.set(col, row, Cell::new(ch, fg, bg));
            }
        }
    }

    fn compose_title(&mut self, s: &Session) {
        let row = FIELD_ROW + 2;
        let gold = Color::Rgb { r: 255, g: 220, b: 50 };
        self.front.put_centered(row, "╔══════════════════════════════╗", gold, SKY_BG);
        self.front.put_centered(row + 1, &format!("║ {:^28} ║", s.level().name), gold, SKY_BG);
        self.front.put_centered(row + 2, "╚══════════════════════════════╝", gold, SKY_BG);
        self.front.put_centered(row + 4, "▸ press any key or click to start", Color::Rgb { r: 80, g: 255, b: 80 }, SKY_BG);
    }

    fn compose_ended(&mut self, outcome: Outcome) {
        let row = FIELD_ROW + 2;
        let (title, color, hint) = match outcome {
            Outcome::Win => (
                "║   ★  FINISH LINE REACHED  ★  ║",
                Color::Rgb { r: 80, g: 255, b: 80 },
                "▸ any key: next run",
            ),
            Outcome::Loss => (
                "║     ✕  HIT A BARRIER  ✕      ║",
                Color::Rgb { r: 255, g: 60, b: 60 },
                "▸ any key: try again",
            ),
        };
        self.front.put_centered(row, "╔══════════════════════════════╗", color, SKY_BG);
        self.front.put_centered(row + 1, title, color, SKY_BG);
        self.front.put_centered(row + 2, "╚══════════════════════════════╝", color, SKY_BG);
        self.front.put_centered(row + 4, hint, Color::White, SKY_BG);
    }

    fn compose_help(&mut self) {
        let help_row = FIELD_ROW + self.scale.field_rows + 1;
        if help_row < self.front.height {
            let help = " Space/↑/Enter/Click: Jump  │  Pad: A/B/X/Y  │  Esc: Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale() -> Scale {
        Scale::from_config(&GameConfig::default())
    }

    #[test]
    fn default_field_geometry() {
        let sc = scale();
        assert_eq!(sc.field_rows, 14);
        assert_eq!(sc.ground_rows, 3);
        assert_eq!(sc.ground_row(), FIELD_ROW + 11);
    }

    #[test]
    fn elevation_rows_count_up_from_the_ground() {
        let sc = scale();
        let g = sc.ground_row();
        assert_eq!(sc.row_for_elevation(0), Some(g - 1));
        assert_eq!(sc.row_for_elevation(19), Some(g - 1));
        assert_eq!(sc.row_for_elevation(20), Some(g - 2));
        assert_eq!(sc.row_for_elevation(10_000), None);
    }

    #[test]
    fn spans_cover_every_row_they_touch() {
        let sc = scale();
        let g = sc.ground_row();
        // Barrier: 60 units tall = 3 rows
        assert_eq!(sc.rows_for_span(0, 60), vec![g - 1, g - 2, g - 3]);
        // Player mid-jump straddles three rows
        assert_eq!(sc.rows_for_span(30, 40), vec![g - 2, g - 3, g - 4]);
        assert!(sc.rows_for_span(0, 0).is_empty());
    }

    #[test]
    fn oversized_spans_stop_at_the_top_of_the_field() {
        let sc = scale();
        let sky_rows = sc.ground_row() - FIELD_ROW;
        assert_eq!(sc.rows_for_span(0, u32::MAX).len(), sky_rows);
        assert!(sc.rows_for_span(u32::MAX - 5, 10).is_empty());
    }

    #[test]
    fn frame_buffer_clips_writes() {
        let mut fb = FrameBuffer::new(4, 2);
        fb.put_str(2, 0, "abcd", Color::White, Color::Reset);
        assert_eq!(fb.get(2, 0).ch, 'a');
        assert_eq!(fb.get(3, 0).ch, 'b');
        assert_eq!(fb.get(0, 5), Cell::BLANK);
        fb.put_centered(1, "xy", Color::White, Color::Reset);
        assert_eq!(fb.get(1, 1).ch, 'x');
        assert_eq!(fb.get(1, 1).bg, Cell::BASE_BG);
    }
}
