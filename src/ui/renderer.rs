/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Each frame:
///   1. Compose the next frame into `front` (a grid of Cell)
///   2. Compare every cell against `back` (the previous frame)
///   3. Queue terminal commands only for cells that changed
///   4. Flush once, then swap front/back
///
/// The playfield is drawn from a `Snapshot`, never from the live world.
/// One terminal cell covers `UNITS_PER_COL` × `UNITS_PER_ROW` world units.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{HazardKind, MoverMode};
use crate::domain::geom::Aabb;
use crate::sim::session::{GameSession, Phase};
use crate::sim::snapshot::Snapshot;
use crate::sim::world::{Outcome, PLAYFIELD};

const UNITS_PER_COL: f32 = 12.0;
const UNITS_PER_ROW: f32 = 20.0;

const HUD_ROW: usize = 0;
const FIELD_ROW: usize = 2;

const BASE_BG: Color = Color::Rgb { r: 18, g: 16, b: 24 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 60 };
const MOSS: Color = Color::Rgb { r: 110, g: 200, b: 90 };

// ── Cell ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Differs from any composed cell, so the next flush repaints everything.
    const INVALID: Cell = Cell { ch: '\u{0}', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
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

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    /// Fill the terminal cells covered by a world-space rect.
    fn fill_world(&mut self, rect: &Aabb, ch: char, fg: Color, bg: Color) {
        let (c0, c1) = span(rect.x, rect.right(), UNITS_PER_COL);
        let (r0, r1) = span(rect.y, rect.bottom(), UNITS_PER_ROW);
        for row in r0..r1 {
            for col in c0..c1 {
                self.set(col, FIELD_ROW + row, Cell::new(ch, fg, bg));
            }
        }
    }

    /// One glyph at a world-space point.
    fn plot_world(&mut self, x: f32, y: f32, ch: char, fg: Color) {
        if x < 0.0 || y < 0.0 { return; }
        let col = (x / UNITS_PER_COL) as usize;
        let row = (y / UNITS_PER_ROW) as usize;
        let bg = self.get(col, FIELD_ROW + row).bg;
        self.set(col, FIELD_ROW + row, Cell::new(ch, fg, bg));
    }
}

/// Cell range `[first, last)` covering world interval `[a, b)`. Never empty
/// for a non-empty interval, so thin objects stay visible.
fn span(a: f32, b: f32, unit: f32) -> (usize, usize) {
    let first = (a.max(0.0) / unit).floor() as usize;
    let last = (b.max(0.0) / unit).ceil() as usize;
    (first, last.max(first + 1))
}

fn field_size() -> (usize, usize) {
    (
        (PLAYFIELD.w / UNITS_PER_COL).ceil() as usize,
        (PLAYFIELD.h / UNITS_PER_ROW).ceil() as usize,
    )
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    /// Terminal accepted the flags that make it report key releases.
    key_release: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            self.key_release = execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            ).is_ok();
        }
        log::debug!("key release events: {}", self.key_release);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    /// True once `init` enabled key release reporting.
    pub fn reports_key_release(&self) -> bool {
        self.key_release
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
            self.key_release = false;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, session: &GameSession, map_cursor: usize) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(session.phase()) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(session.phase());
        }

        self.compose(session, map_cursor);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    fn compose(&mut self, session: &GameSession, map_cursor: usize) {
        self.front.clear();
        match session.phase() {
            Phase::Menu => self.compose_menu(),
            Phase::Map => self.compose_map(session, map_cursor),
            Phase::Running => {
                if let Some(snap) = session.snapshot() {
                    self.compose_run(&snap);
                }
            }
            Phase::Result => {
                if let Some(snap) = session.snapshot() {
                    self.compose_run(&snap);
                }
                self.compose_result(session);
            }
        }
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
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
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Screens ──

    fn compose_menu(&mut self) {
        let title = [
            r"  ___       _        ___                          ",
            r" | _ \_  _ (_)_ _   | _ \_  _ _ _  _ _  ___ _ _ ",
            r" |   / || || | ' \  |   / || | ' \| ' \/ -_) '_|",
            r" |_|_\\_,_||_|_||_| |_|_\\_,_|_||_|_||_\___|_|  ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_centered(2 + i, line, GOLD, Color::Reset);
        }
        self.front.put_centered(8, "crystals, levers and old stone", MOSS, Color::Reset);

        self.front.put_centered(11, "ENTER  Level Map", Color::White, Color::Reset);
        self.front.put_centered(12, "  Q    Quit     ", Color::White, Color::Reset);

        let help = [
            "Controls",
            "  <- -> / A D     Run",
            "  Up / W / Space  Jump",
            "  E / Enter       Lever, ferry",
            "  R Restart   M / Esc  Map",
        ];
        for (i, line) in help.iter().enumerate() {
            let fg = if i == 0 { GOLD } else { Color::DarkGrey };
            self.front.put_str(8, 15 + i, line, fg, Color::Reset);
        }
    }

    fn compose_map(&mut self, session: &GameSession, cursor: usize) {
        self.front.put_centered(1, "── LEVEL MAP ──", GOLD, Color::Reset);

        let progress = session.progress();
        for (i, t) in session.templates().iter().enumerate() {
            let row = 4 + i * 2;
            let (mark, fg) = if progress.is_completed(i) {
                ('*', MOSS)
            } else if progress.is_unlocked(i) {
                ('o', Color::White)
            } else {
                ('#', Color::DarkGrey)
            };
            let label = if progress.is_unlocked(i) { t.name.as_str() } else { "???" };
            let line = format!(" {mark}  {:>2}. {:<28} {:>4.0}s ", i + 1, label, t.time_limit);
            let (fg, bg) = if i == cursor {
                (Color::Black, fg)
            } else {
                (fg, Color::Reset)
            };
            self.front.put_str(6, row, &line, fg, bg);
        }

        let foot = self.front.height.saturating_sub(2);
        self.front.put_str(
            6, foot, "Up/Down choose   ENTER play   Esc menu   Q quit",
            Color::DarkGrey, Color::Reset,
        );
    }

    fn compose_run(&mut self, s: &Snapshot) {
        let (cols, rows) = field_size();

        // Frame around the playfield.
        let frame = Color::Rgb { r: 60, g: 55, b: 70 };
        for col in 0..cols {
            self.front.set(col, FIELD_ROW - 1, Cell::new('─', frame, Color::Reset));
            self.front.set(col, FIELD_ROW + rows, Cell::new('─', frame, Color::Reset));
        }

        for l in &s.liquids {
            let (ch, bg) = match l.kind {
                HazardKind::Lava => ('~', Color::Rgb { r: 170, g: 40, b: 10 }),
                HazardKind::Water => ('~', Color::Rgb { r: 20, g: 60, b: 160 }),
                HazardKind::Acid => ('~', Color::Rgb { r: 60, g: 140, b: 20 }),
            };
            self.front.fill_world(&l.rect, ch, Color::White, bg);
        }

        for p in s.platforms.iter().filter(|p| p.visible) {
            let bg = match p.tag.as_str() {
                "wood" => Color::Rgb { r: 110, g: 70, b: 30 },
                "gear" => Color::Rgb { r: 60, g: 110, b: 60 },
                _ => Color::Rgb { r: 90, g: 85, b: 95 },
            };
            self.front.fill_world(&p.rect, ' ', Color::White, bg);
        }

        for m in &s.movers {
            let (ch, bg) = match m.mode {
                MoverMode::Idle => ('=', Color::Rgb { r: 80, g: 70, b: 50 }),
                MoverMode::Oscillating => ('=', Color::Rgb { r: 150, g: 120, b: 50 }),
                MoverMode::PlayerControlled => ('=', Color::Rgb { r: 200, g: 160, b: 40 }),
            };
            self.front.fill_world(&m.rect, ch, Color::Black, bg);
        }

        for p in &s.plates {
            let fg = if p.pressed { MOSS } else { Color::Grey };
            self.front.fill_world(&p.rect, '_', fg, Color::Reset);
        }

        for d in &s.doors {
            let (ch, fg) = if d.open { (':', MOSS) } else { ('█', Color::Rgb { r: 120, g: 60, b: 40 }) };
            self.front.fill_world(&d.rect, ch, fg, Color::Reset);
        }

        for l in &s.levers {
            let (ch, fg) = if l.active { ('/', MOSS) } else { ('\\', Color::Grey) };
            self.front.fill_world(&l.rect, ch, fg, Color::Reset);
        }

        for c in s.crystals.iter().filter(|c| !c.collected) {
            self.front.fill_world(&c.rect, '◆', Color::Rgb { r: 120, g: 220, b: 255 }, Color::Reset);
        }

        for b in &s.boxes {
            let bg = match b.burn {
                Some(p) if p > 0.5 => Color::Rgb { r: 90, g: 30, b: 10 },
                Some(_) => Color::Rgb { r: 150, g: 70, b: 20 },
                None => Color::Rgb { r: 140, g: 100, b: 50 },
            };
            self.front.fill_world(&b.rect, '▒', Color::Rgb { r: 60, g: 40, b: 20 }, bg);
        }

        for f in &s.fire {
            self.front.plot_world(f.x, f.y, '^', Color::Rgb { r: 255, g: 140, b: 30 });
        }

        let player_fg = if s.player.alive { GOLD } else { Color::Red };
        let glyph = if s.player.controlling { '&' } else { '@' };
        self.front.fill_world(&s.player.rect, glyph, player_fg, Color::Reset);

        self.compose_hud(s, cols);
    }

    fn compose_hud(&mut self, s: &Snapshot, cols: usize) {
        let title = format!(" {}. {} ", s.level_index + 1, s.level_name);
        self.front.put_str(0, HUD_ROW, &title, GOLD, Color::Reset);

        let stats = format!("◆ {}/{}   ⏱ {:>5.1}s ", s.score, s.crystals_total, s.time_left.max(0.0));
        let x = cols.saturating_sub(stats.chars().count());
        let time_fg = if s.time_left < 10.0 { Color::Red } else { Color::White };
        self.front.put_str(x, HUD_ROW, &stats, time_fg, Color::Reset);

        let (_, rows) = field_size();
        let help_row = FIELD_ROW + rows + 1;
        if let Some(m) = &s.mechanic {
            self.front.put_str(1, help_row, m, MOSS, Color::Reset);
        }
        let help = "R restart  M map";
        self.front.put_str(cols.saturating_sub(help.len() + 1), help_row, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_result(&mut self, session: &GameSession) {
        let Some(r) = session.last_result() else { return };
        let (headline, fg) = match r.outcome {
            Outcome::Win => ("LEVEL CLEAR", MOSS),
            Outcome::Lose(_) => ("RUN LOST", Color::Red),
        };
        let detail = match &r.reason {
            Some(reason) => format!("Run lost: {reason}."),
            None => format!("{} crystals, {:.1}s to spare", r.score, r.time_left),
        };

        let (_, rows) = field_size();
        let top = FIELD_ROW + rows / 2 - 3;
        let banner_bg = Color::Rgb { r: 30, g: 28, b: 40 };
        let width = 40;
        let left = self.front.width.min(field_size().0).saturating_sub(width) / 2;
        for row in top..top + 6 {
            for col in left..left + width {
                self.front.set(col, row, Cell::new(' ', Color::White, banner_bg));
            }
        }
        let lines = [
            (headline.to_string(), fg),
            (detail, Color::White),
            (String::new(), Color::White),
            ("R retry    ENTER / M map".to_string(), Color::DarkGrey),
        ];
        for (i, (text, fg)) in lines.iter().enumerate() {
            let x = left + width.saturating_sub(text.chars().count()) / 2;
            self.front.put_str(x, top + 1 + i, text, *fg, banner_bg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::domain::entity::FrameInput;
    use crate::sim::level::{embedded_levels, LevelTemplate};
    use crate::sim::snapshot::capture;
    use crate::sim::world::World;

    fn composed(index: usize) -> (Renderer, Snapshot) {
        let levels = embedded_levels().unwrap();
        let w = World::start(index, &levels[index], &PhysicsConfig::default());
        let snap = capture(&w);
        let mut r = Renderer::new();
        r.front.resize(100, 40);
        r.compose_run(&snap);
        (r, snap)
    }

    fn screen_text(r: &Renderer) -> Vec<String> {
        (0..r.front.height)
            .map(|y| (0..r.front.width).map(|x| r.front.get(x, y).ch).collect())
            .collect()
    }

    #[test]
    fn timeout_banner_reads_well() {
        let text = r#"
            name = "Slow"
            time_limit = 0.1
            spawn = { x = 100, y = 468 }

            [[platforms]]
            x = 0
            y = 500
            w = 960
            h = 40

            [[doors]]
            id = "EXIT"
            x = 600
            y = 430
            w = 36
            h = 70
        "#;
        let t = LevelTemplate::from_toml(text, "slow.toml").unwrap();
        let mut s = GameSession::new(vec![t], PhysicsConfig::default());
        s.open_map().unwrap();
        s.select_level(0).unwrap();
        for _ in 0..20 { s.tick(FrameInput::default(), 16.0); }
        assert_eq!(s.phase(), Phase::Result);

        let mut r = Renderer::new();
        r.front.resize(100, 40);
        r.compose(&s, 0);
        let screen = screen_text(&r);
        assert!(screen.iter().any(|l| l.contains("RUN LOST")));
        assert!(screen.iter().any(|l| l.contains("Run lost: time expired.")));
    }

    #[test]
    fn key_release_is_off_until_init() {
        assert!(!Renderer::new().reports_key_release());
    }

    #[test]
    fn span_never_collapses() {
        assert_eq!(span(0.0, 12.0, 12.0), (0, 1));
        assert_eq!(span(13.0, 14.0, 12.0), (1, 2));
        assert_eq!(span(6.0, 30.0, 12.0), (0, 3));
    }

    #[test]
    fn player_is_drawn_where_it_stands() {
        let (r, snap) = composed(0);
        let col = (snap.player.rect.x / UNITS_PER_COL) as usize;
        let row = FIELD_ROW + (snap.player.rect.y / UNITS_PER_ROW) as usize;
        assert_eq!(r.front.get(col, row).ch, '@');
    }

    #[test]
    fn closed_doors_are_solid() {
        let (r, snap) = composed(0);
        let d = &snap.doors[0];
        let col = (d.rect.center_x() / UNITS_PER_COL) as usize;
        let row = FIELD_ROW + (d.rect.center_y() / UNITS_PER_ROW) as usize;
        assert_eq!(r.front.get(col, row).ch, '█');
    }
}
