/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Glyph)
///   2. Compare each glyph with `back` buffer (previous frame)
///   3. Only emit terminal commands for glyphs that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each maze cell is two terminal columns wide so the board looks square.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use mazechase::domain::cell::{Cell, CellCode};
use mazechase::domain::entity::Heading;
use mazechase::domain::physics;
use mazechase::domain::pursuer::{Pursuer, PursuerState};
use mazechase::sim::world::{Phase, WorldState};

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    /// Explicit dark background for every terminal cell, so row gaps match.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Glyph { ch, fg, bg: Self::norm_bg(bg) }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Glyph::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, g: Glyph) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = g;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const WALL_BG: Color = Color::Rgb { r: 30, g: 40, b: 140 };
const PICKUP_FG: Color = Color::Rgb { r: 250, g: 200, b: 160 };
const PLAYER_FG: Color = Color::Rgb { r: 255, g: 230, b: 0 };
const PATH_FG: Color = Color::Rgb { r: 90, g: 90, b: 110 };

const PURSUER_COLORS: [Color; 4] = [
    Color::Rgb { r: 255, g: 60, b: 60 },
    Color::Rgb { r: 255, g: 150, b: 220 },
    Color::Rgb { r: 60, g: 220, b: 255 },
    Color::Rgb { r: 255, g: 170, b: 60 },
];

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    /// Overlay each pursuer's planned route.
    pub show_paths: bool,
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
            show_paths: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Glyph::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Glyph::INVALID);
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        self.compose_game(world);

        match world.phase {
            Phase::Countdown => {
                let secs = world.countdown.ceil() as u32;
                self.compose_banner(world, &format!("READY  {secs}"), Color::Rgb { r: 80, g: 255, b: 80 });
            }
            Phase::GameOver => {
                self.compose_banner(world, "GAME OVER  (R: new maze)", Color::Rgb { r: 255, g: 60, b: 60 });
            }
            Phase::Won => {
                self.compose_banner(world, "MAZE CLEARED!  (R: new maze)", Color::Rgb { r: 255, g: 220, b: 50 });
            }
            Phase::Playing | Phase::Dying => {}
        }
        if world.paused {
            self.compose_banner(world, "PAUSED", Color::Rgb { r: 100, g: 200, b: 255 });
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Glyph::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let g = self.front.get(x, y);
                if g == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if g.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(g.fg))?;
                    last_fg = g.fg;
                }
                if g.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(g.bg))?;
                    last_bg = g.bg;
                }
                queue!(self.writer, Print(g.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        let grid = &w.grid;

        // ── HUD row ──
        let hud = format!(
            " Score:{:<6}  Lives:{}  Pickups:{}/{} ",
            w.score, w.lives,
            w.pickups_total - w.pickups_remaining, w.pickups_total,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Board ──
        for row in 0..grid.height() {
            for col in 0..grid.width() {
                let cell = Cell::new(col as i32, row as i32);
                let (ch, fg, bg) = match grid.get(cell) {
                    CellCode::Wall => (' ', Color::White, WALL_BG),
                    CellCode::Pickup => ('·', PICKUP_FG, Color::Reset),
                    CellCode::Empty => (' ', Color::White, Color::Reset),
                };
                self.put_cell(cell, ch, ' ', fg, bg);
            }
        }

        // ── Routes ──
        if self.show_paths {
            for p in &w.pursuers {
                let color = pursuer_color(p);
                for &cell in p.next_waypoint().iter().chain(p.path()) {
                    if grid.get(cell) != CellCode::Wall {
                        self.put_cell(cell, '∙', ' ', color, Color::Reset);
                    }
                }
            }
        }

        // ── Entities ──
        for p in &w.pursuers {
            let cell = physics::cell_at(p.position(), w.cell_size, grid);
            let (left, right) = pursuer_glyphs(p);
            let fg = if p.is_dead() { Color::DarkGrey } else { pursuer_color(p) };
            self.put_cell(cell, left, right, fg, Color::Reset);
        }

        let player_cell = w.player.cell(grid);
        let (left, right) = player_glyphs(w);
        self.put_cell(player_cell, left, right, PLAYER_FG, Color::Reset);

        // ── Pursuer status ──
        let mut row = MAP_ROW + grid.height() + 1;
        for p in &w.pursuers {
            let line = format!(
                " #{} {:<6} {:<13} replans:{}",
                p.id, p.strategy().label(), state_label(p.state()), p.replan_count(),
            );
            self.front.put_str(0, row, &line, pursuer_color(p), Color::Reset);
            row += 1;
        }

        // ── Message bar ──
        let msg_row = row + 1;
        if !w.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" {} ", w.message), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help = " Arrows/WASD/HJKL: Move  P: Pause  V: Paths  R: New maze  Q/Esc: Quit";
        self.front.put_str(0, msg_row + 2, help, Color::DarkGrey, Color::Reset);
    }

    fn put_cell(&mut self, cell: Cell, left: char, right: char, fg: Color, bg: Color) {
        let x = cell.col as usize * CELL_W;
        let y = MAP_ROW + cell.row as usize;
        self.front.set(x, y, Glyph::new(left, fg, bg));
        self.front.set(x + 1, y, Glyph::new(right, fg, bg));
    }

    /// One-line banner centred over the board.
    fn compose_banner(&mut self, w: &WorldState, text: &str, fg: Color) {
        let board_w = w.grid.width() * CELL_W;
        let box_w = text.chars().count() + 4;
        let x = board_w.saturating_sub(box_w) / 2;
        let y = MAP_ROW + w.grid.height() / 2;
        let bg = Color::Rgb { r: 40, g: 40, b: 40 };
        for dy in 0..3 {
            for dx in 0..box_w {
                self.front.set(x + dx, y - 1 + dy, Glyph::new(' ', fg, bg));
            }
        }
        self.front.put_str(x + 2, y, text, fg, bg);
    }
}

fn pursuer_color(p: &Pursuer) -> Color {
    PURSUER_COLORS[p.id % PURSUER_COLORS.len()]
}

fn pursuer_glyphs(p: &Pursuer) -> (char, char) {
    if p.is_dead() {
        return if p.frame() % 2 == 0 { ('x', 'x') } else { ('+', '+') };
    }
    let eyes = match p.heading() {
        Heading::Left => '<',
        Heading::Right => '>',
        Heading::Up => '^',
        Heading::Down => 'v',
        Heading::None => 'M',
    };
    if p.frame() % 2 == 0 { ('M', eyes) } else { ('W', eyes) }
}

fn player_glyphs(w: &WorldState) -> (char, char) {
    let player = &w.player;
    if player.dead {
        const FADE: [char; 4] = ['@', 'o', '.', ' '];
        let ch = FADE[(player.death_frame as usize).min(FADE.len() - 1)];
        return (ch, ' ');
    }
    let mouth = match player.heading {
        Heading::Left => '>',
        Heading::Right => '<',
        Heading::Up => 'v',
        Heading::Down => '^',
        Heading::None => ')',
    };
    if (w.tick / 8) % 2 == 0 { ('(', mouth) } else { ('(', ')') }
}

fn state_label(state: PursuerState) -> &'static str {
    match state {
        PursuerState::Patrolling => "patrolling",
        PursuerState::Pursuing => "pursuing",
        PursuerState::StuckRecovery => "recovering",
        PursuerState::Dead => "dead",
    }
}
