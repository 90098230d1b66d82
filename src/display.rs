use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// The 64x32 monochrome screen. Only the interpreter mutates it; displays
/// just get to look.
#[derive(Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.fill(false);
    }

    pub fn fill(&mut self, lit: bool) {
        self.pixels = [[lit; SCREEN_WIDTH]; SCREEN_HEIGHT];
    }

    /// pixel at (x, y); anything off-screen reads as unlit
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    pub fn set(&mut self, x: usize, y: usize, lit: bool) {
        if let Some(px) = self.pixels.get_mut(y).and_then(|row| row.get_mut(x)) {
            *px = lit;
        }
    }

    /// XOR an 8-pixel-wide sprite onto the screen, one byte per row, MSB on
    /// the left. The origin wraps; the sprite itself is clipped at the right
    /// and bottom edges. Returns true if any lit pixel got switched off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let x = x as usize % SCREEN_WIDTH;
        let y = y as usize % SCREEN_HEIGHT;
        let mut collision = false;

        for (row, data) in (y..SCREEN_HEIGHT).zip(rows) {
            for (col, bit) in (x..SCREEN_WIDTH).zip(byte_to_bits(*data)) {
                if bit {
                    let px = &mut self.pixels[row][col];
                    collision |= *px;
                    *px = !*px;
                }
            }
        }
        collision
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool; SCREEN_WIDTH]> {
        self.pixels.iter()
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().flatten().filter(|p| **p).count()
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|p| if *p { '#' } else { '.' }).collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// bits from the most to least significant
fn byte_to_bits(b: u8) -> [bool; 8] {
    std::array::from_fn(|i| (b >> (7 - i)) & 1 == 1)
}

/// Display is used by the interpreter to draw things on the screen. It should
/// abstract the implementation details, so a variety of kinds of screen would
/// work.
pub trait Display {
    /// show the current contents of the framebuffer
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error>;
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coords of every pixel in the given state; y grows downward on
    /// screen so it's negated for the canvas
    fn points(&self, frame: &Framebuffer, lit: bool) -> Vec<(f64, f64)> {
        frame
            .rows()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |(_, px)| **px == lit)
                    .map(move |(x, _)| (x as f64, -1.0 * y as f64))
            })
            .collect()
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new() -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(SCREEN_WIDTH, SCREEN_HEIGHT),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        let resolution = &self.resolution;
        let dark = resolution.points(frame, false);
        let lit = resolution.points(frame, true);

        // 1:1 between terminal cells and chip-8 pixels, plus the border
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &dark,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines; counts frames and keeps the last one
#[derive(Default)]
pub struct DummyDisplay {
    pub frames: usize,
    pub last: Option<Framebuffer>,
}

impl DummyDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, frame: &Framebuffer) -> Result<(), io::Error> {
        self.frames += 1;
        self.last = Some(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Resolution tests
    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_points_split_by_state() {
        let r = Resolution(64, 32);
        let mut fb = Framebuffer::new();
        fb.set(3, 2, true);
        assert_eq!(r.points(&fb, true), vec![(3.0, -2.0)]);
        assert_eq!(r.points(&fb, false).len(), 64 * 32 - 1);
    }

    // Framebuffer tests
    #[test]
    fn test_clear() {
        let mut fb = Framebuffer::new();
        fb.fill(true);
        assert_eq!(fb.lit_count(), 2048);
        fb.clear();
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn test_off_screen_access_ignored() {
        let mut fb = Framebuffer::new();
        fb.set(64, 0, true);
        fb.set(0, 32, true);
        assert_eq!(fb.lit_count(), 0);
        assert!(!fb.get(100, 100));
    }

    #[test]
    fn test_draw_sprite_xor() {
        let mut fb = Framebuffer::new();
        assert!(!fb.draw_sprite(0, 0, &[0b1010_0000]));
        assert!(fb.get(0, 0) && !fb.get(1, 0) && fb.get(2, 0));
        // overlapping on one lit pixel
        assert!(fb.draw_sprite(0, 0, &[0b1100_0000]));
        assert!(!fb.get(0, 0) && fb.get(1, 0) && fb.get(2, 0));
    }

    #[test]
    fn test_draw_sprite_origin_wraps() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(64 + 2, 32 + 1, &[0x80]);
        assert!(fb.get(2, 1));
    }

    #[test]
    fn test_draw_sprite_clips_right_edge() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(60, 0, &[0xff]);
        assert_eq!(fb.lit_count(), 4);
        assert!(!fb.get(0, 0), "must not wrap to the left edge");
        assert!(!fb.get(0, 1));
    }

    #[test]
    fn test_draw_sprite_clips_bottom_edge() {
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 30, &[0x80, 0x80, 0x80, 0x80]);
        assert_eq!(fb.lit_count(), 2);
        assert!(fb.get(0, 30) && fb.get(0, 31));
        assert!(!fb.get(0, 0), "must not wrap to the top edge");
    }

    #[test]
    fn test_dummy_display_counts() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new();
        let mut fb = Framebuffer::new();
        d.draw(&fb)?;
        fb.set(1, 1, true);
        d.draw(&fb)?;
        assert_eq!(d.frames, 2);
        assert_eq!(d.last.map(|f| f.lit_count()), Some(1));
        Ok(())
    }

    #[test]
    #[ignore]
    // NB. figure out how to stop rendering during tests
    fn test_draw_to_terminal() -> Result<(), io::Error> {
        let mut d = MonoTermDisplay::new()?;
        let mut fb = Framebuffer::new();
        fb.draw_sprite(0, 0, &[0xff; 15]);
        d.draw(&fb)
    }
}
