use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::QueueableCommand;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// A single drawable cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::Reset };
}

/// An in-memory cell grid that effects paint onto each frame.
///
/// Coordinates are signed so callers can draw shapes that partially leave the
/// screen without bounds arithmetic; out-of-range writes are dropped.
pub(crate) struct Surface {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Surface {
    pub(crate) fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; width as usize * height as usize],
        }
    }

    /// Resize if the terminal dimensions changed, dropping old content.
    pub(crate) fn resize(&mut self, width: u16, height: u16) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.cells = vec![Cell::BLANK; width as usize * height as usize];
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    pub(crate) fn set(&mut self, x: i32, y: i32, ch: char, fg: Color) {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.cells[index] = Cell { ch, fg };
    }

    /// Draw text advancing by display width, so double-width glyphs keep
    /// the columns after them aligned. The cell behind a wide glyph stays
    /// blank and is skipped on present.
    pub(crate) fn put_str(&mut self, x: i32, y: i32, text: &str, fg: Color) {
        let mut column = x;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            self.set(column, y, ch, fg);
            column += width as i32;
        }
    }

    /// Draw a line of text horizontally centered on the surface.
    pub(crate) fn put_centered(&mut self, y: i32, text: &str, fg: Color) {
        let text_width = text.width() as i32;
        let x = (i32::from(self.width) - text_width) / 2;
        self.put_str(x, y, text, fg);
    }

    /// Flush the whole grid to the terminal in one pass.
    pub(crate) fn present(&self, out: &mut impl Write) -> io::Result<()> {
        let mut current_fg = None;
        for row in 0..self.height {
            out.queue(MoveTo(0, row))?;
            let mut line = String::with_capacity(self.width as usize);
            let mut covered = false;
            for col in 0..self.width {
                let cell = self.cells[row as usize * self.width as usize + col as usize];
                // The cell behind a double-width glyph is not printed.
                if covered {
                    covered = false;
                    continue;
                }
                covered = cell.ch.width().unwrap_or(1) == 2;
                if current_fg != Some(cell.fg) {
                    if !line.is_empty() {
                        out.queue(Print(std::mem::take(&mut line)))?;
                    }
                    out.queue(SetForegroundColor(cell.fg))?;
                    current_fg = Some(cell.fg);
                }
                line.push(cell.ch);
            }
            out.queue(Print(line))?;
        }
        out.queue(ResetColor)?;
        out.flush()
    }
}

/// RAII guard for the terminal session: raw mode plus the alternate screen,
/// restored on drop so panics and early returns still leave the terminal
/// usable.
pub(crate) struct TerminalGuard;

impl TerminalGuard {
    pub(crate) fn enter(out: &mut impl Write) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        out.queue(EnterAlternateScreen)?;
        out.queue(Hide)?;
        out.queue(Clear(ClearType::All))?;
        out.flush()?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = out.queue(Show);
        let _ = out.queue(LeaveAlternateScreen);
        let _ = out.flush();
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_writes_are_dropped() {
        let mut surface = Surface::new(10, 4);
        surface.set(-1, 0, 'x', Color::White);
        surface.set(0, -1, 'x', Color::White);
        surface.set(10, 0, 'x', Color::White);
        surface.set(0, 4, 'x', Color::White);
        assert!(surface.cells.iter().all(|cell| cell.ch == ' '));
    }

    #[test]
    fn test_put_centered() {
        let mut surface = Surface::new(11, 3);
        surface.put_centered(1, "abc", Color::White);
        assert_eq!(surface.cells[1 * 11 + 4].ch, 'a');
        assert_eq!(surface.cells[1 * 11 + 5].ch, 'b');
        assert_eq!(surface.cells[1 * 11 + 6].ch, 'c');
    }

    #[test]
    fn test_resize_drops_content() {
        let mut surface = Surface::new(5, 5);
        surface.set(2, 2, '#', Color::White);
        surface.resize(6, 5);
        assert!(surface.cells.iter().all(|cell| cell.ch == ' '));
        assert_eq!(surface.width, 6);
        assert_eq!(surface.height, 5);
    }

    #[test]
    fn test_put_str_advances_by_display_width() {
        let mut surface = Surface::new(10, 1);
        surface.put_str(0, 0, "🌙a", Color::White);
        assert_eq!(surface.cells[0].ch, '🌙');
        // The cell behind the wide glyph stays blank.
        assert_eq!(surface.cells[1].ch, ' ');
        assert_eq!(surface.cells[2].ch, 'a');
    }

    #[test]
    fn test_present_skips_cell_behind_wide_glyph() {
        let mut surface = Surface::new(6, 1);
        surface.put_str(0, 0, "🔥ok", Color::White);
        let mut buffer = Vec::new();
        surface.present(&mut buffer).expect("failed to present");
        let rendered = String::from_utf8_lossy(&buffer);
        assert!(rendered.contains("🔥ok"));
    }

    #[test]
    fn test_present_writes_every_row() {
        let mut surface = Surface::new(4, 3);
        surface.put_str(0, 0, "hey", Color::White);
        let mut buffer = Vec::new();
        surface.present(&mut buffer).expect("failed to present");
        let rendered = String::from_utf8_lossy(&buffer);
        assert!(rendered.contains("hey"));
    }
}
