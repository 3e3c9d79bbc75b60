//! Draw-command vocabulary and the pixel surface capability that executes it.
//!
//! Renderers never touch a surface directly. They return a `Vec<DrawCommand>`
//! and the runtime replays it, then issues `present`. This keeps every page a
//! pure function of `(page, cache, now)`.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::errors::{BadgeError, Result};

use super::text::{FixedWidthFont, TextMetrics};

/// Two-level e-ink pen. Values match the panel's 4-bit greyscale ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pen {
    Black = 0,
    White = 15,
}

/// One primitive drawing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Fill the whole panel with the current pen.
    Clear,
    SetColor {
        pen: Pen,
    },
    /// `y` is the top of the glyph row. Text past `max_width` pixels is clipped.
    Text {
        text: String,
        x: i32,
        y: i32,
        max_width: u32,
        scale: u8,
    },
    /// Filled rectangle in the current pen.
    Rect { x: i32, y: i32, w: u32, h: u32 },
}

/// Pixel output capability.
pub trait Surface {
    fn clear(&mut self) -> Result<()>;
    fn set_draw_color(&mut self, pen: Pen) -> Result<()>;
    fn draw_text(&mut self, text: &str, x: i32, y: i32, max_width: u32, scale: u8) -> Result<()>;
    fn measure_text(&self, text: &str, scale: u8) -> u32;
    fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32) -> Result<()>;
    /// Push the composed frame to the panel.
    fn present(&mut self) -> Result<()>;
    /// Enter the low-power terminal state. Nothing is drawn afterwards.
    fn halt(&mut self) -> Result<()>;
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn set_draw_color(&mut self, pen: Pen) -> Result<()> {
        (**self).set_draw_color(pen)
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, max_width: u32, scale: u8) -> Result<()> {
        (**self).draw_text(text, x, y, max_width, scale)
    }

    fn measure_text(&self, text: &str, scale: u8) -> u32 {
        (**self).measure_text(text, scale)
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32) -> Result<()> {
        (**self).draw_rect(x, y, w, h)
    }

    fn present(&mut self) -> Result<()> {
        (**self).present()
    }

    fn halt(&mut self) -> Result<()> {
        (**self).halt()
    }
}

/// Execute a command list against a surface. Does not present.
pub fn replay<S: Surface + ?Sized>(surface: &mut S, commands: &[DrawCommand]) -> Result<()> {
    for command in commands {
        match command {
            DrawCommand::Clear => surface.clear()?,
            DrawCommand::SetColor { pen } => surface.set_draw_color(*pen)?,
            DrawCommand::Text {
                text,
                x,
                y,
                max_width,
                scale,
            } => surface.draw_text(text, *x, *y, *max_width, *scale)?,
            DrawCommand::Rect { x, y, w, h } => surface.draw_rect(*x, *y, *w, *h)?,
        }
    }
    Ok(())
}

// ──────────────────── cell canvas ────────────────────

/// Side length of one character cell in pixels.
pub const CELL_PX: u32 = 6;

/// What one character cell of a [`CellCanvas`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Blank,
    Ink,
    Glyph { ch: char, inverted: bool },
}

/// Software panel: a pixel framebuffer plus a character-cell text layer.
///
/// Used for the ASCII preview and the terminal simulator. Cells without text
/// show whichever pen covers the majority of their pixels.
#[derive(Debug, Clone)]
pub struct CellCanvas {
    width: u32,
    height: u32,
    pen: Pen,
    pixels: Vec<Pen>,
    glyphs: Vec<Option<(char, bool)>>,
    font: FixedWidthFont,
    presents: usize,
    halted: bool,
}

impl CellCanvas {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let cols = (width / CELL_PX) as usize;
        let rows = (height / CELL_PX) as usize;
        Self {
            width,
            height,
            pen: Pen::Black,
            pixels: vec![Pen::White; width as usize * height as usize],
            glyphs: vec![None; cols * rows],
            font: FixedWidthFont::BITMAP6,
            presents: 0,
            halted: false,
        }
    }

    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.width / CELL_PX
    }

    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.height / CELL_PX
    }

    #[must_use]
    pub const fn presents(&self) -> usize {
        self.presents
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pen> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[(y * self.width + x) as usize])
    }

    #[must_use]
    pub fn cell(&self, col: u32, row: u32) -> Cell {
        if col >= self.columns() || row >= self.rows() {
            return Cell::Blank;
        }
        if let Some((ch, inverted)) = self.glyphs[(row * self.columns() + col) as usize] {
            return Cell::Glyph { ch, inverted };
        }
        let mut ink = 0;
        for dy in 0..CELL_PX {
            for dx in 0..CELL_PX {
                if self.pixel(col * CELL_PX + dx, row * CELL_PX + dy) == Some(Pen::Black) {
                    ink += 1;
                }
            }
        }
        if ink * 2 > CELL_PX * CELL_PX {
            Cell::Ink
        } else {
            Cell::Blank
        }
    }

    /// Plain-text rendition, one string per cell row.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        (0..self.rows())
            .map(|row| {
                let line: String = (0..self.columns())
                    .map(|col| match self.cell(col, row) {
                        Cell::Blank => ' ',
                        Cell::Ink => '#',
                        Cell::Glyph { ch, .. } => ch,
                    })
                    .collect();
                line.trim_end().to_string()
            })
            .collect()
    }

    /// Whether any row contains `needle`.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.to_lines().iter().any(|line| line.contains(needle))
    }

    fn nearest_cell(coord: i32) -> Option<u32> {
        let cell = (coord + (CELL_PX as i32) / 2).div_euclid(CELL_PX as i32);
        u32::try_from(cell).ok()
    }

    fn fill(&mut self, x: i32, y: i32, w: u32, h: u32) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (i64::from(x) + i64::from(w)).clamp(0, i64::from(self.width)) as u32;
        let y1 = (i64::from(y) + i64::from(h)).clamp(0, i64::from(self.height)) as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels[(py * self.width + px) as usize] = self.pen;
            }
        }
        let cols = self.columns();
        for row in 0..self.rows() {
            for col in 0..cols {
                let cx = col * CELL_PX + CELL_PX / 2;
                let cy = row * CELL_PX + CELL_PX / 2;
                if (x0..x1).contains(&cx) && (y0..y1).contains(&cy) {
                    self.glyphs[(row * cols + col) as usize] = None;
                }
            }
        }
    }
}

impl Surface for CellCanvas {
    fn clear(&mut self) -> Result<()> {
        self.pixels.fill(self.pen);
        self.glyphs.fill(None);
        Ok(())
    }

    fn set_draw_color(&mut self, pen: Pen) -> Result<()> {
        self.pen = pen;
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, max_width: u32, scale: u8) -> Result<()> {
        if self.halted {
            return Err(BadgeError::display("draw_text", "surface halted"));
        }
        let (Some(row), Some(start)) = (Self::nearest_cell(y), Self::nearest_cell(x)) else {
            return Ok(());
        };
        if row >= self.rows() {
            return Ok(());
        }
        let advance = self.font.measure("x", scale).max(1);
        let budget = (max_width / advance) as usize;
        let inverted = self.pen == Pen::White;
        let cols = self.columns();
        for (offset, ch) in text.chars().take(budget).enumerate() {
            let col = start + offset as u32;
            if col >= cols {
                break;
            }
            self.glyphs[(row * cols + col) as usize] = Some((ch, inverted));
        }
        Ok(())
    }

    fn measure_text(&self, text: &str, scale: u8) -> u32 {
        self.font.measure(text, scale)
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32) -> Result<()> {
        if self.halted {
            return Err(BadgeError::display("draw_rect", "surface halted"));
        }
        self.fill(x, y, w, h);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        if self.halted {
            return Err(BadgeError::display("present", "surface halted"));
        }
        self.presents += 1;
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        self.halted = true;
        Ok(())
    }
}

// ──────────────────── recording surface ────────────────────

/// Surface that records every presented frame as its command list.
///
/// [`RecordingSurface::failing_at`] makes the n-th `present` (1-based) fail,
/// for exercising the fatal path.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pending: Vec<DrawCommand>,
    frames: Vec<Vec<DrawCommand>>,
    attempts: usize,
    halted: bool,
    fail_present_at: Option<usize>,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failing_at(attempt: usize) -> Self {
        Self {
            fail_present_at: Some(attempt),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn frames(&self) -> &[Vec<DrawCommand>] {
        &self.frames
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&[DrawCommand]> {
        self.frames.last().map(Vec::as_slice)
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Text strings of a frame, in draw order.
    #[must_use]
    pub fn texts(frame: &[DrawCommand]) -> Vec<&str> {
        frame
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether any presented frame drew exactly `needle`.
    #[must_use]
    pub fn showed(&self, needle: &str) -> bool {
        self.frames
            .iter()
            .any(|frame| Self::texts(frame).contains(&needle))
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) -> Result<()> {
        self.pending.push(DrawCommand::Clear);
        Ok(())
    }

    fn set_draw_color(&mut self, pen: Pen) -> Result<()> {
        self.pending.push(DrawCommand::SetColor { pen });
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, max_width: u32, scale: u8) -> Result<()> {
        self.pending.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            max_width,
            scale,
        });
        Ok(())
    }

    fn measure_text(&self, text: &str, scale: u8) -> u32 {
        FixedWidthFont::BITMAP6.measure(text, scale)
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32) -> Result<()> {
        self.pending.push(DrawCommand::Rect { x, y, w, h });
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.attempts += 1;
        if self.fail_present_at == Some(self.attempts) {
            self.pending.clear();
            return Err(BadgeError::display("present", "injected panel failure"));
        }
        self.frames.push(std::mem::take(&mut self.pending));
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        self.halted = true;
        Ok(())
    }
}
