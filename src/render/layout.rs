//! Panel geometry and the command builder shared by pages and screens.

#![allow(missing_docs)]

use super::surface::{DrawCommand, Pen};
use super::text::TextMetrics;

pub const HEADER_HEIGHT: u32 = 22;
pub const HEADER_TEXT_Y: i32 = 7;
pub const BODY_TOP: i32 = 28;
pub const MARGIN_X: i32 = 5;
/// Step between ordinary body lines.
pub const LINE_STEP: i32 = 12;
/// Step below a section heading.
pub const HEADING_STEP: i32 = 16;
/// Step between logical blocks.
pub const BLOCK_STEP: i32 = 14;
/// Footer region height, measured up from the bottom edge.
pub const FOOTER_HEIGHT: u32 = 24;

/// First pixel row belonging to the footer.
#[must_use]
pub const fn footer_top(height: u32) -> i32 {
    height.saturating_sub(FOOTER_HEIGHT) as i32
}

/// Accumulates draw commands for one frame.
pub struct Frame<'a> {
    width: u32,
    metrics: &'a dyn TextMetrics,
    commands: Vec<DrawCommand>,
}

impl<'a> Frame<'a> {
    /// Start a frame with a cleared white panel and a black pen.
    #[must_use]
    pub fn blank(width: u32, metrics: &'a dyn TextMetrics) -> Self {
        let mut frame = Self {
            width,
            metrics,
            commands: Vec::with_capacity(32),
        };
        frame.pen(Pen::White);
        frame.commands.push(DrawCommand::Clear);
        frame.pen(Pen::Black);
        frame
    }

    pub fn pen(&mut self, pen: Pen) {
        self.commands.push(DrawCommand::SetColor { pen });
    }

    /// Text clipped at the right panel edge.
    pub fn text(&mut self, text: impl Into<String>, x: i32, y: i32) {
        self.text_scaled(text, x, y, 1);
    }

    pub fn text_scaled(&mut self, text: impl Into<String>, x: i32, y: i32, scale: u8) {
        let max_width = self.width.saturating_sub(x.max(0) as u32);
        self.commands.push(DrawCommand::Text {
            text: text.into(),
            x,
            y,
            max_width,
            scale,
        });
    }

    /// Text horizontally centred on the panel.
    pub fn centered(&mut self, text: impl Into<String>, y: i32) {
        let text = text.into();
        let x = self.width.saturating_sub(self.measure(&text)) / 2;
        self.text(text, x as i32, y);
    }

    /// Text whose right edge sits `margin` pixels from the panel edge.
    pub fn right_aligned(&mut self, text: impl Into<String>, margin: u32, y: i32) {
        let text = text.into();
        let x = self.width.saturating_sub(self.measure(&text) + margin);
        self.text(text, x as i32, y);
    }

    pub fn rect(&mut self, x: i32, y: i32, w: u32, h: u32) {
        self.commands.push(DrawCommand::Rect { x, y, w, h });
    }

    #[must_use]
    pub fn measure(&self, text: &str) -> u32 {
        self.metrics.measure(text, 1)
    }

    #[must_use]
    pub fn glyph_height(&self) -> i32 {
        self.metrics.line_height(1) as i32
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn finish(self) -> Vec<DrawCommand> {
        self.commands
    }
}

impl std::fmt::Debug for Frame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}
