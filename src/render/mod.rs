//! Page rendering: pure draw-command producers plus the surface capability.

pub mod layout;
pub mod pages;
pub mod qr;
pub mod screens;
pub mod surface;
pub mod text;

pub use pages::{RenderContext, render_page};
pub use surface::{CellCanvas, DrawCommand, Pen, Surface, replay};

use crate::core::errors::Result;

/// Replay commands onto a fresh canvas and return its text rows.
pub fn ascii_preview(width: u32, height: u32, commands: &[DrawCommand]) -> Result<Vec<String>> {
    let mut canvas = CellCanvas::new(width, height);
    replay(&mut canvas, commands)?;
    Ok(canvas.to_lines())
}
