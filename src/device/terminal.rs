//! Terminal simulator: the panel drawn with `crossterm`, buttons read from the keyboard.
//!
//! Arrow keys are Up/Down, `a`/`b`/`c` are the face buttons, and `q`, Esc,
//! or Ctrl-C leave the loop. Terminals report presses but not releases, so a
//! key reads pressed for exactly the tick in which it arrived.

#![allow(missing_docs)]
#![allow(clippy::cast_possible_truncation)]

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};

use crate::core::errors::{BadgeError, Result};
use crate::render::surface::{Cell, CellCanvas, Pen, Surface};
use crate::ui::input::{Button, ButtonSet, InputSource};

// ──────────────────── session ────────────────────

/// Raw mode plus alternate screen for as long as the guard lives.
#[derive(Debug)]
pub struct TerminalSession {
    active: bool,
}

impl TerminalSession {
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode().map_err(|err| BadgeError::display("raw_mode", err))?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(BadgeError::display("alternate_screen", err));
        }
        Ok(Self { active: true })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if self.active {
            let mut stdout = io::stdout();
            let _ = execute!(stdout, Show, LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
            self.active = false;
        }
    }
}

// ──────────────────── surface ────────────────────

/// Panel rendered as character cells, framed, at the top-left of the terminal.
#[derive(Debug)]
pub struct TerminalSurface {
    canvas: CellCanvas,
    out: Stdout,
}

impl TerminalSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: CellCanvas::new(width, height),
            out: io::stdout(),
        }
    }

    fn draw(&mut self, footer: &str) -> io::Result<()> {
        let columns = self.canvas.columns() as usize;
        let border = format!("+{}+", "-".repeat(columns));
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All), Print(&border))?;
        for row in 0..self.canvas.rows() {
            queue!(self.out, MoveTo(0, row as u16 + 1), Print("|"))?;
            for col in 0..self.canvas.columns() {
                match self.canvas.cell(col, row) {
                    Cell::Blank => queue!(self.out, Print(' '))?,
                    Cell::Ink => queue!(self.out, Print('█'))?,
                    Cell::Glyph { ch, inverted: true } => queue!(
                        self.out,
                        SetAttribute(Attribute::Reverse),
                        Print(ch),
                        SetAttribute(Attribute::Reset)
                    )?,
                    Cell::Glyph { ch, inverted: false } => queue!(self.out, Print(ch))?,
                }
            }
            queue!(self.out, Print("|"))?;
        }
        let bottom = self.canvas.rows() as u16 + 1;
        queue!(
            self.out,
            MoveTo(0, bottom),
            Print(&border),
            MoveTo(0, bottom + 1),
            Print(footer)
        )?;
        self.out.flush()
    }
}

impl Surface for TerminalSurface {
    fn clear(&mut self) -> Result<()> {
        self.canvas.clear()
    }

    fn set_draw_color(&mut self, pen: Pen) -> Result<()> {
        self.canvas.set_draw_color(pen)
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, max_width: u32, scale: u8) -> Result<()> {
        self.canvas.draw_text(text, x, y, max_width, scale)
    }

    fn measure_text(&self, text: &str, scale: u8) -> u32 {
        self.canvas.measure_text(text, scale)
    }

    fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32) -> Result<()> {
        self.canvas.draw_rect(x, y, w, h)
    }

    fn present(&mut self) -> Result<()> {
        self.canvas.present()?;
        self.draw("arrows:Up/Dn  a/b/c:buttons  q:quit")
            .map_err(|err| BadgeError::display("present", err))
    }

    fn halt(&mut self) -> Result<()> {
        self.canvas.halt()?;
        self.draw("display halted")
            .map_err(|err| BadgeError::display("halt", err))
    }
}

// ──────────────────── input ────────────────────

/// Keyboard-backed buttons.
#[derive(Debug, Default)]
pub struct TerminalInput {
    latched: ButtonSet,
    quit: bool,
}

impl TerminalInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Map a key to a badge button.
#[must_use]
pub const fn button_for(code: KeyCode) -> Option<Button> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(Button::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Button::Down),
        KeyCode::Char('a' | 'A') => Some(Button::A),
        KeyCode::Char('b' | 'B') => Some(Button::B),
        KeyCode::Char('c' | 'C') => Some(Button::C),
        _ => None,
    }
}

impl InputSource for TerminalInput {
    fn poll(&mut self) -> Result<()> {
        self.latched = ButtonSet::EMPTY;
        while event::poll(Duration::ZERO).map_err(input_error)? {
            let Event::Key(key) = event::read().map_err(input_error)? else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.quit = true;
                }
                code => {
                    if let Some(button) = button_for(code) {
                        self.latched.insert(button);
                    }
                }
            }
        }
        Ok(())
    }

    fn is_pressed(&self, button: Button) -> Result<bool> {
        Ok(self.latched.contains(button))
    }

    fn quit_requested(&self) -> bool {
        self.quit
    }
}

fn input_error(err: io::Error) -> BadgeError {
    BadgeError::Runtime {
        details: format!("keyboard input: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_buttons() {
        assert_eq!(button_for(KeyCode::Up), Some(Button::Up));
        assert_eq!(button_for(KeyCode::Char('j')), Some(Button::Down));
        assert_eq!(button_for(KeyCode::Char('C')), Some(Button::C));
        assert_eq!(button_for(KeyCode::Char('x')), None);
    }

    #[test]
    fn fresh_input_reads_released() {
        let input = TerminalInput::new();
        assert!(!input.is_pressed(Button::A).unwrap());
        assert!(!input.quit_requested());
    }
}
