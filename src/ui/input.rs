//! Button vocabulary, per-tick snapshots, and the input capability.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::fmt;

use crate::core::errors::Result;

/// The five badge buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    A,
    B,
    C,
}

impl Button {
    /// Handling order when several buttons read pressed in one tick.
    pub const PRIORITY: [Self; 5] = [Self::Up, Self::Down, Self::A, Self::B, Self::C];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::A => "a",
            Self::B => "b",
            Self::C => "c",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|button| button.name().eq_ignore_ascii_case(name.trim()))
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Buttons read pressed during one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const EMPTY: Self = Self(0);

    #[must_use]
    pub const fn with(self, button: Button) -> Self {
        Self(self.0 | button.bit())
    }

    pub fn insert(&mut self, button: Button) {
        self.0 |= button.bit();
    }

    #[must_use]
    pub const fn contains(self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Highest-priority pressed button.
    #[must_use]
    pub fn first(self) -> Option<Button> {
        Button::PRIORITY
            .into_iter()
            .find(|button| self.contains(*button))
    }

    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::PRIORITY
            .into_iter()
            .filter(move |button| self.contains(*button))
    }

    /// Parse a fixture token such as `down`, `a+c`, or `-` for nothing.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token == "-" || token.is_empty() {
            return Some(Self::EMPTY);
        }
        token
            .split('+')
            .try_fold(Self::EMPTY, |set, name| Button::from_name(name).map(|b| set.with(b)))
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<T: IntoIterator<Item = Button>>(iter: T) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for ButtonSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        let names: Vec<&str> = self.iter().map(Button::name).collect();
        f.write_str(&names.join("+"))
    }
}

/// Button input capability.
pub trait InputSource {
    /// Latch the current hardware state. Called once per tick before reads.
    fn poll(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_pressed(&self, button: Button) -> Result<bool>;

    /// Whether the operator asked to leave the run loop.
    fn quit_requested(&self) -> bool {
        false
    }
}

impl<I: InputSource + ?Sized> InputSource for Box<I> {
    fn poll(&mut self) -> Result<()> {
        (**self).poll()
    }

    fn is_pressed(&self, button: Button) -> Result<bool> {
        (**self).is_pressed(button)
    }

    fn quit_requested(&self) -> bool {
        (**self).quit_requested()
    }
}

/// Poll once and read every button.
pub fn snapshot<I: InputSource + ?Sized>(input: &mut I) -> Result<ButtonSet> {
    input.poll()?;
    let mut pressed = ButtonSet::EMPTY;
    for button in Button::PRIORITY {
        if input.is_pressed(button)? {
            pressed.insert(button);
        }
    }
    Ok(pressed)
}

/// Replays one pre-recorded [`ButtonSet`] per poll, then reads released.
///
/// Asks to quit once the script is exhausted, so a run loop driven by it
/// terminates.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<ButtonSet>,
    current: ButtonSet,
    exhausted: bool,
}

impl ScriptedInput {
    #[must_use]
    pub fn new(frames: impl IntoIterator<Item = ButtonSet>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            current: ButtonSet::EMPTY,
            exhausted: false,
        }
    }

    /// Build from whitespace-separated fixture tokens. Unknown names are skipped.
    #[must_use]
    pub fn from_fixture(fixture: &str) -> Self {
        Self::new(fixture.split_whitespace().filter_map(ButtonSet::parse))
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Result<()> {
        match self.frames.pop_front() {
            Some(frame) => self.current = frame,
            None => {
                self.current = ButtonSet::EMPTY;
                self.exhausted = true;
            }
        }
        Ok(())
    }

    fn is_pressed(&self, button: Button) -> Result<bool> {
        Ok(self.current.contains(button))
    }

    fn quit_requested(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_picks_up_before_others() {
        let set: ButtonSet = [Button::C, Button::A, Button::Up].into_iter().collect();
        assert_eq!(set.first(), Some(Button::Up));
        assert_eq!(ButtonSet::EMPTY.first(), None);
    }

    #[test]
    fn fixture_tokens_parse() {
        assert_eq!(ButtonSet::parse("-"), Some(ButtonSet::EMPTY));
        assert_eq!(
            ButtonSet::parse("down+A"),
            Some(ButtonSet::EMPTY.with(Button::Down).with(Button::A))
        );
        assert_eq!(ButtonSet::parse("select"), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let set = ButtonSet::EMPTY.with(Button::B).with(Button::Up);
        assert_eq!(set.to_string(), "up+b");
        assert_eq!(ButtonSet::parse(&set.to_string()), Some(set));
    }

    #[test]
    fn scripted_input_replays_then_quits() {
        let mut input = ScriptedInput::from_fixture("down - c");
        assert!(!input.quit_requested());
        assert!(snapshot(&mut input).unwrap().contains(Button::Down));
        assert!(snapshot(&mut input).unwrap().is_empty());
        assert!(snapshot(&mut input).unwrap().contains(Button::C));
        assert_eq!(input.remaining(), 0);
        assert!(!input.quit_requested());
        assert!(snapshot(&mut input).unwrap().is_empty());
        assert!(input.quit_requested());
    }
}
