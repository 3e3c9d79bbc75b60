//! Button-driven navigation: pure state machine plus the runtime that drives it.

pub mod input;
pub mod model;
pub mod runtime;
pub mod update;

pub use input::{Button, ButtonSet, InputSource, ScriptedInput};
pub use model::{BadgeCmd, BadgeModel, BadgeMsg, Mode, OverlayPhase};
pub use runtime::{BadgeRuntime, StopReason};
pub use update::update;
