//! Pure update function for the badge navigation state machine.
//!
//! `update()` takes the current model and a message, mutates the model, and
//! returns a command describing any side-effects the runtime should execute.
//! This module performs zero I/O.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::feed::orchestrator::RefreshTrigger;

use super::input::{Button, ButtonSet};
use super::model::{BadgeCmd, BadgeModel, BadgeMsg, Mode, OverlayPhase};

/// Apply a message to the model and return the next command for the runtime.
pub fn update(model: &mut BadgeModel, msg: BadgeMsg) -> BadgeCmd {
    match msg {
        BadgeMsg::Poll {
            pressed,
            now,
            last_fetch_at,
        } => match model.mode {
            Mode::Normal => normal_tick(model, pressed, now, last_fetch_at),
            Mode::CacheInfoOverlay(phase) => overlay_tick(model, phase, pressed),
        },
    }
}

/// Whether an automatic refresh should start at `now`.
#[must_use]
pub fn auto_refresh_due(
    model: &BadgeModel,
    now: DateTime<Utc>,
    last_fetch_at: Option<DateTime<Utc>>,
) -> bool {
    let reference = last_fetch_at
        .or(model.last_attempt_at)
        .unwrap_or(model.boot_at);
    if elapsed(now, reference) <= model.timing.update_interval {
        return false;
    }
    model
        .last_attempt_at
        .is_none_or(|attempt| elapsed(now, attempt) >= model.timing.failure_backoff)
}

fn normal_tick(
    model: &mut BadgeModel,
    pressed: ButtonSet,
    now: DateTime<Utc>,
    last_fetch_at: Option<DateTime<Utc>>,
) -> BadgeCmd {
    let mut cmds = Vec::new();
    let auto = auto_refresh_due(model, now, last_fetch_at);
    if auto {
        model.last_attempt_at = Some(now);
        cmds.push(BadgeCmd::Refresh {
            trigger: RefreshTrigger::Auto,
        });
    }

    if let Some(button) = pressed.first() {
        cmds.push(handle_button(model, button, now, auto));
    }

    match cmds.len() {
        0 => BadgeCmd::None,
        1 => cmds.remove(0),
        _ => BadgeCmd::Batch(cmds),
    }
}

fn handle_button(
    model: &mut BadgeModel,
    button: Button,
    now: DateTime<Utc>,
    refresh_pending: bool,
) -> BadgeCmd {
    let debounce = BadgeCmd::Sleep(model.timing.debounce);
    match button {
        Button::Up => {
            model.page_index = (model.page_index + model.page_count - 1) % model.page_count;
            BadgeCmd::Batch(vec![BadgeCmd::Render, debounce])
        }
        Button::Down => {
            model.page_index = (model.page_index + 1) % model.page_count;
            BadgeCmd::Batch(vec![BadgeCmd::Render, debounce])
        }
        Button::A if refresh_pending => BadgeCmd::Sleep(model.timing.refresh_debounce),
        Button::A => {
            model.last_attempt_at = Some(now);
            BadgeCmd::Batch(vec![
                BadgeCmd::Refresh {
                    trigger: RefreshTrigger::Manual,
                },
                BadgeCmd::Sleep(model.timing.refresh_debounce),
            ])
        }
        Button::B => BadgeCmd::Batch(vec![BadgeCmd::Render, debounce]),
        Button::C => {
            model.mode = Mode::CacheInfoOverlay(OverlayPhase::AwaitRelease);
            BadgeCmd::ShowCacheInfo
        }
    }
}

fn overlay_tick(model: &mut BadgeModel, phase: OverlayPhase, pressed: ButtonSet) -> BadgeCmd {
    match phase {
        OverlayPhase::AwaitRelease => {
            if !pressed.contains(Button::C) {
                model.mode = Mode::CacheInfoOverlay(OverlayPhase::AwaitPress);
            }
            BadgeCmd::None
        }
        OverlayPhase::AwaitPress => {
            let dismissed = [Button::Up, Button::Down, Button::A, Button::B]
                .into_iter()
                .any(|button| pressed.contains(button));
            if dismissed {
                model.mode = Mode::Normal;
                BadgeCmd::Batch(vec![BadgeCmd::Render, BadgeCmd::Sleep(model.timing.debounce)])
            } else {
                BadgeCmd::None
            }
        }
    }
}

fn elapsed(now: DateTime<Utc>, since: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}
