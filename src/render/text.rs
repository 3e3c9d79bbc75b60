//! Text measurement, truncation, and the small string helpers pages share.

#![allow(missing_docs)]

use std::time::Duration;

/// Measures rendered text width in pixels.
pub trait TextMetrics {
    fn measure(&self, text: &str, scale: u8) -> u32;
    fn line_height(&self, scale: u8) -> u32;
}

/// Deterministic monospace bitmap font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWidthFont {
    pub glyph_width: u32,
    pub glyph_height: u32,
}

impl FixedWidthFont {
    /// The panel's small bitmap font.
    pub const BITMAP6: Self = Self {
        glyph_width: 6,
        glyph_height: 6,
    };
}

impl Default for FixedWidthFont {
    fn default() -> Self {
        Self::BITMAP6
    }
}

impl TextMetrics for FixedWidthFont {
    fn measure(&self, text: &str, scale: u8) -> u32 {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        chars
            .saturating_mul(self.glyph_width)
            .saturating_mul(u32::from(scale.max(1)))
    }

    fn line_height(&self, scale: u8) -> u32 {
        self.glyph_height * u32::from(scale.max(1))
    }
}

/// Shorten `text` to at most `budget` characters, ending in `...` when cut.
#[must_use]
pub fn truncate(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let keep = budget.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Footer status line for a cache age.
#[must_use]
pub fn format_age(age: Option<Duration>) -> String {
    match age {
        None => "No data cached".to_string(),
        Some(age) => {
            let minutes = age.as_secs() / 60;
            if minutes < 60 {
                format!("Updated: {minutes}m ago")
            } else {
                format!("Updated: {}h ago", minutes / 60)
            }
        }
    }
}

/// URL without its `http://` or `https://` prefix.
#[must_use]
pub fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url)
}
