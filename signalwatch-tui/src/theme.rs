//! Parrot/neon style tokens for the dashboard.
//!
//! # Color Palette
//! - **Accent**: Electric cyan (headers, focus)
//! - **Positive**: Neon green (WATCHING rows)
//! - **Negative**: Hot pink (SELL rows, errors)
//! - **Warning**: Neon orange (warnings, pass in progress)
//! - **Neutral**: Cool purple (secondary info)
//! - **Muted**: Steel blue (hints, disabled text)

use ratatui::style::{Color, Modifier, Style};
use signalwatch_core::domain::Signal;

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn panel_border() -> Style {
    accent()
}

pub fn panel_title() -> Style {
    accent_bold()
}

/// Row style for a signal: SELL rows stand out.
pub fn signal_style(signal: Signal) -> Style {
    match signal {
        Signal::Watching => positive(),
        Signal::Sell => negative().add_modifier(Modifier::BOLD),
    }
}
