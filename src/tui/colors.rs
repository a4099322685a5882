//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Header and status bar background.
pub const ACCENT: Color = Color::Rgb(30, 64, 175);
/// Tasks whose reminder has fallen due.
pub const ALERT: Color = Color::Rgb(245, 158, 11);
/// Completed tasks.
pub const DONE: Color = Color::DarkGray;
/// Validation and failure messages.
pub const ERROR: Color = Color::Rgb(220, 38, 38);
