//! Shared UI theme constants.

use ratatui::style::Color;

// Readout colors match the gauges they describe
pub const CPU_TEXT: Color = Color::Rgb(0x00, 0xb7, 0xeb);
pub const RAM_TEXT: Color = Color::Rgb(0x00, 0xff, 0x00);
pub const MUTED: Color = Color::Rgb(170, 170, 180);
pub const FALLBACK: Color = Color::Rgb(0xff, 0x99, 0x33);
