//! UI module root: exposes drawing functions for the header and the scene canvas.

pub mod header;
pub mod scene_view;
pub mod theme;
