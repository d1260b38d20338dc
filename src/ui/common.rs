//! # UI Common Components
//!
//! Shared colours and frame helpers for the overlay and its settings popup.

use eframe::egui::{Color32, Frame, Stroke};

/// Dark overlay palette.
pub struct UiColors;

impl UiColors {
    pub const MAIN_BG: Color32 = Color32::from_rgb(20, 20, 24);
    pub const PANEL_BG: Color32 = Color32::from_rgb(32, 33, 38);
    pub const BORDER: Color32 = Color32::from_rgb(70, 72, 80);
    pub const TEXT: Color32 = Color32::from_rgb(220, 220, 225);
    pub const DIM_TEXT: Color32 = Color32::from_rgb(130, 132, 140);
    pub const STICK_DOT: Color32 = Color32::from_rgb(80, 200, 255);
    pub const DEADZONE: Color32 = Color32::from_rgb(50, 52, 60);
    pub const BOOST_ON: Color32 = Color32::from_rgb(255, 170, 40);
    pub const BOOST_OFF: Color32 = Color32::from_rgb(60, 60, 66);
    pub const THROTTLE: Color32 = Color32::from_rgb(90, 200, 110);
    pub const REVERSE: Color32 = Color32::from_rgb(210, 90, 90);
    pub const WARNING: Color32 = Color32::from_rgb(255, 70, 60);
    pub const ABSENT: Color32 = Color32::from_rgb(200, 160, 60);
}

/// Bordered panel used for each overlay section.
pub fn section_frame() -> Frame {
    Frame::new()
        .stroke(Stroke::new(1.0, UiColors::BORDER))
        .fill(UiColors::PANEL_BG)
        .inner_margin(6.0)
        .outer_margin(2.0)
}

/// Background of the whole overlay window.
pub fn window_frame() -> Frame {
    Frame::new()
        .fill(UiColors::MAIN_BG)
        .stroke(Stroke::new(1.0, UiColors::BORDER))
        .inner_margin(4.0)
}
