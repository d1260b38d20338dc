//! # Persistence Module
//!
//! Holds the overlay's user settings and keeps them on disk between runs.
//!
//! ## Key Abstractions
//! - [`OverlayConfig`]: the full settings record, read by the tick driver on
//!   every frame so edits apply immediately
//! - [`config_store::ConfigStore`]: TOML file in the user's config directory
//! - [`persistence_worker::PersistenceWorker`]: background task that performs
//!   disk I/O on behalf of the UI thread
//!
//! ## Error Handling Strategy
//! File operations return `color_eyre` results. A missing or unreadable file
//! never blocks startup: every key has a default, and [`OverlayConfig::sanitized`]
//! replaces values that are present but out of range.

pub mod config_store;
pub mod persistence_worker;

use crate::controller::device_reader::AxisName;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which raw axis feeds each displayed value.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct AxisMapping {
    /// Stick lateral axis (strafe)
    pub stick_x: AxisName,
    /// Stick longitudinal axis (forward/backward)
    pub stick_y: AxisName,
    /// Pedal axis shown as throttle
    pub throttle: AxisName,
    /// Pedal axis shown as reverse
    pub reverse: AxisName,
}

impl Default for AxisMapping {
    fn default() -> Self {
        Self {
            stick_x: AxisName::X,
            stick_y: AxisName::Y,
            throttle: AxisName::Y,
            reverse: AxisName::X,
        }
    }
}

/// Overlay window placement.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub x: f32,
    pub y: f32,
    pub always_on_top: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            x: 40.0,
            y: 40.0,
            always_on_top: true,
        }
    }
}

/// Complete user configuration of the overlay.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    /// Magnitude below which a stick axis counts as centred, in `[0, 1)`
    pub deadzone: f32,
    /// Seconds a direction may be held before a warning is shown
    pub hold_threshold_secs: f64,
    /// Interval between ticks in milliseconds
    pub tick_interval_ms: u64,
    /// Platform index of the directional stick
    pub stick_device: u32,
    /// Platform index of the pedal set
    pub pedal_device: u32,
    /// Stick button shown as the boost indicator, `0..32`
    pub boost_button: u8,
    pub axes: AxisMapping,
    pub window: WindowConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            deadzone: 0.3,
            hold_threshold_secs: 5.0,
            tick_interval_ms: 16,
            stick_device: 0,
            pedal_device: 1,
            boost_button: 0,
            axes: AxisMapping::default(),
            window: WindowConfig::default(),
        }
    }
}

impl OverlayConfig {
    /// Replaces out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !self.deadzone.is_finite() || !(0.0..1.0).contains(&self.deadzone) {
            warn!(
                "Invalid deadzone {}, using default {}",
                self.deadzone, defaults.deadzone
            );
            self.deadzone = defaults.deadzone;
        }
        if !self.hold_threshold_secs.is_finite() || self.hold_threshold_secs <= 0.0 {
            warn!(
                "Invalid hold threshold {}, using default {}",
                self.hold_threshold_secs, defaults.hold_threshold_secs
            );
            self.hold_threshold_secs = defaults.hold_threshold_secs;
        }
        if self.tick_interval_ms == 0 {
            warn!(
                "Tick interval of 0ms, using default {}ms",
                defaults.tick_interval_ms
            );
            self.tick_interval_ms = defaults.tick_interval_ms;
        }
        if self.boost_button >= 32 {
            warn!(
                "Boost button {} outside 0..32, using default {}",
                self.boost_button, defaults.boost_button
            );
            self.boost_button = defaults.boost_button;
        }
        if !self.window.x.is_finite() || !self.window.y.is_finite() {
            warn!("Invalid window position, using default");
            self.window.x = defaults.window.x;
            self.window.y = defaults.window.y;
        }

        self
    }
}
