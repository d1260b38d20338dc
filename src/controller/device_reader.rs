//! # Device Reader
//!
//! Turns one index-addressed hardware query into a normalized [`DeviceSnapshot`].
//!
//! The platform layer reports six unsigned axis registers in `0..=65535`, a
//! 32-bit button word and a point-of-view value. This module owns the mapping
//! from that raw record to the values the rest of the overlay works with:
//!
//! ```text
//! DeviceSource::query(index) ──► RawJoyState ──► DeviceSnapshot
//!        (hardware)               (registers)     (axes in [-1, 1], button set)
//! ```
//!
//! A failed query never escapes as an error: [`DeviceReader::poll`] reports it
//! as `None` ("absent") and the caller substitutes neutral values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

use super::DeviceError;

/// Upper end of the raw axis register range.
pub const RAW_AXIS_MAX: f32 = 65535.0;

/// POV value reported when the hat is centred.
pub const POV_CENTERED: u32 = 0xFFFF;

/// Axis names as the platform joystick API labels them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    X,
    Y,
    Z,
    R,
    U,
    V,
}

impl AxisName {
    pub const ALL: [AxisName; 6] = [
        AxisName::X,
        AxisName::Y,
        AxisName::Z,
        AxisName::R,
        AxisName::U,
        AxisName::V,
    ];

    fn slot(self) -> usize {
        match self {
            AxisName::X => 0,
            AxisName::Y => 1,
            AxisName::Z => 2,
            AxisName::R => 3,
            AxisName::U => 4,
            AxisName::V => 5,
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            AxisName::X => "x",
            AxisName::Y => "y",
            AxisName::Z => "z",
            AxisName::R => "r",
            AxisName::U => "u",
            AxisName::V => "v",
        }
    }
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// One raw record as returned by the platform query, axes in X, Y, Z, R, U, V order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawJoyState {
    pub axes: [u32; 6],
    pub buttons: u32,
    pub pov: u32,
}

impl Default for RawJoyState {
    /// Every axis centred, nothing pressed.
    fn default() -> Self {
        Self {
            axes: [32768; 6],
            buttons: 0,
            pov: POV_CENTERED,
        }
    }
}

/// Normalized state of a device at the moment it was polled.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    axes: [f32; 6],
    buttons: BTreeSet<u8>,
    pov: u32,
}

impl DeviceSnapshot {
    pub fn from_raw(raw: &RawJoyState) -> Self {
        Self {
            axes: raw.axes.map(|value| normalize_axis(value as f32)),
            buttons: decode_buttons(raw.buttons),
            pov: raw.pov,
        }
    }

    /// Normalized reading of `axis` in `[-1.0, 1.0]`.
    pub fn axis(&self, axis: AxisName) -> f32 {
        self.axes[axis.slot()]
    }

    pub fn is_pressed(&self, button: u8) -> bool {
        self.buttons.contains(&button)
    }

    pub fn pressed_buttons(&self) -> &BTreeSet<u8> {
        &self.buttons
    }

    /// Hat direction in hundredths of a degree, `None` when centred.
    pub fn pov(&self) -> Option<u32> {
        if self.pov == POV_CENTERED || self.pov >= 36000 {
            None
        } else {
            Some(self.pov)
        }
    }
}

/// Maps a raw register value to `[-1.0, 1.0]`.
///
/// The transform is affine and applied identically to every axis; no clamping
/// is done beyond the natural range of the register.
pub fn normalize_axis(raw: f32) -> f32 {
    (raw / RAW_AXIS_MAX) * 2.0 - 1.0
}

/// Returns the set of bit positions set in a 32-bit button word.
pub fn decode_buttons(flags: u32) -> BTreeSet<u8> {
    (0u8..32).filter(|&bit| flags & (1u32 << bit) != 0).collect()
}

/// Hardware capability used by the overlay to read joystick-class devices.
///
/// Implementations perform exactly one query per call and keep no history.
pub trait DeviceSource {
    /// Number of device slots the platform enumerates.
    fn device_count(&mut self) -> u32;

    /// Reads the current raw record of the device at `index`.
    fn query(&mut self, index: u32) -> Result<RawJoyState, DeviceError>;
}

impl<S: DeviceSource + ?Sized> DeviceSource for Box<S> {
    fn device_count(&mut self) -> u32 {
        (**self).device_count()
    }

    fn query(&mut self, index: u32) -> Result<RawJoyState, DeviceError> {
        (**self).query(index)
    }
}

/// Source with no devices, used when no input backend could be started.
#[derive(Debug, Default)]
pub struct InertSource;

impl DeviceSource for InertSource {
    fn device_count(&mut self) -> u32 {
        0
    }

    fn query(&mut self, index: u32) -> Result<RawJoyState, DeviceError> {
        Err(DeviceError::NotConnected(index))
    }
}

/// Normalizing front-end over a [`DeviceSource`].
pub struct DeviceReader<S: DeviceSource> {
    source: S,
}

impl<S: DeviceSource> DeviceReader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Polls a device once. Any failure of the underlying query is reported as `None`.
    pub fn poll(&mut self, index: u32) -> Option<DeviceSnapshot> {
        match self.source.query(index) {
            Ok(raw) => Some(DeviceSnapshot::from_raw(&raw)),
            Err(e) => {
                debug!("Device {} absent: {}", index, e);
                None
            }
        }
    }

    /// Indices in `0..device_count` that currently answer a poll.
    pub fn list_connected(&mut self) -> BTreeSet<u32> {
        let count = self.source.device_count();
        (0..count)
            .filter(|&index| self.poll(index).is_some())
            .collect()
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct ScriptedSource {
        devices: HashMap<u32, RawJoyState>,
        count: u32,
    }

    impl DeviceSource for ScriptedSource {
        fn device_count(&mut self) -> u32 {
            self.count
        }

        fn query(&mut self, index: u32) -> Result<RawJoyState, DeviceError> {
            self.devices
                .get(&index)
                .copied()
                .ok_or(DeviceError::QueryFailed { index, code: 167 })
        }
    }

    #[test]
    fn normalization_hits_both_ends_and_centre() {
        assert_eq!(normalize_axis(0.0), -1.0);
        assert_eq!(normalize_axis(65535.0), 1.0);
        assert!(normalize_axis(32767.5).abs() < 1e-6);
    }

    #[test]
    fn normalization_is_identical_for_every_axis() {
        let raw = RawJoyState {
            axes: [12000; 6],
            buttons: 0,
            pov: POV_CENTERED,
        };
        let snapshot = DeviceSnapshot::from_raw(&raw);
        let expected = normalize_axis(12000.0);
        for axis in AxisName::ALL {
            assert_eq!(snapshot.axis(axis), expected);
        }
    }

    #[test]
    fn button_word_decodes_to_bit_positions() {
        assert_eq!(decode_buttons(0b101), BTreeSet::from([0, 2]));
        assert!(decode_buttons(0).is_empty());
        assert_eq!(decode_buttons(1 << 31), BTreeSet::from([31]));
        assert_eq!(decode_buttons(u32::MAX).len(), 32);
    }

    #[test]
    fn snapshot_keeps_axis_order() {
        let raw = RawJoyState {
            axes: [0, 65535, 0, 65535, 0, 65535],
            buttons: 0b10,
            pov: 9000,
        };
        let snapshot = DeviceSnapshot::from_raw(&raw);
        assert_eq!(snapshot.axis(AxisName::X), -1.0);
        assert_eq!(snapshot.axis(AxisName::Y), 1.0);
        assert_eq!(snapshot.axis(AxisName::V), 1.0);
        assert!(snapshot.is_pressed(1));
        assert!(!snapshot.is_pressed(0));
        assert_eq!(snapshot.pov(), Some(9000));
    }

    #[test]
    fn centred_pov_reads_as_none() {
        let snapshot = DeviceSnapshot::from_raw(&RawJoyState::default());
        assert_eq!(snapshot.pov(), None);
    }

    #[test]
    fn failed_query_is_absent() {
        let mut reader = DeviceReader::new(ScriptedSource {
            devices: HashMap::new(),
            count: 4,
        });
        assert!(reader.poll(3).is_none());
        assert!(reader.poll(99).is_none());
    }

    #[test]
    fn list_connected_only_reports_responding_indices() {
        let devices = HashMap::from([(0, RawJoyState::default()), (2, RawJoyState::default())]);
        let mut reader = DeviceReader::new(ScriptedSource { devices, count: 4 });
        assert_eq!(reader.list_connected(), BTreeSet::from([0, 2]));
    }

    #[test]
    fn inert_source_has_nothing_connected() {
        let mut reader = DeviceReader::new(InertSource);
        assert!(reader.poll(0).is_none());
        assert!(reader.list_connected().is_empty());
    }

    #[test]
    fn axis_letters_round_trip_through_toml() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            axis: AxisName,
        }
        let text = toml::to_string(&Wrapper { axis: AxisName::R }).unwrap();
        assert_eq!(text.trim(), "axis = \"r\"");
        let parsed: Wrapper = toml::from_str("axis = \"u\"").unwrap();
        assert_eq!(parsed.axis, AxisName::U);
    }
}
