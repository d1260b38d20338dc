//! Per-frame glue between the devices, the hold monitor and the display.
//!
//! A tick reads the stick and the pedal set once, feeds the stick position to
//! the [`HoldMonitor`] and hands the result to the UI as an [`OverlayFrame`].
//! Absent devices are replaced by neutral values; a tick that panics is
//! logged and replaced by the neutral frame so the next tick runs normally.

use chrono::{DateTime, Local};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{error, info, warn};

use super::device_reader::{DeviceReader, DeviceSnapshot, DeviceSource};
use super::hold_monitor::HoldMonitor;
use crate::persistence::OverlayConfig;

/// Pedal reading shown when the pedal set is absent.
pub const NEUTRAL_PEDAL_PERCENT: u8 = 50;

/// Display values for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayFrame {
    pub stick_x: f32,
    pub stick_y: f32,
    pub boost: bool,
    pub throttle_percent: u8,
    pub reverse_percent: u8,
    /// Every active warning, lateral axis first
    pub warnings: Vec<String>,
    pub stick_present: bool,
    pub pedals_present: bool,
}

impl Default for OverlayFrame {
    fn default() -> Self {
        Self {
            stick_x: 0.0,
            stick_y: 0.0,
            boost: false,
            throttle_percent: NEUTRAL_PEDAL_PERCENT,
            reverse_percent: NEUTRAL_PEDAL_PERCENT,
            warnings: Vec::new(),
            stick_present: false,
            pedals_present: false,
        }
    }
}

impl OverlayFrame {
    /// The single warning the overlay has room to show.
    pub fn headline_warning(&self) -> Option<&str> {
        self.warnings.first().map(String::as_str)
    }
}

/// Maps a normalized pedal value to a whole percentage in `0..=100`.
pub fn pedal_percent(value: f32) -> u8 {
    ((value + 1.0) / 2.0 * 100.0).clamp(0.0, 100.0) as u8
}

pub struct TickDriver<S: DeviceSource> {
    reader: DeviceReader<S>,
    monitor: HoldMonitor,

    // Presence seen on the previous tick, to log changes only once
    stick_was_present: Option<bool>,
    pedals_were_present: Option<bool>,
    last_headline: Option<String>,

    // Stats
    tick_count: u64,
    last_stats_time: DateTime<Local>,
}

impl<S: DeviceSource> TickDriver<S> {
    pub fn new(source: S) -> Self {
        Self {
            reader: DeviceReader::new(source),
            monitor: HoldMonitor::new(),
            stick_was_present: None,
            pedals_were_present: None,
            last_headline: None,
            tick_count: 0,
            last_stats_time: Local::now(),
        }
    }

    /// Runs one tick at the current wall-clock time.
    pub fn tick(&mut self, config: &OverlayConfig) -> OverlayFrame {
        self.tick_at(config, Local::now())
    }

    /// Runs one tick at `now`. Never panics and never fails.
    pub fn tick_at(&mut self, config: &OverlayConfig, now: DateTime<Local>) -> OverlayFrame {
        let result = catch_unwind(AssertUnwindSafe(|| self.run_tick(config, now)));
        let frame = match result {
            Ok(frame) => frame,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Tick failed, showing neutral values: {}", reason);
                OverlayFrame::default()
            }
        };

        self.log_stats(now);
        frame
    }

    fn run_tick(&mut self, config: &OverlayConfig, now: DateTime<Local>) -> OverlayFrame {
        let mut frame = OverlayFrame::default();

        let stick = self.reader.poll(config.stick_device);
        self.note_presence(stick.as_ref(), config.stick_device, true);
        if let Some(stick) = &stick {
            frame.stick_present = true;
            frame.stick_x = stick.axis(config.axes.stick_x);
            frame.stick_y = stick.axis(config.axes.stick_y);
            frame.boost = stick.is_pressed(config.boost_button);
        }

        let pedals = self.reader.poll(config.pedal_device);
        self.note_presence(pedals.as_ref(), config.pedal_device, false);
        if let Some(pedals) = &pedals {
            frame.pedals_present = true;
            frame.throttle_percent = pedal_percent(pedals.axis(config.axes.throttle));
            frame.reverse_percent = pedal_percent(pedals.axis(config.axes.reverse));
        }

        // An absent stick reads as centred, which releases any hold in progress
        frame.warnings = self.monitor.evaluate(
            frame.stick_x,
            frame.stick_y,
            now,
            config.deadzone,
            config.hold_threshold_secs,
        );

        let headline = frame.headline_warning().map(str::to_string);
        if headline != self.last_headline {
            match &headline {
                Some(text) => info!("Warning raised: {}", text),
                None => info!("Warning cleared"),
            }
            self.last_headline = headline;
        }

        frame
    }

    fn note_presence(&mut self, snapshot: Option<&DeviceSnapshot>, index: u32, is_stick: bool) {
        let present = snapshot.is_some();
        let (previous, role) = if is_stick {
            (&mut self.stick_was_present, "Stick")
        } else {
            (&mut self.pedals_were_present, "Pedal set")
        };

        if *previous != Some(present) {
            if present {
                info!("{} connected at index {}", role, index);
            } else {
                warn!("{} not available at index {}, using neutral values", role, index);
            }
            *previous = Some(present);
        }
    }

    fn log_stats(&mut self, now: DateTime<Local>) {
        self.tick_count += 1;
        let log_interval = chrono::Duration::seconds(10);
        if now - self.last_stats_time > log_interval {
            info!(
                "Tick driver stats: {} ticks in last {} seconds (avg {:.2}/sec)",
                self.tick_count,
                log_interval.num_seconds(),
                self.tick_count as f64 / log_interval.num_seconds() as f64
            );
            self.tick_count = 0;
            self.last_stats_time = now;
        }
    }

    /// Device indices currently answering a poll, for the settings popup.
    pub fn connected_devices(&mut self) -> Vec<u32> {
        self.reader.list_connected().into_iter().collect()
    }

    pub fn monitor(&self) -> &HoldMonitor {
        &self.monitor
    }
}
