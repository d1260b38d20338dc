//! Controller subsystem: device input and hold detection
//!
//! One tick flows strictly in one direction:
//!
//! 1. [`device_reader`] - query a device by index and normalize the result
//! 2. [`hold_monitor`] - track how long each stick direction has been held
//! 3. [`tick_driver`] - glue both together into an [`tick_driver::OverlayFrame`]
//!
//! # Architecture
//!
//! ```text
//! DeviceSource ──► DeviceReader ──► HoldMonitor ──► OverlayFrame ──► UI
//!  (hardware)      (snapshot)       (warnings)      (display values)
//! ```
//!
//! Everything here runs on the UI thread, once per frame. Backends are chosen
//! by [`default_source`]: the multimedia joystick API on Windows, gilrs on
//! other platforms.

pub mod device_reader;
#[cfg(not(windows))]
pub mod gilrs_source;
pub mod hold_monitor;
pub mod tick_driver;
#[cfg(windows)]
pub mod winmm_source;

use tracing::info;

use self::device_reader::DeviceSource;

// Device errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Input backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Query for device {index} failed with status {code}")]
    QueryFailed { index: u32, code: u32 },

    #[error("No device connected at index {0}")]
    NotConnected(u32),
}

/// Picks the input backend for this platform.
///
/// Falls back to an [`InertSource`] when the backend cannot start, so the
/// overlay still runs and shows neutral values.
pub fn default_source() -> Box<dyn DeviceSource> {
    #[cfg(windows)]
    {
        info!("Using multimedia joystick API backend");
        Box::new(winmm_source::WinMmSource::new())
    }

    #[cfg(not(windows))]
    {
        use self::device_reader::InertSource;
        use tracing::error;

        match gilrs_source::GilrsSource::create() {
            Ok(source) => {
                info!("Using gilrs backend");
                Box::new(source.initialize())
            }
            Err(e) => {
                error!("Failed to start gilrs backend, no devices will be read: {}", e);
                Box::new(InertSource)
            }
        }
    }
}
