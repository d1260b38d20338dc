//! Multimedia joystick API backend (Windows only).
//!
//! `joyGetPosEx` fills a fixed record with six axis registers (`0..=65535`),
//! a 32-bit button word and the POV angle. Any non-zero status means the slot
//! has nothing usable behind it.

use std::mem::size_of;

use tracing::trace;
use windows_sys::Win32::Media::Multimedia::{joyGetNumDevs, joyGetPosEx, JOYINFOEX, JOY_RETURNALL};

use super::device_reader::{DeviceSource, RawJoyState};
use super::DeviceError;

const JOYERR_NOERROR: u32 = 0;

#[derive(Debug, Default)]
pub struct WinMmSource;

impl WinMmSource {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceSource for WinMmSource {
    fn device_count(&mut self) -> u32 {
        // SAFETY: takes no arguments and only reads driver state.
        unsafe { joyGetNumDevs() }
    }

    fn query(&mut self, index: u32) -> Result<RawJoyState, DeviceError> {
        let mut info = JOYINFOEX {
            dwSize: size_of::<JOYINFOEX>() as u32,
            dwFlags: JOY_RETURNALL as u32,
            dwXpos: 0,
            dwYpos: 0,
            dwZpos: 0,
            dwRpos: 0,
            dwUpos: 0,
            dwVpos: 0,
            dwButtons: 0,
            dwButtonNumber: 0,
            dwPOV: 0,
            dwReserved1: 0,
            dwReserved2: 0,
        };

        // SAFETY: `info` is a fully initialised JOYINFOEX with `dwSize` set,
        // and the pointer stays valid for the duration of the call.
        let status = unsafe { joyGetPosEx(index, &mut info) };
        if status != JOYERR_NOERROR {
            trace!("joyGetPosEx({}) returned {}", index, status);
            return Err(DeviceError::QueryFailed {
                index,
                code: status,
            });
        }

        Ok(RawJoyState {
            axes: [
                info.dwXpos,
                info.dwYpos,
                info.dwZpos,
                info.dwRpos,
                info.dwUpos,
                info.dwVpos,
            ],
            buttons: info.dwButtons,
            pov: info.dwPOV,
        })
    }
}
