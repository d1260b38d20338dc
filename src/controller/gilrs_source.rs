use gilrs::{Axis, Button, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

use super::device_reader::{DeviceSource, RawJoyState, POV_CENTERED, RAW_AXIS_MAX};
use super::DeviceError;

// Buttons in the order they occupy the button word
const BUTTON_ORDER: [Button; 19] = [
    Button::South,
    Button::East,
    Button::North,
    Button::West,
    Button::C,
    Button::Z,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

// Axes in X, Y, Z, R, U, V slot order
const AXIS_ORDER: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::LeftZ,
    Axis::RightZ,
    Axis::RightStickX,
    Axis::RightStickY,
];

#[state]
#[derive(Debug, Clone)]
pub enum BackendState {
    Initializing,
    Polling,
}

/// gilrs-backed [`DeviceSource`]. A device index is the gamepad's gilrs slot
/// (`usize::from(GamepadId)`), which stays fixed while other pads come and go.
#[machine]
#[derive(Debug)]
pub struct GilrsSource<S: BackendState> {
    gilrs: Gilrs,

    // One past the highest slot ever seen
    slot_count: u32,
}

impl GilrsSource<Initializing> {
    pub fn create() -> Result<Self, DeviceError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(DeviceError::BackendUnavailable(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, 0))
    }

    pub fn initialize(mut self) -> GilrsSource<Polling> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            warn!("No gamepad connected, every device will read as absent until one appears");
        } else {
            info!("Found {} gamepads:", gamepads.len());
            for (id, gamepad) in gamepads.iter() {
                info!(
                    "  [{}] Name: {}, UUID: {:?}",
                    id,
                    gamepad.name(),
                    gamepad.uuid()
                );
            }
        }

        let slot_count = gamepads
            .iter()
            .fold(self.slot_count, |count, (id, _)| grow_slot_count(count, usize::from(*id)));
        self.slot_count = slot_count;

        self.transition()
    }
}

impl GilrsSource<Polling> {
    // gilrs only updates gamepad state while events are pulled
    fn pump_events(&mut self) {
        while let Some(event) = self.gilrs.next_event() {
            debug!("Drained gilrs event: {:?} from {}", event.event, event.id);
            if let EventType::Connected = event.event {
                info!("Gamepad connected in slot {}", event.id);
            }
            self.slot_count = grow_slot_count(self.slot_count, usize::from(event.id));
        }
    }
}

impl DeviceSource for GilrsSource<Polling> {
    fn device_count(&mut self) -> u32 {
        self.pump_events();
        self.slot_count
    }

    fn query(&mut self, index: u32) -> Result<RawJoyState, DeviceError> {
        self.pump_events();

        let pads = self
            .gilrs
            .gamepads()
            .map(|(id, gamepad)| (usize::from(id), gamepad.is_connected(), gamepad));

        pad_in_slot(pads, index)
            .map(|gamepad| raw_state(&gamepad))
            .ok_or(DeviceError::NotConnected(index))
    }
}

/// Picks the connected pad whose slot equals `index`.
fn pad_in_slot<T>(pads: impl IntoIterator<Item = (usize, bool, T)>, index: u32) -> Option<T> {
    pads.into_iter()
        .find(|(slot, connected, _)| *connected && *slot == index as usize)
        .map(|(_, _, pad)| pad)
}

fn grow_slot_count(count: u32, slot: usize) -> u32 {
    count.max(u32::try_from(slot).map_or(u32::MAX, |slot| slot.saturating_add(1)))
}

fn raw_state(gamepad: &Gamepad<'_>) -> RawJoyState {
    let mut axes = [0u32; 6];
    for (slot, axis) in AXIS_ORDER.iter().enumerate() {
        let mut value = gamepad.value(*axis);
        // gilrs reports stick Y up-positive, the joystick register grows downwards
        if matches!(axis, Axis::LeftStickY | Axis::RightStickY) {
            value = -value;
        }
        axes[slot] = to_register(value);
    }

    let buttons = BUTTON_ORDER
        .iter()
        .enumerate()
        .filter(|(_, button)| gamepad.is_pressed(**button))
        .fold(0u32, |word, (bit, _)| word | (1 << bit));

    RawJoyState {
        axes,
        buttons,
        pov: dpad_pov(
            gamepad.is_pressed(Button::DPadUp),
            gamepad.is_pressed(Button::DPadRight),
            gamepad.is_pressed(Button::DPadDown),
            gamepad.is_pressed(Button::DPadLeft),
        ),
    }
}

/// Maps a gilrs value in `[-1, 1]` back onto the raw register range.
fn to_register(value: f32) -> u32 {
    let clamped = value.clamp(-1.0, 1.0);
    ((clamped + 1.0) / 2.0 * RAW_AXIS_MAX).round() as u32
}

/// POV angle in hundredths of a degree, clockwise from up.
fn dpad_pov(up: bool, right: bool, down: bool, left: bool) -> u32 {
    match (up, right, down, left) {
        (true, false, false, false) => 0,
        (true, true, false, false) => 4500,
        (false, true, false, false) => 9000,
        (false, true, true, false) => 13500,
        (false, false, true, false) => 18000,
        (false, false, true, true) => 22500,
        (false, false, false, true) => 27000,
        (true, false, false, true) => 31500,
        _ => POV_CENTERED,
    }
}
