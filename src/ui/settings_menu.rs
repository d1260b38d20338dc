use eframe::egui::{self, DragValue, Slider, Ui};
use tokio::sync::mpsc::Sender;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{error, info, warn};

use super::common::{section_frame, UiColors};
use crate::controller::device_reader::AxisName;
use crate::persistence::persistence_worker::PersistenceAction;
use crate::persistence::OverlayConfig;

enum PendingRequest {
    Save(oneshot::Receiver<color_eyre::Result<()>>),
    Reload(oneshot::Receiver<color_eyre::Result<OverlayConfig>>),
}

/// What the settings popup asks the overlay to do after rendering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SettingsRequests {
    pub refresh_devices: bool,
    pub save: bool,
    pub reload: bool,
}

/// State of the settings popup
pub struct SettingsMenuData {
    persistence: Sender<PersistenceAction>,
    pending: Option<PendingRequest>,
    status: String,
    connected_devices: Vec<u32>,
}

impl SettingsMenuData {
    pub fn new(persistence: Sender<PersistenceAction>) -> Self {
        Self {
            persistence,
            pending: None,
            status: String::new(),
            connected_devices: Vec::new(),
        }
    }

    pub fn set_connected_devices(&mut self, devices: Vec<u32>) {
        self.connected_devices = devices;
    }

    /// Renders the popup contents, editing `config` in place.
    pub fn render(&mut self, ui: &mut Ui, config: &mut OverlayConfig) -> SettingsRequests {
        let mut requests = SettingsRequests::default();

        section_frame().show(ui, |ui| {
            ui.heading("Hold warning");
            ui.horizontal(|ui| {
                ui.label("Deadzone:");
                ui.add(Slider::new(&mut config.deadzone, 0.0..=0.95).step_by(0.01));
            });
            ui.horizontal(|ui| {
                ui.label("Hold threshold:");
                ui.add(
                    Slider::new(&mut config.hold_threshold_secs, 0.5..=30.0)
                        .step_by(0.5)
                        .suffix(" s"),
                );
            });
        });

        section_frame().show(ui, |ui| {
            ui.heading("Devices");
            ui.horizontal(|ui| {
                ui.label("Stick index:");
                ui.add(DragValue::new(&mut config.stick_device).range(0..=15));
                ui.label("Pedal index:");
                ui.add(DragValue::new(&mut config.pedal_device).range(0..=15));
            });
            ui.horizontal(|ui| {
                ui.label("Boost button:");
                ui.add(DragValue::new(&mut config.boost_button).range(0..=31));
            });
            ui.horizontal(|ui| {
                let listing = if self.connected_devices.is_empty() {
                    "none".to_string()
                } else {
                    self.connected_devices
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                ui.colored_label(UiColors::DIM_TEXT, format!("Connected: {}", listing));
                if ui.small_button("Refresh").clicked() {
                    requests.refresh_devices = true;
                }
            });
        });

        section_frame().show(ui, |ui| {
            ui.heading("Axes");
            axis_combo(ui, "stick_x", "Stick X", &mut config.axes.stick_x);
            axis_combo(ui, "stick_y", "Stick Y", &mut config.axes.stick_y);
            axis_combo(ui, "throttle", "Throttle", &mut config.axes.throttle);
            axis_combo(ui, "reverse", "Reverse", &mut config.axes.reverse);
        });

        section_frame().show(ui, |ui| {
            ui.checkbox(&mut config.window.always_on_top, "Always on top");
        });

        ui.horizontal(|ui| {
            let busy = self.pending.is_some();
            if ui.add_enabled(!busy, egui::Button::new("Save")).clicked() {
                requests.save = true;
            }
            if ui.add_enabled(!busy, egui::Button::new("Reload")).clicked() {
                requests.reload = true;
            }
            ui.colored_label(UiColors::DIM_TEXT, &self.status);
        });

        requests
    }

    pub fn request_save(&mut self, config: OverlayConfig) {
        let (response_tx, response_rx) = oneshot::channel();
        match self.persistence.try_send(PersistenceAction::Save {
            config,
            response_tx,
        }) {
            Ok(()) => {
                self.pending = Some(PendingRequest::Save(response_rx));
                self.status = "Saving...".to_string();
            }
            Err(e) => {
                error!("Failed to queue config save: {}", e);
                self.status = "Save failed".to_string();
            }
        }
    }

    pub fn request_reload(&mut self) {
        let (response_tx, response_rx) = oneshot::channel();
        match self
            .persistence
            .try_send(PersistenceAction::Reload { response_tx })
        {
            Ok(()) => {
                self.pending = Some(PendingRequest::Reload(response_rx));
                self.status = "Loading...".to_string();
            }
            Err(e) => {
                error!("Failed to queue config reload: {}", e);
                self.status = "Reload failed".to_string();
            }
        }
    }

    /// Checks for a finished persistence request. Returns a freshly loaded
    /// configuration when a reload completed.
    pub fn poll_pending(&mut self) -> Option<OverlayConfig> {
        let pending = self.pending.take()?;
        match pending {
            PendingRequest::Save(mut rx) => match rx.try_recv() {
                Ok(Ok(())) => {
                    info!("Config saved");
                    self.status = "Saved".to_string();
                }
                Ok(Err(e)) => {
                    warn!("Config save failed: {}", e);
                    self.status = "Save failed".to_string();
                }
                Err(TryRecvError::Empty) => self.pending = Some(PendingRequest::Save(rx)),
                Err(TryRecvError::Closed) => {
                    error!("Persistence worker dropped the save request");
                    self.status = "Save failed".to_string();
                }
            },
            PendingRequest::Reload(mut rx) => match rx.try_recv() {
                Ok(Ok(config)) => {
                    self.status = "Reloaded".to_string();
                    return Some(config);
                }
                Ok(Err(e)) => {
                    warn!("Config reload failed: {}", e);
                    self.status = "Reload failed".to_string();
                }
                Err(TryRecvError::Empty) => self.pending = Some(PendingRequest::Reload(rx)),
                Err(TryRecvError::Closed) => {
                    error!("Persistence worker dropped the reload request");
                    self.status = "Reload failed".to_string();
                }
            },
        }
        None
    }
}

fn axis_combo(ui: &mut Ui, id: &str, label: &str, value: &mut AxisName) {
    ui.horizontal(|ui| {
        ui.label(format!("{}:", label));
        egui::ComboBox::from_id_salt(id)
            .selected_text(value.letter())
            .width(50.0)
            .show_ui(ui, |ui| {
                for axis in AxisName::ALL {
                    ui.selectable_value(value, axis, axis.letter());
                }
            });
    });
}
