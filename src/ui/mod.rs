//! # Overlay User Interface
//!
//! Small always-on-top eframe/egui window showing live stick and pedal state.
//!
//! Every frame the UI runs one tick of the [`TickDriver`] with the current
//! configuration and renders the resulting [`OverlayFrame`]:
//!
//! - stick position inside a circle with the deadzone drawn in
//! - boost button indicator
//! - throttle and reverse bars in percent
//! - the first active hold warning
//!
//! The window has no decorations; dragging anywhere moves it and a right
//! click opens the settings popup. Repaints are requested at the configured
//! tick interval, so the UI timer is the tick cadence.

pub mod common;
pub mod settings_menu;

use eframe::egui::{
    self, pos2, vec2, Align2, Context, FontId, ProgressBar, RichText, Sense, Stroke, Ui,
    ViewportCommand, WindowLevel,
};
use std::time::Duration;
use tracing::{debug, info};

use crate::controller::device_reader::DeviceSource;
use crate::controller::tick_driver::{OverlayFrame, TickDriver};
use crate::persistence::persistence_worker::PersistenceWorker;
use crate::persistence::OverlayConfig;

use self::common::{section_frame, window_frame, UiColors};
use self::settings_menu::SettingsMenuData;

pub const OVERLAY_SIZE: [f32; 2] = [200.0, 250.0];
pub const SETTINGS_SIZE: [f32; 2] = [380.0, 560.0];

const STICK_AREA: f32 = 110.0;

pub struct OverlayUI<S: DeviceSource> {
    driver: TickDriver<S>,

    /// Live configuration; edited in place by the settings popup
    config: OverlayConfig,

    /// Most recent tick result
    frame: OverlayFrame,

    settings_open: bool,
    settings_menu_data: SettingsMenuData,

    /// Window level last sent to the viewport
    applied_on_top: bool,

    /// Keeps the persistence task's sender alive for the UI's lifetime
    _persistence: PersistenceWorker,
}

impl<S: DeviceSource> OverlayUI<S> {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: OverlayConfig,
        driver: TickDriver<S>,
        persistence: PersistenceWorker,
    ) -> Self {
        info!("Creating overlay UI");
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        Self {
            driver,
            applied_on_top: config.window.always_on_top,
            config,
            frame: OverlayFrame::default(),
            settings_open: false,
            settings_menu_data: SettingsMenuData::new(persistence.get_sender()),
            _persistence: persistence,
        }
    }

    fn toggle_settings(&mut self, ctx: &Context) {
        self.settings_open = !self.settings_open;
        let size = if self.settings_open {
            self.settings_menu_data
                .set_connected_devices(self.driver.connected_devices());
            SETTINGS_SIZE
        } else {
            OVERLAY_SIZE
        };
        debug!("Settings popup open: {}", self.settings_open);
        ctx.send_viewport_cmd(ViewportCommand::InnerSize(vec2(size[0], size[1])));
    }

    fn render_overlay(&mut self, ui: &mut Ui, ctx: &Context) {
        let background = ui.interact(
            ui.max_rect(),
            egui::Id::new("overlay_drag_area"),
            Sense::click_and_drag(),
        );
        if background.drag_started() {
            ctx.send_viewport_cmd(ViewportCommand::StartDrag);
        }
        if background.secondary_clicked() {
            self.toggle_settings(ctx);
        }

        ui.vertical_centered(|ui| {
            section_frame().show(ui, |ui| {
                self.render_stick(ui);
            });

            section_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    let (color, text) = if self.frame.boost {
                        (UiColors::BOOST_ON, "BOOST")
                    } else {
                        (UiColors::BOOST_OFF, "boost")
                    };
                    ui.label(RichText::new(text).color(color).strong());
                    if !self.frame.stick_present {
                        ui.colored_label(UiColors::ABSENT, "no stick");
                    }
                });
            });

            section_frame().show(ui, |ui| {
                pedal_bar(ui, "THR", self.frame.throttle_percent, UiColors::THROTTLE);
                pedal_bar(ui, "REV", self.frame.reverse_percent, UiColors::REVERSE);
                if !self.frame.pedals_present {
                    ui.colored_label(UiColors::ABSENT, "no pedals");
                }
            });

            if let Some(warning) = self.frame.headline_warning() {
                ui.label(
                    RichText::new(warning)
                        .color(UiColors::WARNING)
                        .strong()
                        .size(12.0),
                );
            }
        });
    }

    fn render_stick(&self, ui: &mut Ui) {
        let (rect, _) = ui.allocate_exact_size(vec2(STICK_AREA, STICK_AREA), Sense::hover());
        let painter = ui.painter_at(rect);
        let center = rect.center();
        let radius = STICK_AREA / 2.0 - 4.0;

        painter.circle_filled(center, radius * self.config.deadzone, UiColors::DEADZONE);
        painter.circle_stroke(center, radius, Stroke::new(1.0, UiColors::BORDER));
        painter.line_segment(
            [pos2(center.x - radius, center.y), pos2(center.x + radius, center.y)],
            Stroke::new(0.5, UiColors::BORDER),
        );
        painter.line_segment(
            [pos2(center.x, center.y - radius), pos2(center.x, center.y + radius)],
            Stroke::new(0.5, UiColors::BORDER),
        );

        // Screen Y grows downwards like the stick register, so no flip is needed
        let dot = pos2(
            center.x + self.frame.stick_x.clamp(-1.0, 1.0) * radius,
            center.y + self.frame.stick_y.clamp(-1.0, 1.0) * radius,
        );
        painter.circle_filled(dot, 5.0, UiColors::STICK_DOT);
        painter.text(
            rect.left_bottom() + vec2(2.0, -2.0),
            Align2::LEFT_BOTTOM,
            format!("{:+.2} {:+.2}", self.frame.stick_x, self.frame.stick_y),
            FontId::monospace(9.0),
            UiColors::DIM_TEXT,
        );
    }

    fn render_settings(&mut self, ui: &mut Ui, ctx: &Context) {
        ui.horizontal(|ui| {
            ui.heading("Settings");
            if ui.small_button("Close").clicked() {
                self.toggle_settings(ctx);
            }
        });

        egui::ScrollArea::vertical().show(ui, |ui| {
            let requests = self.settings_menu_data.render(ui, &mut self.config);

            if requests.refresh_devices {
                self.settings_menu_data
                    .set_connected_devices(self.driver.connected_devices());
            }
            if requests.save {
                if let Some(outer) = ctx.input(|i| i.viewport().outer_rect) {
                    self.config.window.x = outer.min.x;
                    self.config.window.y = outer.min.y;
                }
                self.config = self.config.clone().sanitized();
                self.settings_menu_data.request_save(self.config.clone());
            }
            if requests.reload {
                self.settings_menu_data.request_reload();
            }
        });
    }

    fn apply_window_level(&mut self, ctx: &Context) {
        if self.applied_on_top != self.config.window.always_on_top {
            self.applied_on_top = self.config.window.always_on_top;
            ctx.send_viewport_cmd(ViewportCommand::WindowLevel(window_level(
                self.applied_on_top,
            )));
        }
    }
}

impl<S: DeviceSource> eframe::App for OverlayUI<S> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(reloaded) = self.settings_menu_data.poll_pending() {
            info!("Applying reloaded config");
            self.config = reloaded;
        }

        self.frame = self.driver.tick(&self.config);
        self.apply_window_level(ctx);

        egui::CentralPanel::default()
            .frame(window_frame())
            .show(ctx, |ui| {
                ui.style_mut().visuals.override_text_color = Some(UiColors::TEXT);
                if self.settings_open {
                    self.render_settings(ui, ctx);
                } else {
                    self.render_overlay(ui, ctx);
                }
            });

        ctx.request_repaint_after(Duration::from_millis(self.config.tick_interval_ms));
    }
}

fn pedal_bar(ui: &mut Ui, label: &str, percent: u8, color: egui::Color32) {
    ui.horizontal(|ui| {
        ui.monospace(label);
        ui.add(
            ProgressBar::new(f32::from(percent) / 100.0)
                .fill(color)
                .desired_width(120.0)
                .text(format!("{}%", percent)),
        );
    });
}

pub fn window_level(always_on_top: bool) -> WindowLevel {
    if always_on_top {
        WindowLevel::AlwaysOnTop
    } else {
        WindowLevel::Normal
    }
}
