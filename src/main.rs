pub mod controller;
pub mod persistence;
pub mod ui;

use crate::controller::tick_driver::TickDriver;
use crate::persistence::config_store::ConfigStore;
use crate::persistence::persistence_worker::PersistenceWorker;
use crate::ui::{window_level, OverlayUI, OVERLAY_SIZE};
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let store = ConfigStore::default_location();
    info!("Loading config from {}", store.path().display());
    let config = store.load_or_default().await;
    info!("Starting with config: {:?}", config);

    let persistence = PersistenceWorker::spawn(store);

    // Devices are read on the UI thread, one tick per frame
    let driver = TickDriver::new(controller::default_source());

    info!("Starting overlay UI");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Stickwatch")
            .with_inner_size(OVERLAY_SIZE)
            .with_position([config.window.x, config.window.y])
            .with_decorations(false)
            .with_resizable(false)
            .with_window_level(window_level(config.window.always_on_top)),
        ..Default::default()
    };

    eframe::run_native(
        "Stickwatch",
        native_options,
        Box::new(move |cc| Ok(Box::new(OverlayUI::new(cc, config, driver, persistence)))),
    )
    .map_err(|e| eyre!("Overlay window failed: {}", e))?;

    info!("Overlay closed");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
