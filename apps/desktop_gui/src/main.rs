use std::time::Duration;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::DEFAULT_SERVER_URL;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::{DesktopGuiApp, StartupConfig};

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the greeting service.
    #[arg(long, env = "GREET_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
    /// Give up on a greet call after this many milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl From<Args> for StartupConfig {
    fn from(args: Args) -> Self {
        Self {
            server_url: args.server_url,
            call_timeout: args.timeout_ms.map(Duration::from_millis),
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let startup = StartupConfig::from(Args::parse());

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, startup.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Greeter")
            .with_inner_size([480.0, 220.0])
            .with_min_inner_size([360.0, 180.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Greeter",
        options,
        Box::new(move |_cc| Ok(Box::new(DesktopGuiApp::bootstrap(cmd_tx, ui_rx, &startup)))),
    )
}
