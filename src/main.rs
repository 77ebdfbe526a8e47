// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod app;
mod backend;
mod config;
mod map;
mod overlay;
mod status;
mod ui;

use clap::Parser;
use grazing_client::BackendClient;
use log::{info, warn};
use mimalloc::MiMalloc;

use crate::app::GrazingApp;
use crate::config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Map viewer for grazing-quality pipeline runs
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Backend base address; overrides GRAZING_BACKEND_URL and the config file
    #[arg(long, value_name = "URL")]
    backend_url: Option<String>,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("Starting Grazing Mapper...");

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {e}");
        AppConfig::default()
    });
    if let Ok(path) = AppConfig::get_config_path() {
        info!("Config file: {}", path.display());
    }

    let (backend_url, source) = config.resolve_backend_url(args.backend_url.as_deref());
    info!("Backend {backend_url} (from {})", source.describe());

    let client_config = config.client_config(backend_url);
    let opacity = config.initial_opacity();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_title("Grazing Mapper"),
        ..Default::default()
    };

    eframe::run_native(
        "Grazing Mapper",
        options,
        Box::new(move |cc| {
            let client = BackendClient::new(client_config)?;
            let app = GrazingApp::new(&cc.egui_ctx, client, opacity)?;
            Ok(Box::new(app))
        }),
    )
}
