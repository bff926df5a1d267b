// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process Flow Editor
//!
//! Interactive editor for production process graphs:
//! - Steps with a variable number of input and output ports
//! - Drag-to-connect edges between output and input ports
//! - Edit lock that freezes the process
//! - JSON export and import of the process document

mod app;
mod panels;
mod settings;

use app::EditorApp;
use settings::EditorSettings;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in [
        "process_editor=debug",
        "process_editor_graph=debug",
        "wgpu=warn",
        "naga=warn",
    ] {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive {directive}: {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Process Flow Editor v{}", env!("CARGO_PKG_VERSION"));

    let settings_path = EditorSettings::file_path(Path::new("."));
    let settings = match EditorSettings::load_or_default(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Could not read {}: {e}; using defaults", settings_path.display());
            EditorSettings::default()
        }
    };

    if !settings_path.exists() {
        if let Err(e) = settings.save(&settings_path) {
            tracing::warn!("Could not write default settings: {e}");
        }
    }

    if let Err(e) = EditorApp::run(settings) {
        tracing::error!("Editor crashed: {e}");
        std::process::exit(1);
    }
}
