use scene_search_client::gui::SceneSearchApp;
use scene_search_client::logging;
use scene_search_client::search::HttpSearchClient;
use scene_search_client::settings::Settings;
use scene_search_client::view::{ThreadedMediaLoader, ViewController};

use eframe::egui;
use std::sync::mpsc;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "settings.json".into());
    let mut settings = Settings::load(&settings_path)?;
    logging::init(settings.debug_logging, settings.log_file.clone());
    settings.apply_env_overrides();

    let client = Arc::new(HttpSearchClient::from_settings(&settings)?);
    tracing::info!(backend = %client.base_url(), "starting scene search");

    let (status_tx, status_rx) = mpsc::channel();
    let ping_client = Arc::clone(&client);
    std::thread::spawn(move || {
        let status = match ping_client.ping() {
            Ok(banner) => format!("Connected to {}: {banner}", ping_client.base_url()),
            Err(err) => {
                tracing::warn!(%err, "backend health check failed");
                format!("Backend {} is not reachable: {err}", ping_client.base_url())
            }
        };
        let _ = status_tx.send(status);
    });

    let controller = ViewController::new(
        client,
        Box::new(ThreadedMediaLoader),
        settings.marker_style(),
    );

    let (width, height) = settings.window_size.unwrap_or((1100.0, 760.0));
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([480.0, 360.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Scene Search",
        native_options,
        Box::new(move |_cc| Box::new(SceneSearchApp::new(controller, Some(status_rx)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start the window: {e}"))?;
    Ok(())
}
