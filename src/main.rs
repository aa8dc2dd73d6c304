// src/main.rs
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use filtered_scenes::app::SceneBrowserApp;
use filtered_scenes::config::load_config;

fn pick_renderer() -> eframe::Renderer {
    match env::var("SCENES_RENDERER").as_deref() {
        Ok("glow") => eframe::Renderer::Glow,
        Ok("wgpu") => eframe::Renderer::Wgpu,
        other => {
            if let Ok(unknown) = other {
                warn!("Unknown SCENES_RENDERER `{unknown}`; using the platform default.");
            }
            // Default: Windows = WGPU (DX12), Others = Glow (GL)
            #[cfg(target_os = "windows")]
            { eframe::Renderer::Wgpu }
            #[cfg(not(target_os = "windows"))]
            { eframe::Renderer::Glow }
        }
    }
}

fn main() -> eframe::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let cfg = load_config();
    info!(
        "api={} timeout={}s stats_every={}s thumbs={}",
        cfg.api_base_url, cfg.request_timeout_secs, cfg.stats_refresh_secs, cfg.thumbnail_workers
    );

    let options = eframe::NativeOptions {
        renderer: pick_renderer(),
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Filtered Scenes")
            .with_inner_size([1400.0, 860.0]),
        multisampling: 0,
        ..Default::default()
    };

    match eframe::run_native(
        "Filtered Scenes",
        options,
        Box::new(|_cc| Ok(Box::new(SceneBrowserApp::new(cfg)?))),
    ) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("eframe failed to start: {e:?}");
            error!("Hint: try SCENES_RENDERER=wgpu or glow.");
            Err(e)
        }
    }
}
