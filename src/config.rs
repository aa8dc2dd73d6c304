use std::{env, fs, path::Path, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_CACHE_DIR: &str = ".scenes_cache";

/// Which identifier scheme the want-list button uses for a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueKeyScheme {
    Scene,
    WantedScene,
    TitleYear,
}

impl QueueKeyScheme {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "scene" | "scene_id" => Some(Self::Scene),
            "wanted" | "wanted_scene" => Some(Self::WantedScene),
            "title_year" | "title" => Some(Self::TitleYear),
            _ => None,
        }
    }
}

impl Default for QueueKeyScheme {
    fn default() -> Self {
        Self::Scene
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub stats_refresh_secs: u64,
    pub cache_dir: Option<String>,
    pub thumbnail_workers: usize,
    pub queue_scheme: QueueKeyScheme,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 20,
            stats_refresh_secs: 5 * 60,
            cache_dir: None,
            thumbnail_workers: 4,
            queue_scheme: QueueKeyScheme::default(),
        }
    }
}

impl AppConfig {
    pub fn cache_dir_path(&self) -> PathBuf {
        PathBuf::from(
            self.cache_dir
                .clone()
                .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string()),
        )
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "base_url")]
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    stats_refresh_secs: Option<u64>,
    cache_dir: Option<String>,
    thumbnail_workers: Option<usize>,
    queue_target: Option<String>,
}

pub fn load_config() -> AppConfig {
    let mut cfg = load_config_from(Path::new(CONFIG_FILE));
    if let Ok(url) = env::var("SCENES_API_URL") {
        if !url.trim().is_empty() {
            info!("api_base_url overridden by SCENES_API_URL");
            cfg.api_base_url = normalize_base_url(&url);
        }
    }
    cfg
}

pub fn load_config_from(cfg_path: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();

    match fs::read_to_string(cfg_path) {
        Ok(raw) => match serde_json::from_str::<RawConfig>(&raw) {
            Ok(parsed) => {
                if let Some(url) = parsed.api_base_url.filter(|u| !u.trim().is_empty()) {
                    cfg.api_base_url = normalize_base_url(&url);
                    if raw.contains("\"base_url\"") {
                        warn!("`base_url` is deprecated; rename it to `api_base_url` in config.json.");
                    }
                }
                if let Some(secs) = parsed.request_timeout_secs {
                    cfg.request_timeout_secs = secs.max(1);
                }
                if let Some(secs) = parsed.stats_refresh_secs {
                    cfg.stats_refresh_secs = secs.max(10);
                }
                if parsed.cache_dir.is_some() {
                    cfg.cache_dir = parsed.cache_dir;
                }
                if let Some(n) = parsed.thumbnail_workers {
                    cfg.thumbnail_workers = n.clamp(1, 16);
                }
                if let Some(scheme) = parsed.queue_target {
                    match QueueKeyScheme::from_str(&scheme) {
                        Some(kind) => cfg.queue_scheme = kind,
                        None => warn!(
                            "Unknown queue_target `{scheme}` in config.json; falling back to scene."
                        ),
                    }
                }
                info!("Loaded config from {}", cfg_path.display());
            }
            Err(err) => {
                warn!("Failed to parse {} ({}). Using defaults.", cfg_path.display(), err);
            }
        },
        Err(_) => {
            info!("No {} found; using defaults", cfg_path.display());
        }
    }

    cfg
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
