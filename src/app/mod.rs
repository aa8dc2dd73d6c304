// src/app/mod.rs: desktop shell around the scene browser controller

pub mod cache;
pub mod controller;
pub mod detail;
pub mod filters;
pub mod gfx;
pub mod prefetch;
pub mod queue_button;
pub mod scheduled;
pub mod types;
pub mod ui;
pub mod utils;
pub mod view;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{self as eg, TextureHandle};
use tracing::info;

use crate::api::{ApiError, HttpApi, QueueApi, SceneApi, SceneId};
use crate::app::controller::SceneBrowser;
use crate::app::filters::{DateFieldEdit, FilterForm, SearchDebounce};
use crate::app::prefetch::{ThumbState, ThumbnailLoader};
use crate::app::queue_button::AddToQueueButton;
use crate::app::types::ExceptionForm;
use crate::config::AppConfig;

// ---- Tunables ----
const MAX_UPLOADS_PER_FRAME: usize = 4;
const IDLE_REPAINT: Duration = Duration::from_millis(250);
const DEFAULT_CLEANUP_DAYS: u32 = 30;

/// Texture slot per thumbnail URL; `None` marks a failed decode so it is
/// not retried every frame.
type TextureCache = HashMap<String, Option<TextureHandle>>;

pub struct SceneBrowserApp {
    cfg: AppConfig,
    browser: SceneBrowser,
    queue_api: Arc<dyn QueueApi>,

    // ---- form state ----
    filter_form: FilterForm,
    search_debounce: SearchDebounce,
    date_from_edit: DateFieldEdit,
    date_to_edit: DateFieldEdit,
    exception_form: ExceptionForm,
    bulk_form: ExceptionForm,
    cleanup_days: u32,

    // ---- detail window ----
    queue_button: Option<(SceneId, AddToQueueButton)>,

    // ---- thumbnails ----
    thumbs: ThumbnailLoader,
    textures: TextureCache,
    uploads_left: usize,
}

impl SceneBrowserApp {
    pub fn new(cfg: AppConfig) -> Result<Self, ApiError> {
        let timeout = Duration::from_secs(cfg.request_timeout_secs);
        let http = Arc::new(HttpApi::new(&cfg.api_base_url, timeout)?);
        info!("backend: {}", http.base_url());

        let scene_api: Arc<dyn SceneApi> = http.clone();
        let mut browser = SceneBrowser::new(scene_api);
        browser.initialize(Duration::from_secs(cfg.stats_refresh_secs));

        let thumbs =
            ThumbnailLoader::start(cfg.cache_dir_path(), cfg.thumbnail_workers, timeout);

        Ok(Self {
            browser,
            queue_api: http,
            filter_form: FilterForm::default(),
            search_debounce: SearchDebounce::default(),
            date_from_edit: DateFieldEdit::default(),
            date_to_edit: DateFieldEdit::default(),
            exception_form: ExceptionForm::default(),
            bulk_form: ExceptionForm::default(),
            cleanup_days: DEFAULT_CLEANUP_DAYS,
            queue_button: None,
            thumbs,
            textures: TextureCache::new(),
            uploads_left: MAX_UPLOADS_PER_FRAME,
            cfg,
        })
    }

    /// Texture for a thumbnail URL, uploading at most a few per frame.
    pub(crate) fn thumbnail_texture(&mut self, ctx: &eg::Context, url: &str) -> Option<TextureHandle> {
        if let Some(slot) = self.textures.get(url) {
            return slot.clone();
        }
        let ThumbState::Ready(path) = self.thumbs.request(url)?.clone() else {
            return None;
        };
        if self.uploads_left == 0 {
            return None;
        }
        self.uploads_left -= 1;
        let name = format!("thumb_{}", cache::url_to_cache_key(url));
        let tex = match gfx::load_texture_from_path(ctx, &path, &name) {
            Ok(tex) => Some(tex),
            Err(err) => {
                tracing::debug!("thumbnail upload failed: {err}");
                None
            }
        };
        self.textures.insert(url.to_string(), tex.clone());
        tex
    }

    /// Earliest moment something on screen changes without user input.
    fn next_repaint(&self, now: Instant) -> Duration {
        let mut wait = IDLE_REPAINT;
        if let Some(d) = self.search_debounce.remaining(now) {
            wait = wait.min(d);
        }
        if let Some(d) = self
            .queue_button
            .as_ref()
            .and_then(|(_, b)| b.next_change_in(now))
        {
            wait = wait.min(d);
        }
        if let Some(d) = self
            .browser
            .notices()
            .iter()
            .map(|n| types::NOTICE_TTL.saturating_sub(now.saturating_duration_since(n.created)))
            .min()
        {
            wait = wait.min(d);
        }
        wait.max(Duration::from_millis(16))
    }
}

impl eframe::App for SceneBrowserApp {
    fn update(&mut self, ctx: &eg::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        // ---- drain background work ----
        self.browser.poll();
        if self.thumbs.poll() > 0 {
            ctx.request_repaint();
        }
        if let Some((_, button)) = self.queue_button.as_mut() {
            button.poll(now);
        }
        if self.search_debounce.fire(now) {
            self.browser.apply_filters(&self.filter_form);
        }
        self.browser.prune_notices(now);
        self.uploads_left = MAX_UPLOADS_PER_FRAME;

        // ---- paint ----
        eg::TopBottomPanel::top("stats_bar").show(ctx, |ui| {
            self.ui_render_stats(ui, ctx);
        });
        eg::TopBottomPanel::top("filter_bar").show(ctx, |ui| {
            self.ui_render_filters(ui);
            self.ui_render_bulk_bar(ui);
        });
        eg::TopBottomPanel::bottom("pagination").show(ctx, |ui| {
            self.ui_render_pagination(ui);
        });
        eg::CentralPanel::default().show(ctx, |ui| {
            self.ui_render_table(ui, ctx);
        });

        self.ui_render_modals(ctx);
        self.ui_render_detail_window(ctx);
        self.ui_render_notices(ctx);

        let busy = self.browser.in_flight() > 0 || self.thumbs.pending() > 0;
        if busy {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(self.next_repaint(now));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.browser.teardown();
        info!("scene browser closed");
    }
}
