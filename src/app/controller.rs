// src/app/controller.rs: scene browsing state + request orchestration
use std::collections::BTreeSet;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::api::{
    BulkExceptionRequest, ExceptionKind, ExceptionRequest, Pagination, SceneApi, SceneDetail,
    SceneId, SceneSummary, StatsSummary,
};
use crate::app::filters::{self, FilterCriteria, FilterForm};
use crate::app::scheduled::RepeatingTask;
use crate::app::types::{ApiEvent, ExportLink, Modal, Notice, NoticeKind};
use crate::app::utils;
use crate::app::view::{self, PageItem, TableView};

pub const PAGE_SIZE: u32 = 20;

struct RefreshRound {
    stats_seq: u64,
    stats_done: bool,
    listing_seq: u64,
    listing_ok: Option<bool>,
}

/// Owns pagination, filter and selection state for one browser view and
/// issues every request against the scene API.
///
/// Requests run on short-lived worker threads; their results come back over
/// a channel and are applied by [`SceneBrowser::poll`] on the UI thread.
pub struct SceneBrowser {
    api: Arc<dyn SceneApi>,
    tx: Sender<ApiEvent>,
    rx: Receiver<ApiEvent>,
    in_flight: usize,

    current_page: u32,
    page_size: u32,
    filters: FilterCriteria,
    selected: BTreeSet<SceneId>,
    stats: Option<StatsSummary>,
    stats_seq: u64,

    scenes: Vec<SceneSummary>,
    pagination: Option<Pagination>,
    listing_seq: u64,
    loading: bool,

    detail: Option<SceneDetail>,
    modal: Option<Modal>,
    notices: Vec<Notice>,

    initialized: bool,
    awaiting_first_page: bool,
    refresh: Option<RefreshRound>,
    auto_refresh: Option<RepeatingTask>,
}

impl SceneBrowser {
    pub fn new(api: Arc<dyn SceneApi>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            tx,
            rx,
            in_flight: 0,
            current_page: 1,
            page_size: PAGE_SIZE,
            filters: FilterCriteria::new(),
            selected: BTreeSet::new(),
            stats: None,
            stats_seq: 0,
            scenes: Vec::new(),
            pagination: None,
            listing_seq: 0,
            loading: false,
            detail: None,
            modal: None,
            notices: Vec::new(),
            initialized: false,
            awaiting_first_page: false,
            refresh: None,
            auto_refresh: None,
        }
    }

    // ---- lifecycle ----

    /// Stats first, then page 1 once stats have answered; arms the periodic
    /// stats refresh. Runs once.
    pub fn initialize(&mut self, stats_every: Duration) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.awaiting_first_page = true;
        self.load_stats();

        let tx = self.tx.clone();
        match RepeatingTask::spawn("stats-refresh", stats_every, move || {
            let _ = tx.send(ApiEvent::StatsDue);
        }) {
            Ok(task) => self.auto_refresh = Some(task),
            Err(err) => warn!("stats auto-refresh unavailable: {err}"),
        }
        info!("scene browser initialised");
    }

    /// Stops the periodic refresh. In-flight requests are abandoned.
    pub fn teardown(&mut self) {
        if let Some(mut task) = self.auto_refresh.take() {
            task.cancel();
        }
    }

    pub fn auto_refresh_armed(&self) -> bool {
        self.auto_refresh.as_ref().is_some_and(RepeatingTask::is_running)
    }

    // ---- request plumbing ----

    fn dispatch<F>(&mut self, what: &'static str, job: F)
    where
        F: FnOnce(&dyn SceneApi) -> ApiEvent + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("api-{what}"))
            .spawn(move || {
                let _ = tx.send(job(api.as_ref()));
            });
        match spawned {
            Ok(_) => {
                self.in_flight += 1;
                debug!("{what} request started ({} in flight)", self.in_flight);
            }
            Err(err) => {
                error!("could not start {what} request: {err}");
                self.notify(NoticeKind::Error, format!("Could not start request: {err}"));
            }
        }
    }

    /// Apply every finished request. Returns how many events were handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0usize;
        loop {
            match self.rx.try_recv() {
                Ok(ev) => {
                    self.handle(ev);
                    handled += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        handled
    }

    /// Block until no request is in flight (or `timeout` passes), applying
    /// results as they arrive. Returns true when idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if self.in_flight == 0 {
                return true;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            match self.rx.recv_timeout(left) {
                Ok(ev) => self.handle(ev),
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => return self.in_flight == 0,
            }
        }
    }

    fn handle(&mut self, ev: ApiEvent) {
        if ev.is_response() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        match ev {
            ApiEvent::StatsDue => self.load_stats(),
            ApiEvent::Stats { seq, result } => {
                match result {
                    Ok(stats) => self.stats = Some(stats),
                    Err(err) => warn!("Failed to load stats: {err}"),
                }
                if let Some(round) = self.refresh.as_mut().filter(|r| r.stats_seq == seq) {
                    round.stats_done = true;
                }
                self.finish_refresh_if_done();
                if std::mem::take(&mut self.awaiting_first_page) {
                    self.load_filtered_scenes(1);
                }
            }
            ApiEvent::Scenes { seq, page, result } => {
                if let Some(round) = self.refresh.as_mut().filter(|r| r.listing_seq == seq) {
                    round.listing_ok = Some(result.is_ok());
                }
                if seq != self.listing_seq {
                    debug!("dropping superseded listing #{seq}");
                } else {
                    self.loading = false;
                    match result {
                        Ok(data) => {
                            self.scenes = data.scenes;
                            self.pagination = Some(data.pagination);
                            self.current_page = page;
                        }
                        Err(err) => {
                            error!("Error loading filtered scenes: {err}");
                            self.notify(
                                NoticeKind::Error,
                                format!("Failed to load filtered scenes: {err}"),
                            );
                        }
                    }
                }
                self.finish_refresh_if_done();
            }
            ApiEvent::Detail { id, result } => match result {
                Ok(detail) => {
                    self.detail = Some(detail);
                    self.modal = Some(Modal::SceneDetails);
                }
                Err(err) => {
                    error!("Error loading scene {id} details: {err}");
                    self.notify(
                        NoticeKind::Error,
                        format!("Failed to load scene details: {err}"),
                    );
                }
            },
            ApiEvent::ExceptionCreated(result) => match result {
                Ok(message) => {
                    self.notify(
                        NoticeKind::Success,
                        message.unwrap_or_else(|| "Exception created".to_string()),
                    );
                    if matches!(self.modal, Some(Modal::Exception { .. })) {
                        self.modal = None;
                    }
                    self.reload_after_mutation();
                }
                Err(err) => {
                    error!("Error creating exception: {err}");
                    self.notify(
                        NoticeKind::Error,
                        format!("Failed to create exception: {err}"),
                    );
                }
            },
            ApiEvent::BulkCreated(result) => match result {
                Ok(outcome) => {
                    self.notify(
                        NoticeKind::Success,
                        format!("{} exceptions created successfully", outcome.created_count),
                    );
                    for item in &outcome.errors {
                        warn!("Bulk exception error: {item}");
                    }
                    if self.modal == Some(Modal::BulkException) {
                        self.modal = None;
                    }
                    self.deselect_all();
                    self.reload_after_mutation();
                }
                Err(err) => {
                    error!("Error creating bulk exceptions: {err}");
                    self.notify(
                        NoticeKind::Error,
                        format!("Failed to create bulk exceptions: {err}"),
                    );
                }
            },
            ApiEvent::CleanedUp(result) => match result {
                Ok(message) => {
                    self.notify(
                        NoticeKind::Success,
                        message.unwrap_or_else(|| "Cleanup completed".to_string()),
                    );
                    if self.modal == Some(Modal::Cleanup) {
                        self.modal = None;
                    }
                    self.reload_after_mutation();
                }
                Err(err) => {
                    error!("Error during cleanup: {err}");
                    self.notify(NoticeKind::Error, format!("Cleanup failed: {err}"));
                }
            },
        }
    }

    fn reload_after_mutation(&mut self) {
        self.load_filtered_scenes(self.current_page);
        self.load_stats();
    }

    fn finish_refresh_if_done(&mut self) {
        let Some(round) = self.refresh.as_ref() else {
            return;
        };
        let Some(listing_ok) = round.listing_ok else {
            return;
        };
        if !round.stats_done {
            return;
        }
        self.refresh = None;
        if listing_ok {
            self.notify(NoticeKind::Success, "Data refreshed successfully");
        }
    }

    // ---- loading ----

    /// Errors are logged only; the previous stats stay on screen.
    pub fn load_stats(&mut self) {
        self.stats_seq += 1;
        let seq = self.stats_seq;
        self.dispatch("stats", move |api| ApiEvent::Stats {
            seq,
            result: api.stats(),
        });
    }

    pub fn load_filtered_scenes(&mut self, page: u32) {
        let page = page.max(1);
        self.listing_seq += 1;
        let seq = self.listing_seq;
        let query = filters::listing_query(&self.filters, page, self.page_size);
        self.loading = true;
        self.dispatch("scenes", move |api| ApiEvent::Scenes {
            seq,
            page,
            result: api.list_scenes(&query),
        });
    }

    pub fn apply_filters(&mut self, form: &FilterForm) {
        self.filters = form.criteria();
        self.load_filtered_scenes(1);
    }

    pub fn clear_filters(&mut self, form: &mut FilterForm) {
        form.reset();
        self.filters.clear();
        self.load_filtered_scenes(1);
    }

    /// Stats and the current page at once; one success notice when both land.
    pub fn refresh_data(&mut self) {
        if self.refresh.is_some() {
            return;
        }
        self.load_stats();
        self.load_filtered_scenes(self.current_page);
        self.refresh = Some(RefreshRound {
            stats_seq: self.stats_seq,
            stats_done: false,
            listing_seq: self.listing_seq,
            listing_ok: None,
        });
    }

    // ---- selection ----

    pub fn toggle_scene_selection(&mut self, id: SceneId) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Select every scene on the page, or clear the set when they already are.
    pub fn toggle_select_all(&mut self) {
        if self.select_all_checked() {
            self.selected.clear();
        } else {
            self.selected.extend(self.scenes.iter().map(|s| s.id));
        }
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn select_all_checked(&self) -> bool {
        !self.scenes.is_empty() && self.scenes.iter().all(|s| self.selected.contains(&s.id))
    }

    pub fn bulk_bar_visible(&self) -> bool {
        !self.selected.is_empty()
    }

    // ---- exceptions ----

    pub fn open_exception_modal(&mut self, scene_id: SceneId) {
        self.modal = Some(Modal::Exception { scene_id });
    }

    pub fn open_bulk_exception_modal(&mut self) {
        if self.selected.is_empty() {
            self.notify(NoticeKind::Error, "Please select at least one scene");
            return;
        }
        self.modal = Some(Modal::BulkException);
    }

    /// `expires_at` is forwarded only for temporary exceptions; the form is
    /// responsible for supplying it.
    pub fn create_exception(
        &mut self,
        scene_id: SceneId,
        kind: ExceptionKind,
        reason: &str,
        add_to_queue: bool,
        expires_at: Option<String>,
    ) {
        let request = ExceptionRequest::new(kind, reason, add_to_queue, expires_at);
        self.dispatch("exception", move |api| {
            ApiEvent::ExceptionCreated(api.create_exception(scene_id, &request))
        });
    }

    /// Returns false (and notifies) without sending anything when nothing is selected.
    pub fn create_bulk_exceptions(
        &mut self,
        kind: ExceptionKind,
        reason: &str,
        add_to_queue: bool,
        expires_at: Option<String>,
    ) -> bool {
        if self.selected.is_empty() {
            self.notify(NoticeKind::Error, "No scenes selected");
            return false;
        }
        let request = BulkExceptionRequest {
            scene_ids: self.selected.iter().copied().collect(),
            exception: ExceptionRequest::new(kind, reason, add_to_queue, expires_at),
        };
        self.dispatch("bulk-exception", move |api| {
            ApiEvent::BulkCreated(api.create_bulk_exceptions(&request))
        });
        true
    }

    // ---- detail / maintenance ----

    /// Always refetches; details are never cached.
    pub fn show_scene_details(&mut self, id: SceneId) {
        self.dispatch("detail", move |api| ApiEvent::Detail {
            id,
            result: api.scene_detail(id),
        });
    }

    pub fn open_cleanup_modal(&mut self) {
        self.modal = Some(Modal::Cleanup);
    }

    pub fn perform_cleanup(&mut self, days_to_keep: u32) {
        self.dispatch("cleanup", move |api| ApiEvent::CleanedUp(api.cleanup(days_to_keep)));
    }

    /// URL + suggested filename for the CSV export. The caller navigates to it.
    pub fn export_data(&mut self) -> ExportLink {
        let url = self.api.export_url(&filters::export_query(&self.filters));
        let link = ExportLink {
            url,
            filename: utils::export_filename(utils::today_utc()),
        };
        info!("export requested: {} as {}", link.url, link.filename);
        self.notify(
            NoticeKind::Success,
            format!(
                "Export started. The file will download shortly ({}).",
                link.filename
            ),
        );
        link
    }

    pub fn close_modal(&mut self) {
        if self.modal == Some(Modal::SceneDetails) {
            self.detail = None;
        }
        self.modal = None;
    }

    // ---- notifications ----

    pub fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            NoticeKind::Error => warn!("notice: {text}"),
            NoticeKind::Success => debug!("notice: {text}"),
        }
        self.notices.push(Notice {
            kind,
            text,
            created: Instant::now(),
        });
    }

    pub fn dismiss_notice(&mut self, idx: usize) {
        if idx < self.notices.len() {
            self.notices.remove(idx);
        }
    }

    pub fn prune_notices(&mut self, now: Instant) {
        self.notices.retain(|n| !n.is_expired(now));
    }

    // ---- read access for the view ----

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn selected(&self) -> &BTreeSet<SceneId> {
        &self.selected
    }

    pub fn stats(&self) -> Option<&StatsSummary> {
        self.stats.as_ref()
    }

    pub fn scenes(&self) -> &[SceneSummary] {
        &self.scenes
    }

    pub fn scene(&self, id: SceneId) -> Option<&SceneSummary> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn detail(&self) -> Option<&SceneDetail> {
        self.detail.as_ref()
    }

    pub fn modal(&self) -> Option<Modal> {
        self.modal
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn table(&self) -> TableView {
        view::build_table(&self.scenes, &self.selected)
    }

    pub fn page_items(&self) -> Vec<PageItem> {
        self.pagination
            .as_ref()
            .map(view::pagination_items)
            .unwrap_or_default()
    }
}

impl Drop for SceneBrowser {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, BulkOutcome, ScenePage};
    use crate::app::types::NOTICE_TTL;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        page: ScenePage,
        bulk: BulkOutcome,
        /// Listing answers `[page * 100]` for whichever page was asked.
        numbered_pages: bool,
        slow_page: Option<u32>,
        stats_delays_ms: Mutex<VecDeque<u64>>,
        fail_stats: AtomicBool,
        fail_list: bool,
        fail_detail: bool,
        fail_exception: bool,
        fail_bulk: bool,
        fail_cleanup: bool,
    }

    impl FakeApi {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl SceneApi for FakeApi {
        fn stats(&self) -> Result<StatsSummary, ApiError> {
            self.record("stats".into());
            let delay = self.stats_delays_ms.lock().unwrap().pop_front();
            if let Some(ms) = delay {
                thread::sleep(Duration::from_millis(ms));
            }
            if self.fail_stats.load(Ordering::SeqCst) {
                return Err(ApiError::Rejected("stats down".into()));
            }
            Ok(StatsSummary {
                total_filtered: 42,
                ..Default::default()
            })
        }

        fn list_scenes(&self, query: &str) -> Result<ScenePage, ApiError> {
            self.record(format!("list?{query}"));
            let page: u32 = query
                .split('&')
                .find_map(|kv| kv.strip_prefix("page="))
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            if self.slow_page == Some(page) {
                thread::sleep(Duration::from_millis(300));
            }
            if self.fail_list {
                return Err(ApiError::Http {
                    status: 500,
                    message: "boom".into(),
                });
            }
            if self.numbered_pages {
                let mut numbered = page_of(&[SceneId::from(page) * 100]);
                numbered.pagination.page = page;
                return Ok(numbered);
            }
            Ok(self.page.clone())
        }

        fn scene_detail(&self, id: SceneId) -> Result<SceneDetail, ApiError> {
            self.record(format!("detail/{id}"));
            if self.fail_detail {
                return Err(ApiError::Rejected("scene gone".into()));
            }
            Ok(SceneDetail {
                summary: SceneSummary {
                    id,
                    ..Default::default()
                },
                ..Default::default()
            })
        }

        fn create_exception(
            &self,
            id: SceneId,
            request: &ExceptionRequest,
        ) -> Result<Option<String>, ApiError> {
            let body = serde_json::to_string(request).unwrap();
            self.record(format!("exception/{id} {body}"));
            if self.fail_exception {
                return Err(ApiError::Rejected("scene locked".into()));
            }
            Ok(Some("Exception created".into()))
        }

        fn create_bulk_exceptions(
            &self,
            request: &BulkExceptionRequest,
        ) -> Result<BulkOutcome, ApiError> {
            let body = serde_json::to_string(request).unwrap();
            self.record(format!("bulk {body}"));
            if self.fail_bulk {
                return Err(ApiError::Rejected("queue offline".into()));
            }
            Ok(self.bulk.clone())
        }

        fn cleanup(&self, days_to_keep: u32) -> Result<Option<String>, ApiError> {
            self.record(format!("cleanup {days_to_keep}"));
            if self.fail_cleanup {
                return Err(ApiError::Rejected("database busy".into()));
            }
            Ok(Some("Removed 12 records".into()))
        }

        fn export_url(&self, query: &str) -> String {
            format!("http://backend/api/filtered-scenes?{query}")
        }
    }

    fn scenes(ids: &[SceneId]) -> Vec<SceneSummary> {
        ids.iter()
            .map(|&id| SceneSummary {
                id,
                title: format!("Scene {id}"),
                filter_reason: "unwanted_tags".into(),
                ..Default::default()
            })
            .collect()
    }

    fn page_of(ids: &[SceneId]) -> ScenePage {
        ScenePage {
            scenes: scenes(ids),
            pagination: Pagination {
                page: 1,
                pages: 1,
                total: ids.len() as u64,
                has_prev: false,
                has_next: false,
            },
        }
    }

    fn browser(api: FakeApi) -> (SceneBrowser, Arc<FakeApi>) {
        let api = Arc::new(api);
        let shared: Arc<dyn SceneApi> = api.clone();
        (SceneBrowser::new(shared), api)
    }

    fn calls(api: &FakeApi) -> Vec<String> {
        api.calls.lock().unwrap().clone()
    }

    fn notices_of(b: &SceneBrowser, kind: NoticeKind) -> Vec<String> {
        b.notices()
            .iter()
            .filter(|n| n.kind == kind)
            .map(|n| n.text.clone())
            .collect()
    }

    #[test]
    fn empty_form_clears_filters_and_loads_page_one() {
        let (mut b, api) = browser(FakeApi::default());
        b.apply_filters(&FilterForm::default());
        assert!(b.wait_idle(WAIT));
        assert!(b.filters().is_empty());
        assert_eq!(calls(&api), vec!["list?page=1&per_page=20".to_string()]);
        assert_eq!(b.current_page(), 1);
    }

    #[test]
    fn search_filter_reaches_query_string() {
        let (mut b, api) = browser(FakeApi::default());
        let form = FilterForm {
            search: "foo".into(),
            exception_status: "   ".into(),
            ..Default::default()
        };
        b.apply_filters(&form);
        assert!(b.wait_idle(WAIT));
        let listed = calls(&api);
        assert!(listed[0].contains("search=foo&page=1&per_page=20"), "{listed:?}");
        assert!(!listed[0].contains("exception_status"));
    }

    #[test]
    fn clear_filters_resets_form() {
        let (mut b, _api) = browser(FakeApi::default());
        let mut form = FilterForm {
            search: "foo".into(),
            ..Default::default()
        };
        b.apply_filters(&form);
        b.clear_filters(&mut form);
        assert!(b.wait_idle(WAIT));
        assert_eq!(form, FilterForm::default());
        assert!(b.filters().is_empty());
    }

    #[test]
    fn toggling_twice_restores_selection() {
        let (mut b, _api) = browser(FakeApi::default());
        b.toggle_scene_selection(5);
        let before = b.selected().clone();
        b.toggle_scene_selection(9);
        b.toggle_scene_selection(9);
        assert_eq!(b.selected(), &before);
        assert!(b.bulk_bar_visible());
    }

    #[test]
    fn select_all_then_deselect_all_empties_selection() {
        let (mut b, _api) = browser(FakeApi {
            page: page_of(&[1, 2, 3]),
            ..Default::default()
        });
        b.load_filtered_scenes(1);
        assert!(b.wait_idle(WAIT));

        b.toggle_select_all();
        assert_eq!(b.selected().len(), 3);
        assert!(b.select_all_checked());

        b.deselect_all();
        assert!(b.selected().is_empty());
        assert!(!b.bulk_bar_visible());
        let TableView::Rows(rows) = b.table() else {
            panic!("expected rows");
        };
        assert!(rows.iter().all(|r| !r.checked));
    }

    #[test]
    fn bulk_with_empty_selection_sends_nothing() {
        let (mut b, api) = browser(FakeApi::default());
        let sent = b.create_bulk_exceptions(ExceptionKind::Permanent, "ok", false, None);
        assert!(!sent);
        assert!(b.wait_idle(WAIT));
        assert!(calls(&api).is_empty());
        assert_eq!(notices_of(&b, NoticeKind::Error), vec!["No scenes selected"]);
    }

    #[test]
    fn empty_listing_shows_empty_state() {
        let (mut b, _api) = browser(FakeApi {
            page: page_of(&[]),
            ..Default::default()
        });
        b.load_filtered_scenes(1);
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.table(), TableView::Empty);
        assert!(b.page_items().is_empty());
    }

    #[test]
    fn expiry_only_sent_for_temporary() {
        let (mut b, api) = browser(FakeApi::default());
        b.create_exception(4, ExceptionKind::Permanent, "keep", false, Some("2030-01-01T00:00".into()));
        assert!(b.wait_idle(WAIT));
        b.create_exception(4, ExceptionKind::Temporary, "trial", true, Some("2030-01-01T00:00".into()));
        assert!(b.wait_idle(WAIT));

        let sent: Vec<String> = calls(&api)
            .into_iter()
            .filter(|c| c.starts_with("exception/4"))
            .collect();
        assert_eq!(sent.len(), 2);
        assert!(!sent[0].contains("expires_at"));
        assert!(sent[1].contains("\"expires_at\":\"2030-01-01T00:00\""));
    }

    #[test]
    fn bulk_success_reports_count_and_logs_errors() {
        let (mut b, api) = browser(FakeApi {
            page: page_of(&[7, 8, 9]),
            bulk: BulkOutcome {
                created_count: 3,
                errors: vec!["id 9 not found".into()],
            },
            ..Default::default()
        });
        b.load_filtered_scenes(1);
        assert!(b.wait_idle(WAIT));
        b.toggle_select_all();
        b.open_bulk_exception_modal();
        assert_eq!(b.modal(), Some(Modal::BulkException));

        assert!(b.create_bulk_exceptions(ExceptionKind::Permanent, "approved", true, None));
        assert!(b.wait_idle(WAIT));

        assert_eq!(
            notices_of(&b, NoticeKind::Success),
            vec!["3 exceptions created successfully"]
        );
        assert!(notices_of(&b, NoticeKind::Error).is_empty());
        assert!(b.selected().is_empty());
        assert_eq!(b.modal(), None);

        let log = calls(&api);
        assert!(log.iter().any(|c| c.starts_with("bulk") && c.contains("\"scene_ids\":[7,8,9]")));
        assert_eq!(log.iter().filter(|c| c.starts_with("list?")).count(), 2);
        assert!(log.iter().any(|c| c == "stats"));
    }

    #[test]
    fn failed_exception_keeps_modal_open() {
        let (mut b, _api) = browser(FakeApi {
            fail_exception: true,
            ..Default::default()
        });
        b.open_exception_modal(3);
        b.create_exception(3, ExceptionKind::Permanent, "x", false, None);
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.modal(), Some(Modal::Exception { scene_id: 3 }));
        assert_eq!(
            notices_of(&b, NoticeKind::Error),
            vec!["Failed to create exception: scene locked"]
        );
    }

    #[test]
    fn successful_exception_closes_modal_and_reloads() {
        let (mut b, api) = browser(FakeApi::default());
        b.open_exception_modal(3);
        b.create_exception(3, ExceptionKind::Permanent, "x", false, None);
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.modal(), None);
        let log = calls(&api);
        assert!(log.iter().any(|c| c.starts_with("list?")));
        assert!(log.iter().any(|c| c == "stats"));
    }

    #[test]
    fn stats_failure_is_silent_and_keeps_previous() {
        let (mut b, api) = browser(FakeApi::default());
        b.load_stats();
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.stats().map(|s| s.total_filtered), Some(42));

        api.fail_stats.store(true, Ordering::SeqCst);
        b.load_stats();
        assert!(b.wait_idle(WAIT));
        assert_eq!(calls(&api), vec!["stats".to_string(), "stats".to_string()]);
        assert_eq!(b.stats().map(|s| s.total_filtered), Some(42));
        assert!(b.notices().is_empty());
    }

    #[test]
    fn superseded_listing_is_dropped() {
        let (mut b, _api) = browser(FakeApi {
            numbered_pages: true,
            slow_page: Some(1),
            ..Default::default()
        });
        b.load_filtered_scenes(1);
        b.load_filtered_scenes(2);
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.current_page(), 2);
        assert_eq!(b.scenes().first().map(|s| s.id), Some(200));
        assert_eq!(b.scenes().len(), 1);
        assert!(!b.is_loading());
    }

    #[test]
    fn refresh_waits_for_its_own_stats_request() {
        let (mut b, api) = browser(FakeApi {
            page: page_of(&[1]),
            stats_delays_ms: Mutex::new(VecDeque::from([150, 600])),
            ..Default::default()
        });
        b.load_stats();
        thread::sleep(Duration::from_millis(50));
        b.refresh_data();

        let deadline = Instant::now() + WAIT;
        while b.in_flight() > 1 && Instant::now() < deadline {
            b.poll();
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(b.in_flight(), 1);
        assert!(b.is_refreshing());
        assert!(notices_of(&b, NoticeKind::Success).is_empty());

        assert!(b.wait_idle(WAIT));
        assert!(!b.is_refreshing());
        assert_eq!(
            notices_of(&b, NoticeKind::Success),
            vec!["Data refreshed successfully"]
        );
        assert_eq!(calls(&api).iter().filter(|c| *c == "stats").count(), 2);
    }

    #[test]
    fn failed_mutations_and_details_surface_errors() {
        let (mut b, _api) = browser(FakeApi {
            fail_detail: true,
            fail_bulk: true,
            fail_cleanup: true,
            ..Default::default()
        });
        b.show_scene_details(5);
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.modal(), None);
        assert!(b.detail().is_none());

        b.toggle_scene_selection(5);
        b.open_bulk_exception_modal();
        assert!(b.create_bulk_exceptions(ExceptionKind::Permanent, "ok", false, None));
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.modal(), Some(Modal::BulkException));
        assert!(b.selected().contains(&5));

        b.open_cleanup_modal();
        b.perform_cleanup(30);
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.modal(), Some(Modal::Cleanup));

        assert_eq!(
            notices_of(&b, NoticeKind::Error),
            vec![
                "Failed to load scene details: scene gone",
                "Failed to create bulk exceptions: queue offline",
                "Cleanup failed: database busy",
            ]
        );
        assert!(notices_of(&b, NoticeKind::Success).is_empty());
    }

    #[test]
    fn notices_expire_after_five_seconds() {
        let (mut b, _api) = browser(FakeApi::default());
        b.notify(NoticeKind::Success, "saved");
        b.notify(NoticeKind::Error, "broken");
        let now = Instant::now();
        b.prune_notices(now);
        assert_eq!(b.notices().len(), 2);

        b.dismiss_notice(0);
        assert_eq!(notices_of(&b, NoticeKind::Error), vec!["broken"]);

        b.prune_notices(now + NOTICE_TTL);
        assert!(b.notices().is_empty());
    }

    #[test]
    fn listing_failure_surfaces_error_and_keeps_table() {
        let (mut b, _api) = browser(FakeApi {
            fail_list: true,
            ..Default::default()
        });
        b.load_filtered_scenes(3);
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.current_page(), 1);
        assert!(!b.is_loading());
        let errors = notices_of(&b, NoticeKind::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Failed to load filtered scenes"));
    }

    #[test]
    fn details_always_refetch() {
        let (mut b, api) = browser(FakeApi::default());
        b.show_scene_details(11);
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.modal(), Some(Modal::SceneDetails));
        assert_eq!(b.detail().map(|d| d.summary.id), Some(11));
        b.close_modal();
        assert!(b.detail().is_none());

        b.show_scene_details(11);
        assert!(b.wait_idle(WAIT));
        let fetched = calls(&api).iter().filter(|c| *c == "detail/11").count();
        assert_eq!(fetched, 2);
    }

    #[test]
    fn cleanup_reloads_and_reports() {
        let (mut b, api) = browser(FakeApi::default());
        b.open_cleanup_modal();
        b.perform_cleanup(30);
        assert!(b.wait_idle(WAIT));
        assert_eq!(b.modal(), None);
        assert_eq!(notices_of(&b, NoticeKind::Success), vec!["Removed 12 records"]);
        assert!(calls(&api).contains(&"cleanup 30".to_string()));
    }

    #[test]
    fn refresh_runs_both_and_reports_once() {
        let (mut b, api) = browser(FakeApi {
            page: page_of(&[1]),
            ..Default::default()
        });
        b.refresh_data();
        assert!(b.is_refreshing());
        b.refresh_data();
        assert!(b.wait_idle(WAIT));
        assert!(!b.is_refreshing());
        assert_eq!(calls(&api).len(), 2);
        assert_eq!(
            notices_of(&b, NoticeKind::Success),
            vec!["Data refreshed successfully"]
        );
    }

    #[test]
    fn export_link_carries_filters() {
        let (mut b, api) = browser(FakeApi::default());
        b.apply_filters(&FilterForm {
            filter_reason: "date_range".into(),
            ..Default::default()
        });
        assert!(b.wait_idle(WAIT));
        let link = b.export_data();
        assert_eq!(
            link.url,
            "http://backend/api/filtered-scenes?filter_reason=date_range&export=true"
        );
        assert!(link.filename.starts_with("filtered-scenes-"));
        assert!(link.filename.ends_with(".csv"));
        assert_eq!(
            notices_of(&b, NoticeKind::Success),
            vec![format!(
                "Export started. The file will download shortly ({}).",
                link.filename
            )]
        );
        assert_eq!(calls(&api).len(), 1);
    }

    #[test]
    fn initialize_loads_stats_then_first_page_and_teardown_disarms() {
        let (mut b, api) = browser(FakeApi::default());
        b.initialize(Duration::from_secs(3600));
        assert!(b.auto_refresh_armed());
        assert!(b.wait_idle(WAIT));
        assert_eq!(
            calls(&api),
            vec!["stats".to_string(), "list?page=1&per_page=20".to_string()]
        );
        b.teardown();
        assert!(!b.auto_refresh_armed());
    }

    #[test]
    fn periodic_tick_reloads_stats() {
        let (mut b, api) = browser(FakeApi::default());
        b.initialize(Duration::from_millis(20));
        assert!(b.wait_idle(WAIT));
        thread::sleep(Duration::from_millis(120));
        assert!(b.wait_idle(WAIT));
        b.teardown();
        let stats_calls = calls(&api).iter().filter(|c| *c == "stats").count();
        assert!(stats_calls >= 2, "only {stats_calls} stats calls");
    }

    #[test]
    fn bulk_modal_requires_selection() {
        let (mut b, _api) = browser(FakeApi::default());
        b.open_bulk_exception_modal();
        assert_eq!(b.modal(), None);
        assert_eq!(
            notices_of(&b, NoticeKind::Error),
            vec!["Please select at least one scene"]
        );
    }
}
