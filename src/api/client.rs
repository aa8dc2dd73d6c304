use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

use super::envelope::ApiResult;
use super::models::{
    BulkExceptionRequest, BulkOutcome, CleanupRequest, DetailEnvelope, ExceptionRequest,
    QueueTarget, SceneDetail, SceneId, ScenePage, StatsSummary,
};
use super::{
    ApiError, QueueApi, SceneApi, BULK_EXCEPTION_PATH, CLEANUP_PATH, SCENES_PATH, STATS_PATH,
};

/// Blocking JSON client for the backend. Cheap to share behind an `Arc`;
/// the inner reqwest client pools connections.
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("filtered-scenes/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .default_headers({
                let mut h = HeaderMap::new();
                h.insert(ACCEPT, HeaderValue::from_static("application/json"));
                h
            })
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> Result<ApiResult, ApiError> {
        let url = self.url(path);
        debug!("GET {url}");
        let resp = self.client.get(&url).send()?;
        Self::finish(resp)
    }

    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResult, ApiError> {
        let url = self.url(path);
        debug!("POST {url}");
        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(body)?)
            .send()?;
        Self::finish(resp)
    }

    fn finish(resp: Response) -> Result<ApiResult, ApiError> {
        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(ApiResult::from_response(status, &body))
    }
}

impl SceneApi for HttpApi {
    fn stats(&self) -> Result<StatsSummary, ApiError> {
        self.get(STATS_PATH)?.into_data()
    }

    fn list_scenes(&self, query: &str) -> Result<ScenePage, ApiError> {
        self.get(&format!("{SCENES_PATH}?{query}"))?.into_data()
    }

    fn scene_detail(&self, id: SceneId) -> Result<SceneDetail, ApiError> {
        let env: DetailEnvelope = self.get(&format!("{SCENES_PATH}/{id}"))?.into_data()?;
        Ok(env.scene)
    }

    fn create_exception(
        &self,
        id: SceneId,
        request: &ExceptionRequest,
    ) -> Result<Option<String>, ApiError> {
        let res = self
            .post(&format!("{SCENES_PATH}/{id}/exception"), request)?
            .check()?;
        Ok(res.message)
    }

    fn create_bulk_exceptions(
        &self,
        request: &BulkExceptionRequest,
    ) -> Result<BulkOutcome, ApiError> {
        self.post(BULK_EXCEPTION_PATH, request)?.into_data()
    }

    fn cleanup(&self, days_to_keep: u32) -> Result<Option<String>, ApiError> {
        let res = self
            .post(CLEANUP_PATH, &CleanupRequest { days_to_keep })?
            .check()?;
        Ok(res.message)
    }

    fn export_url(&self, query: &str) -> String {
        self.url(&format!("{SCENES_PATH}?{query}"))
    }
}

impl QueueApi for HttpApi {
    fn add_to_queue(&self, target: &QueueTarget) -> Result<Option<String>, ApiError> {
        let res = self.post(target.endpoint(), &target.body())?.check()?;
        Ok(res.message)
    }
}
