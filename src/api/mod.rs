//! HTTP boundary for the filtered-scenes backend and the want-list queue.
//!
//! Every endpoint answer is normalised into [`ApiResult`] before it reaches
//! the controller, so callers only ever see `Result<T, ApiError>`.

pub mod client;
pub mod envelope;
pub mod models;

pub use client::HttpApi;
pub use envelope::ApiResult;
pub use models::*;

pub const STATS_PATH: &str = "/api/filtered-scenes/stats";
pub const SCENES_PATH: &str = "/api/filtered-scenes";
pub const BULK_EXCEPTION_PATH: &str = "/api/filtered-scenes/bulk-exception";
pub const CLEANUP_PATH: &str = "/api/filtered-scenes/cleanup";
pub const ADD_SCENE_TO_QUEUE_PATH: &str = "/api/add-scene-to-whisparr";
pub const ADD_TO_QUEUE_PATH: &str = "/api/add-to-whisparr";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// Remote scene-management API consumed by the browser controller.
pub trait SceneApi: Send + Sync {
    fn stats(&self) -> Result<StatsSummary, ApiError>;

    /// `query` is an already-encoded query string without the leading `?`.
    fn list_scenes(&self, query: &str) -> Result<ScenePage, ApiError>;

    fn scene_detail(&self, id: SceneId) -> Result<SceneDetail, ApiError>;

    fn create_exception(
        &self,
        id: SceneId,
        request: &ExceptionRequest,
    ) -> Result<Option<String>, ApiError>;

    fn create_bulk_exceptions(
        &self,
        request: &BulkExceptionRequest,
    ) -> Result<BulkOutcome, ApiError>;

    fn cleanup(&self, days_to_keep: u32) -> Result<Option<String>, ApiError>;

    /// Absolute URL of the CSV export for `query`. Never fetched by us.
    fn export_url(&self, query: &str) -> String;
}

/// External want-list queue (Whisparr) reached through the backend.
pub trait QueueApi: Send + Sync {
    fn add_to_queue(&self, target: &QueueTarget) -> Result<Option<String>, ApiError>;
}
