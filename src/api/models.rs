use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use super::{ADD_SCENE_TO_QUEUE_PATH, ADD_TO_QUEUE_PATH};

pub type SceneId = i64;

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SceneSummary {
    pub id: SceneId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub performers: Vec<String>,
    #[serde(default)]
    pub studio: Option<String>,
    #[serde(default, alias = "duration")]
    pub duration_minutes: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filter_reason: String,
    #[serde(default)]
    pub filtered_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_exception: bool,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ExceptionRecord {
    #[serde(alias = "type", default, deserialize_with = "null_as_default")]
    pub exception_type: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SceneDetail {
    #[serde(flatten)]
    pub summary: SceneSummary,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub scene_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exceptions: Vec<ExceptionRecord>,
}

#[derive(Deserialize)]
pub(crate) struct DetailEnvelope {
    pub scene: SceneDetail,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub has_prev: bool,
    #[serde(default)]
    pub has_next: bool,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ScenePage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub scenes: Vec<SceneSummary>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ReasonCount {
    pub reason: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StatsSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_filtered: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_exceptions: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exception_rate: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filter_reasons: Vec<ReasonCount>,
}

impl StatsSummary {
    /// Server orders reasons by count, so the first one is the top reason.
    pub fn top_reason(&self) -> Option<&ReasonCount> {
        self.filter_reasons.first()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionKind {
    #[default]
    Permanent,
    Temporary,
}

impl ExceptionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Temporary => "temporary",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Permanent => "Permanent",
            Self::Temporary => "Temporary",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExceptionRequest {
    #[serde(rename = "type")]
    pub kind: ExceptionKind,
    pub reason: String,
    #[serde(rename = "add_to_whisparr")]
    pub add_to_queue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl ExceptionRequest {
    /// `expires_at` only travels with temporary exceptions.
    pub fn new(
        kind: ExceptionKind,
        reason: impl Into<String>,
        add_to_queue: bool,
        expires_at: Option<String>,
    ) -> Self {
        let expires_at = match kind {
            ExceptionKind::Temporary => expires_at,
            ExceptionKind::Permanent => None,
        };
        Self {
            kind,
            reason: reason.into(),
            add_to_queue,
            expires_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BulkExceptionRequest {
    pub scene_ids: Vec<SceneId>,
    #[serde(flatten)]
    pub exception: ExceptionRequest,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct BulkOutcome {
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct CleanupRequest {
    pub days_to_keep: u32,
}

/// Identifier scheme for a want-list request.
///
/// `Scene` keys by the stable scene identifier and is what new call sites use;
/// the other two keep the legacy endpoint shapes working.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueTarget {
    Scene { scene_id: String, title: String },
    WantedScene { scene_id: String, title: String },
    TitleYear { title: String, year: Option<i32> },
}

impl QueueTarget {
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::Scene { .. } => ADD_SCENE_TO_QUEUE_PATH,
            Self::WantedScene { .. } | Self::TitleYear { .. } => ADD_TO_QUEUE_PATH,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::Scene { scene_id, title } | Self::WantedScene { scene_id, title } => {
                json!({ "scene_id": scene_id, "title": title })
            }
            Self::TitleYear { title, year } => json!({ "title": title, "year": year }),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Scene { title, .. }
            | Self::WantedScene { title, .. }
            | Self::TitleYear { title, .. } => title,
        }
    }
}
