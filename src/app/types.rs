// src/app/types.rs
use std::time::{Duration, Instant};

use crate::api::{
    ApiError, BulkOutcome, ExceptionKind, SceneDetail, SceneId, ScenePage, StatsSummary,
};

pub const NOTICE_TTL: Duration = Duration::from_secs(5);

// ---- cross-thread messages ----
pub enum ApiEvent {
    /// Periodic refresh tick; not a response.
    StatsDue,
    Stats {
        seq: u64,
        result: Result<StatsSummary, ApiError>,
    },
    Scenes {
        seq: u64,
        page: u32,
        result: Result<ScenePage, ApiError>,
    },
    Detail {
        id: SceneId,
        result: Result<SceneDetail, ApiError>,
    },
    ExceptionCreated(Result<Option<String>, ApiError>),
    BulkCreated(Result<BulkOutcome, ApiError>),
    CleanedUp(Result<Option<String>, ApiError>),
}

impl ApiEvent {
    pub const fn is_response(&self) -> bool {
        !matches!(self, Self::StatsDue)
    }
}

// ---- modal windows ----
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modal {
    Exception { scene_id: SceneId },
    BulkException,
    Cleanup,
    SceneDetails,
}

// ---- toast notifications ----
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub created: Instant,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= NOTICE_TTL
    }
}

/// Fields of the single and bulk exception dialogs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExceptionForm {
    pub kind: ExceptionKind,
    pub reason: String,
    pub add_to_queue: bool,
    pub expires_at: String,
}

impl ExceptionForm {
    /// Every switch to temporary starts from a fresh default expiry; switching
    /// back hides it.
    pub fn set_kind(&mut self, kind: ExceptionKind, default_expiry: impl FnOnce() -> String) {
        self.kind = kind;
        match kind {
            ExceptionKind::Temporary => self.expires_at = default_expiry(),
            ExceptionKind::Permanent => self.expires_at.clear(),
        }
    }

    pub fn expires_at(&self) -> Option<String> {
        let v = self.expires_at.trim();
        (self.kind == ExceptionKind::Temporary && !v.is_empty()).then(|| v.to_string())
    }

    /// Temporary exceptions need an expiry before they can be submitted.
    pub fn is_submittable(&self) -> bool {
        self.kind == ExceptionKind::Permanent || self.expires_at().is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportLink {
    pub url: String,
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporary_kind_prefills_expiry() {
        let mut form = ExceptionForm::default();
        assert!(form.is_submittable());
        form.set_kind(ExceptionKind::Temporary, || "2030-01-01T00:00".into());
        assert_eq!(form.expires_at().as_deref(), Some("2030-01-01T00:00"));

        form.expires_at = "  ".into();
        assert!(!form.is_submittable());

        form.set_kind(ExceptionKind::Permanent, || unreachable!());
        assert_eq!(form.expires_at(), None);
        assert!(form.is_submittable());
    }

    #[test]
    fn switching_back_to_temporary_resets_expiry() {
        let mut form = ExceptionForm::default();
        form.set_kind(ExceptionKind::Temporary, || "2030-01-01T00:00".into());
        form.expires_at = "2031-06-15T12:00".into();
        form.set_kind(ExceptionKind::Temporary, || "2030-02-01T00:00".into());
        assert_eq!(form.expires_at().as_deref(), Some("2030-02-01T00:00"));
    }

    #[test]
    fn notice_expires_after_ttl() {
        let created = Instant::now();
        let notice = Notice {
            kind: NoticeKind::Success,
            text: "done".into(),
            created,
        };
        assert!(!notice.is_expired(created + NOTICE_TTL - Duration::from_millis(1)));
        assert!(notice.is_expired(created + NOTICE_TTL));
    }
}
