// src/app/queue_button.rs: "add to want-list" button behaviour
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::api::{ApiError, QueueApi, QueueTarget};

pub const RESET_AFTER: Duration = Duration::from_millis(2000);

pub const PENDING_LABEL: &str = "Adding…";
pub const SUCCESS_LABEL: &str = "Added!";
pub const FAILED_LABEL: &str = "Failed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueButtonState {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonStyle {
    Outline,
    Positive,
    Negative,
}

/// Self-contained want-list button, independent of the scene table.
///
/// The request runs on its own thread; the outcome and the 2 s cosmetic
/// reset are both applied from [`AddToQueueButton::poll`]. Dropping the
/// button drops the receiver, which abandons any pending result.
pub struct AddToQueueButton {
    target: QueueTarget,
    label: String,
    state: QueueButtonState,
    rx: Option<Receiver<Result<Option<String>, ApiError>>>,
    reset_at: Option<Instant>,
}

impl AddToQueueButton {
    pub fn new(target: QueueTarget, label: impl Into<String>) -> Self {
        Self {
            target,
            label: label.into(),
            state: QueueButtonState::Idle,
            rx: None,
            reset_at: None,
        }
    }

    pub fn target(&self) -> &QueueTarget {
        &self.target
    }

    pub fn state(&self) -> QueueButtonState {
        self.state
    }

    pub fn enabled(&self) -> bool {
        self.state == QueueButtonState::Idle
    }

    pub fn label(&self) -> &str {
        match self.state {
            QueueButtonState::Idle => &self.label,
            QueueButtonState::Pending => PENDING_LABEL,
            QueueButtonState::Succeeded => SUCCESS_LABEL,
            QueueButtonState::Failed => FAILED_LABEL,
        }
    }

    pub fn style(&self) -> ButtonStyle {
        match self.state {
            QueueButtonState::Idle | QueueButtonState::Pending => ButtonStyle::Outline,
            QueueButtonState::Succeeded => ButtonStyle::Positive,
            QueueButtonState::Failed => ButtonStyle::Negative,
        }
    }

    /// Starts the request. Ignored (returns false) unless the button is idle.
    pub fn click(&mut self, api: Arc<dyn QueueApi>) -> bool {
        if self.state != QueueButtonState::Idle {
            return false;
        }
        let (tx, rx) = mpsc::channel();
        let target = self.target.clone();
        let spawned = std::thread::Builder::new()
            .name("queue-add".into())
            .spawn(move || {
                let _ = tx.send(api.add_to_queue(&target));
            });
        match spawned {
            Ok(_) => {
                self.state = QueueButtonState::Pending;
                self.rx = Some(rx);
                true
            }
            Err(err) => {
                warn!("could not start queue request: {err}");
                self.finish(false, Instant::now());
                true
            }
        }
    }

    /// Applies a finished request and the timed reset. Returns true when the
    /// visible state changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if let Some(rx) = self.rx.as_ref() {
            let outcome = match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(ApiError::Unavailable(
                    "queue request ended without a result".into(),
                ))),
            };
            if let Some(result) = outcome {
                self.rx = None;
                match result {
                    Ok(_) => {
                        info!("queued \"{}\"", self.target.title());
                        self.finish(true, now);
                    }
                    Err(err) => {
                        warn!("adding \"{}\" to queue failed: {err}", self.target.title());
                        self.finish(false, now);
                    }
                }
                return true;
            }
        }
        if self.reset_at.is_some_and(|at| now >= at) {
            self.reset_at = None;
            self.state = QueueButtonState::Idle;
            return true;
        }
        false
    }

    /// Time left before the next visible change, for repaint scheduling.
    pub fn next_change_in(&self, now: Instant) -> Option<Duration> {
        self.reset_at.map(|at| at.saturating_duration_since(now))
    }

    fn finish(&mut self, ok: bool, now: Instant) {
        self.state = if ok {
            QueueButtonState::Succeeded
        } else {
            QueueButtonState::Failed
        };
        self.reset_at = Some(now + RESET_AFTER);
    }
}
