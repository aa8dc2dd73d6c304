// src/app/prefetch.rs
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::app::cache;

type WorkItem = (String, String); // (key, url)

pub struct ThumbDone {
    pub key: String,
    pub result: Result<PathBuf, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ThumbState {
    Pending,
    Ready(PathBuf),
    Failed,
}

/// Fixed pool of download workers fed through one shared work channel.
///
/// `request` is idempotent per URL: a thumbnail is queued at most once per
/// session and its outcome is remembered, so scrolling back over a page
/// never re-downloads.
pub struct ThumbnailLoader {
    dir: PathBuf,
    work_tx: Option<Sender<WorkItem>>,
    done_rx: Option<Receiver<ThumbDone>>,
    states: HashMap<String, ThumbState>,
}

impl ThumbnailLoader {
    /// Honors `SCENES_DISABLE_THUMBNAILS`; a disabled loader accepts requests
    /// and does nothing.
    pub fn start(cache_root: PathBuf, workers: usize, timeout: Duration) -> Self {
        if std::env::var_os("SCENES_DISABLE_THUMBNAILS").is_some() {
            info!("thumbnails disabled via SCENES_DISABLE_THUMBNAILS");
            return Self::disabled(cache_root);
        }
        let dir = cache::prepare_thumb_dir(&cache_root);

        let client = match reqwest::blocking::Client::builder()
            .user_agent(concat!("filtered-scenes/", env!("CARGO_PKG_VERSION"), " thumbs"))
            .timeout(timeout)
            .pool_max_idle_per_host(workers.max(1))
            .default_headers({
                use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
                let mut h = HeaderMap::new();
                h.insert(
                    ACCEPT,
                    HeaderValue::from_static("image/avif,image/webp,image/*;q=0.8,*/*;q=0.5"),
                );
                h
            })
            .build()
        {
            Ok(c) => Arc::new(c),
            Err(e) => {
                warn!("thumbnail http client build failed: {e}");
                return Self::disabled(dir);
            }
        };

        let (work_tx, work_rx) = mpsc::channel::<WorkItem>();
        let (done_tx, done_rx) = mpsc::channel::<ThumbDone>();
        let work_rx = Arc::new(Mutex::new(work_rx));

        for n in 0..workers.max(1) {
            let work_rx = Arc::clone(&work_rx);
            let done_tx = done_tx.clone();
            let client = Arc::clone(&client);
            let dir = dir.clone();

            let spawned = std::thread::Builder::new()
                .name(format!("thumb-{n}"))
                .spawn(move || loop {
                    let job = {
                        let Ok(rx) = work_rx.lock() else { break };
                        rx.recv()
                    };
                    let Ok((key, url)) = job else { break };
                    let result = cache::download_thumbnail(&client, &dir, &url, &key);
                    if done_tx.send(ThumbDone { key, result }).is_err() {
                        break;
                    }
                });
            if let Err(e) = spawned {
                warn!("thumbnail worker {n} failed to start: {e}");
            }
        }
        debug!("thumbnail pool: {} workers, cache {}", workers.max(1), dir.display());

        Self {
            dir,
            work_tx: Some(work_tx),
            done_rx: Some(done_rx),
            states: HashMap::new(),
        }
    }

    pub fn disabled(dir: PathBuf) -> Self {
        Self {
            dir,
            work_tx: None,
            done_rx: None,
            states: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.work_tx.is_some()
    }

    /// Current state for `url`, queueing a download on first sight.
    pub fn request(&mut self, url: &str) -> Option<&ThumbState> {
        let work_tx = self.work_tx.as_ref()?;
        let key = cache::url_to_cache_key(url);
        if !self.states.contains_key(&key) {
            let state = match cache::find_cached(&self.dir, &key) {
                Some(path) => ThumbState::Ready(path),
                None => match work_tx.send((key.clone(), url.to_string())) {
                    Ok(()) => ThumbState::Pending,
                    Err(_) => ThumbState::Failed,
                },
            };
            self.states.insert(key.clone(), state);
        }
        self.states.get(&key)
    }

    /// Drain finished downloads. Returns how many arrived.
    pub fn poll(&mut self) -> usize {
        let Some(rx) = self.done_rx.as_ref() else {
            return 0;
        };
        let mut n = 0;
        while let Ok(done) = rx.try_recv() {
            let state = match done.result {
                Ok(path) => ThumbState::Ready(path),
                Err(err) => {
                    debug!("thumbnail {} failed: {err}", done.key);
                    ThumbState::Failed
                }
            };
            self.states.insert(done.key, state);
            n += 1;
        }
        n
    }

    pub fn pending(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == ThumbState::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_loader_ignores_requests() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = ThumbnailLoader::disabled(dir.path().to_path_buf());
        assert!(!loader.is_enabled());
        assert!(loader.request("http://img/1.jpg").is_none());
        assert_eq!(loader.poll(), 0);
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn cached_file_is_ready_without_download() {
        let root = tempfile::tempdir().unwrap();
        let url = "http://127.0.0.1:9/never.jpg";
        let thumbs = cache::prepare_thumb_dir(root.path());
        let key = cache::url_to_cache_key(url);
        std::fs::write(cache::thumb_path(&thumbs, &key), b"jpeg").unwrap();

        let mut loader = ThumbnailLoader::start(root.path().to_path_buf(), 1, Duration::from_secs(1));
        if !loader.is_enabled() {
            return;
        }
        assert_eq!(
            loader.request(url),
            Some(&ThumbState::Ready(cache::thumb_path(&thumbs, &key)))
        );
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn unreachable_url_ends_failed() {
        let root = tempfile::tempdir().unwrap();
        let mut loader = ThumbnailLoader::start(root.path().to_path_buf(), 2, Duration::from_secs(2));
        if !loader.is_enabled() {
            return;
        }
        let url = "http://127.0.0.1:9/missing.jpg";
        assert_eq!(loader.request(url), Some(&ThumbState::Pending));
        assert_eq!(loader.request(url), Some(&ThumbState::Pending));

        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        while loader.pending() > 0 && std::time::Instant::now() < deadline {
            loader.poll();
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(loader.request(url), Some(&ThumbState::Failed));
    }
}
