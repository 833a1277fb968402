use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, info_span, instrument};
use tracing_error::SpanTrace;

use crate::domain::TVError;
use crate::post::Post;

/// Where the post collection comes from.
pub trait PostSource: Send + Sync {
    fn fetch(&self) -> Result<Vec<Post>, TVError>;

    fn describe(&self) -> String;
}

pub struct HttpSource {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TVError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl PostSource for HttpSource {
    #[instrument(skip(self), fields(url = %self.url))]
    fn fetch(&self) -> Result<Vec<Post>, TVError> {
        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(TVError::HttpStatus(status.as_u16()));
        }
        let body = response.text()?;
        let posts: Vec<Post> = serde_json::from_str(&body)?;
        Ok(posts)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Accepts `~` and environment variables in `path`.
    pub fn new(path: &str) -> Result<Self, TVError> {
        let expanded = shellexpand::full(path)
            .map_err(|e| TVError::LoadingFailed(format!("cannot expand {path}: {e}")))?;
        Ok(Self {
            path: PathBuf::from(expanded.into_owned()),
        })
    }
}

impl PostSource for FileSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn fetch(&self) -> Result<Vec<Post>, TVError> {
        let metadata = fs::metadata(&self.path)?;
        if !metadata.is_file() {
            return Err(TVError::LoadingFailed("Not a file!".into()));
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn describe(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// A single in-flight fetch, scoped to the view that started it.
///
/// The fetch runs on its own thread. Once the scope ends, through `cancel` or
/// by dropping the handle, a result that still arrives is discarded.
pub struct Fetch {
    receiver: Receiver<Result<Vec<Post>, TVError>>,
    cancelled: Arc<AtomicBool>,
    started: Instant,
}

impl Fetch {
    pub fn spawn(source: Arc<dyn PostSource>) -> Result<Self, TVError> {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        thread::Builder::new()
            .name("ptv-fetch".into())
            .spawn(move || {
                let span = info_span!("fetch", source = %source.describe());
                let _enter = span.enter();

                let result = source.fetch();
                if let Err(e) = &result {
                    error!("Fetching posts failed: {e}\n{}", SpanTrace::capture());
                }
                if flag.load(Ordering::Acquire) {
                    debug!("Fetch scope ended, discarding late result");
                    return;
                }
                if sender.send(result).is_err() {
                    debug!("Fetch handle is gone, discarding late result");
                }
            })?;

        Ok(Self {
            receiver,
            cancelled,
            started: Instant::now(),
        })
    }

    /// Returns the result once it arrived. Never yields after `cancel`.
    pub fn poll(&self) -> Option<Result<Vec<Post>, TVError>> {
        if self.is_cancelled() {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                info!(
                    "Fetch finished after {}ms",
                    self.started.elapsed().as_millis()
                );
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(TVError::LoadingFailed(
                "fetch worker exited without a result".into(),
            ))),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for Fetch {
    fn drop(&mut self) {
        self.cancel();
    }
}
