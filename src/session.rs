use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use crate::{
    client::Describer,
    error::{DescribeError, Result},
    image::ImageRecord,
};

/// Caller-observed state of a describe session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing requested yet, or the view was reset.
    Idle,
    /// A description request is outstanding.
    Requesting,
    /// The last request produced this description.
    Succeeded(String),
    /// The last request failed with this user-facing message.
    Failed(String),
}

impl SessionState {
    /// Returns the state as a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Requesting => "requesting",
            SessionState::Succeeded(_) => "succeeded",
            SessionState::Failed(_) => "failed",
        }
    }

    /// Whether a new request may start. Finished states count as idle.
    pub fn is_ready(&self) -> bool {
        !matches!(self, SessionState::Requesting)
    }
}

/// Recorded as the failure when a request is abandoned mid-flight.
pub const CANCELLED_MESSAGE: &str = "The description request was cancelled";

struct SessionInner {
    state: SessionState,
    image: Option<ImageRecord>,
}

/// Holds the current image and the outcome of the last request, and
/// allows at most one request in flight.
///
/// Cloning is cheap; clones share the same state.
pub struct DescribeSession<D: Describer> {
    describer: Arc<D>,
    inner: Arc<Mutex<SessionInner>>,
}

impl<D: Describer> Clone for DescribeSession<D> {
    fn clone(&self) -> Self {
        Self {
            describer: self.describer.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<D: Describer> DescribeSession<D> {
    /// Creates an idle session with no image.
    pub fn new(describer: D) -> Self {
        Self {
            describer: Arc::new(describer),
            inner: Arc::new(Mutex::new(SessionInner {
                state: SessionState::Idle,
                image: None,
            })),
        }
    }

    /// The backend this session forwards images to.
    pub fn describer(&self) -> &D {
        &self.describer
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// The image the next `describe` call will send, if any.
    pub fn image(&self) -> Option<ImageRecord> {
        self.lock().image.clone()
    }

    /// Replaces the current image and clears the previous outcome.
    pub fn load_image(&self, image: ImageRecord) -> Result<()> {
        let mut inner = self.lock();
        ensure_ready(&inner.state)?;

        log::debug!("Loaded a new {} image", image.content_type());
        inner.image = Some(image);
        inner.state = SessionState::Idle;
        Ok(())
    }

    /// Reads an image file and makes it the current image.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let image = ImageRecord::from_path(path)?;
        self.load_image(image)
    }

    /// Drops the current image and returns to `Idle`.
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.lock();
        ensure_ready(&inner.state)?;

        inner.image = None;
        inner.state = SessionState::Idle;
        Ok(())
    }

    /// Describes the current image.
    ///
    /// Refused without a call to the describer when no image is loaded or
    /// when another request is still outstanding.
    pub async fn describe(&self) -> Result<String> {
        let image = {
            let mut inner = self.lock();
            ensure_ready(&inner.state)?;
            let image = inner
                .image
                .clone()
                .ok_or_else(|| DescribeError::validation("Please upload an image first"))?;
            inner.state = SessionState::Requesting;
            image
        };

        log::debug!("Scheduling a new description");
        let start_time = Instant::now();
        let guard = RequestGuard::new(&self.inner);

        let result = self.describer.describe(&image).await;

        let state = match &result {
            Ok(description) => {
                log::info!("Description completed in {:?}", start_time.elapsed());
                SessionState::Succeeded(description.clone())
            }
            Err(e) => {
                log::warn!(
                    "Description failed after {:?} ({})",
                    start_time.elapsed(),
                    e.kind()
                );
                SessionState::Failed(e.user_message())
            }
        };
        guard.complete(state);

        result
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        lock_inner(&self.inner)
    }
}

/// Leaves `Requesting` when a describe future is dropped before it finishes.
struct RequestGuard<'a> {
    inner: &'a Mutex<SessionInner>,
    finished: bool,
}

impl<'a> RequestGuard<'a> {
    fn new(inner: &'a Mutex<SessionInner>) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    fn complete(mut self, state: SessionState) {
        lock_inner(self.inner).state = state;
        self.finished = true;
    }
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        log::warn!("Description request was cancelled before it finished");
        lock_inner(self.inner).state = SessionState::Failed(CANCELLED_MESSAGE.to_string());
    }
}

fn lock_inner(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ensure_ready(state: &SessionState) -> Result<()> {
    if state.is_ready() {
        Ok(())
    } else {
        Err(DescribeError::validation(
            "A description is already being generated",
        ))
    }
}
