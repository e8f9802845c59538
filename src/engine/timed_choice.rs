//! Reading session with wall-clock expiry of timed choices.
//!
//! Expiry is a spawned task sleeping until the deadline. Manual selections and expiries are
//! serialized through the session mutex, and every deadline carries the step token it was armed
//! for, so at most one of the two can resolve a given choice. The timer only holds a weak
//! reference: once every `ReaderSession` handle is dropped, pending expiries do nothing.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::resolver::PlaybackResolver;
use crate::analytics_pipeline::AnalyticsHandle;
use crate::error::PlaybackError;
use crate::types::{PlaybackSession, PlaybackState, StoryMap, Transition};

struct Inner {
  session: PlaybackSession,
  timer: Option<JoinHandle<()>>,
}

struct Shared {
  graph: Arc<StoryMap>,
  max_auto_steps: usize,
  analytics: Option<AnalyticsHandle>,
  inner: Mutex<Inner>,
}

/// A playback session owned by one reader, safe to drive from concurrent tasks.
#[derive(Clone)]
pub struct ReaderSession {
  shared: Arc<Shared>,
}

impl ReaderSession {
  /// Starts a session at the graph's start node.
  pub async fn start(
    graph: Arc<StoryMap>,
    session_id: impl Into<String>,
    max_auto_steps: usize,
    analytics: Option<AnalyticsHandle>,
  ) -> Result<Self, PlaybackError> {
    let (session, transition) = PlaybackResolver::new(&graph)
      .with_max_auto_steps(max_auto_steps)
      .start(session_id)?;
    let shared = Arc::new(Shared {
      graph,
      max_auto_steps,
      analytics,
      inner: Mutex::new(Inner {
        session,
        timer: None,
      }),
    });
    shared.publish(&transition);
    Ok(Self { shared })
  }

  /// Copy of the current session.
  pub async fn snapshot(&self) -> PlaybackSession {
    self.shared.inner.lock().await.session.clone()
  }

  pub async fn state(&self) -> PlaybackState {
    self.shared.inner.lock().await.session.state.clone()
  }

  #[instrument(level = "trace", skip(self))]
  pub async fn advance(&self) -> Result<Transition, PlaybackError> {
    let mut inner = self.shared.inner.lock().await;
    let transition = self.shared.resolver().advance(&mut inner.session)?;
    self.shared.settle(&mut inner, &transition);
    Ok(transition)
  }

  /// Applies the reader's selection. A pending expiry timer is aborted as soon as the
  /// selection succeeds; if the selection is rejected the timer keeps running.
  #[instrument(level = "trace", skip(self))]
  pub async fn select(&self, choice_id: &str) -> Result<Transition, PlaybackError> {
    let mut inner = self.shared.inner.lock().await;
    let transition = self
      .shared
      .resolver()
      .select_choice(&mut inner.session, choice_id)?;
    self.shared.settle(&mut inner, &transition);
    Ok(transition)
  }

  /// Whether an expiry timer is currently armed.
  pub async fn timer_pending(&self) -> bool {
    let inner = self.shared.inner.lock().await;
    inner.timer.as_ref().is_some_and(|t| !t.is_finished())
  }
}

impl Shared {
  fn resolver(&self) -> PlaybackResolver<'_> {
    PlaybackResolver::new(&self.graph).with_max_auto_steps(self.max_auto_steps)
  }

  fn publish(&self, transition: &Transition) {
    if let Some(ref analytics) = self.analytics {
      analytics.record_all(transition.events.iter().cloned());
    }
  }

  /// Post-transition bookkeeping: cancel the old timer, arm a new one, emit events.
  fn settle(self: &Arc<Self>, inner: &mut Inner, transition: &Transition) {
    if let Some(timer) = inner.timer.take() {
      timer.abort();
    }
    self.arm(inner);
    self.publish(transition);
  }

  fn arm(self: &Arc<Self>, inner: &mut Inner) {
    let Some(deadline) = inner.session.state.deadline() else {
      return;
    };
    let token = deadline.token;
    let limit = Duration::from_secs(u64::from(deadline.limit_seconds));
    debug!(token, limit_seconds = deadline.limit_seconds, "choice timer armed");
    let shared = Arc::downgrade(self);
    inner.timer = Some(tokio::spawn(async move {
      tokio::time::sleep(limit).await;
      match Weak::upgrade(&shared) {
        Some(shared) => shared.expire(token).await,
        None => debug!(token, "reader gone, choice timer dropped"),
      }
    }));
  }

  async fn expire(self: Arc<Self>, token: u64) {
    let mut inner = self.inner.lock().await;
    match self.resolver().expire_choice(&mut inner.session, token) {
      Ok(transition) => {
        // This task is the armed timer; detach it rather than aborting itself.
        inner.timer = None;
        self.arm(&mut inner);
        self.publish(&transition);
      }
      Err(PlaybackError::StaleTimer { .. }) => {}
      Err(e) => warn!(error = %e, token, "timed choice default could not be applied"),
    }
  }
}

impl Drop for Shared {
  fn drop(&mut self) {
    if let Some(timer) = self.inner.get_mut().timer.take() {
      timer.abort();
    }
  }
}
