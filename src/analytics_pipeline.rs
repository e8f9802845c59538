//! Asynchronous batched ingestion of playback events into an [`AnalyticsAggregator`].
//!
//! Playback hands events to an [`AnalyticsHandle`], which never blocks or fails the caller.
//! A background task drains the channel in batches and folds them into a shared aggregator,
//! so reports are eventually consistent with live playback.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use crate::analytics::{AnalyticsAggregator, AnalyticsReport};
use crate::types::PlaybackEvent;

/// Cloneable sender side of the pipeline.
#[derive(Debug, Clone)]
pub struct AnalyticsHandle {
  tx: mpsc::Sender<PlaybackEvent>,
}

impl AnalyticsHandle {
  /// Queues `event` without waiting. When the buffer is full the send is retried on a spawned
  /// task; when the pipeline is gone the event is logged and dropped.
  pub fn record(&self, event: PlaybackEvent) {
    match self.tx.try_send(event) {
      Ok(()) => {}
      Err(mpsc::error::TrySendError::Full(event)) => {
        let tx = self.tx.clone();
        tokio::spawn(async move {
          if let Err(e) = tx.send(event).await {
            warn!(session_id = %e.0.session_id, "analytics pipeline closed, event dropped");
          }
        });
      }
      Err(mpsc::error::TrySendError::Closed(event)) => {
        warn!(session_id = %event.session_id, node_id = %event.node_id, "analytics pipeline closed, event dropped");
      }
    }
  }

  pub fn record_all(&self, events: impl IntoIterator<Item = PlaybackEvent>) {
    for event in events {
      self.record(event);
    }
  }
}

/// A running ingestion task and the aggregator it feeds.
#[derive(Debug)]
pub struct AnalyticsPipeline {
  handle: AnalyticsHandle,
  aggregator: Arc<RwLock<AnalyticsAggregator>>,
  task: JoinHandle<()>,
}

impl AnalyticsPipeline {
  pub fn handle(&self) -> AnalyticsHandle {
    self.handle.clone()
  }

  /// Report over the events ingested so far.
  pub async fn report(&self) -> AnalyticsReport {
    self.aggregator.read().await.report()
  }

  /// Closes this pipeline's sender and waits until every queued event is ingested.
  /// Completes once all handles cloned from it have been dropped too.
  pub async fn shutdown(self) -> AnalyticsReport {
    drop(self.handle);
    if let Err(e) = self.task.await {
      warn!(error = %e, "analytics ingestor task failed");
    }
    self.aggregator.read().await.report()
  }
}

/// Spawns the ingestion task. `capacity` bounds the channel; events are folded in batches of at
/// most `batch_size`. Invalid events are logged and skipped.
pub fn spawn_ingestor(
  aggregator: AnalyticsAggregator,
  capacity: usize,
  batch_size: usize,
) -> AnalyticsPipeline {
  let (tx, rx) = mpsc::channel(capacity.max(1));
  let aggregator = Arc::new(RwLock::new(aggregator));
  let shared = Arc::clone(&aggregator);
  let task = tokio::spawn(async move {
    let mut batches = ReceiverStream::new(rx).ready_chunks(batch_size.max(1));
    while let Some(batch) = batches.next().await {
      let mut agg = shared.write().await;
      let mut counted = 0usize;
      for event in &batch {
        match agg.ingest(event) {
          Ok(true) => counted += 1,
          Ok(false) => {}
          Err(e) => warn!(error = %e, session_id = %event.session_id, "analytics event skipped"),
        }
      }
      debug!(batch = batch.len(), counted, "analytics batch ingested");
    }
  });
  AnalyticsPipeline {
    handle: AnalyticsHandle { tx },
    aggregator,
    task,
  }
}
