//! The per-model event reporter.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::warn;

use super::{EventSink, LogPredictionArgs, LogTrueValueArgs, MonitorError, MonitorEvent};

/// Reports events for one model, immediately or in batches.
///
/// Queued events are kept until a flush succeeds.
#[derive(Debug)]
pub struct Monitor {
    model_id: String,
    sink: Box<dyn EventSink>,
    queue: Mutex<Vec<MonitorEvent>>,
}

impl Monitor {
    pub fn new(model_id: impl Into<String>, sink: Box<dyn EventSink>) -> Self {
        Self {
            model_id: model_id.into(),
            sink,
            queue: Mutex::new(Vec::new()),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Send a prediction event now.
    pub fn log_prediction(&self, args: LogPredictionArgs) -> Result<(), MonitorError> {
        let event = MonitorEvent::prediction(&self.model_id, args, Utc::now());
        self.sink.send(std::slice::from_ref(&event))
    }

    /// Send a true-value event now.
    pub fn log_true_value(&self, args: LogTrueValueArgs) -> Result<(), MonitorError> {
        let event = MonitorEvent::true_value(&self.model_id, args, Utc::now());
        self.sink.send(std::slice::from_ref(&event))
    }

    /// Queue a prediction event for the next flush.
    pub fn enqueue_prediction(&self, args: LogPredictionArgs) {
        let event = MonitorEvent::prediction(&self.model_id, args, Utc::now());
        self.lock_queue().push(event);
    }

    /// Queue a true-value event for the next flush.
    pub fn enqueue_true_value(&self, args: LogTrueValueArgs) {
        let event = MonitorEvent::true_value(&self.model_id, args, Utc::now());
        self.lock_queue().push(event);
    }

    /// Number of events waiting for a flush.
    pub fn queued(&self) -> usize {
        self.lock_queue().len()
    }

    /// Send every queued event as one batch, returning how many were sent.
    ///
    /// On failure the events go back to the front of the queue.
    pub fn flush(&self) -> Result<usize, MonitorError> {
        let events = std::mem::take(&mut *self.lock_queue());
        if events.is_empty() {
            return Ok(0);
        }

        match self.sink.send(&events) {
            Ok(()) => Ok(events.len()),
            Err(err) => {
                warn!(error = %err, n_events = events.len(), "Flushing monitoring events failed");
                let mut queue = self.lock_queue();
                let newer = std::mem::replace(&mut *queue, events);
                queue.extend(newer);
                Err(err)
            }
        }
    }

    fn lock_queue(&self) -> MutexGuard<'_, Vec<MonitorEvent>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        let queued = self
            .queue
            .get_mut()
            .map_or_else(|poisoned| poisoned.into_inner().len(), |queue| queue.len());
        if queued > 0 {
            warn!(
                model_id = %self.model_id,
                n_events = queued,
                "Dropping model with unflushed monitoring events"
            );
        }
    }
}
