//! An in-memory event sink.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::monitor::{EventSink, MonitorError, MonitorEvent};

#[derive(Debug, Default)]
struct State {
    batches: Vec<Vec<MonitorEvent>>,
    failing: bool,
}

/// Records every batch it is sent. Clones share the same record.
///
/// A failing sink answers every send with [`MonitorError::Rejected`] and
/// records nothing.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    state: Arc<Mutex<State>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sink = Self::new();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Batches received so far, oldest first.
    pub fn batches(&self) -> Vec<Vec<MonitorEvent>> {
        self.lock().batches.clone()
    }

    /// All received events, flattened.
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.lock().batches.iter().flatten().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for RecordingSink {
    fn send(&self, events: &[MonitorEvent]) -> Result<(), MonitorError> {
        let mut state = self.lock();
        if state.failing {
            return Err(MonitorError::Rejected {
                status: 503,
                body: "recording sink is failing".to_string(),
            });
        }
        state.batches.push(events.to_vec());
        Ok(())
    }
}
