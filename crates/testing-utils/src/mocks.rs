//! Mock implementations of the collaborator traits
//!
//! In-memory test doubles for payload sources, the transform engine and
//! observers, so scheduler behaviour can be exercised without real files.

use async_trait::async_trait;
use batch_core::{
    ItemError, OperationKind, OperationOptions, Payload, PayloadSource, ProcessingObserver,
    ProgressRecord, RunSummary, TransformEngine, WorkItem,
};
use bytes::Bytes;
use std::collections::HashSet;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Payload source that always returns the same bytes
#[derive(Debug, Clone)]
pub struct StaticPayloadSource {
    bytes: Bytes,
}

impl StaticPayloadSource {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl PayloadSource for StaticPayloadSource {
    async fn read(&self) -> io::Result<Bytes> {
        Ok(self.bytes.clone())
    }
}

/// Payload source that fails a fixed number of times before succeeding
#[derive(Debug)]
pub struct FlakyPayloadSource {
    failures_before_success: usize,
    attempts: AtomicUsize,
    bytes: Bytes,
}

impl FlakyPayloadSource {
    pub fn new(failures_before_success: usize) -> Self {
        Self {
            failures_before_success,
            attempts: AtomicUsize::new(0),
            bytes: Bytes::from_static(b"%PDF-1.7 flaky"),
        }
    }

    /// Never succeeds
    pub fn always_failing() -> Self {
        Self::new(usize::MAX)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PayloadSource for FlakyPayloadSource {
    async fn read(&self) -> io::Result<Bytes> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failures_before_success {
            return Err(io::Error::new(
                io::ErrorKind::Interrupted,
                format!("read attempt {attempt} failed"),
            ));
        }
        Ok(self.bytes.clone())
    }
}

/// Lifecycle event recorded by [`MockTransformEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Started(String),
    Finished(String),
}

/// Transform engine double
///
/// Records every call, tracks how many transforms are in flight at once and
/// fails the items whose names were registered with [`fail_on`](Self::fail_on).
#[derive(Debug, Default)]
pub struct MockTransformEngine {
    delay: Duration,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    events: Mutex<Vec<EngineEvent>>,
    calls: Mutex<Vec<(OperationKind, String)>>,
}

impl MockTransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn panic_on(mut self, name: &str) -> Self {
        self.panicking.insert(name.to_string());
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<(OperationKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Names in the order their transforms started
    pub fn started_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                EngineEvent::Started(name) => Some(name),
                EngineEvent::Finished(_) => None,
            })
            .collect()
    }

    /// Position of an event in the log
    pub fn event_position(&self, event: &EngineEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

#[async_trait]
impl TransformEngine for MockTransformEngine {
    async fn transform(
        &self,
        kind: OperationKind,
        item: &WorkItem,
        payload: Payload,
        _options: &OperationOptions,
    ) -> Result<Payload, ItemError> {
        let name = item.name().to_string();
        self.calls.lock().unwrap().push((kind, name.clone()));
        self.events
            .lock()
            .unwrap()
            .push(EngineEvent::Started(name.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events
            .lock()
            .unwrap()
            .push(EngineEvent::Finished(name.clone()));

        if self.panicking.contains(&name) {
            panic!("transform engine crashed on {name}");
        }
        if self.failing.contains(&name) {
            return Err(ItemError::transform(name, "mock engine failure"));
        }
        Ok(payload)
    }
}

/// Observer that keeps every notification it receives
#[derive(Debug, Default)]
pub struct RecordingObserver {
    progress: Mutex<Vec<ProgressRecord>>,
    summaries: Mutex<Vec<RunSummary>>,
    errors: Mutex<Vec<(String, String)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn progress(&self) -> Vec<ProgressRecord> {
        self.progress.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<RunSummary> {
        self.summaries.lock().unwrap().clone()
    }

    /// `(item name, error kind)` pairs
    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().unwrap().clone()
    }
}

impl ProcessingObserver for RecordingObserver {
    fn on_progress(&self, progress: &ProgressRecord) {
        self.progress.lock().unwrap().push(*progress);
    }

    fn on_complete(&self, summary: &RunSummary) {
        self.summaries.lock().unwrap().push(summary.clone());
    }

    fn on_error(&self, item: &WorkItem, error: &ItemError) {
        self.errors
            .lock()
            .unwrap()
            .push((item.name().to_string(), error.kind().to_string()));
    }
}
