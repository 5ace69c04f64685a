use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use batch_core::{ItemError, ProcessingObserver, ProgressRecord, RunSummary, WorkItem};
use tracing::error;

pub type ProgressCallback = Arc<dyn Fn(&ProgressRecord) + Send + Sync>;
pub type CompleteCallback = Arc<dyn Fn(&RunSummary) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&WorkItem, &ItemError) + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    progress: Option<ProgressCallback>,
    complete: Option<CompleteCallback>,
    error: Option<ErrorCallback>,
}

/// 通知回调
///
/// 回调在队列生命周期内有效，后注册的覆盖先注册的，
/// 对正在排空的队列立即生效。
#[derive(Default)]
pub struct Notifier {
    callbacks: RwLock<Callbacks>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, f: impl FnOnce(&mut Callbacks)) {
        let mut callbacks = self.callbacks.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut callbacks);
    }

    pub fn set_on_progress(&self, callback: ProgressCallback) {
        self.update(|c| c.progress = Some(callback));
    }

    pub fn set_on_complete(&self, callback: CompleteCallback) {
        self.update(|c| c.complete = Some(callback));
    }

    pub fn set_on_error(&self, callback: ErrorCallback) {
        self.update(|c| c.error = Some(callback));
    }

    /// 用一个观察者同时替换三个回调
    pub fn set_observer(&self, observer: Arc<dyn ProcessingObserver>) {
        let progress = Arc::clone(&observer);
        let complete = Arc::clone(&observer);
        self.update(move |c| {
            c.progress = Some(Arc::new(move |p: &ProgressRecord| progress.on_progress(p)));
            c.complete = Some(Arc::new(move |s: &RunSummary| complete.on_complete(s)));
            c.error = Some(Arc::new(move |item: &WorkItem, e: &ItemError| {
                observer.on_error(item, e)
            }));
        });
    }

    // 先克隆出回调再调用，调用期间不持有锁。回调panic只记录日志，不影响排空循环

    pub(crate) fn progress(&self, progress: &ProgressRecord) {
        let callback = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .progress
            .clone();
        if let Some(callback) = callback {
            guarded("on_progress", || callback(progress));
        }
    }

    pub(crate) fn complete(&self, summary: &RunSummary) {
        let callback = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .complete
            .clone();
        if let Some(callback) = callback {
            guarded("on_complete", || callback(summary));
        }
    }

    pub(crate) fn error(&self, item: &WorkItem, error: &ItemError) {
        let callback = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .error
            .clone();
        if let Some(callback) = callback {
            guarded("on_error", || callback(item, error));
        }
    }
}

fn guarded(callback: &str, f: impl FnOnce()) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!(callback, "通知回调发生panic，已忽略: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batch_testing_utils::RecordingObserver;
    use std::sync::Mutex;

    #[test]
    fn test_observer_replaces_closures() {
        let notifier = Notifier::new();
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        notifier.set_on_progress(Arc::new(move |_: &ProgressRecord| {
            *counter.lock().unwrap() += 1
        }));

        let observer = RecordingObserver::new();
        notifier.set_observer(observer.clone());
        notifier.progress(&ProgressRecord::default());

        assert_eq!(*hits.lock().unwrap(), 0);
        assert_eq!(observer.progress().len(), 1);
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let notifier = Notifier::new();
        notifier.set_on_complete(Arc::new(|_: &RunSummary| panic!("ui crashed")));
        notifier.set_on_progress(Arc::new(|_: &ProgressRecord| {
            std::panic::panic_any(42_u32)
        }));

        notifier.progress(&ProgressRecord::default());
        notifier.complete(&RunSummary {
            run_id: uuid::Uuid::new_v4(),
            processed: 0,
            errors: 0,
            duration: std::time::Duration::ZERO,
            success_rate: 0.0,
            started_at: chrono::Utc::now(),
            finished_at: chrono::Utc::now(),
        });
    }
}
