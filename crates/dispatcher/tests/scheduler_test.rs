use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use batch_core::config::{OperationRulesConfig, SchedulerConfig};
use batch_core::{InputFile, OperationKind, SchedulerError, SchedulerState, TransformEngine};
use batch_dispatcher::BatchScheduler;
use batch_testing_utils::{
    pdf_inputs, test_scheduler_config, InputFileBuilder, MockTransformEngine, RecordingObserver,
    TestEnv,
};
use batch_worker::{OperationDispatcher, ReadRetryPolicy};
use tokio::time::timeout;

fn scheduler(engine: Arc<dyn TransformEngine>, config: SchedulerConfig) -> BatchScheduler {
    let dispatcher = OperationDispatcher::with_default_handlers(
        engine,
        &OperationRulesConfig::default(),
        config.max_item_size_bytes,
        ReadRetryPolicy::from_config(&config),
    );
    BatchScheduler::new(config, Arc::new(dispatcher)).unwrap()
}

async fn wait_idle(scheduler: &BatchScheduler) {
    timeout(Duration::from_secs(5), scheduler.wait_idle())
        .await
        .expect("scheduler did not drain in time");
}

#[tokio::test]
async fn test_single_partial_batch() {
    let engine = Arc::new(MockTransformEngine::new().with_delay(Duration::from_millis(5)));
    let scheduler = scheduler(engine.clone(), test_scheduler_config(10, 3));
    let observer = RecordingObserver::new();
    scheduler.set_observer(observer.clone());

    let position = scheduler
        .add_items(pdf_inputs("scan", 7), OperationKind::Ocr, HashMap::new())
        .await
        .unwrap();
    assert_eq!(position, 0);

    wait_idle(&scheduler).await;

    let stats = scheduler.stats();
    assert_eq!(stats.total_submitted, 7);
    assert_eq!(stats.total_processed, 7);
    assert_eq!(stats.total_errors, 0);
    assert!(engine.max_in_flight() <= 3);

    let summaries = observer.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].processed, 7);
    assert_eq!(summaries[0].success_rate, 1.0);

    let progress = observer.progress();
    assert_eq!(progress.len(), 7);
    let last = progress.last().unwrap();
    assert_eq!(last.current, 7);
    assert_eq!(last.total, 7);
    assert_eq!(last.batch_current, 7);
    assert_eq!(last.batch_total, 7);
}

#[tokio::test]
async fn test_batches_drain_in_order() {
    let engine = Arc::new(MockTransformEngine::new().with_delay(Duration::from_millis(2)));
    let scheduler = scheduler(engine.clone(), test_scheduler_config(10, 3));
    let observer = RecordingObserver::new();
    scheduler.set_observer(observer.clone());

    scheduler
        .add_items(pdf_inputs("doc", 23), OperationKind::Compress, HashMap::new())
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let batch_totals: Vec<usize> = observer.progress().iter().map(|p| p.batch_total).collect();
    let mut expected = vec![10; 20];
    expected.extend(vec![3; 3]);
    assert_eq!(batch_totals, expected);

    let started = engine.started_order();
    let index_of = |name: &str| started.iter().position(|n| n == name).unwrap();
    for first in 0..10 {
        for second in 10..20 {
            assert!(index_of(&format!("doc-{first}.pdf")) < index_of(&format!("doc-{second}.pdf")));
        }
    }
    for second in 10..20 {
        for third in 20..23 {
            assert!(index_of(&format!("doc-{second}.pdf")) < index_of(&format!("doc-{third}.pdf")));
        }
    }
    assert_eq!(scheduler.stats().total_processed, 23);
}

#[tokio::test]
async fn test_validation_failure_is_isolated() {
    let engine = Arc::new(MockTransformEngine::new());
    let scheduler = scheduler(engine.clone(), test_scheduler_config(10, 3));

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    scheduler.on_error(move |item, error| {
        sink.lock()
            .unwrap()
            .push((item.name().to_string(), error.kind().to_string()));
    });

    let mut inputs = pdf_inputs("doc", 4);
    inputs.push(
        InputFileBuilder::new("doc-4.png")
            .with_content_type("image/png")
            .build(),
    );

    scheduler
        .add_items(inputs, OperationKind::Compress, HashMap::new())
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let stats = scheduler.stats();
    assert_eq!(stats.total_processed, 5);
    assert_eq!(stats.total_errors, 1);
    assert_eq!(
        *errors.lock().unwrap(),
        vec![("doc-4.png".to_string(), "validation".to_string())]
    );
    assert_eq!(engine.call_count(), 4);

    let log = scheduler.error_log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].item_name, "doc-4.png");
    assert_eq!(scheduler.last_summary().unwrap().errors, 1);
}

#[tokio::test]
async fn test_second_submission_waits_behind_first() {
    let engine = Arc::new(MockTransformEngine::new().with_delay(Duration::from_millis(5)));
    let scheduler = scheduler(engine.clone(), test_scheduler_config(2, 2));

    let first = scheduler
        .add_items(pdf_inputs("first", 3), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();
    let second = scheduler
        .add_items(pdf_inputs("second", 3), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();

    assert_eq!(first, 0);
    assert_eq!(second, 2);

    wait_idle(&scheduler).await;

    let started = engine.started_order();
    let last_first = started.iter().rposition(|n| n.starts_with("first")).unwrap();
    let first_second = started.iter().position(|n| n.starts_with("second")).unwrap();
    assert!(last_first < first_second);
    assert_eq!(scheduler.stats().total_processed, 6);
}

#[tokio::test]
async fn test_submission_during_drain_joins_same_run() {
    let engine = Arc::new(MockTransformEngine::new().with_delay(Duration::from_millis(30)));
    let scheduler = scheduler(engine.clone(), test_scheduler_config(2, 2));
    let observer = RecordingObserver::new();
    scheduler.set_observer(observer.clone());

    scheduler
        .add_items(pdf_inputs("a", 4), OperationKind::Compress, HashMap::new())
        .await
        .unwrap();
    let probe = scheduler.clone();
    let started = TestEnv::wait_for(
        move || {
            let probe = probe.clone();
            async move { probe.progress().current >= 1 }
        },
        Duration::from_secs(2),
    )
    .await;
    assert!(started);
    assert_eq!(scheduler.state().await, SchedulerState::Draining);

    scheduler
        .add_items(pdf_inputs("b", 2), OperationKind::Compress, HashMap::new())
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let summaries = observer.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].processed, 6);
}

#[tokio::test]
async fn test_empty_submission_is_noop() {
    let engine = Arc::new(MockTransformEngine::new());
    let scheduler = scheduler(engine.clone(), test_scheduler_config(10, 3));
    let observer = RecordingObserver::new();
    scheduler.set_observer(observer.clone());

    let position = scheduler
        .add_items(Vec::<InputFile>::new(), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();

    assert_eq!(position, 0);
    assert_eq!(scheduler.state().await, SchedulerState::Idle);
    assert_eq!(scheduler.pending_batches().await, 0);
    assert_eq!(scheduler.stats().total_submitted, 0);
    wait_idle(&scheduler).await;
    assert!(observer.summaries().is_empty());
    assert!(scheduler.last_summary().is_none());
}

#[tokio::test]
async fn test_scheduler_reusable_after_idle() {
    let engine = Arc::new(MockTransformEngine::new().fail_on("two-1.pdf"));
    let scheduler = scheduler(engine.clone(), test_scheduler_config(10, 3));
    let observer = RecordingObserver::new();
    scheduler.set_observer(observer.clone());

    scheduler
        .add_items(pdf_inputs("one", 3), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();
    wait_idle(&scheduler).await;
    assert_eq!(scheduler.state().await, SchedulerState::Idle);

    scheduler
        .add_items(pdf_inputs("two", 2), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let summaries = observer.summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].processed, 3);
    assert_eq!(summaries[1].processed, 2);
    assert_eq!(summaries[1].errors, 1);
    assert_eq!(summaries[1].success_rate, 0.5);
    assert_ne!(summaries[0].run_id, summaries[1].run_id);

    let stats = scheduler.stats();
    assert_eq!(stats.total_processed, 5);
    assert_eq!(stats.total_errors, 1);
    assert_eq!(stats.total_processed, stats.total_submitted);
    assert_eq!(scheduler.error_log().len() as u64, stats.total_errors);
}

#[tokio::test]
async fn test_queue_full_rejects_submission() {
    let engine = Arc::new(MockTransformEngine::new().with_delay(Duration::from_millis(10)));
    let config = SchedulerConfig {
        max_pending_items: Some(5),
        ..test_scheduler_config(2, 1)
    };
    let scheduler = scheduler(engine.clone(), config);

    scheduler
        .add_items(pdf_inputs("ok", 4), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();
    let err = scheduler
        .add_items(pdf_inputs("late", 2), OperationKind::Merge, HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::QueueFull {
            pending: 4,
            requested: 2,
            limit: 5
        }));

    wait_idle(&scheduler).await;
    assert_eq!(scheduler.stats().total_submitted, 4);
    assert_eq!(scheduler.stats().total_processed, 4);
}

#[tokio::test]
async fn test_latest_callback_registration_wins() {
    let engine = Arc::new(MockTransformEngine::new());
    let scheduler = scheduler(engine, test_scheduler_config(10, 3));

    let calls = Arc::new(Mutex::new(Vec::new()));
    let first = calls.clone();
    scheduler.on_complete(move |_| first.lock().unwrap().push("first"));
    let second = calls.clone();
    scheduler.on_complete(move |_| second.lock().unwrap().push("second"));

    scheduler
        .add_items(pdf_inputs("doc", 2), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    assert_eq!(*calls.lock().unwrap(), vec!["second"]);
}

#[tokio::test]
async fn test_panicking_callbacks_do_not_stall_queue() {
    let engine = Arc::new(MockTransformEngine::new().fail_on("first-2.pdf"));
    let scheduler = scheduler(engine, test_scheduler_config(2, 2));

    scheduler.on_progress(|progress| {
        if progress.current == 1 {
            panic!("progress bar crashed");
        }
    });
    scheduler.on_error(|_, _| panic!("toast crashed"));
    scheduler.on_complete(|_| panic!("summary dialog crashed"));

    scheduler
        .add_items(pdf_inputs("first", 3), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    assert_eq!(scheduler.state().await, SchedulerState::Idle);
    let stats = scheduler.stats();
    assert_eq!(stats.total_processed, 3);
    assert_eq!(stats.total_errors, 1);
    assert!(stats.end_time.is_some());
    assert_eq!(scheduler.last_summary().unwrap().processed, 3);

    let completed = Arc::new(Mutex::new(0));
    let counter = completed.clone();
    scheduler.on_progress(|_| {});
    scheduler.on_complete(move |_| *counter.lock().unwrap() += 1);

    scheduler
        .add_items(pdf_inputs("second", 2), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    assert_eq!(scheduler.state().await, SchedulerState::Idle);
    assert_eq!(scheduler.stats().total_submitted, 5);
    assert_eq!(scheduler.stats().total_processed, 5);
    assert_eq!(*completed.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_progress_reports_monotonic_current() {
    let engine = Arc::new(MockTransformEngine::new().with_delay(Duration::from_millis(1)));
    let scheduler = scheduler(engine, test_scheduler_config(4, 2));
    let observer = RecordingObserver::new();
    scheduler.set_observer(observer.clone());

    scheduler
        .add_items(pdf_inputs("doc", 9), OperationKind::Merge, HashMap::new())
        .await
        .unwrap();
    wait_idle(&scheduler).await;

    let currents: Vec<u64> = observer.progress().iter().map(|p| p.current).collect();
    assert_eq!(currents, (1..=9).collect::<Vec<_>>());
    assert_eq!(scheduler.progress().current, 9);
}

#[test]
fn test_invalid_config_rejected() {
    let dispatcher = Arc::new(OperationDispatcher::new(ReadRetryPolicy::default()));

    let config = SchedulerConfig {
        batch_size: 0,
        ..SchedulerConfig::default()
    };
    let result = BatchScheduler::new(config, dispatcher);
    assert!(matches!(result, Err(SchedulerError::Configuration(_))));
}

#[test]
fn test_confirmation_threshold() {
    let scheduler = scheduler(Arc::new(MockTransformEngine::new()), test_scheduler_config(10, 3));
    assert!(!scheduler.requires_confirmation(50));
    assert!(scheduler.requires_confirmation(51));
}
