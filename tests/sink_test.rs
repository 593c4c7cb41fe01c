//! Integration tests for the progress sink's routing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use racket::{Progress, ProgressData, ProgressKind, ProgressOutput, ProgressSink, WorkError, WriterOutput};
use tracing::Level;

/// Collects lines for inspection.
#[derive(Clone, Default)]
struct Lines(Arc<Mutex<Vec<(Level, String)>>>);

impl Lines {
    fn take(&self) -> Vec<(Level, String)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl ProgressOutput for Lines {
    fn write_line(&mut self, level: Level, line: &str) {
        self.0.lock().unwrap().push((level, line.to_string()));
    }
}

#[tokio::test]
async fn routes_by_kind_and_forwards_bar_envelopes() {
    let (ptx, prx) = async_channel::bounded(1);
    let (btx, brx) = async_channel::bounded(1);
    let lines = Lines::default();
    let errors = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&errors);

    let sink = tokio::spawn(
        ProgressSink::new(lines.clone())
            .log_messages(true)
            .on_error(move |e| {
                assert_eq!(e, WorkError::new("Error!"));
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .forward_bars(btx)
            .run(prx),
    );

    ptx.send(Progress::message("Hello")).await.unwrap();
    ptx.send(Progress::error("Error!")).await.unwrap();

    ptx.send(Progress::estimate(42)).await.unwrap();
    assert_eq!(brx.recv().await.unwrap(), Progress::estimate(42));

    ptx.send(Progress::update(-1)).await.unwrap();
    assert_eq!(brx.recv().await.unwrap(), Progress::update(-1));

    ptx.send(Progress::new(ProgressKind(1024), ProgressData::Text("CRAP!".to_string())))
        .await
        .unwrap();

    ptx.close();
    sink.await.unwrap();

    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert!(brx.try_recv().is_err(), "only updates and estimates are forwarded");
    assert_eq!(
        lines.take(),
        vec![
            (Level::INFO, "[PROGRESS] Hello".to_string()),
            (Level::ERROR, "[PROGRESS] ERROR: Error!".to_string()),
            (Level::INFO, "[PROGRESS] ProgressEstimate: 42".to_string()),
            (Level::INFO, "[PROGRESS] ProgressUpdate: -1".to_string()),
            (Level::WARN, "[PROGRESS] ??: : CRAP!".to_string()),
        ]
    );
}

#[tokio::test]
async fn quiet_sink_still_writes_errors_and_unknowns() {
    let (ptx, prx) = async_channel::bounded(8);
    let lines = Lines::default();

    ptx.send(Progress::message("hidden")).await.unwrap();
    ptx.send(Progress::update(3)).await.unwrap();
    ptx.send(Progress::error("shown")).await.unwrap();
    ptx.send(Progress::other("opaque")).await.unwrap();
    drop(ptx);

    ProgressSink::new(lines.clone()).run(prx).await;

    assert_eq!(
        lines.take(),
        vec![
            (Level::ERROR, "[PROGRESS] ERROR: shown".to_string()),
            (Level::WARN, "[PROGRESS] ??: ProgressOther: \"opaque\"".to_string()),
        ]
    );
}

#[tokio::test]
async fn bar_forwarding_ignores_logging_flag() {
    let (ptx, prx) = async_channel::bounded(4);
    let (btx, brx) = async_channel::bounded(4);

    ptx.send(Progress::update(1)).await.unwrap();
    ptx.send(Progress::estimate(10)).await.unwrap();
    drop(ptx);

    let out = ProgressSink::new(WriterOutput::new(Vec::new()))
        .forward_bars(btx)
        .run(prx)
        .await;

    assert!(out.get_ref().is_empty());
    assert_eq!(brx.recv().await.unwrap(), Progress::update(1));
    assert_eq!(brx.recv().await.unwrap(), Progress::estimate(10));
}

#[tokio::test]
async fn writer_output_writes_lines() {
    let (ptx, prx) = async_channel::bounded(4);
    ptx.send(Progress::error("boom")).await.unwrap();
    ptx.send(Progress::message("hi")).await.unwrap();
    drop(ptx);

    let out = ProgressSink::new(WriterOutput::new(Vec::new()))
        .log_messages(true)
        .run(prx)
        .await;

    let text = String::from_utf8(out.into_inner()).unwrap();
    assert_eq!(text, "[PROGRESS] ERROR: boom\n[PROGRESS] hi\n");
}

#[tokio::test]
async fn closed_bar_channel_does_not_stop_the_sink() {
    let (ptx, prx) = async_channel::bounded(4);
    let (btx, brx) = async_channel::bounded::<Progress>(1);
    brx.close();

    ptx.send(Progress::update(1)).await.unwrap();
    ptx.send(Progress::error("after")).await.unwrap();
    drop(ptx);

    let lines = Lines::default();
    ProgressSink::new(lines.clone()).forward_bars(btx).run(prx).await;

    assert_eq!(lines.take().len(), 1);
}
