//! Integration tests for progress envelopes and their rendering.

use racket::{Progress, ProgressData, ProgressKind, ProgressSender, WorkError, perror, pmessage};

const CRAP: ProgressKind = ProgressKind(1024);

#[test]
fn unknown_kinds_render_with_empty_name() {
    let p = Progress::new(CRAP, ProgressData::Text("CRAP!".to_string()));

    assert_eq!(p.kind, CRAP);
    assert_eq!(p.kind.name(), "");
    assert!(!p.kind.is_known());
    assert!(p.as_error().is_none());
    assert_eq!(p.render(), ": CRAP!");
}

#[test]
fn error_envelopes() {
    let p = perror!("an {}", "ERROR");

    assert_eq!(p.kind, ProgressKind::ERROR);
    assert_eq!(p.kind.to_string(), "ProgressError");
    assert_eq!(p.as_error(), Some(WorkError::new("an ERROR")));
    assert_eq!(p.render(), "ProgressError: an ERROR");

    let boom = Progress::error("boom");
    assert_eq!(boom.as_error(), Some(WorkError::from("boom")));
    assert_eq!(boom.to_string(), "ProgressError: boom");
}

#[test]
fn message_envelopes() {
    let p = pmessage!("MESSAGE!");

    assert_eq!(p.kind, ProgressKind::MESSAGE);
    assert_eq!(p.kind.name(), "ProgressMessage");
    assert_eq!(p.data, ProgressData::Text("MESSAGE!".to_string()));
    assert!(p.as_error().is_none());
    assert_eq!(p.render(), "ProgressMessage: MESSAGE!");
}

#[test]
fn update_and_estimate_envelopes() {
    let update = Progress::update(42);
    assert_eq!(update.kind.name(), "ProgressUpdate");
    assert_eq!(update.data, ProgressData::Count(42));
    assert!(update.as_error().is_none());
    assert_eq!(update.render(), "ProgressUpdate: 42");

    let estimate = Progress::estimate(4026);
    assert_eq!(estimate.kind.name(), "ProgressEstimate");
    assert!(estimate.as_error().is_none());
    assert_eq!(estimate.render(), "ProgressEstimate: 4026");

    assert_eq!(Progress::update(-1).render(), "ProgressUpdate: -1");
}

#[test]
fn other_envelopes_are_opaque() {
    let p = Progress::other(serde_json::json!({}));

    assert_eq!(p.kind.name(), "ProgressOther");
    assert!(p.as_error().is_none());
    assert_eq!(p.render(), "ProgressOther: {}");
}

#[test]
fn error_kind_with_foreign_payload_still_yields_error() {
    let p = Progress::new(ProgressKind::ERROR, ProgressData::Text("odd".to_string()));
    assert_eq!(p.as_error(), Some(WorkError::new("odd")));
}

#[test]
fn work_error_captures_source_chain() {
    #[derive(Debug, thiserror::Error)]
    #[error("upload failed")]
    struct UploadFailed {
        #[source]
        cause: std::io::Error,
    }

    let failed = UploadFailed {
        cause: std::io::Error::other("disk on fire"),
    };
    let err = WorkError::from_error(&failed);
    assert_eq!(err.message(), "upload failed: disk on fire");

    let p: Progress = err.clone().into();
    assert_eq!(p.as_error(), Some(err));
}

#[tokio::test]
async fn sender_reports_closed_channel() {
    let (tx, rx) = async_channel::bounded(4);
    let sender = ProgressSender::new(tx);

    assert!(sender.message("hi").await);
    assert_eq!(rx.recv().await.unwrap(), Progress::message("hi"));

    rx.close();
    assert!(sender.is_closed());
    assert!(!sender.update(1).await);
}
