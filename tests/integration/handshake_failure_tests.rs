//! Handshake failures during `start()`.

use std::time::Instant;

use serial_test::serial;

use ucci_analyzer::engine::SessionPhase;
use ucci_analyzer::{AppError, EngineSession};

use super::test_helpers::{fast_config, write_script, NO_HANG};

async fn start_with(body: &str) -> (AppError, EngineSession) {
    let temp = tempfile::tempdir().expect("tempdir");
    let engine = write_script(temp.path(), "engine", body);
    let mut config = fast_config(engine);
    config.handshake_timeout_ms = 200;

    let mut session = EngineSession::new(config);
    let err = session.start().await.expect_err("start must fail");
    (err, session)
}

#[tokio::test]
#[serial]
async fn silent_engine_times_out() {
    let started = Instant::now();
    let (err, session) = start_with("while read -r cmd; do :; done").await;

    match err {
        AppError::Handshake(msg) => {
            assert!(msg.contains("timed out"), "got: {msg}");
            assert!(msg.contains("ucciok"), "got: {msg}");
        }
        other => panic!("expected AppError::Handshake, got: {other:?}"),
    }
    assert_eq!(session.state(), SessionPhase::Terminated);
    assert!(started.elapsed() < NO_HANG);
}

#[tokio::test]
#[serial]
async fn wrong_acknowledgement_is_rejected() {
    let (err, _) = start_with(
        r"
while IFS= read -r cmd; do
  case $cmd in
    ucci) echo 'ucci ok'; echo 'uciok' ;;
  esac
done",
    )
    .await;

    assert!(matches!(err, AppError::Handshake(_)), "got: {err:?}");
}

#[tokio::test]
#[serial]
async fn missing_readyok_fails_after_ucciok() {
    let (err, _) = start_with(
        r"
while IFS= read -r cmd; do
  case $cmd in
    ucci) echo 'ucciok' ;;
  esac
done",
    )
    .await;

    match err {
        AppError::Handshake(msg) => assert!(msg.contains("readyok"), "got: {msg}"),
        other => panic!("expected AppError::Handshake, got: {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn engine_exiting_during_handshake_fails_fast() {
    let started = Instant::now();
    let (err, _) = start_with("read -r cmd\necho 'crashing'\nexit 3").await;

    match err {
        AppError::Handshake(msg) => assert!(msg.contains("exited"), "got: {msg}"),
        other => panic!("expected AppError::Handshake, got: {other:?}"),
    }
    assert!(started.elapsed() < NO_HANG);
}

#[tokio::test]
#[serial]
async fn failed_session_cannot_be_restarted() {
    let (_, mut session) = start_with("read -r cmd\nexit 0").await;

    assert!(matches!(
        session.start().await,
        Err(AppError::Contract(_))
    ));
}

/// The engine acknowledges `ucci` but has already closed its stdin, so
/// writing `isready` fails on a broken pipe.
#[tokio::test]
#[serial]
async fn engine_closing_stdin_mid_handshake_is_a_handshake_error() {
    let (err, session) = start_with("read -r cmd\nexec 0<&-\necho 'ucciok'\nsleep 2").await;

    match err {
        AppError::Handshake(msg) => {
            assert!(msg.contains("stopped accepting commands"), "got: {msg}");
            assert!(msg.contains("isready"), "got: {msg}");
            assert!(!msg.contains("io:"), "nested error prefix in: {msg}");
        }
        other => panic!("expected AppError::Handshake, got: {other:?}"),
    }
    assert_eq!(session.state(), SessionPhase::Terminated);
}
