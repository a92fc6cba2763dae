//! End-to-end tests for PackagingService::run using a fake packaging tool.
//!
//! A generated shell script stands in for the Python interpreter: it ignores
//! the `-m PyInstaller` arguments, prints tool-like output and creates (or
//! omits) the expected artifact. This exercises the whole run path - spawn,
//! merged stream relay, milestone progress and the artifact check - without
//! requiring Python on the test machine.

#![cfg(unix)]

use camino::{Utf8Path, Utf8PathBuf};
use pypack::models::BuildConfig;
use pypack::services::packaging::{BuildEvent, BuildResult, PackagingError, PackagingService};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

fn utf8_dir(temp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap()
}

/// Write an executable shell script acting as the interpreter
fn write_fake_tool(dir: &Utf8Path, body: &str) -> Utf8PathBuf {
    let path = dir.join("python3");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();

    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();

    path
}

/// Run a build while collecting every emitted event
async fn run_collecting(
    service: &PackagingService,
    config: &BuildConfig,
) -> (Result<BuildResult, PackagingError>, Vec<BuildEvent>) {
    let (event_tx, mut event_rx) = mpsc::channel(256);

    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = event_rx.recv().await {
            events.push(event);
        }
        events
    });

    let result = service.run(config, Duration::from_secs(30), event_tx).await;
    let events = collector.await.unwrap();
    (result, events)
}

fn config_for(temp: &TempDir) -> BuildConfig {
    let dir = utf8_dir(temp);
    BuildConfig {
        script_path: dir.join("app.py"),
        output_name: "app".to_string(),
        output_dir: dir.join("dist"),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_run_succeeds_when_artifact_appears() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp);

    // Tool prints the milestone line and creates the expected artifact
    let tool = write_fake_tool(
        &utf8_dir(&temp),
        &format!(
            "echo \"100 INFO: Analyzing app.py\"\n\
             echo \"120 INFO: Building EXE from EXE-00.toc\"\n\
             mkdir -p \"{dist}\"\n\
             touch \"{artifact}\"",
            dist = config.output_dir,
            artifact = config.artifact_path()
        ),
    );

    let service = PackagingService::new(tool);
    let (result, events) = run_collecting(&service, &config).await;
    let result = result.unwrap();

    assert!(result.success);
    assert_eq!(result.artifact_path, Some(config.artifact_path()));
    assert!(result.log.contains("Building EXE"));

    // Milestone heuristic fired, and the artifact check drove progress to 100
    assert!(events.contains(&BuildEvent::Progress(50)));
    let last_progress = events
        .iter()
        .filter_map(|e| match e {
            BuildEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .last();
    assert_eq!(last_progress, Some(100));
}

#[tokio::test]
async fn test_run_fails_without_artifact_despite_exit_zero() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp);

    // Exit status zero, but nothing is created
    let tool = write_fake_tool(
        &utf8_dir(&temp),
        "echo \"120 INFO: Building EXE from EXE-00.toc\"\nexit 0",
    );

    let service = PackagingService::new(tool);
    let (result, events) = run_collecting(&service, &config).await;
    let result = result.unwrap();

    assert!(!result.success);
    assert!(result.artifact_path.is_none());
    assert!(result.log.contains("Expected executable not found"));
    assert!(!events.contains(&BuildEvent::Progress(100)));
}

#[tokio::test]
async fn test_run_finds_directory_mode_bundle() {
    let temp = TempDir::new().unwrap();
    let mut config = config_for(&temp);
    config.one_file = false;

    // Directory-mode layout: dist/app/app instead of dist/app
    let tool = write_fake_tool(
        &utf8_dir(&temp),
        &format!(
            "mkdir -p \"{bundle_dir}\"\ntouch \"{artifact}\"",
            bundle_dir = config.output_dir.join("app"),
            artifact = config.bundled_artifact_path()
        ),
    );

    let service = PackagingService::new(tool);
    let (result, _events) = run_collecting(&service, &config).await;
    let result = result.unwrap();

    assert!(result.success);
    assert_eq!(result.artifact_path, Some(config.bundled_artifact_path()));
}

#[tokio::test]
async fn test_run_merges_stderr_and_counts_diagnostics() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp);

    let tool = write_fake_tool(
        &utf8_dir(&temp),
        &format!(
            "echo \"stdout line\"\n\
             echo \"151 WARNING: lib not found: libfoo.so\" >&2\n\
             echo \"ERROR: hook failed\" >&2\n\
             mkdir -p \"{dist}\"\n\
             touch \"{artifact}\"",
            dist = config.output_dir,
            artifact = config.artifact_path()
        ),
    );

    let service = PackagingService::new(tool);
    let (result, events) = run_collecting(&service, &config).await;
    let result = result.unwrap();

    // Both streams land in the same captured log
    assert!(result.log.contains("stdout line"));
    assert!(result.log.contains("151 WARNING: lib not found"));
    assert!(result.log.contains("ERROR: hook failed"));

    assert_eq!(result.stats.warnings, 1);
    assert_eq!(result.stats.errors, 1);

    // And every line was relayed as an event
    assert!(
        events
            .iter()
            .any(|e| matches!(e, BuildEvent::Line(l) if l.contains("hook failed")))
    );
}

#[tokio::test]
async fn test_run_reports_launch_failure() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp);

    let service = PackagingService::new(utf8_dir(&temp).join("no-such-interpreter"));
    let (result, _events) = run_collecting(&service, &config).await;

    assert!(matches!(result, Err(PackagingError::Launch { .. })));
}

#[tokio::test]
async fn test_run_times_out() {
    let temp = TempDir::new().unwrap();
    let config = config_for(&temp);

    let tool = write_fake_tool(&utf8_dir(&temp), "sleep 30");
    let service = PackagingService::new(tool);

    let (event_tx, mut event_rx) = mpsc::channel(256);
    let drain = tokio::spawn(async move { while event_rx.recv().await.is_some() {} });

    let result = service
        .run(&config, Duration::from_millis(200), event_tx)
        .await;
    drain.await.unwrap();

    assert!(matches!(result, Err(PackagingError::Timeout(_))));
}
