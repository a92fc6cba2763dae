//! Integration tests for StateManager
//!
//! These tests exercise the state layer the way the GUI does: mutate through
//! the public API, observe the broadcast events a subscriber would render.

use camino::Utf8PathBuf;
use pypack::state::{StateChange, StateManager};
use pypack::{BuildSettings, UserConfig};

#[test]
fn test_form_workflow_reaches_ready() {
    let manager = StateManager::new();
    assert!(!manager.read(|s| s.is_ready_to_build()));

    manager.set_script_path(Some(Utf8PathBuf::from("/work/converter.py")));

    // Picking a script prefills the output name, which makes the form ready
    let state = manager.snapshot();
    assert_eq!(state.output_name, "converter");
    assert!(state.is_ready_to_build());

    // Enabling the icon checkbox without a file makes it unready again
    manager.update(|s| s.use_custom_icon = true);
    assert!(!manager.read(|s| s.is_ready_to_build()));

    manager.set_icon_path(Some(Utf8PathBuf::from("/work/converter.ico")));
    assert!(manager.read(|s| s.is_ready_to_build()));
}

#[test]
fn test_configuration_events_carry_readiness() {
    let manager = StateManager::new();
    let mut rx = manager.subscribe();

    manager.set_script_path(Some(Utf8PathBuf::from("/work/app.py")));

    assert_eq!(
        rx.try_recv().unwrap(),
        StateChange::ConfigurationChanged { is_ready: true }
    );
}

#[test]
fn test_full_build_event_sequence() {
    let manager = StateManager::new();
    manager.set_script_path(Some(Utf8PathBuf::from("/work/app.py")));

    let mut rx = manager.subscribe();

    assert!(manager.start_build());
    manager.append_log_line("100 INFO: Analyzing app.py");
    manager.set_progress(50);
    manager.set_progress(100);
    manager.finish_build(true, Some(Utf8PathBuf::from("/work/dist/app")), 1, 0);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(events.contains(&StateChange::BuildStarted));
    assert!(events.contains(&StateChange::LogLine {
        line: "100 INFO: Analyzing app.py".to_string()
    }));
    assert!(events.contains(&StateChange::ProgressUpdated { percent: 50 }));
    assert!(events.contains(&StateChange::ProgressUpdated { percent: 100 }));
    assert!(events.contains(&StateChange::BuildFinished {
        success: true,
        artifact: Some(Utf8PathBuf::from("/work/dist/app")),
    }));

    // BuildStarted comes before BuildFinished
    let started = events
        .iter()
        .position(|e| matches!(e, StateChange::BuildStarted))
        .unwrap();
    let finished = events
        .iter()
        .position(|e| matches!(e, StateChange::BuildFinished { .. }))
        .unwrap();
    assert!(started < finished);
}

#[test]
fn test_at_most_one_build_in_flight() {
    let manager = StateManager::new();

    assert!(manager.start_build());

    // Repeated triggers while building are rejected without state changes
    for _ in 0..3 {
        assert!(!manager.start_build());
    }
    assert_eq!(manager.read(|s| s.builds_run), 0);

    manager.finish_build(false, None, 0, 0);
    assert!(manager.start_build());
}

#[test]
fn test_trigger_released_after_failure() {
    let manager = StateManager::new();

    manager.start_build();
    manager.finish_build(false, None, 0, 1);

    // The trigger is re-enabled regardless of outcome
    let state = manager.snapshot();
    assert!(!state.is_building);
    assert_eq!(state.last_build_succeeded, Some(false));
    assert!(manager.start_build());
}

#[test]
fn test_settings_round_trip_through_state() {
    let manager = StateManager::new();

    let config = UserConfig {
        settings: BuildSettings {
            python_exe: "/opt/python/bin/python3".to_string(),
            output_dir: "/builds/out".to_string(),
            last_script: "/builds/tool.py".to_string(),
            use_custom_icon: true,
            icon_file: "/builds/tool.ico".to_string(),
            one_file: false,
            show_console: true,
            debug_mode: true,
            build_timeout: 90,
        },
    };

    manager.load_from_settings(&config);
    let exported = manager.read(|s| s.to_settings());

    assert_eq!(exported.python_exe, config.settings.python_exe);
    assert_eq!(exported.output_dir, config.settings.output_dir);
    assert_eq!(exported.last_script, config.settings.last_script);
    assert_eq!(exported.icon_file, config.settings.icon_file);
    assert!(exported.use_custom_icon);
    assert!(!exported.one_file);
    assert!(exported.show_console);
    assert!(exported.debug_mode);
    assert_eq!(exported.build_timeout, 90);
}

#[test]
fn test_shared_state_across_clones_and_threads() {
    let manager = StateManager::new();
    let worker = manager.clone();

    let handle = std::thread::spawn(move || {
        worker.start_build();
        worker.set_progress(50);
    });
    handle.join().unwrap();

    let state = manager.snapshot();
    assert!(state.is_building);
    assert_eq!(state.progress, 50);
}
