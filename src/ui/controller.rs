// GUI Controller - Bridges the Slint window with the build orchestration
//
// This module contains the GuiController which coordinates between:
// - Slint UI (MainWindow)
// - StateManager (application state)
// - PackagingService (build execution)
// - UiBridge (async/GUI coordination)
//
// It handles:
// - Wiring Slint callbacks to state mutations and the build task
// - Subscribing to state changes and rendering them into widgets
// - Native file browser dialogs
// - Build orchestration and result reporting

use crate::metrics::Metrics;
use crate::models::BuildConfig;
use crate::services::interpreter::discover_interpreter;
use crate::services::packaging::{BuildEvent, PackagingService};
use crate::state::{StateChange, StateManager};
use crate::ui::bridge::{UiBridge, UiBridgeHandle};
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// Include the generated Slint code
slint::include_modules!();

/// GUI Controller that wires up the Slint UI with application state and logic
///
/// This is the main coordinator for the GUI layer. It:
/// - Creates and manages the UiBridge for tokio/Slint coordination
/// - Sets up Slint callbacks to trigger the build task
/// - Subscribes to StateManager events and updates the UI accordingly
/// - Handles file browser dialogs using the `rfd` crate
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Bridge for marshaling between tokio and the Slint event loop
    _bridge: UiBridge<MainWindow>,

    /// Shared state manager
    _state_manager: Arc<StateManager>,
}

impl GuiController {
    /// Create a new GUI controller
    ///
    /// # Arguments
    /// * `state_manager` - Shared application state manager
    /// * `metrics` - Shared performance counters
    /// * `tokio_handle` - Handle to the tokio runtime for spawning async tasks
    pub fn new(
        state_manager: Arc<StateManager>,
        metrics: Arc<Metrics>,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;

        let bridge = UiBridge::new(&ui, tokio_handle);

        // Initialize UI with current state
        Self::sync_ui_with_state(&ui, &state_manager);

        // Set up Slint callbacks
        Self::setup_callbacks(&ui, &bridge, &state_manager, &metrics);

        // Subscribe to state changes and update UI
        Self::setup_state_subscription(&bridge, &state_manager, &metrics);

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            _state_manager: state_manager,
        })
    }

    /// Run the GUI (blocks until window is closed)
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        self.ui.run()
    }

    /// Synchronize UI with current state.
    ///
    /// Called once at startup to seed the widgets with the loaded settings.
    fn sync_ui_with_state(ui: &MainWindow, state_manager: &StateManager) {
        let state = state_manager.snapshot();

        ui.set_script_path(
            state
                .script_path
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default()
                .into(),
        );
        ui.set_icon_path(
            state
                .icon_path
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default()
                .into(),
        );
        ui.set_python_exe(
            state
                .python_exe
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default()
                .into(),
        );
        ui.set_use_custom_icon(state.use_custom_icon);
        ui.set_output_name(state.output_name.clone().into());
        ui.set_output_dir(state.output_dir.to_string().into());
        ui.set_one_file(state.one_file);
        ui.set_show_console(state.show_console);
        ui.set_debug_build(state.debug_build);

        ui.set_is_building(state.is_building);
        ui.set_progress(state.progress as i32);
        ui.set_status_message(Self::get_status_message(&state).into());

        tracing::debug!("UI synchronized with initial state");
    }

    /// Set up Slint UI callbacks
    ///
    /// This connects Slint UI events (button clicks, edits) to Rust logic.
    fn setup_callbacks(
        ui: &MainWindow,
        bridge: &UiBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        metrics: &Arc<Metrics>,
    ) {
        let bridge_handle = bridge.handle();
        let state = Arc::clone(state_manager);
        let metrics_clone = Arc::clone(metrics);
        let ui_weak_for_start = ui.as_weak();

        // Convert button
        ui.on_start_build(move || {
            tracing::info!("Convert button clicked");

            let snapshot = state.snapshot();
            let config = snapshot.snapshot_build_config();

            // Validate before anything is launched
            if let Err(e) = PackagingService::validate(&config) {
                tracing::error!("Cannot start build: {}", e);
                Self::show_error_dialog(&ui_weak_for_start, "Error", e.to_string(), "");
                return;
            }

            // Resolve the interpreter: configured path first, then PATH
            let interpreter = snapshot.python_exe.clone().or_else(discover_interpreter);
            let Some(interpreter) = interpreter else {
                tracing::error!("No Python interpreter available");
                Self::show_error_dialog(
                    &ui_weak_for_start,
                    "Python Not Found",
                    "No Python interpreter was found on PATH.\n\n\
                     Set \"Python EXE\" in PyPack Settings.yaml and restart.",
                    "",
                );
                return;
            };

            // At most one build in flight; the trigger is also disabled in
            // the UI while is_building is set.
            if !state.start_build() {
                tracing::warn!("Build already in flight - trigger ignored");
                return;
            }

            // Fresh console for the new build
            bridge_handle.post(|ui| {
                ui.set_console_text("".into());
            });

            let timeout = snapshot.build_timeout;
            let state_task = Arc::clone(&state);
            let metrics_task = Arc::clone(&metrics_clone);
            let bridge_task = bridge_handle.clone();

            bridge_handle.spawn(move || async move {
                Self::run_build(
                    state_task,
                    metrics_task,
                    bridge_task,
                    interpreter,
                    config,
                    timeout,
                )
                .await;
            });
        });

        let state = Arc::clone(state_manager);

        // Browse script callback
        ui.on_browse_script(move || {
            tracing::debug!("Browse script clicked");

            if let Some(path) =
                Self::show_file_picker("Select Python Script", vec![("Python Files", &["py"])])
            {
                tracing::info!("Script selected: {}", path);
                state.set_script_path(Some(path));
            }
        });

        let state = Arc::clone(state_manager);

        // Browse icon callback
        ui.on_browse_icon(move || {
            tracing::debug!("Browse icon clicked");

            if let Some(path) =
                Self::show_file_picker("Select Icon File", vec![("Icon Files", &["ico"])])
            {
                tracing::info!("Icon selected: {}", path);
                state.set_icon_path(Some(path));
            }
        });

        let state = Arc::clone(state_manager);

        // Browse output directory callback
        ui.on_browse_output_dir(move || {
            tracing::debug!("Browse output directory clicked");

            if let Some(dir) = Self::show_folder_picker("Select Output Directory") {
                tracing::info!("Output directory selected: {}", dir);
                state.set_output_dir(dir);
            }
        });

        // Text edits feed straight back into state

        let state = Arc::clone(state_manager);
        ui.on_script_path_edited(move |text| {
            let text = text.to_string();
            state.set_script_path(if text.trim().is_empty() {
                None
            } else {
                Some(Utf8PathBuf::from(text))
            });
        });

        let state = Arc::clone(state_manager);
        ui.on_icon_path_edited(move |text| {
            let text = text.to_string();
            state.set_icon_path(if text.trim().is_empty() {
                None
            } else {
                Some(Utf8PathBuf::from(text))
            });
        });

        let state = Arc::clone(state_manager);
        ui.on_output_name_edited(move |text| {
            state.update(|s| {
                s.output_name = text.to_string();
            });
        });

        let state = Arc::clone(state_manager);
        ui.on_output_dir_edited(move |text| {
            state.set_output_dir(Utf8PathBuf::from(text.to_string()));
        });

        // Flag checkboxes

        let state = Arc::clone(state_manager);
        ui.on_use_icon_toggled(move |checked| {
            tracing::debug!("Use custom icon toggled: {}", checked);
            state.update(|s| {
                s.use_custom_icon = checked;
            });
        });

        let state = Arc::clone(state_manager);
        ui.on_one_file_toggled(move |checked| {
            tracing::debug!("One file toggled: {}", checked);
            state.update_settings(|s| {
                s.one_file = checked;
            });
        });

        let state = Arc::clone(state_manager);
        ui.on_show_console_toggled(move |checked| {
            tracing::debug!("Show console toggled: {}", checked);
            state.update_settings(|s| {
                s.show_console = checked;
            });
        });

        let state = Arc::clone(state_manager);
        ui.on_debug_toggled(move |checked| {
            tracing::debug!("Debug mode toggled: {}", checked);
            state.update_settings(|s| {
                s.debug_build = checked;
            });
        });

        // Dialog dismissal

        let ui_weak = ui.as_weak();
        ui.on_error_dialog_dismissed(move || {
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_error_dialog(false);
            }
        });

        let ui_weak = ui.as_weak();
        ui.on_message_dialog_dismissed(move || {
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_message_dialog(false);
            }
        });

        let ui_weak = ui.as_weak();
        ui.on_close_confirmation_proceed(move || {
            tracing::info!("User confirmed exit during build");
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_close_confirmation(false);
                ui.window().hide().ok();
            }
        });

        let ui_weak = ui.as_weak();
        ui.on_close_confirmation_cancelled(move || {
            tracing::info!("User cancelled exit - build continues");
            if let Some(ui) = ui_weak.upgrade() {
                ui.set_show_close_confirmation(false);
            }
        });

        // Window close event handler
        let state = Arc::clone(state_manager);
        let ui_weak = ui.as_weak();

        ui.window().on_close_requested(move || {
            let is_building = state.read(|s| s.is_building);

            if is_building {
                tracing::info!("Close requested during build - showing confirmation dialog");
                if let Some(ui) = ui_weak.upgrade() {
                    ui.set_show_close_confirmation(true);
                }
                slint::CloseRequestResponse::KeepWindowShown
            } else {
                tracing::info!("Close requested - allowing window to close");
                slint::CloseRequestResponse::HideWindow
            }
        });

        tracing::debug!("UI callbacks configured");
    }

    /// Subscribe to state changes and update UI accordingly
    ///
    /// This spawns a background thread that listens for state change events
    /// and updates the Slint UI via the UiBridge.
    fn setup_state_subscription(
        bridge: &UiBridge<MainWindow>,
        state_manager: &Arc<StateManager>,
        metrics: &Arc<Metrics>,
    ) {
        let bridge_handle = bridge.handle();
        let state_manager_clone = Arc::clone(state_manager);
        let metrics = Arc::clone(metrics);
        let mut rx = state_manager.subscribe();

        std::thread::spawn(move || {
            tracing::debug!("State subscription thread started");

            loop {
                match rx.blocking_recv() {
                    Ok(change) => {
                        tracing::trace!("State change received: {:?}", change);
                        metrics.record_ui_update();

                        match change {
                            StateChange::ConfigurationChanged { is_ready } => {
                                tracing::debug!("Configuration changed: ready={}", is_ready);

                                let state_snapshot = state_manager_clone.snapshot();
                                bridge_handle.post(move |ui| {
                                    ui.set_script_path(
                                        state_snapshot
                                            .script_path
                                            .as_ref()
                                            .map(|p| p.as_str().to_string())
                                            .unwrap_or_default()
                                            .into(),
                                    );
                                    ui.set_icon_path(
                                        state_snapshot
                                            .icon_path
                                            .as_ref()
                                            .map(|p| p.as_str().to_string())
                                            .unwrap_or_default()
                                            .into(),
                                    );
                                    ui.set_use_custom_icon(state_snapshot.use_custom_icon);
                                    ui.set_output_name(state_snapshot.output_name.clone().into());
                                    ui.set_output_dir(state_snapshot.output_dir.to_string().into());
                                    ui.set_status_message(
                                        Self::get_status_message(&state_snapshot).into(),
                                    );
                                });
                            }

                            StateChange::SettingsChanged => {
                                let state_snapshot = state_manager_clone.snapshot();
                                bridge_handle.post(move |ui| {
                                    ui.set_one_file(state_snapshot.one_file);
                                    ui.set_show_console(state_snapshot.show_console);
                                    ui.set_debug_build(state_snapshot.debug_build);
                                    ui.set_python_exe(
                                        state_snapshot
                                            .python_exe
                                            .as_ref()
                                            .map(|p| p.as_str().to_string())
                                            .unwrap_or_default()
                                            .into(),
                                    );
                                });
                            }

                            StateChange::BuildStarted => {
                                tracing::info!("Build started");
                                bridge_handle.post(|ui| {
                                    ui.set_is_building(true);
                                    ui.set_progress(0);
                                });
                            }

                            StateChange::ProgressUpdated { percent } => {
                                bridge_handle.post(move |ui| {
                                    ui.set_progress(percent as i32);
                                });
                            }

                            StateChange::LogLine { line } => {
                                bridge_handle.post(move |ui| {
                                    let mut text = ui.get_console_text().to_string();
                                    text.push_str(&line);
                                    text.push('\n');
                                    ui.set_console_text(text.into());
                                });
                            }

                            StateChange::BuildFinished { success, artifact } => {
                                tracing::info!(
                                    "Build finished: success={}, artifact={:?}",
                                    success,
                                    artifact
                                );
                                bridge_handle.post(|ui| {
                                    ui.set_is_building(false);
                                });
                            }

                            StateChange::StatusChanged { message } => {
                                bridge_handle.post(move |ui| {
                                    ui.set_status_message(message.into());
                                });
                            }

                            StateChange::StateReset => {
                                tracing::info!("State reset");
                                bridge_handle.post(|ui| {
                                    ui.set_is_building(false);
                                    ui.set_progress(0);
                                    ui.set_status_message("".into());
                                    ui.set_console_text("".into());
                                });
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        tracing::info!(
                            "State broadcast channel closed - shutting down subscription thread"
                        );
                        break;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "State subscription lagged - {} events were skipped",
                            skipped
                        );
                        // Continue receiving - this is a recoverable error
                    }
                }
            }

            tracing::debug!("State subscription thread terminated gracefully");
        });
    }

    // ===== Build Orchestration =====

    /// Run one build to completion and report the outcome.
    ///
    /// Consumes the packaging service's event stream into state updates (which
    /// the subscription thread renders), then records the result and re-enables
    /// the trigger. Runs on the tokio runtime; every UI touch goes through the
    /// bridge or the state manager.
    async fn run_build(
        state: Arc<StateManager>,
        metrics: Arc<Metrics>,
        bridge: UiBridgeHandle<MainWindow>,
        interpreter: Utf8PathBuf,
        config: BuildConfig,
        timeout: Duration,
    ) {
        let service = PackagingService::new(interpreter);
        let (event_tx, mut event_rx) = mpsc::channel::<BuildEvent>(256);

        // Relay build events into state; the subscription thread takes it
        // from there.
        let state_events = Arc::clone(&state);
        let metrics_events = Arc::clone(&metrics);
        let relay = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                match event {
                    BuildEvent::Line(line) => {
                        metrics_events.record_log_line();
                        state_events.append_log_line(line);
                    }
                    BuildEvent::Progress(percent) => {
                        state_events.set_progress(percent);
                    }
                }
            }
        });

        let outcome = service.run(&config, timeout, event_tx).await;

        // The service dropped its sender; the relay drains and exits
        if let Err(e) = relay.await {
            tracing::error!("Build event relay failed: {}", e);
        }

        match outcome {
            Ok(result) => {
                metrics.record_build_time(result.duration);
                if result.success {
                    metrics.record_build_succeeded();
                } else {
                    metrics.record_build_failed();
                }

                let artifact = result.artifact_path.clone();
                state.finish_build(
                    result.success,
                    result.artifact_path,
                    result.stats.warnings,
                    result.stats.errors,
                );

                if let Some(path) = artifact {
                    let message = format!("EXE file created successfully at:\n{}", path);
                    bridge.post(move |ui| {
                        Self::show_message_dialog_on(ui, "Success", message);
                    });
                } else {
                    let details = result.stats.summary();
                    let expected = config.artifact_path().to_string();
                    bridge.post(move |ui| {
                        Self::show_error_dialog_on(
                            ui,
                            "Build Failed",
                            format!("The expected executable was not created:\n{}", expected),
                            details,
                        );
                    });
                }
            }
            Err(e) => {
                tracing::error!("Build error: {}", e);
                metrics.record_build_failed();

                state.append_log_line(format!("Error: {}", e));
                state.finish_build(false, None, 0, 0);

                let details = format!("{:?}", e);
                bridge.post(move |ui| {
                    Self::show_error_dialog_on(
                        ui,
                        "Build Failed",
                        "An error occurred while running the packaging tool.",
                        details,
                    );
                });
            }
        }
    }

    /// Generate contextual status message based on current state
    fn get_status_message(state: &crate::models::AppState) -> String {
        if state.is_building {
            "Converting... Please wait...".to_string()
        } else if !state.is_ready_to_build() {
            format!("Setup required: {}", state.missing_fields().join(", "))
        } else {
            format!("Ready to convert {}", state.output_name)
        }
    }

    // ===== Dialog helpers =====

    /// Show an error dialog (call on the UI thread)
    fn show_error_dialog(
        ui_weak: &slint::Weak<MainWindow>,
        title: impl Into<slint::SharedString>,
        message: impl Into<slint::SharedString>,
        details: impl Into<slint::SharedString>,
    ) {
        if let Some(ui) = ui_weak.upgrade() {
            Self::show_error_dialog_on(&ui, title, message, details);
        }
    }

    fn show_error_dialog_on(
        ui: &MainWindow,
        title: impl Into<slint::SharedString>,
        message: impl Into<slint::SharedString>,
        details: impl Into<slint::SharedString>,
    ) {
        ui.set_error_title(title.into());
        ui.set_error_message(message.into());
        ui.set_error_details(details.into());
        ui.set_show_error_dialog(true);
    }

    fn show_message_dialog_on(
        ui: &MainWindow,
        title: impl Into<slint::SharedString>,
        message: impl Into<slint::SharedString>,
    ) {
        ui.set_message_title(title.into());
        ui.set_message_text(message.into());
        ui.set_show_message_dialog(true);
    }

    /// Show a native file picker dialog
    ///
    /// # Arguments
    /// * `title` - Dialog title
    /// * `filters` - File type filters (name, extensions)
    ///
    /// # Returns
    /// The selected file path, or None if cancelled
    fn show_file_picker(title: &str, filters: Vec<(&str, &[&str])>) -> Option<Utf8PathBuf> {
        use rfd::FileDialog;

        let mut dialog = FileDialog::new().set_title(title);

        for (name, extensions) in filters {
            dialog = dialog.add_filter(name, extensions);
        }

        dialog.pick_file().and_then(|path| {
            Utf8PathBuf::try_from(path)
                .map_err(|e| {
                    tracing::error!("Failed to convert path to UTF-8: {}", e);
                    e
                })
                .ok()
        })
    }

    /// Show a native folder picker dialog
    fn show_folder_picker(title: &str) -> Option<Utf8PathBuf> {
        use rfd::FileDialog;

        FileDialog::new().set_title(title).pick_folder().and_then(|path| {
            Utf8PathBuf::try_from(path)
                .map_err(|e| {
                    tracing::error!("Failed to convert path to UTF-8: {}", e);
                    e
                })
                .ok()
        })
    }
}
