// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe
// access using Arc<RwLock<T>> and emits change events for GUI updates.

use crate::models::{AppState, UserConfig};
use crate::services::interpreter::default_artifact_name;
use camino::Utf8PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events are emitted to notify interested parties (primarily the GUI)
/// about state changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// A form field affecting build readiness has been updated
    ConfigurationChanged {
        is_ready: bool,
    },

    /// Build flags or tool settings have been updated
    SettingsChanged,

    /// A build has started; the trigger must stay disabled until it finishes
    BuildStarted,

    /// Best-effort progress percentage has been updated
    ProgressUpdated {
        percent: u8,
    },

    /// One line of tool output to append to the console view
    LogLine {
        line: String,
    },

    /// The build has finished, successfully or not
    BuildFinished {
        success: bool,
        artifact: Option<Utf8PathBuf>,
    },

    /// The status line has changed
    StatusChanged {
        message: String,
    },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// # Usage
///
/// Always use `StateManager` instead of accessing [`AppState`] directly:
/// - [`read()`](Self::read) for reading state without long-held locks
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(256);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.state.read().unwrap().clone()
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap();
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        // Form fields that decide build readiness
        if old.script_path != new.script_path
            || old.icon_path != new.icon_path
            || old.use_custom_icon != new.use_custom_icon
            || old.output_name != new.output_name
            || old.output_dir != new.output_dir
        {
            changes.push(StateChange::ConfigurationChanged {
                is_ready: new.is_ready_to_build(),
            });
        }

        // Build flags and tool settings
        if old.one_file != new.one_file
            || old.show_console != new.show_console
            || old.debug_build != new.debug_build
            || old.python_exe != new.python_exe
            || old.build_timeout != new.build_timeout
        {
            changes.push(StateChange::SettingsChanged);
        }

        // Build lifecycle
        if old.is_building != new.is_building {
            if new.is_building {
                changes.push(StateChange::BuildStarted);
            } else {
                changes.push(StateChange::BuildFinished {
                    success: new.last_build_succeeded.unwrap_or(false),
                    artifact: new.last_artifact.clone(),
                });
            }
        }

        if old.progress != new.progress {
            changes.push(StateChange::ProgressUpdated {
                percent: new.progress,
            });
        }

        if old.status_message != new.status_message {
            changes.push(StateChange::StatusChanged {
                message: new.status_message.clone(),
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Set the script path; prefills the output name from the script's file
    /// stem when the name field is still empty.
    pub fn set_script_path(&self, path: Option<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            if state.output_name.trim().is_empty() {
                if let Some(name) = path.as_deref().and_then(default_artifact_name) {
                    state.output_name = name;
                }
            }
            state.script_path = path;
        })
    }

    /// Set the icon file path
    pub fn set_icon_path(&self, path: Option<Utf8PathBuf>) -> Vec<StateChange> {
        self.update(|state| {
            state.icon_path = path;
        })
    }

    /// Set the output directory
    pub fn set_output_dir(&self, dir: Utf8PathBuf) -> Vec<StateChange> {
        self.update(|state| {
            state.output_dir = dir;
        })
    }

    /// Try to mark a build as started.
    ///
    /// Returns `false` without touching the state when a build is already in
    /// flight; the check and the transition happen under one write lock, so
    /// at most one build can ever be marked running.
    pub fn start_build(&self) -> bool {
        let mut started = false;
        self.update(|state| {
            if !state.is_building {
                state.is_building = true;
                state.progress = 0;
                state.status_message = "Converting... Please wait...".to_string();
                started = true;
            }
        });
        started
    }

    /// Record a finished build and release the trigger
    pub fn finish_build(
        &self,
        success: bool,
        artifact: Option<Utf8PathBuf>,
        warnings: usize,
        errors: usize,
    ) -> Vec<StateChange> {
        self.update(|state| {
            state.record_build_outcome(success, artifact, warnings, errors);
            state.is_building = false;
            state.status_message = if success {
                "Conversion completed successfully!".to_string()
            } else {
                "Conversion failed!".to_string()
            };
            if !success {
                state.progress = 0;
            }
        })
    }

    /// Update the progress percentage
    pub fn set_progress(&self, percent: u8) -> Vec<StateChange> {
        self.update(|state| {
            state.progress = percent.min(100);
        })
    }

    /// Update the status line
    pub fn set_status(&self, message: impl Into<String>) -> Vec<StateChange> {
        let message = message.into();
        self.update(|state| {
            state.status_message = message;
        })
    }

    /// Broadcast one line of tool output for the console view.
    ///
    /// Log lines are relayed, not stored in AppState; the captured log of a
    /// build lives in its BuildResult.
    pub fn append_log_line(&self, line: impl Into<String>) -> StateChange {
        let event = StateChange::LogLine { line: line.into() };
        let _ = self.state_tx.send(event.clone());
        event
    }

    /// Reset the runtime build state
    pub fn reset_build_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.reset_build_state();
        });

        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }

    /// Update settings
    pub fn update_settings<F>(&self, settings_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        self.update(settings_fn)
    }

    /// Load persisted user settings into the state.
    ///
    /// # Arguments
    /// * `user_config` - The loaded user configuration
    pub fn load_from_settings(&self, user_config: &UserConfig) -> Vec<StateChange> {
        use std::time::Duration;

        self.update(|state| {
            let settings = &user_config.settings;

            if !settings.python_exe.is_empty() {
                state.python_exe = Some(Utf8PathBuf::from(&settings.python_exe));
            }

            if !settings.output_dir.is_empty() {
                state.output_dir = Utf8PathBuf::from(&settings.output_dir);
            }

            if !settings.last_script.is_empty() {
                let script = Utf8PathBuf::from(&settings.last_script);
                if state.output_name.trim().is_empty() {
                    if let Some(name) = default_artifact_name(&script) {
                        state.output_name = name;
                    }
                }
                state.script_path = Some(script);
            }

            state.use_custom_icon = settings.use_custom_icon;
            if !settings.icon_file.is_empty() {
                state.icon_path = Some(Utf8PathBuf::from(&settings.icon_file));
            }

            state.one_file = settings.one_file;
            state.show_console = settings.show_console;
            state.debug_build = settings.debug_mode;
            state.build_timeout = Duration::from_secs(settings.build_timeout as u64);

            tracing::info!(
                "Loaded user settings: python={}, script={}, one_file={}, timeout={}s",
                state.python_exe.is_some(),
                state.script_path.is_some(),
                state.one_file,
                settings.build_timeout
            );
        })
    }

    /// Get an Arc reference to the state for use in worker threads
    pub fn state_arc(&self) -> Arc<RwLock<AppState>> {
        Arc::clone(&self.state)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
