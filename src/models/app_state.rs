use crate::models::BuildConfig;
use crate::models::settings::BuildSettings;
use camino::Utf8PathBuf;
use std::time::Duration;

/// Single source of truth for all application state.
///
/// Holds the form values, the runtime build state and the outcome of the
/// last completed build.
///
/// # Thread Safety
///
/// `AppState` is wrapped in `Arc<RwLock<AppState>>` by
/// [`crate::state::StateManager`] to provide thread-safe access across the
/// application. Never access `AppState` directly - always use
/// [`StateManager`](crate::state::StateManager) methods:
/// - [`read()`](crate::state::StateManager::read) for read-only access
/// - [`update()`](crate::state::StateManager::update) for mutations with automatic change events
#[derive(Clone, Debug)]
pub struct AppState {
    // Form values
    pub script_path: Option<Utf8PathBuf>,
    pub icon_path: Option<Utf8PathBuf>,
    pub use_custom_icon: bool,
    pub output_name: String,
    pub output_dir: Utf8PathBuf,
    pub python_exe: Option<Utf8PathBuf>,
    pub one_file: bool,
    pub show_console: bool,
    pub debug_build: bool,

    // Runtime state
    pub is_building: bool,
    pub progress: u8,
    pub status_message: String,

    // Outcome of the last completed build
    pub builds_run: usize,
    pub last_build_succeeded: Option<bool>,
    pub last_artifact: Option<Utf8PathBuf>,
    pub last_warnings: usize,
    pub last_errors: usize,

    // Settings
    pub build_timeout: Duration,
}

impl Default for AppState {
    fn default() -> Self {
        // The original converter defaulted its output directory to ./dist,
        // matching where the packaging tool drops artifacts anyway.
        let default_dist = std::env::current_dir()
            .ok()
            .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
            .map(|p| p.join("dist"))
            .unwrap_or_else(|| Utf8PathBuf::from("dist"));

        Self {
            script_path: None,
            icon_path: None,
            use_custom_icon: false,
            output_name: String::new(),
            output_dir: default_dist,
            python_exe: None,
            one_file: true,
            show_console: false,
            debug_build: false,

            is_building: false,
            progress: 0,
            status_message: String::new(),

            builds_run: 0,
            last_build_succeeded: None,
            last_artifact: None,
            last_warnings: 0,
            last_errors: 0,

            build_timeout: Duration::from_secs(600),
        }
    }
}

impl AppState {
    /// Form fields that still need a value before a build can start.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.script_path.is_none() {
            missing.push("Python script");
        }
        if self.output_name.trim().is_empty() {
            missing.push("Output name");
        }
        if self.use_custom_icon && self.icon_path.is_none() {
            missing.push("Icon file");
        }
        missing
    }

    /// Check if the form holds everything a build needs.
    pub fn is_ready_to_build(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Freeze the current form values into an immutable [`BuildConfig`].
    ///
    /// The snapshot is what the build actually runs with; later form edits
    /// do not affect a build in flight.
    pub fn snapshot_build_config(&self) -> BuildConfig {
        BuildConfig {
            script_path: self.script_path.clone().unwrap_or_default(),
            output_name: self.output_name.trim().to_string(),
            output_dir: self.output_dir.clone(),
            use_custom_icon: self.use_custom_icon,
            icon_path: self.icon_path.clone().unwrap_or_default(),
            one_file: self.one_file,
            show_console: self.show_console,
            debug_build: self.debug_build,
        }
    }

    /// Record the outcome of a completed build.
    pub fn record_build_outcome(
        &mut self,
        success: bool,
        artifact: Option<Utf8PathBuf>,
        warnings: usize,
        errors: usize,
    ) {
        self.builds_run += 1;
        self.last_build_succeeded = Some(success);
        self.last_artifact = artifact;
        self.last_warnings = warnings;
        self.last_errors = errors;
    }

    /// Reset the runtime build state to idle.
    pub fn reset_build_state(&mut self) {
        self.is_building = false;
        self.progress = 0;
        self.status_message.clear();
    }

    /// Export the current form values as persistable settings.
    pub fn to_settings(&self) -> BuildSettings {
        BuildSettings {
            python_exe: self
                .python_exe
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            output_dir: self.output_dir.to_string(),
            last_script: self
                .script_path
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            use_custom_icon: self.use_custom_icon,
            icon_file: self
                .icon_path
                .as_ref()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            one_file: self.one_file,
            show_console: self.show_console,
            debug_mode: self.debug_build,
            build_timeout: self.build_timeout.as_secs() as u32,
        }
    }
}
