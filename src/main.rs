//! PyPack - Python Script to Executable Converter
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend for PyPack. It initializes:
//! - Logging infrastructure (rotating file + console output)
//! - Tokio async runtime (worker threads for subprocess execution)
//! - State management ([`StateManager`])
//! - Settings loading ([`ConfigManager`])
//! - GUI controller ([`pypack::ui::GuiController`] - bridges Slint UI with the build logic)
//!
//! The application uses a hybrid threading model:
//! - **Main thread**: Runs the Slint event loop (blocking, synchronous)
//! - **Tokio workers**: Run the packaging-tool subprocess and its output relay
//! - **State listener**: Background std::thread for reactive UI updates
//!
//! # Execution Flow
//!
//! 1. Initialize logging → logs/pypack.<date>
//! 2. Create tokio runtime
//! 3. Create StateManager (Arc<RwLock<AppState>>)
//! 4. Load `PyPack Data/PyPack Settings.yaml` into the state
//! 5. Discover a Python interpreter if none is configured
//! 6. Create GuiController (wires Slint UI to state and runtime)
//! 7. Run Slint event loop (blocks until window closed)
//! 8. Persist settings, log metrics, shut the runtime down

use anyhow::Result;
use pypack::services::interpreter::discover_interpreter;
use pypack::ui::GuiController;
use pypack::{APP_NAME, ConfigManager, Metrics, StateManager, UserConfig, VERSION};
use std::sync::Arc;

/// Main entry point for the PyPack GUI application
///
/// # Errors
///
/// This function can fail if:
/// - Logging initialization fails (disk space, permissions)
/// - Tokio runtime creation fails (system resources)
/// - The settings file exists but is invalid YAML
/// - Slint UI initialization fails (graphics drivers, display)
fn main() -> Result<()> {
    // Setup logging with both file and console output.
    // The guard keeps the non-blocking file writer alive for the whole run.
    let _log_guard = pypack::logging::setup_logging("logs", "pypack", false, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // Create tokio runtime for async operations.
    // This handles the packaging subprocess and its output relay.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("pypack-worker")
        .build()?;

    tracing::info!("Tokio runtime initialized");

    let state_manager = Arc::new(StateManager::new());
    let metrics = Arc::new(Metrics::new());

    // Load persisted settings into the state
    let config_manager = ConfigManager::new("PyPack Data")?;
    let user_config = config_manager.load_settings()?;
    state_manager.load_from_settings(&user_config);

    // Without a configured interpreter, fall back to whatever PATH offers
    if state_manager.read(|s| s.python_exe.is_none()) {
        if let Some(python) = discover_interpreter() {
            state_manager.update_settings(|s| s.python_exe = Some(python));
        } else {
            tracing::warn!("No Python interpreter configured or found on PATH");
        }
    }

    // Create GUI controller.
    // This wires up the Slint UI with state management and the tokio runtime.
    let gui_controller = GuiController::new(
        Arc::clone(&state_manager),
        Arc::clone(&metrics),
        runtime.handle().clone(),
    )?;

    tracing::info!("GUI controller initialized, launching window");

    // Run the GUI (blocks until window is closed).
    // The tokio runtime stays alive in the background to handle async tasks.
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    if state_manager.read(|s| s.is_building) {
        tracing::warn!("Window closed during a build - the running tool will be abandoned");
    }

    // Persist the form values for the next session
    let settings = UserConfig {
        settings: state_manager.read(|s| s.to_settings()),
    };
    if let Err(e) = config_manager.save_settings(&settings) {
        tracing::error!("Failed to save settings: {}", e);
    }

    metrics.log_summary();

    // Shutdown the tokio runtime gracefully
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
