//! Services module - Pure business logic for packaging builds.
//!
//! This module contains the core logic for converting a Python script into a
//! standalone executable by driving the external packaging tool. The services
//! are **framework-agnostic** and have no dependencies on the UI layer,
//! making them testable and reusable.
//!
//! # Components
//!
//! - [`PackagingService`]: The build orchestrator. Handles:
//!   - Validating the form values before anything is launched
//!   - Mapping the configuration onto the tool's command line
//!   - Executing the tool as a subprocess with merged output streams
//!   - Relaying output lines and milestone-based progress to the UI
//!   - Deciding success by checking that the expected executable exists
//!
//! - [`interpreter`]: Locating a Python interpreter on `PATH` and deriving
//!   the default executable name from a script path.
//!
//! # Design Philosophy
//!
//! The services layer is designed to be:
//! - **Pure**: No side effects beyond file I/O and subprocess execution
//! - **Async**: Subprocess execution uses tokio for non-blocking I/O
//! - **Testable**: No hidden dependencies, all inputs are explicit parameters
//! - **Framework-agnostic**: No Slint, no GUI code, only business logic

pub mod interpreter;
pub mod packaging;

pub use interpreter::{default_artifact_name, discover_interpreter, find_interpreter_in};
pub use packaging::{
    BuildEvent, BuildResult, BuildStats, PackagingError, PackagingService, ValidationError,
};
