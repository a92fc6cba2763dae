//! Data models for the PyPack application.
//!
//! This module contains the core data structures used throughout the
//! application:
//! - [`AppState`]: The central state container holding form values, build
//!   progress and the last build outcome
//! - [`BuildConfig`]: Immutable snapshot of the form handed to the packaging
//!   service when a build starts
//! - [`UserConfig`] / [`BuildSettings`]: User preferences persisted as
//!   `PyPack Settings.yaml`
//!
//! # Architecture Note
//!
//! The models are designed to be:
//! - **Serializable**: The settings structs derive `Serialize`/`Deserialize`
//!   for YAML persistence
//! - **Cloneable**: AppState is wrapped in `Arc<RwLock<>>` by
//!   [`StateManager`](crate::state::StateManager) for thread-safe access
//! - **Immutable**: State updates go through StateManager's `update()` method
//!   to ensure consistency

pub mod app_state;
pub mod build;
pub mod settings;

pub use app_state::AppState;
pub use build::BuildConfig;
pub use settings::{BuildSettings, UserConfig};
