use camino::Utf8PathBuf;
use std::env::consts::EXE_SUFFIX;

/// Immutable build configuration.
///
/// Snapshotted from [`AppState`](crate::models::AppState) at the moment the
/// user triggers a build, so edits made in the form while the packaging tool
/// is running cannot leak into the build in flight. Values are taken verbatim
/// from the form; emptiness is checked by
/// [`PackagingService::validate`](crate::services::packaging::PackagingService::validate),
/// not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Script file to hand to the packaging tool. Appended last on the
    /// command line because the tool takes it as a positional argument.
    pub script_path: Utf8PathBuf,

    /// Executable name, without platform extension.
    pub output_name: String,

    /// Directory the tool drops artifacts into (`--distpath`).
    pub output_dir: Utf8PathBuf,

    /// Whether the icon row of the form is active.
    pub use_custom_icon: bool,

    /// Icon file, only meaningful when `use_custom_icon` is set.
    pub icon_path: Utf8PathBuf,

    /// Bundle into a single executable (`--onefile`).
    pub one_file: bool,

    /// Keep a console window attached; when off the tool gets `--windowed`.
    pub show_console: bool,

    /// Verbose tool build (`--debug=all`).
    pub debug_build: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            script_path: Utf8PathBuf::new(),
            output_name: String::new(),
            output_dir: Utf8PathBuf::new(),
            use_custom_icon: false,
            icon_path: Utf8PathBuf::new(),
            one_file: true,
            show_console: false,
            debug_build: false,
        }
    }
}

impl BuildConfig {
    /// Expected artifact for a one-file build: `<output_dir>/<name><exe suffix>`.
    pub fn artifact_path(&self) -> Utf8PathBuf {
        self.output_dir
            .join(format!("{}{}", self.output_name, EXE_SUFFIX))
    }

    /// Artifact location inside a directory-mode bundle:
    /// `<output_dir>/<name>/<name><exe suffix>`.
    pub fn bundled_artifact_path(&self) -> Utf8PathBuf {
        self.output_dir
            .join(&self.output_name)
            .join(format!("{}{}", self.output_name, EXE_SUFFIX))
    }

    /// Find the produced executable, checking the flat one-file layout first
    /// and falling back to the directory-bundle layout.
    pub fn locate_artifact(&self) -> Option<Utf8PathBuf> {
        let flat = self.artifact_path();
        if flat.is_file() {
            return Some(flat);
        }
        let bundled = self.bundled_artifact_path();
        if bundled.is_file() {
            return Some(bundled);
        }
        None
    }
}
