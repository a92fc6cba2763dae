use serde::{Deserialize, Serialize};

/// User configuration from `PyPack Settings.yaml`
///
/// Persists the form choices between sessions so the user does not have to
/// re-enter paths and flags for every build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(rename = "PyPack_Settings")]
    pub settings: BuildSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(rename = "Python EXE", default)]
    pub python_exe: String,

    #[serde(rename = "Output Directory", default)]
    pub output_dir: String,

    #[serde(rename = "Last Script", default)]
    pub last_script: String,

    #[serde(rename = "Use Custom Icon", default)]
    pub use_custom_icon: bool,

    #[serde(rename = "Icon File", default)]
    pub icon_file: String,

    #[serde(rename = "One File", default = "default_one_file")]
    pub one_file: bool,

    #[serde(rename = "Show Console", default)]
    pub show_console: bool,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,

    /// Seconds before a running build is abandoned. Zero disables the limit.
    #[serde(rename = "Build Timeout", default = "default_build_timeout")]
    pub build_timeout: u32,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            python_exe: String::new(),
            output_dir: String::new(),
            last_script: String::new(),
            use_custom_icon: false,
            icon_file: String::new(),
            one_file: true,
            show_console: false,
            debug_mode: false,
            build_timeout: 600,
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            settings: BuildSettings::default(),
        }
    }
}

fn default_one_file() -> bool {
    true
}

fn default_build_timeout() -> u32 {
    600
}
