//! Integration tests for ConfigManager
//!
//! These tests verify YAML persistence of the user settings: round trips,
//! the serialized key names, and default fallbacks for absent files/keys.

use camino::Utf8PathBuf;
use pypack::{BuildSettings, ConfigManager, UserConfig};
use std::fs;
use tempfile::TempDir;

fn manager_in_temp() -> (ConfigManager, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let manager = ConfigManager::new(&config_path).unwrap();
    (manager, temp_dir)
}

#[test]
fn test_config_dir_is_created() {
    let temp_dir = TempDir::new().unwrap();
    let nested = Utf8PathBuf::try_from(temp_dir.path().to_path_buf())
        .unwrap()
        .join("PyPack Data");

    let manager = ConfigManager::new(&nested).unwrap();
    assert!(nested.is_dir());
    assert_eq!(manager.config_dir(), nested);
}

#[test]
fn test_absent_settings_file_yields_defaults() {
    let (manager, _temp) = manager_in_temp();

    let config = manager.load_settings().unwrap();
    assert!(config.settings.one_file);
    assert!(!config.settings.show_console);
    assert_eq!(config.settings.build_timeout, 600);
    assert!(config.settings.python_exe.is_empty());
}

#[test]
fn test_settings_round_trip() {
    let (manager, _temp) = manager_in_temp();

    let config = UserConfig {
        settings: BuildSettings {
            python_exe: "C:/Python312/python.exe".to_string(),
            output_dir: "C:/Builds/dist".to_string(),
            last_script: "C:/Projects/tool.py".to_string(),
            use_custom_icon: true,
            icon_file: "C:/Projects/tool.ico".to_string(),
            one_file: false,
            show_console: true,
            debug_mode: true,
            build_timeout: 120,
        },
    };

    manager.save_settings(&config).unwrap();
    let loaded = manager.load_settings().unwrap();

    assert_eq!(loaded.settings.python_exe, config.settings.python_exe);
    assert_eq!(loaded.settings.output_dir, config.settings.output_dir);
    assert_eq!(loaded.settings.last_script, config.settings.last_script);
    assert_eq!(loaded.settings.icon_file, config.settings.icon_file);
    assert!(loaded.settings.use_custom_icon);
    assert!(!loaded.settings.one_file);
    assert!(loaded.settings.show_console);
    assert!(loaded.settings.debug_mode);
    assert_eq!(loaded.settings.build_timeout, 120);
}

#[test]
fn test_serialized_key_names() {
    let (manager, temp) = manager_in_temp();

    manager.save_settings(&UserConfig::default()).unwrap();

    let written = fs::read_to_string(temp.path().join("PyPack Settings.yaml")).unwrap();
    assert!(written.contains("PyPack_Settings"));
    assert!(written.contains("Python EXE"));
    assert!(written.contains("One File"));
    assert!(written.contains("Build Timeout"));
}

#[test]
fn test_partial_settings_file_uses_defaults_for_rest() {
    let (manager, temp) = manager_in_temp();

    fs::write(
        temp.path().join("PyPack Settings.yaml"),
        "PyPack_Settings:\n  \"Debug Mode\": true\n",
    )
    .unwrap();

    let loaded = manager.load_settings().unwrap();
    assert!(loaded.settings.debug_mode);
    assert!(loaded.settings.one_file);
    assert_eq!(loaded.settings.build_timeout, 600);
}

#[test]
fn test_malformed_settings_file_is_an_error() {
    let (manager, temp) = manager_in_temp();

    fs::write(
        temp.path().join("PyPack Settings.yaml"),
        "PyPack_Settings: [not, a, mapping]\n",
    )
    .unwrap();

    assert!(manager.load_settings().is_err());
}
