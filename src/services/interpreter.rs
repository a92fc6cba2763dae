//! Interpreter discovery utilities.
//!
//! The packaging tool is a Python module, so the application needs a Python
//! interpreter to run it under. The original form relied on whatever
//! interpreter hosted it; a standalone binary has to look one up itself.
//! Discovery scans `PATH` for the usual interpreter launcher names and the
//! user can always override the result in the settings file.

use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::env::consts::EXE_SUFFIX;

/// Interpreter launcher names probed in each directory, in preference order
const INTERPRETER_CANDIDATES: [&str; 3] = ["python3", "python", "py"];

/// Scan candidate directories for a Python interpreter.
///
/// Directories are searched in the given order; within a directory the
/// launcher names are tried in [`INTERPRETER_CANDIDATES`] order, so an
/// earlier directory wins over a preferred name further down the path.
///
/// # Arguments
///
/// * `dirs` - Directories to search, highest priority first
///
/// # Returns
///
/// Full path to the first interpreter found, None otherwise
pub fn find_interpreter_in<I>(dirs: I) -> Option<Utf8PathBuf>
where
    I: IntoIterator<Item = Utf8PathBuf>,
{
    for dir in dirs {
        for name in INTERPRETER_CANDIDATES {
            let candidate = dir.join(format!("{}{}", name, EXE_SUFFIX));
            if candidate.is_file() {
                tracing::info!("Found Python interpreter: {}", candidate);
                return Some(candidate);
            }
        }
    }
    None
}

/// Locate a Python interpreter on the `PATH` environment variable.
pub fn discover_interpreter() -> Option<Utf8PathBuf> {
    let path_var = env::var_os("PATH")?;
    let dirs = env::split_paths(&path_var).filter_map(|p| Utf8PathBuf::from_path_buf(p).ok());

    let found = find_interpreter_in(dirs);
    if found.is_none() {
        tracing::warn!("No Python interpreter found on PATH");
    }
    found
}

/// Default executable name for a script: its file stem.
///
/// Used to prefill the output-name field when the user picks a script and
/// has not typed a name yet.
pub fn default_artifact_name(script: &Utf8Path) -> Option<String> {
    script
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .map(|stem| stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Utf8Path, name: &str) -> Utf8PathBuf {
        let path = dir.join(format!("{}{}", name, EXE_SUFFIX));
        File::create(&path).unwrap();
        path
    }

    fn utf8_dir(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_find_interpreter_in_seeded_dir() {
        let temp = TempDir::new().unwrap();
        let dir = utf8_dir(&temp);
        let expected = touch(&dir, "python3");

        assert_eq!(find_interpreter_in([dir]), Some(expected));
    }

    #[test]
    fn test_candidate_preference_within_dir() {
        let temp = TempDir::new().unwrap();
        let dir = utf8_dir(&temp);
        touch(&dir, "python");
        let preferred = touch(&dir, "python3");

        assert_eq!(find_interpreter_in([dir]), Some(preferred));
    }

    #[test]
    fn test_earlier_dir_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let first_dir = utf8_dir(&first);
        let second_dir = utf8_dir(&second);

        let expected = touch(&first_dir, "py");
        touch(&second_dir, "python3");

        assert_eq!(
            find_interpreter_in([first_dir, second_dir]),
            Some(expected)
        );
    }

    #[test]
    fn test_non_candidates_ignored() {
        let temp = TempDir::new().unwrap();
        let dir = utf8_dir(&temp);
        touch(&dir, "python-config");
        touch(&dir, "pydoc");

        assert_eq!(find_interpreter_in([dir]), None);
    }

    #[test]
    fn test_default_artifact_name() {
        assert_eq!(
            default_artifact_name(Utf8Path::new("/work/my_tool.py")),
            Some("my_tool".to_string())
        );
        assert_eq!(
            default_artifact_name(Utf8Path::new("script.py")),
            Some("script".to_string())
        );
        assert_eq!(default_artifact_name(Utf8Path::new("")), None);
    }
}
