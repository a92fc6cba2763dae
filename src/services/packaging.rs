use crate::models::BuildConfig;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::Regex;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Module handed to the interpreter via `-m`.
pub const PACKAGING_MODULE: &str = "PyInstaller";

/// Hidden import the packaging tool cannot discover on its own; always passed.
pub const FIXED_HIDDEN_IMPORT: &str = "win32timezone";

/// Result of a completed packaging run
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// True iff the expected executable exists after the tool finished.
    /// The tool's exit code does not decide this.
    pub success: bool,
    pub artifact_path: Option<Utf8PathBuf>,
    pub log: String,
    pub duration: Duration,
    pub stats: BuildStats,
}

/// Diagnostics counted from the tool's output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub warnings: usize,
    pub errors: usize,
}

impl BuildStats {
    pub fn has_problems(&self) -> bool {
        self.warnings > 0 || self.errors > 0
    }

    /// Get a summary string of the counted diagnostics
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if self.warnings > 0 {
            parts.push(format!("{} warnings", self.warnings));
        }
        if self.errors > 0 {
            parts.push(format!("{} errors", self.errors));
        }

        if parts.is_empty() {
            "No warnings".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Events streamed to the presentation layer while a build runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// One line of merged tool output
    Line(String),
    /// Best-effort progress percentage derived from milestone substrings.
    /// Not a reliable completion signal.
    Progress(u8),
}

/// A required form field is missing; checked before any subprocess is launched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No Python script selected")]
    MissingScript,

    #[error("Output name is empty")]
    MissingOutputName,

    #[error("\"Use Custom Icon\" is enabled but no icon file is selected")]
    MissingIcon,
}

/// Errors that can occur while running the packaging tool
#[derive(Error, Debug)]
pub enum PackagingError {
    #[error("Failed to launch {interpreter}: {source}")]
    Launch {
        interpreter: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Build timed out after {0:?}")]
    Timeout(Duration),

    #[error("Process error: {0}")]
    Process(#[from] std::io::Error),
}

/// Service for packaging a Python script into a standalone executable.
///
/// Wraps the external packaging tool, invoked as
/// `<interpreter> -m PyInstaller <args...>`. The service handles argument
/// assembly, subprocess execution with merged output streams, line relay to
/// the presentation layer and the post-build artifact check.
///
/// # Design Philosophy
///
/// - **Stateless**: All operations take explicit parameters; no hidden state
/// - **Framework-agnostic**: No GUI dependencies, works with any UI or CLI
/// - **Async**: Uses tokio for non-blocking subprocess execution and I/O
pub struct PackagingService {
    /// Interpreter the tool module is run under
    interpreter: Utf8PathBuf,

    /// Output substrings mapped to the progress percentage they imply.
    /// Insertion order decides which entry wins when a line matches several.
    milestones: IndexMap<&'static str, u8>,

    /// Regex for counting "WARNING" lines in tool output
    warning_pattern: Regex,

    /// Regex for counting "ERROR" lines in tool output
    error_pattern: Regex,
}

impl PackagingService {
    /// Create a new PackagingService running the tool under `interpreter`
    pub fn new(interpreter: Utf8PathBuf) -> Self {
        let mut milestones = IndexMap::new();
        milestones.insert("Building EXE", 50);
        milestones.insert("Building completed", 100);

        Self {
            interpreter,
            milestones,
            warning_pattern: Regex::new(r"\bWARNING\b").expect("Invalid warning regex"),
            error_pattern: Regex::new(r"\bERROR\b").expect("Invalid error regex"),
        }
    }

    pub fn interpreter(&self) -> &Utf8Path {
        &self.interpreter
    }

    /// Check that the form holds everything a build needs.
    ///
    /// Pure and synchronous; runs before any subprocess is launched.
    pub fn validate(config: &BuildConfig) -> Result<(), ValidationError> {
        if config.script_path.as_str().trim().is_empty() {
            return Err(ValidationError::MissingScript);
        }
        if config.output_name.trim().is_empty() {
            return Err(ValidationError::MissingOutputName);
        }
        if config.use_custom_icon && config.icon_path.as_str().trim().is_empty() {
            return Err(ValidationError::MissingIcon);
        }
        Ok(())
    }

    /// Map the configuration onto the tool's command line.
    ///
    /// The script path goes last because the tool takes it as a positional
    /// trailing argument; the remaining flag order is kept stable so runs
    /// are reproducible.
    pub fn build_args(config: &BuildConfig) -> Vec<String> {
        let mut args = vec![
            format!("--name={}", config.output_name),
            format!("--distpath={}", config.output_dir),
        ];

        if config.one_file {
            args.push("--onefile".to_string());
        }
        if !config.show_console {
            args.push("--windowed".to_string());
        }
        if config.debug_build {
            args.push("--debug=all".to_string());
        }
        if config.use_custom_icon {
            args.push("--icon".to_string());
            args.push(config.icon_path.to_string());
        }

        args.push(format!("--hidden-import={}", FIXED_HIDDEN_IMPORT));
        args.push(config.script_path.to_string());
        args
    }

    /// Progress percentage implied by an output line, if any
    pub fn milestone_for(&self, line: &str) -> Option<u8> {
        self.milestones
            .iter()
            .find(|(needle, _)| line.contains(*needle))
            .map(|(_, percent)| *percent)
    }

    fn scan_diagnostics(&self, line: &str, stats: &mut BuildStats) {
        if self.warning_pattern.is_match(line) {
            stats.warnings += 1;
        }
        if self.error_pattern.is_match(line) {
            stats.errors += 1;
        }
    }

    /// Run the packaging tool for the given configuration.
    ///
    /// Launches `<interpreter> -m PyInstaller <args...>` with stdout and
    /// stderr piped and merged into one line stream. Every line is forwarded
    /// through `events` and matched against the milestone table; after the
    /// child exits, success is decided solely by the existence of the
    /// expected artifact (a zero exit status with no artifact is a failure).
    ///
    /// # Arguments
    /// * `config` - Frozen build configuration (already validated)
    /// * `timeout_duration` - Maximum run time; zero disables the limit
    /// * `events` - Sink for [`BuildEvent`]s consumed by the presentation layer
    ///
    /// # Errors
    /// [`PackagingError::Launch`] when the interpreter cannot be spawned,
    /// [`PackagingError::Timeout`] past the limit, [`PackagingError::Process`]
    /// on stream or wait failures. A missing artifact is not an error; it is
    /// reported as an unsuccessful [`BuildResult`].
    pub async fn run(
        &self,
        config: &BuildConfig,
        timeout_duration: Duration,
        events: mpsc::Sender<BuildEvent>,
    ) -> Result<BuildResult, PackagingError> {
        let args = Self::build_args(config);
        tracing::info!(
            "Executing: {} -m {} {}",
            self.interpreter,
            PACKAGING_MODULE,
            args.join(" ")
        );

        let start = Instant::now();

        let mut cmd = Command::new(self.interpreter.as_str());
        cmd.arg("-m")
            .arg(PACKAGING_MODULE)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // An abandoned child (timeout path) is killed when the handle drops
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| PackagingError::Launch {
            interpreter: self.interpreter.clone(),
            source,
        })?;

        // Merge stdout and stderr into a single line-delimited stream
        let (line_tx, mut line_rx) = mpsc::channel::<String>(256);
        let stdout = child.stdout.take().expect("stdout is piped");
        let stderr = child.stderr.take().expect("stderr is piped");
        tokio::spawn(forward_lines(stdout, line_tx.clone()));
        tokio::spawn(forward_lines(stderr, line_tx));

        let relay = async {
            let mut log = String::new();
            let mut stats = BuildStats::default();

            // The channel drains until both forwarders hit EOF, which
            // happens when the child closes its ends of the pipes.
            while let Some(line) = line_rx.recv().await {
                self.scan_diagnostics(&line, &mut stats);

                if let Some(percent) = self.milestone_for(&line) {
                    let _ = events.send(BuildEvent::Progress(percent)).await;
                }

                log.push_str(&line);
                log.push('\n');
                let _ = events.send(BuildEvent::Line(line)).await;
            }

            let status = child.wait().await?;
            Ok::<_, std::io::Error>((log, stats, status))
        };

        let (mut log, stats, status) = if timeout_duration.is_zero() {
            relay.await?
        } else {
            timeout(timeout_duration, relay)
                .await
                .map_err(|_| {
                    tracing::warn!("Packaging tool timed out after {:?}", timeout_duration);
                    PackagingError::Timeout(timeout_duration)
                })??
        };

        let duration = start.elapsed();
        let exit_code = status.code().unwrap_or(-1);
        tracing::info!(
            "Packaging tool exited with code {} after {:.2}s ({})",
            exit_code,
            duration.as_secs_f32(),
            stats.summary()
        );

        // Exit status is only observed; the artifact decides the outcome
        let artifact_path = config.locate_artifact();
        match &artifact_path {
            Some(path) => {
                let done = format!("Executable created at: {}", path);
                log.push_str(&done);
                log.push('\n');
                let _ = events.send(BuildEvent::Line(done)).await;
                let _ = events.send(BuildEvent::Progress(100)).await;
            }
            None => {
                let missing = format!(
                    "Expected executable not found at: {}",
                    config.artifact_path()
                );
                tracing::warn!("{}", missing);
                log.push_str(&missing);
                log.push('\n');
                let _ = events.send(BuildEvent::Line(missing)).await;
            }
        }

        Ok(BuildResult {
            success: artifact_path.is_some(),
            artifact_path,
            log,
            duration,
            stats,
        })
    }
}

/// Forward lines from one child stream into the merged channel.
///
/// Ends at stream EOF or once the receiving side is gone.
async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            break;
        }
    }
}
