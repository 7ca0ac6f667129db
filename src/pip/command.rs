use crate::core::path::venv_python;
use crate::core::{PipguardError, PipguardResult};
use crate::pip::report::PipInstallReport;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// pip stderr fragments meaning no wheel satisfied a requirement
const MISSING_WHEEL_MARKERS: &[&str] = &[
    "No matching distribution found",
    "Could not find a version that satisfies",
];

/// Build the `pip install` arguments for a dry-run report.
///
/// Unless `allow_source_builds` is set, only wheels are considered, so resolving cannot
/// run any package's build code. Explicit `--only-binary`/`--no-binary` choices are kept.
fn report_args(install_args: &[String], allow_source_builds: bool) -> Vec<String> {
    let mut args = vec!["install".to_string()];
    args.extend_from_slice(install_args);
    let user_chose_formats = install_args.iter().any(|arg| {
        ["--only-binary", "--no-binary"]
            .iter()
            .any(|flag| arg == flag || arg.starts_with(&format!("{}=", flag)))
    });
    if !allow_source_builds && !user_chose_formats {
        args.push("--only-binary=:all:".to_string());
    }
    args.extend(
        ["--dry-run", "--quiet", "--report", "-"]
            .iter()
            .map(|s| s.to_string()),
    );
    args
}

fn needs_source_build(stderr: &str) -> bool {
    MISSING_WHEEL_MARKERS.iter().any(|marker| stderr.contains(marker))
}

/// How to invoke pip for the current environment.
///
/// Built once from the environment by the caller and passed to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipCommand {
    program: PathBuf,
    base_args: Vec<String>,
}

impl PipCommand {
    /// Create a new pip invocation: `program` followed by `base_args` before each command
    pub fn new(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    /// Use the activated virtual environment's interpreter so that packages land in that
    /// environment; otherwise whichever `pip` is on PATH.
    pub fn from_env() -> PipguardResult<Self> {
        Self::detect(std::env::var_os("VIRTUAL_ENV").map(PathBuf::from))
    }

    fn detect(virtual_env: Option<PathBuf>) -> PipguardResult<Self> {
        if let Some(venv) = virtual_env.filter(|v| !v.as_os_str().is_empty()) {
            return Ok(Self::new(
                venv_python(&venv),
                vec!["-m".to_string(), "pip".to_string()],
            ));
        }

        which::which("pip")
            .or_else(|_| which::which("pip3"))
            .map(|pip| Self::new(pip, Vec::new()))
            .map_err(|_| PipguardError::Pip("pip executable not found on PATH".to_string()))
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args).args(args);
        cmd
    }

    fn display(&self, args: &[String]) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.base_args.iter().cloned());
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }

    /// Run pip with the user's arguments, inheriting stdio. Returns pip's exit code.
    pub async fn pass_through(&self, args: &[String]) -> PipguardResult<i32> {
        tracing::debug!("Running subprocess: {}", self.display(args));
        let start = Instant::now();

        let status = self.command(args).status().await.map_err(|e| {
            PipguardError::Pip(format!(
                "Failed to run {}: {}",
                self.program.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Subprocess completed in {:.2}s with {}",
            start.elapsed().as_secs_f64(),
            status
        );
        Ok(status.code().unwrap_or(1))
    }

    /// Ask pip what it would install for these install arguments, without installing anything.
    ///
    /// Without `allow_source_builds` pip may only use wheels. If that is not enough to
    /// resolve, [`PipguardError::SourceBuildRequired`] is returned. Allowing source builds
    /// lets pip build source distributions, which runs their build hooks.
    pub async fn install_report(
        &self,
        install_args: &[String],
        allow_source_builds: bool,
    ) -> PipguardResult<PipInstallReport> {
        let args = report_args(install_args, allow_source_builds);
        tracing::debug!("Running pip report subprocess: {}", self.display(&args));
        let start = Instant::now();

        let output = self
            .command(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                PipguardError::Pip(format!(
                    "Failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            tracing::debug!(
                "Pip report subprocess failed after {:.2}s",
                start.elapsed().as_secs_f64()
            );
            let stderr = String::from_utf8_lossy(&output.stderr);
            let binary_only = args.iter().any(|arg| arg == "--only-binary=:all:");
            if binary_only && needs_source_build(&stderr) {
                return Err(PipguardError::SourceBuildRequired(stderr.trim().to_string()));
            }
            return Err(PipguardError::Resolution(format!(
                "pip report failed with exit code {}:\n{}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        tracing::debug!(
            "Pip report subprocess completed in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        PipInstallReport::parse(&String::from_utf8_lossy(&output.stdout))
    }
}
