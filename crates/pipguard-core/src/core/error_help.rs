use crate::core::PipguardError;

/// Provides helpful suggestions for common errors
pub trait ErrorHelp {
    fn help(&self) -> Option<String>;
}

impl ErrorHelp for PipguardError {
    fn help(&self) -> Option<String> {
        match self {
            PipguardError::Pip(msg) => {
                if msg.contains("not found") {
                    Some(
                        "💡 Suggestion: Make sure pip is installed, or activate the virtual environment you want to install into"
                            .to_string(),
                    )
                } else {
                    None
                }
            }
            PipguardError::Resolution(msg) => {
                if msg.contains("exit code") {
                    Some(
                        "💡 Suggestion: Run the same command with 'pip install --dry-run' to see pip's own error output"
                            .to_string(),
                    )
                } else {
                    Some(
                        "💡 Suggestion: Check that the requested packages and versions exist on PyPI"
                            .to_string(),
                    )
                }
            }
            PipguardError::SourceBuildRequired(_) => Some(
                "💡 Suggestion: Install a version that ships wheels, or re-run and allow building from source if you trust the package"
                    .to_string(),
            ),
            PipguardError::Config(_) => Some(
                "💡 Suggestion: Fix or delete the pipguard config.yaml; a default one is recreated on the next run"
                    .to_string(),
            ),
            PipguardError::Http(e) => {
                if e.is_timeout() {
                    Some(
                        "💡 Suggestion: Check your internet connection, or try again later"
                            .to_string(),
                    )
                } else if e.is_connect() {
                    Some(
                        "💡 Suggestion: Check your internet connection and firewall settings"
                            .to_string(),
                    )
                } else {
                    Some(
                        "💡 Suggestion: Check your internet connection, or verify that pypi.org is accessible"
                            .to_string(),
                    )
                }
            }
            PipguardError::Io(e) => {
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    Some(
                        "💡 Suggestion: Check file permissions, or try running with appropriate permissions"
                            .to_string(),
                    )
                } else if e.kind() == std::io::ErrorKind::NotFound {
                    Some(
                        "💡 Suggestion: The file or program may not exist. Check the path and try again"
                            .to_string(),
                    )
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Format an error with helpful suggestions
pub fn format_error_with_help(error: &PipguardError) -> String {
    let mut output = format!("❌ Error: {}", error);

    if let Some(help) = error.help() {
        output.push_str("\n\n");
        output.push_str(&help);
    }

    output
}
