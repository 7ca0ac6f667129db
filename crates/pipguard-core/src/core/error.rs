use thiserror::Error;

pub type PipguardResult<T> = Result<T, PipguardError>;

#[derive(Error, Debug)]
pub enum PipguardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("pip error: {0}")]
    Pip(String),

    #[error("Dependency resolution error: {0}")]
    Resolution(String),

    #[error("Source build required: {0}")]
    SourceBuildRequired(String),

    #[error("Interrupted by user")]
    Interrupted,
}

impl PipguardError {
    /// Process exit code to use when this error ends the run
    pub fn exit_code(&self) -> i32 {
        match self {
            PipguardError::Interrupted => 130,
            _ => 1,
        }
    }
}
