use crate::exit_code;

/// A specialized Result type for staging operations.
pub type Result<T> = std::result::Result<T, StageError>;

/// An error that occurred while staging an application.
///
/// Variants map one-to-one onto the exit codes in [`crate::exit_code`]; the
/// Display strings are the messages the platform greps for on stderr.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("None of the buildpacks detected a compatible application")]
    DetectNoneMatched,

    #[error("Failed to run all supply scripts")]
    SupplyFailed,

    #[error("Failed to compile droplet")]
    CompileFailed,

    #[error("Failed to build droplet release")]
    ReleaseFailed,

    #[error("buildpack's release output invalid")]
    ReleaseInvalid,

    #[error("Failed to read command from Procfile: invalid YAML")]
    ProcfileInvalid,

    #[error("Buildpack not found: {0}")]
    BuildpackNotFound(String),

    #[error("Buildpack order is empty")]
    OrderEmpty,

    #[error("I/O error while staging: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize staging metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl StageError {
    /// The exit code the staging process reports for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            StageError::DetectNoneMatched => exit_code::DETECT_NONE_MATCHED,
            StageError::SupplyFailed => exit_code::SUPPLY_FAILED,
            StageError::CompileFailed => exit_code::COMPILE_FAILED,
            StageError::ReleaseFailed | StageError::ReleaseInvalid => exit_code::RELEASE_FAILED,
            StageError::ProcfileInvalid => exit_code::PROCFILE_INVALID,
            StageError::BuildpackNotFound(_)
            | StageError::OrderEmpty
            | StageError::Io(_)
            | StageError::Metadata(_) => exit_code::STAGING_FAILED,
        }
    }
}
