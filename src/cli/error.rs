//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::Domain(e).into()
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Serialize { .. } => exitcode::SOFTWARE,
                InfraError::Application(e) => match e {
                    ApplicationError::ContentNotFound(_) => exitcode::NOINPUT,
                    ApplicationError::InvalidContent { .. } => exitcode::DATAERR,
                    ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::Git { .. } => exitcode::SOFTWARE,
                    ApplicationError::OperationFailed { .. } => exitcode::CANTCREAT,
                    ApplicationError::Domain(DomainError::UnknownObject(_)) => exitcode::USAGE,
                    ApplicationError::Domain(_) => exitcode::DATAERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectId;
    use std::path::PathBuf;

    #[test]
    fn given_errors_when_mapping_exit_codes_then_follow_sysexits() {
        let missing: CliError = ApplicationError::ContentNotFound(PathBuf::from("x")).into();
        let unknown: CliError =
            ApplicationError::from(DomainError::UnknownObject(ObjectId::new("9"))).into();
        let cycle: CliError =
            ApplicationError::from(DomainError::RecipeCycle(ObjectId::new("9"))).into();

        assert_eq!(missing.exit_code(), exitcode::NOINPUT);
        assert_eq!(unknown.exit_code(), exitcode::USAGE);
        assert_eq!(cycle.exit_code(), exitcode::DATAERR);
        assert_eq!(CliError::Usage("x".into()).exit_code(), exitcode::USAGE);
    }
}
