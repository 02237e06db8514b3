use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tickerwatch_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Remote(#[from] tickerwatch_core::RemoteError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Remote(_) => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use tickerwatch_core::{RemoteError, ValidationError};

    use super::*;

    #[test]
    fn exit_codes_follow_error_category() {
        assert_eq!(CliError::from(ValidationError::EmptyInput).exit_code(), 2);
        assert_eq!(CliError::Command(String::from("refused")).exit_code(), 2);
        assert_eq!(
            CliError::from(RemoteError::Backend { status: 500 }).exit_code(),
            3
        );
        assert_eq!(
            CliError::from(std::io::Error::other("closed pipe")).exit_code(),
            10
        );
    }
}
