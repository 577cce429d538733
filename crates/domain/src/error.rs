use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("{0} is locked")]
    Locked(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Device profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Command {command} not found for profile {profile}")]
    CommandNotFound { profile: String, command: String },

    #[error("Device object {object} not found in profile {profile}")]
    ResourceNotFound { profile: String, object: String },

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error(
        "MaxCmdOps ({max}) exceeded for device {device} command {command}: {count} operations"
    )]
    TooManyOperations {
        device: String,
        command: String,
        count: usize,
        max: usize,
    },

    #[error("Type mismatch: value is {actual}, requested {requested}")]
    TypeMismatch {
        actual: &'static str,
        requested: &'static str,
    },

    #[error("Transform parse error: {0}")]
    TransformParseError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Value {value} overflows {value_type}")]
    Overflow {
        value: f64,
        value_type: &'static str,
    },

    #[error("Assertion ({expected}) failed with value: {actual}")]
    AssertionFailed { expected: String, actual: String },

    #[error("No mapping found for value: {0}")]
    MappingNotFound(String),

    #[error("Operation timed out after {0} ms")]
    Timeout(u64),

    #[error("Driver error: {0}")]
    DriverError(String),

    #[error("Internal error: {0}")]
    ServerError(String),
}

impl DomainError {
    /// Errors the command surface reports as "not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound(_)
                | Self::ProfileNotFound(_)
                | Self::CommandNotFound { .. }
                | Self::ResourceNotFound { .. }
        )
    }

    /// Errors the command surface reports as an internal failure.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::TooManyOperations { .. }
                | Self::DriverError(_)
                | Self::ServerError(_)
                | Self::Timeout(_)
        )
    }

    /// Per-value failures that drop a single reading rather than the whole command.
    pub fn is_transform_error(&self) -> bool {
        matches!(
            self,
            Self::TransformParseError(_)
                | Self::Overflow { .. }
                | Self::AssertionFailed { .. }
                | Self::MappingNotFound(_)
                | Self::TypeMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
