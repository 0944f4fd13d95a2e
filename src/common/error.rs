use aws_sdk_dynamodb::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::{error, fmt, io};

/// Result type alias used by every binding operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a binding call.
///
/// Every variant collapses to a single human readable string at the host boundary,
/// see [`Error::to_string`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The handle is not registered (typo or use after destroy).
    #[error("handle not found")]
    HandleNotFound,
    /// The method name is not part of the service's method set.
    #[error("Unknown method")]
    UnknownMethod(String),
    /// Wrong number of arguments for a method.
    #[error("wrong # args: should be \"{0}\"")]
    Usage(&'static str),
    /// An argument does not have the expected shape.
    #[error("{0}")]
    InvalidArgument(String),
    /// The configuration dict could not be read.
    #[error("Invalid config_dict: {0}")]
    InvalidConfig(String),
    /// The AWS SDK reported a failure, the message is forwarded verbatim.
    #[error("{0}")]
    Service(String),
    /// A request could not be assembled by the SDK builders.
    #[error("{0}")]
    Build(String),
    /// Item conversion between typed and simple representations failed.
    #[error(transparent)]
    Serialization(#[from] serde_dynamo::Error),
    /// Local file or runtime I/O failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The blocking front end cannot run here.
    #[error("{0}")]
    Runtime(&'static str),
}

impl Error {
    pub(crate) fn invalid(message: impl fmt::Display) -> Self {
        Self::InvalidArgument(message.to_string())
    }
}

impl<E, R> From<SdkError<E, R>> for Error
where
    E: ProvideErrorMetadata + error::Error + 'static,
    R: fmt::Debug,
{
    fn from(err: SdkError<E, R>) -> Self {
        let message = err
            .as_service_error()
            .and_then(ProvideErrorMetadata::message)
            .map(str::to_owned)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
        Self::Service(message)
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Self::Build(err.to_string())
    }
}
