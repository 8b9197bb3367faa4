use thiserror::Error;

/// Failure conditions of the chart and insight pipeline.
///
/// Every variant is recoverable at the scope of the user action that
/// triggered it: the caller reports it and stays usable.
#[derive(Debug, Error)]
pub enum Error {
    /// The table has no columns at all, so there is nothing to classify
    /// or plot.
    #[error("table has no columns")]
    EmptySchema,

    /// A chart request referenced a missing column, omitted a required
    /// channel, or mapped a channel to a column of the wrong semantic type.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// The external text-generation service could not be reached, rejected
    /// the request, or timed out.
    #[error("insight service error: {message}")]
    InsightService {
        message: String,
        /// HTTP status, when the service answered at all.
        status: Option<u16>,
    },

    /// The service responded, but the payload could not be interpreted as
    /// the structured insight schema.
    #[error("malformed insight response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn service(message: impl Into<String>) -> Self {
        Error::InsightService {
            message: message.into(),
            status: None,
        }
    }

    pub(crate) fn service_status(status: u16, message: impl Into<String>) -> Self {
        Error::InsightService {
            message: message.into(),
            status: Some(status),
        }
    }
}
