use bytes::Bytes;
use lather_wsdl::Component;
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid endpoint URL {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Error sending request")]
    Request(#[from] reqwest::Error),

    #[error("Endpoint answered with HTTP status {status}")]
    Status { status: u16, body: Bytes },

    #[error("No response registered for {0}")]
    NoResponse(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error parsing WSDL")]
    Parse(#[source] lather_wsdl::Error),

    #[error("Unknown {component} {name}")]
    NotFound { component: Component, name: String },

    #[error("{0}")]
    Usage(String),

    #[error("Unsupported SOAP version {0}")]
    UnsupportedSoapVersion(String),

    #[error("Error rendering envelope")]
    Envelope(#[source] lather_util::Error),

    #[error("Error reading response")]
    Response(#[source] lather_util::Error),

    #[error("Error calling endpoint")]
    Transport(#[from] TransportError),
}

impl From<lather_wsdl::Error> for Error {
    fn from(error: lather_wsdl::Error) -> Self {
        match error {
            lather_wsdl::Error::NotFound { component, name } => Self::NotFound { component, name },
            other => Self::Parse(other),
        }
    }
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
