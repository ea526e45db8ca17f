use std::fmt;
use thiserror::Error;

/// The part of an operation lookup that did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Service,
    Port,
    Operation,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to read file")]
    FileReadError(#[source] std::io::Error),

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Document has no wsdl:definitions root element")]
    MissingDefinitions,

    #[error("Document ended inside {0}")]
    UnexpectedEof(String),

    #[error("Element {element} is missing the {attribute} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("Namespace prefix {0} is not declared")]
    UnknownPrefix(String),

    #[error("Element {0} appeared where it was not expected")]
    UnexpectedElement(String),

    #[error("Reference to undefined {kind} {name}")]
    DanglingReference { kind: &'static str, name: String },

    #[error("{component} {name} not found")]
    NotFound { component: Component, name: String },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Component::Service => "Service",
            Component::Port => "Port",
            Component::Operation => "Operation",
        })
    }
}
