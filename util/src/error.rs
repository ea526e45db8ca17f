use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error reading or writing XML")]
    XmlError(#[from] quick_xml::Error),

    #[error("Rendered XML is not valid UTF-8")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Body must be a mapping with exactly one top-level key, found {0}")]
    InvalidBody(String),

    #[error("Document has no root element")]
    EmptyDocument,

    #[error("Document ended inside element {0}")]
    UnexpectedEof(String),

    #[error("Unknown SOAP version {0}")]
    UnknownSoapVersion(String),
}
