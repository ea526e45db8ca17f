use std::path::Path;
use url::Url;

mod document;
mod parser;

pub mod error;
pub mod types;

pub use document::{OperationDescriptor, PortInfo, WsdlDocument};
pub use error::{Component, Error};
pub use parser::XSD_NAMESPACE;

/// Loads a WSDL document from an `http(s)` or `file` URL, or from a local path.
///
/// Imported WSDL and schema documents are fetched relative to the document importing them.
pub fn load<S: AsRef<str>>(location: S) -> Result<WsdlDocument, error::Error> {
    let url = location_url(location.as_ref())?;
    WsdlDocument::from_definition(parser::parse_url(url)?)
}

/// Parses a WSDL document held in memory.
pub fn parse<S: AsRef<str>>(xml: S) -> Result<WsdlDocument, error::Error> {
    WsdlDocument::parse(xml.as_ref())
}

fn location_url(location: &str) -> Result<Url, error::Error> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = Path::new(location)
                .canonicalize()
                .map_err(|err| error::Error::PathConversionError(Some(err)))?;

            Url::from_file_path(&path).map_err(|()| error::Error::PathConversionError(None))
        }
        Err(err) => Err(err.into()),
    }
}
