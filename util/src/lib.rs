pub mod error;
pub mod soap;
pub mod value;
pub mod xml;

pub use error::Error;
pub use soap::{Envelope, SoapVersion};
pub use value::{Map, Value};
