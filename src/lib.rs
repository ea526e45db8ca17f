//! Calls SOAP services described by a WSDL document.
//!
//! ```no_run
//! use lather::{Client, Value};
//!
//! # fn main() -> Result<(), lather::Error> {
//! let client = Client::load("http://www.webservicex.net/ConvertTemperature.asmx?WSDL")?;
//! let mut operation = client.operation("ConvertTemperature", "ConvertTemperatureSoap12", "ConvertTemp")?;
//!
//! operation.set_body(Value::map([(
//!     "ConvertTemp",
//!     Value::map([
//!         ("Temperature", Value::from(30)),
//!         ("FromUnit", Value::from("degreeCelsius")),
//!         ("ToUnit", Value::from("degreeFahrenheit")),
//!     ]),
//! )]));
//!
//! let response = operation.call()?;
//! println!("{:?}", response.envelope_body()?);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod operation;
mod response;
mod transport;

pub use client::Client;
pub use error::{Error, TransportError};
pub use operation::{Operation, DEFAULT_ENCODING};
pub use response::{Fault, Response};
pub use transport::{
    FakeTransport, Headers, HttpTransport, HttpTransportBuilder, RawResponse, Request, Transport,
    DEFAULT_TIMEOUT,
};

pub use lather_util::{Map, SoapVersion, Value};
pub use lather_wsdl::{Component, OperationDescriptor, PortInfo, WsdlDocument};
