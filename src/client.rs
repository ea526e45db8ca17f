use super::{
    error::Error,
    operation::Operation,
    transport::{HttpTransport, Transport},
};

use lather_wsdl::{PortInfo, WsdlDocument};

/// A WSDL document paired with the transport its operations are called through.
#[derive(Debug)]
pub struct Client<T = HttpTransport> {
    document: WsdlDocument,
    transport: T,
}

impl Client<HttpTransport> {
    /// Loads the WSDL at `location` and calls it over HTTP with default settings.
    pub fn load<S: AsRef<str>>(location: S) -> Result<Self, Error> {
        let document = lather_wsdl::load(location)?;
        Ok(Self::new(document, HttpTransport::new()?))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(document: WsdlDocument, transport: T) -> Self {
        Self {
            document,
            transport,
        }
    }

    pub fn document(&self) -> &WsdlDocument {
        &self.document
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn services(&self) -> Vec<PortInfo<'_>> {
        self.document.services()
    }

    pub fn operations(&self, service: &str, port: &str) -> Result<Vec<&str>, Error> {
        Ok(self.document.operations(service, port)?)
    }

    pub fn operation(
        &self,
        service: &str,
        port: &str,
        operation: &str,
    ) -> Result<Operation<'_>, Error> {
        let descriptor = self.document.operation(service, port, operation)?;
        Ok(Operation::new(descriptor, &self.transport))
    }
}
