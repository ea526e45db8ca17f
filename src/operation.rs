use super::{
    error::Error,
    response::Response,
    transport::{Headers, Request, Transport},
};

use lather_util::{Envelope, SoapVersion, Value};
use lather_wsdl::OperationDescriptor;
use std::fmt;
use tracing::{debug, info};

pub const DEFAULT_ENCODING: &str = "UTF-8";

/// One WSDL operation ready to be called.
///
/// Endpoint, SOAP version, SOAP action, encoding and HTTP headers default to what the
/// WSDL declares and can each be overridden. The request is either a [`Value`] body,
/// rendered into an envelope on [`build`](Self::build), or a prebuilt XML envelope sent
/// as is. Setting one input clears the other.
pub struct Operation<'a> {
    descriptor: OperationDescriptor<'a>,
    transport: &'a dyn Transport,

    endpoint: Option<String>,
    soap_version: Option<String>,
    soap_action: Option<String>,
    encoding: Option<String>,
    http_headers: Option<Headers>,

    body: Option<Value>,
    xml_envelope: Option<String>,
}

impl<'a> Operation<'a> {
    pub fn new(descriptor: OperationDescriptor<'a>, transport: &'a dyn Transport) -> Self {
        Self {
            descriptor,
            transport,
            endpoint: None,
            soap_version: None,
            soap_action: None,
            encoding: None,
            http_headers: None,
            body: None,
            xml_envelope: None,
        }
    }

    pub fn descriptor(&self) -> &OperationDescriptor<'a> {
        &self.descriptor
    }

    pub fn name(&self) -> &'a str {
        self.descriptor.name()
    }

    /// The port address unless overridden. Empty when the port declares no address.
    pub fn endpoint(&self) -> &str {
        match &self.endpoint {
            Some(endpoint) => endpoint,
            None => self.descriptor.endpoint().unwrap_or_default(),
        }
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = Some(endpoint.into());
    }

    pub fn unset_endpoint(&mut self) {
        self.endpoint = None;
    }

    /// `"1.1"` or `"1.2"` as derived from the binding, or whatever was set.
    pub fn soap_version(&self) -> &str {
        match &self.soap_version {
            Some(version) => version,
            None => self.descriptor.soap_version().as_str(),
        }
    }

    /// Stored as given; an unknown version fails once headers or the envelope are built.
    pub fn set_soap_version(&mut self, version: impl Into<String>) {
        self.soap_version = Some(version.into());
    }

    pub fn unset_soap_version(&mut self) {
        self.soap_version = None;
    }

    pub fn soap_action(&self) -> &str {
        match &self.soap_action {
            Some(action) => action,
            None => self.descriptor.soap_action(),
        }
    }

    pub fn set_soap_action(&mut self, action: impl Into<String>) {
        self.soap_action = Some(action.into());
    }

    pub fn unset_soap_action(&mut self) {
        self.soap_action = None;
    }

    pub fn encoding(&self) -> &str {
        self.encoding.as_deref().unwrap_or(DEFAULT_ENCODING)
    }

    /// Changes the charset announced in the HTTP headers. The envelope itself is always
    /// UTF-8 text and only carries an XML declaration when the encoding is UTF-8.
    pub fn set_encoding(&mut self, encoding: impl Into<String>) {
        self.encoding = Some(encoding.into());
    }

    pub fn unset_encoding(&mut self) {
        self.encoding = None;
    }

    /// Headers sent with the request.
    ///
    /// Unless overridden these are computed from the current SOAP version, action and
    /// encoding. An override replaces the computed headers entirely.
    pub fn http_headers(&self) -> Result<Headers, Error> {
        if let Some(headers) = &self.http_headers {
            return Ok(headers.clone());
        }

        Ok(self
            .version()?
            .http_headers(self.soap_action(), self.encoding())
            .into_iter()
            .collect())
    }

    pub fn set_http_headers<K, V, I>(&mut self, headers: I)
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.http_headers = Some(
            headers
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        );
    }

    pub fn unset_http_headers(&mut self) {
        self.http_headers = None;
    }

    /// A request scaffold naming each input field with its XSD type.
    pub fn example_body(&self) -> Value {
        self.descriptor.example_body()
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Sets the request body and discards any XML envelope.
    pub fn set_body(&mut self, body: impl Into<Value>) {
        self.body = Some(body.into());
        self.xml_envelope = None;
    }

    pub fn xml_envelope(&self) -> Option<&str> {
        self.xml_envelope.as_deref()
    }

    /// Sets a prebuilt envelope, sent unmodified, and discards any body.
    pub fn set_xml_envelope(&mut self, envelope: impl Into<String>) {
        self.xml_envelope = Some(envelope.into());
        self.body = None;
    }

    /// Forgets both the body and the XML envelope.
    pub fn clear_request(&mut self) {
        self.body = None;
        self.xml_envelope = None;
    }

    /// The request envelope: the XML envelope if one is set, else the rendered body.
    pub fn build(&self) -> Result<String, Error> {
        if let Some(envelope) = &self.xml_envelope {
            return Ok(envelope.clone());
        }

        let body = self.body.as_ref().ok_or_else(|| {
            Error::Usage(format!(
                "Operation {} has neither a body nor an XML envelope to send",
                self.name()
            ))
        })?;

        let namespace = self.descriptor.target_namespace();
        let version = self.version()?;
        debug!(operation = self.name(), namespace, %version, "rendering envelope");

        Envelope::new(namespace, version)
            .with_encoding(self.encoding())
            .render(body)
            .map_err(|error| match error {
                lather_util::Error::InvalidBody(found) => Error::Usage(format!(
                    "Body of {} must be a mapping with exactly one top-level key, found {}",
                    self.name(),
                    found
                )),
                other => Error::Envelope(other),
            })
    }

    /// Builds the envelope and posts it to the endpoint.
    pub fn call(&self) -> Result<Response, Error> {
        let envelope = self.build()?;
        let headers = self.http_headers()?;

        let endpoint = self.endpoint();
        if endpoint.is_empty() {
            return Err(Error::Usage(format!(
                "Operation {} has no endpoint to call",
                self.name()
            )));
        }

        info!(
            operation = self.name(),
            endpoint,
            version = self.soap_version(),
            action = self.soap_action(),
            "calling operation"
        );

        let raw = self
            .transport
            .send(&Request::post(endpoint, headers, envelope))?;

        Ok(Response::from(raw))
    }

    fn version(&self) -> Result<SoapVersion, Error> {
        match &self.soap_version {
            Some(version) => version
                .parse()
                .map_err(|_| Error::UnsupportedSoapVersion(version.clone())),
            None => Ok(self.descriptor.soap_version()),
        }
    }
}

impl fmt::Debug for Operation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name())
            .field("endpoint", &self.endpoint())
            .field("soap_version", &self.soap_version())
            .field("soap_action", &self.soap_action())
            .field("encoding", &self.encoding())
            .field("body", &self.body)
            .field("xml_envelope", &self.xml_envelope)
            .finish()
    }
}
