use super::{
    error::{Error, TransportError},
    transport::{Headers, RawResponse},
};

use bytes::Bytes;
use lather_util::{xml::read_value, Value};
use std::borrow::Cow;

/// The result of calling an [`Operation`](crate::Operation).
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Bytes,
}

/// A SOAP fault carried in a response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub code: String,
    pub reason: String,
    pub detail: Option<Value>,
}

impl From<RawResponse> for Response {
    fn from(raw: RawResponse) -> Self {
        Self {
            status: raw.status,
            headers: raw.headers,
            body: raw.body,
        }
    }
}

impl Response {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Looks up a header ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn raw(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// The body read into a [`Value`] keyed by local element names, starting at the root.
    pub fn document(&self) -> Result<Value, Error> {
        read_value(&self.text()).map_err(Error::Response)
    }

    /// Contents of the envelope's `Header`, if the response has one.
    pub fn envelope_header(&self) -> Result<Option<Value>, Error> {
        Ok(self.document()?.pointer(["Envelope", "Header"]).cloned())
    }

    pub fn envelope_body(&self) -> Result<Option<Value>, Error> {
        Ok(self.document()?.pointer(["Envelope", "Body"]).cloned())
    }

    pub fn fault(&self) -> Result<Option<Fault>, Error> {
        Ok(self.envelope_body()?.as_ref().and_then(Fault::from_body))
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::List(values) => values.first().and_then(text_of),
        Value::Null => None,
        other if other.is_scalar() => Some(other.to_string()),
        _ => None,
    }
}

impl Fault {
    /// Reads a SOAP 1.1 (`faultcode`, `faultstring`) or SOAP 1.2 (`Code/Value`,
    /// `Reason/Text`) fault out of an envelope body.
    pub fn from_body(body: &Value) -> Option<Self> {
        let fault = body.get("Fault")?;

        if let Some(code) = fault.get("faultcode") {
            return Some(Self {
                code: text_of(code).unwrap_or_default(),
                reason: fault.get("faultstring").and_then(text_of).unwrap_or_default(),
                detail: fault.get("detail").cloned(),
            });
        }

        Some(Self {
            code: fault
                .pointer(["Code", "Value"])
                .and_then(text_of)
                .unwrap_or_default(),
            reason: fault
                .pointer(["Reason", "Text"])
                .and_then(text_of)
                .unwrap_or_default(),
            detail: fault.get("Detail").cloned(),
        })
    }
}

impl TransportError {
    /// The SOAP fault in the body of an error status, if there is one.
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Self::Status { body, .. } => read_value(&String::from_utf8_lossy(body))
                .ok()?
                .pointer(["Envelope", "Body"])
                .and_then(Fault::from_body),
            _ => None,
        }
    }
}

impl Error {
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Self::Transport(error) => error.fault(),
            _ => None,
        }
    }
}
