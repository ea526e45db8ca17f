use super::error::TransportError;

use bytes::Bytes;
use indexmap::IndexMap;
use reqwest::{blocking::Client as Reqwest, Method};
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};
use tracing::{debug, trace};
use url::Url;

/// HTTP header names and values in the order they are sent.
pub type Headers = IndexMap<String, String>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An outgoing HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub url: String,
    pub method: Method,
    pub headers: Headers,
    pub body: String,
}

/// Status, headers and body exactly as a transport received them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

/// Sends requests on behalf of an [`Operation`](crate::Operation).
pub trait Transport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        (**self).send(request)
    }
}

impl Request {
    pub fn post(url: impl Into<String>, headers: Headers, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            headers,
            body: body.into(),
        }
    }
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Blocking HTTP transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Reqwest,
}

#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
    user_agent: String,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            user_agent: concat!("lather/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl HttpTransportBuilder {
    /// Total time allowed for a request, `None` waits indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<HttpTransport, TransportError> {
        let client = Reqwest::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let url = Url::parse(&request.url).map_err(|source| TransportError::InvalidUrl {
            url: request.url.clone(),
            source,
        })?;

        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body.clone()).send()?;
        let status = response.status();

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| match value.to_str() {
                Ok(value) => Some((name.as_str().to_owned(), value.to_owned())),
                Err(_) => {
                    trace!(header = %name, "skipping non-text header");
                    None
                }
            })
            .collect();

        let body = response.bytes()?;
        debug!(status = status.as_u16(), length = body.len(), "received response");

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

/// In-memory transport replaying canned responses per URL and recording every request.
#[derive(Debug, Default)]
pub struct FakeTransport {
    responses: HashMap<String, RawResponse>,
    requests: Mutex<Vec<Request>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers requests to `url` with status 200 and `body`.
    pub fn respond(self, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.respond_with(url, RawResponse::new(200, body))
    }

    pub fn respond_with(mut self, url: impl Into<String>, response: RawResponse) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    /// Requests sent so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let response = self
            .responses
            .get(&request.url)
            .cloned()
            .ok_or_else(|| TransportError::NoResponse(request.url.clone()))?;

        if (200..300).contains(&response.status) {
            Ok(response)
        } else {
            Err(TransportError::Status {
                status: response.status,
                body: response.body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> Request {
        Request::post(url, Headers::new(), "<env:Envelope/>")
    }

    #[test]
    fn fake_replays_and_records() {
        let transport = FakeTransport::new().respond("http://example.com/a", "ok");

        let response = transport.send(&request("http://example.com/a")).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Bytes::from_static(b"ok"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].body, "<env:Envelope/>");
    }

    #[test]
    fn fake_without_response_fails() {
        let transport = FakeTransport::new();

        assert!(matches!(
            transport.send(&request("http://example.com/missing")),
            Err(TransportError::NoResponse(url)) if url == "http://example.com/missing"
        ));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn fake_error_status_is_surfaced() {
        let transport = FakeTransport::new()
            .respond_with("http://example.com/a", RawResponse::new(500, "boom"));

        assert!(matches!(
            transport.send(&request("http://example.com/a")),
            Err(TransportError::Status { status: 500, body }) if body == "boom"
        ));
    }

    #[test]
    fn http_rejects_invalid_url() {
        let transport = HttpTransport::new().unwrap();

        assert!(matches!(
            transport.send(&request("not a url")),
            Err(TransportError::InvalidUrl { url, .. }) if url == "not a url"
        ));
    }
}
