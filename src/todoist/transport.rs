use std::io::Read;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::capability::Capability;

pub const TRANSPORT_NAME: &str = "ureq";

/// A form-encoded POST, fully described before it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct FormRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl FormRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A response the transport handed back as a success.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<Value>,
}

/// How a request failed, from the transport's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The server answered with an error status.
    Status {
        status: u16,
        body: Option<Value>,
        message: String,
    },
    /// The request went out but no usable response came back.
    NoResponse { message: String },
    /// The request could not be built or sent.
    Setup { message: String },
}

pub trait HttpTransport: Send + Sync {
    fn post_form(&self, request: &FormRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a shared `ureq::Agent`.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    /// Build the agent, routing through `proxy` when one is configured.
    pub fn build(proxy: Option<&str>) -> std::result::Result<Self, ureq::Error> {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(proxy) = proxy {
            builder = builder.proxy(ureq::Proxy::new(proxy)?);
        }
        Ok(Self::new(builder.build()))
    }
}

impl HttpTransport for UreqTransport {
    fn post_form(&self, request: &FormRequest) -> Result<HttpResponse, TransportError> {
        let mut req = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            req = req.set(name, value);
        }
        let form: Vec<(&str, &str)> = request
            .form
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        match req.send_form(&form) {
            Ok(response) => {
                let status = response.status();
                let bytes = read_body(response).map_err(|e| TransportError::NoResponse {
                    message: format!("failed to read response body: {e}"),
                })?;
                debug!(status, bytes = bytes.len(), "Todoist response received");
                Ok(HttpResponse {
                    status,
                    body: decode_body(&bytes),
                })
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = read_body(response).ok().and_then(|b| decode_body(&b));
                Err(TransportError::Status {
                    status,
                    body,
                    message: format!("request failed with status code {status}"),
                })
            }
            Err(ureq::Error::Transport(transport)) => Err(classify_transport(&transport)),
        }
    }
}

fn classify_transport(err: &ureq::Transport) -> TransportError {
    let message = err.to_string();
    match err.kind() {
        ureq::ErrorKind::InvalidUrl
        | ureq::ErrorKind::UnknownScheme
        | ureq::ErrorKind::InsecureRequestHttpsOnly
        | ureq::ErrorKind::InvalidProxyUrl => TransportError::Setup { message },
        _ => TransportError::NoResponse { message },
    }
}

/// Read the whole body without the size cap of `Response::into_string`.
fn read_body(response: ureq::Response) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// JSON when it parses, the (lossily decoded) text otherwise, nothing when empty.
pub fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}

/// Load the HTTP capability; a transport that cannot be built is reported once.
pub fn load(proxy: Option<&str>) -> Capability<Arc<dyn HttpTransport>> {
    match UreqTransport::build(proxy) {
        Ok(transport) => Capability::Available(Arc::new(transport)),
        Err(e) => Capability::missing(TRANSPORT_NAME, e.to_string()),
    }
}
