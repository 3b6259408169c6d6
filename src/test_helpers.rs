use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use crate::capability::Capability;
use crate::markdown::MarkdownConverter;
use crate::todoist::FetchConfig;
use crate::todoist::adapter::FetchAdapter;
use crate::todoist::transport::{FormRequest, HttpResponse, HttpTransport, TransportError};

/// Transport that replays canned results and records every request it sees.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<FormRequest>>,
}

impl MockTransport {
    pub fn new(responses: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<FormRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for MockTransport {
    fn post_form(&self, request: &FormRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::NoResponse {
                    message: "no more mock responses".to_string(),
                })
            })
    }
}

/// Converter with an output that is easy to tell apart from the input.
pub struct UppercaseConverter;

impl MarkdownConverter for UppercaseConverter {
    fn to_html(&self, markdown: &str) -> String {
        markdown.to_uppercase()
    }
}

pub fn make_adapter(
    transport: &Arc<MockTransport>,
    converter: Option<Arc<dyn MarkdownConverter>>,
) -> FetchAdapter {
    let http: Arc<dyn HttpTransport> = transport.clone();
    let markdown = match converter {
        Some(converter) => Capability::Available(converter),
        None => Capability::Missing {
            name: "pulldown-cmark".to_string(),
            reason: "not loaded in test".to_string(),
        },
    };
    FetchAdapter::new(Capability::Available(http), markdown)
}

/// The configuration used throughout the adapter scenarios.
pub fn scenario_config() -> FetchConfig {
    FetchConfig {
        access_token: Some("abc".to_string()),
        api_base: "https://api.x.com".to_string(),
        api_version: "v9".to_string(),
        todoist_endpoint: "sync".to_string(),
        todoist_resource_type: "items".to_string(),
        debug: false,
    }
}

/// Shared in-memory sink for a scoped `fmt` subscriber.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with every event on this thread formatted into the returned text.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
