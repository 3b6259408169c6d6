use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, error, info};

use super::transport::{FormRequest, HttpResponse, HttpTransport, TransportError};
use super::{FetchConfig, Outcome, TaskCollection, is_truthy};
use crate::capability::Capability;
use crate::error::FetchError;
use crate::markdown::MarkdownConverter;

/// Sync token value that asks for a full sync.
const FULL_SYNC_TOKEN: &str = "*";

/// Fetches the task list and turns it into exactly one [`Outcome`] per trigger.
///
/// Overlapping triggers run independently. The configuration of a cycle is
/// threaded through it, so the stored slot is only a record of the most
/// recent trigger (last write wins).
pub struct FetchAdapter {
    http: Capability<Arc<dyn HttpTransport>>,
    markdown: Capability<Arc<dyn MarkdownConverter>>,
    latest: Mutex<Option<FetchConfig>>,
}

impl FetchAdapter {
    pub fn new(
        http: Capability<Arc<dyn HttpTransport>>,
        markdown: Capability<Arc<dyn MarkdownConverter>>,
    ) -> Self {
        Self {
            http,
            markdown,
            latest: Mutex::new(None),
        }
    }

    /// Handle a `FETCH_TODOIST` trigger.
    pub async fn trigger(&self, config: FetchConfig) -> Outcome {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());
        self.fetch(&config).await
    }

    pub fn latest_config(&self) -> Option<FetchConfig> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run one fetch cycle with `config`.
    pub async fn fetch(&self, config: &FetchConfig) -> Outcome {
        match self.run(config).await {
            Ok(collection) => {
                info!(items = collection.items().len(), "Todoist tasks fetched");
                Outcome::Tasks(collection)
            }
            Err(err) => Outcome::from(err),
        }
    }

    async fn run(&self, config: &FetchConfig) -> Result<TaskCollection, FetchError> {
        let http = match &self.http {
            Capability::Available(http) => Arc::clone(http),
            Capability::Missing { name, reason } => {
                error!(dependency = %name, %reason, "HTTP transport is not available");
                return Err(FetchError::MissingDependency { name: name.clone() });
            }
        };

        let Some(token) = config.token() else {
            error!("AccessToken not set");
            return Err(FetchError::ConfigurationError);
        };

        let request = build_request(config, token);
        debug!(url = %request.url, "requesting Todoist tasks");

        let outcome = tokio::task::spawn_blocking(move || http.post_form(&request))
            .await
            .unwrap_or_else(|e| {
                Err(TransportError::NoResponse {
                    message: format!("transport task failed: {e}"),
                })
            });

        match outcome {
            Ok(response) => self.handle_response(config, token, response),
            Err(err) => Err(classify_failure(err)),
        }
    }

    fn handle_response(
        &self,
        config: &FetchConfig,
        token: &str,
        response: HttpResponse,
    ) -> Result<TaskCollection, FetchError> {
        if config.debug {
            let pretty = response
                .body
                .as_ref()
                .and_then(|body| serde_json::to_string_pretty(body).ok())
                .unwrap_or_else(|| "null".to_string());
            info!(status = response.status, body = %pretty, "Todoist API response");
        }

        let body = match response.body {
            Some(body) if response.status == 200 && is_truthy(&body) => body,
            _ => {
                error!(status = response.status, "unexpected response status");
                return Err(FetchError::UnexpectedStatus {
                    status: response.status,
                });
            }
        };

        let Value::Object(mut fields) = body else {
            error!("invalid response format: body is not an object");
            return Err(FetchError::InvalidResponseFormat);
        };

        let Some(Value::Array(items)) = fields.get_mut("items") else {
            error!("invalid response format: items array missing");
            return Err(FetchError::InvalidResponseFormat);
        };

        let converter = self.markdown.get();
        for item in items.iter_mut() {
            render_content(item, converter.map(|c| &**c));
        }

        fields.insert(
            TaskCollection::ACCESS_TOKEN_FIELD.to_string(),
            Value::String(token.to_string()),
        );
        Ok(TaskCollection::new(fields))
    }
}

/// Describe the POST for one cycle. `token` is the validated access token.
pub fn build_request(config: &FetchConfig, token: &str) -> FormRequest {
    FormRequest {
        url: config.url(),
        headers: vec![
            (
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("cache-control".to_string(), "no-cache".to_string()),
            ("Authorization".to_string(), format!("Bearer {token}")),
        ],
        form: vec![
            ("sync_token".to_string(), FULL_SYNC_TOKEN.to_string()),
            (
                "resource_types".to_string(),
                config.todoist_resource_type.clone(),
            ),
        ],
    }
}

/// Add `contentHtml` to an item whose `content` is a non-empty string.
fn render_content(item: &mut Value, converter: Option<&dyn MarkdownConverter>) {
    let Value::Object(fields) = item else {
        return;
    };
    let html = match fields.get("content") {
        Some(Value::String(content)) if !content.is_empty() => match converter {
            Some(converter) => converter.to_html(content),
            None => content.clone(),
        },
        _ => return,
    };
    fields.insert(
        TaskCollection::CONTENT_HTML_FIELD.to_string(),
        Value::String(html),
    );
}

fn classify_failure(err: TransportError) -> FetchError {
    match err {
        TransportError::Status {
            status,
            body,
            message,
        } => {
            error!(status, body = ?body, %message, "Todoist API error");
            let detail = match body.filter(is_truthy) {
                Some(body) => body.to_string(),
                None => message,
            };
            FetchError::ApiError { status, detail }
        }
        TransportError::NoResponse { message } => {
            error!(%message, "no response received from Todoist API");
            FetchError::NoResponse { message }
        }
        TransportError::Setup { message } => {
            error!(%message, "Todoist request setup failed");
            FetchError::RequestSetupError { message }
        }
    }
}
