pub mod adapter;
pub mod transport;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;

/// Per-trigger settings sent by the display layer.
///
/// Nothing here has a default: a missing token is reported by the adapter and
/// missing URL parts produce a request that fails to build.
///
/// The display layer is loosely typed, so fields decode leniently: `null`
/// reads as absent, scalars of the wrong type are stringified and `debug`
/// follows truthiness. A trigger is never rejected for its field types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    #[serde(
        default,
        deserialize_with = "loose_token",
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub api_base: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub api_version: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub todoist_endpoint: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub todoist_resource_type: String,
    #[serde(default, deserialize_with = "truthy_bool")]
    pub debug: bool,
}

impl FetchConfig {
    /// The access token, if one is set and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.api_base, self.api_version, self.todoist_endpoint
        )
    }
}

fn stringify(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn loose_token<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Value::deserialize(deserializer).map(stringify)
}

fn loose_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(|v| stringify(v).unwrap_or_default())
}

fn truthy_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Value::deserialize(deserializer).map(|v| is_truthy(&v))
}

/// Presence check for loosely typed payload values: null, false, zero and
/// the empty string count as absent.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Decoded response body, re-emitted with every unknown field intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCollection(Map<String, Value>);

impl TaskCollection {
    pub const ACCESS_TOKEN_FIELD: &'static str = "accessToken";
    pub const CONTENT_HTML_FIELD: &'static str = "contentHtml";

    pub fn new(fields: Map<String, Value>) -> Self {
        TaskCollection(fields)
    }

    pub fn items(&self) -> &[Value] {
        self.0
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.0
            .get(Self::ACCESS_TOKEN_FIELD)
            .and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

/// Events delivered to the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "notification",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum InboundEvent {
    FetchTodoist(FetchConfig),
}

/// The single result of one fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "notification",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
pub enum Outcome {
    Tasks(TaskCollection),
    FetchError { error: String },
}

impl Outcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::FetchError { .. })
    }
}

impl From<FetchError> for Outcome {
    fn from(err: FetchError) -> Self {
        Outcome::FetchError {
            error: err.to_string(),
        }
    }
}
