use std::path::Path;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::markdown::MarkdownExtension;
use crate::todoist::FetchConfig;

pub const DEFAULT_CONFIG_PATH: &str = "todofetch.toml";
pub const DEFAULT_TOKEN_ENV: &str = "TODOIST_ACCESS_TOKEN";
pub const DEFAULT_API_BASE: &str = "https://api.todoist.com/sync";
pub const DEFAULT_API_VERSION: &str = "v9";
pub const DEFAULT_ENDPOINT: &str = "sync";
pub const DEFAULT_RESOURCE_TYPES: &str = r#"["items", "projects", "collaborators", "user", "labels"]"#;

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub access_token: Option<String>,
    pub access_token_env: Option<String>,
    pub api_base: Option<String>,
    pub api_version: Option<String>,
    pub endpoint: Option<String>,
    pub resource_types: Option<String>,
    pub debug: Option<bool>,
    pub proxy: Option<String>,
    pub markdown: Option<MarkdownFile>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MarkdownFile {
    pub enabled: Option<bool>,
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownConfig {
    pub enabled: bool,
    pub extensions: Vec<String>,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: vec!["strikethrough".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub fetch: FetchConfig,
    pub markdown: MarkdownConfig,
    pub proxy: Option<String>,
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match &cli.config {
            Some(path) => {
                let path = Path::new(path);
                if !path.exists() {
                    return Err(Error::ConfigNotFound(path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(path)?)?
            }
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    parse_config(&std::fs::read_to_string(path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        Ok(merge(file_config, cli))
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(ref base) = config.api_base
        && !(base.starts_with("http://") || base.starts_with("https://"))
    {
        return Err(Error::ConfigValidation(format!(
            "api_base must be an http(s) URL: {base}"
        )));
    }
    if config.api_version.as_deref() == Some("") {
        return Err(Error::ConfigValidation(
            "api_version must not be empty".to_string(),
        ));
    }
    if config.endpoint.as_deref() == Some("") {
        return Err(Error::ConfigValidation(
            "endpoint must not be empty".to_string(),
        ));
    }
    if let Some(extensions) = config.markdown.as_ref().and_then(|m| m.extensions.as_ref()) {
        for name in extensions {
            if MarkdownExtension::from_name(name).is_none() {
                return Err(Error::ConfigValidation(format!(
                    "unknown markdown extension: {name} (expected: {})",
                    MarkdownExtension::NAMES.join(", ")
                )));
            }
        }
    }
    Ok(())
}

/// Resolve the access token: CLI flag, then config file, then environment.
fn resolve_access_token(file: &ConfigFile, cli: &Cli) -> Option<String> {
    if let Some(token) = cli.access_token.clone().or_else(|| file.access_token.clone()) {
        return Some(token);
    }
    let env_name = file.access_token_env.as_deref().unwrap_or(DEFAULT_TOKEN_ENV);
    std::env::var(env_name).ok()
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Config {
    let access_token = resolve_access_token(&file, cli);
    let markdown_file = file.markdown.unwrap_or_default();
    let markdown_defaults = MarkdownConfig::default();

    Config {
        fetch: FetchConfig {
            access_token,
            api_base: cli
                .api_base
                .clone()
                .or(file.api_base)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_version: cli
                .api_version
                .clone()
                .or(file.api_version)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            todoist_endpoint: cli
                .endpoint
                .clone()
                .or(file.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            todoist_resource_type: cli
                .resource_types
                .clone()
                .or(file.resource_types)
                .unwrap_or_else(|| DEFAULT_RESOURCE_TYPES.to_string()),
            debug: cli.debug || file.debug.unwrap_or(false),
        },
        markdown: MarkdownConfig {
            enabled: !cli.no_markdown
                && markdown_file.enabled.unwrap_or(markdown_defaults.enabled),
            extensions: markdown_file
                .extensions
                .unwrap_or(markdown_defaults.extensions),
        },
        proxy: cli.proxy.clone().or(file.proxy),
    }
}
