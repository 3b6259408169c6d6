use clap::{Parser, Subcommand};

/// todofetch — fetch Todoist tasks for a dashboard widget
#[derive(Parser, Debug, Clone)]
#[command(name = "todofetch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Path to config file (default: ./todofetch.toml when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Todoist API access token
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// API base URL
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// API version path segment
    #[arg(long, global = true)]
    pub api_version: Option<String>,

    /// Resource endpoint name
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Resource type selector sent as `resource_types`
    #[arg(long, global = true)]
    pub resource_types: Option<String>,

    /// Proxy URL for outbound requests
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Log the full API response
    #[arg(long, global = true)]
    pub debug: bool,

    /// Pass task content through without markdown rendering
    #[arg(long, global = true)]
    pub no_markdown: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Fetch tasks once and print the outcome event (default)
    Fetch,

    /// Read FETCH_TODOIST events from stdin and write outcome events to stdout
    Serve,
}
