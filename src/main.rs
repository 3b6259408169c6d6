use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use todofetch::bridge;
use todofetch::cli::{Cli, CliCommand};
use todofetch::config::Config;
use todofetch::markdown;
use todofetch::todoist::adapter::FetchAdapter;
use todofetch::todoist::transport;

fn init_logging(debug: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if debug && let Ok(directive) = "todofetch=debug".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    info!("todofetch starting");

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    info!(
        url = %config.fetch.url(),
        token_set = config.fetch.token().is_some(),
        markdown = config.markdown.enabled,
        "config loaded"
    );

    let http = transport::load(config.proxy.as_deref());
    let converter = markdown::load(&config.markdown);
    let adapter = Arc::new(FetchAdapter::new(http, converter));

    match cli.command.unwrap_or(CliCommand::Fetch) {
        CliCommand::Fetch => {
            let outcome = adapter.trigger(config.fetch).await;
            match serde_json::to_string(&outcome) {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    eprintln!("error: failed to encode outcome: {e}");
                    std::process::exit(1);
                }
            }
            if outcome.is_error() {
                std::process::exit(1);
            }
        }
        CliCommand::Serve => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            if let Err(e) = bridge::serve(adapter, stdin, tokio::io::stdout()).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}
