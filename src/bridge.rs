use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::todoist::adapter::FetchAdapter;
use crate::todoist::{FetchConfig, InboundEvent, Outcome};

/// Parse one inbound line.
///
/// Returns `Ok(None)` for well-formed events addressed to someone else. A
/// `FETCH_TODOIST` is always accepted once recognised, so that it gets an
/// outcome; a payload that is not an object reads as an empty configuration.
pub fn parse_event(line: &str) -> Result<Option<InboundEvent>> {
    let mut value: Value = serde_json::from_str(line)
        .map_err(|e| Error::Event(format!("invalid event JSON: {e}")))?;

    let notification = value
        .get("notification")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Event("event has no notification name".to_string()))?;
    if notification != "FETCH_TODOIST" {
        return Ok(None);
    }

    let config = match value.get_mut("payload").map(Value::take) {
        Some(payload @ Value::Object(_)) => serde_json::from_value(payload)
            .map_err(|e| Error::Event(format!("invalid FETCH_TODOIST payload: {e}")))?,
        other => {
            warn!(payload = ?other, "FETCH_TODOIST payload is not an object");
            FetchConfig::default()
        }
    };
    Ok(Some(InboundEvent::FetchTodoist(config)))
}

/// Serve newline-delimited events until `reader` is exhausted.
///
/// Every `FETCH_TODOIST` starts its own cycle; outcomes are written in
/// completion order. In-flight cycles are awaited, never cancelled.
pub async fn serve<R, W>(adapter: Arc<FetchAdapter>, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();
    let mut tx = Some(tx);
    let mut lines = reader.lines();

    loop {
        tokio::select! {
            line = lines.next_line(), if tx.is_some() => {
                let Some(line) = line? else {
                    debug!("input closed, waiting for in-flight fetches");
                    tx = None;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_event(&line) {
                    Ok(Some(InboundEvent::FetchTodoist(config))) => {
                        if let Some(tx) = &tx {
                            spawn_cycle(Arc::clone(&adapter), config, tx.clone());
                        }
                    }
                    Ok(None) => debug!(%line, "ignoring unrelated notification"),
                    Err(e) => warn!(error = %e, "skipping malformed event"),
                }
            }
            outcome = rx.recv() => {
                let Some(outcome) = outcome else {
                    break;
                };
                write_outcome(&mut writer, &outcome).await?;
            }
        }
    }

    info!("event bridge stopped");
    Ok(())
}

fn spawn_cycle(
    adapter: Arc<FetchAdapter>,
    config: FetchConfig,
    tx: mpsc::UnboundedSender<Outcome>,
) {
    tokio::spawn(async move {
        let outcome = adapter.trigger(config).await;
        if tx.send(outcome).is_err() {
            warn!("outcome dropped, event bridge already stopped");
        }
    });
}

async fn write_outcome<W: AsyncWrite + Unpin>(writer: &mut W, outcome: &Outcome) -> Result<()> {
    let mut line = serde_json::to_string(outcome)
        .map_err(|e| Error::Event(format!("failed to encode outcome: {e}")))?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
