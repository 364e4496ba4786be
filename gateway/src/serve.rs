//! Line-delimited JSON request loop.

use std::io;
use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::handler::{ExchangeHandler, ExchangeOutcome};

/// Requests handled concurrently before reading pauses.
pub const MAX_IN_FLIGHT: usize = 64;

/// Answer one JSON request per input line until the input closes.
///
/// Each request runs in its own task against the shared handler. Responses
/// are written one per line, in input order, as
/// `{"status": <code>, "body": <body>}`. Blank lines are skipped. Returns the
/// number of requests answered.
pub async fn serve_lines<R, W>(handler: Arc<ExchangeHandler>, input: R, output: W) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<JoinHandle<ExchangeOutcome>>(MAX_IN_FLIGHT);
    let writer = tokio::spawn(write_outcomes(rx, output));

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let handler = handler.clone();
        let pending = tokio::spawn(async move { handler.handle_json(&line).await });
        if tx.send(pending).await.is_err() {
            debug!("Response writer stopped, no longer reading input");
            break;
        }
    }
    drop(tx);

    writer.await.map_err(io::Error::other)?
}

async fn write_outcomes<W>(
    mut pending: mpsc::Receiver<JoinHandle<ExchangeOutcome>>,
    mut output: W,
) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut handled = 0;

    while let Some(outcome) = pending.recv().await {
        let outcome = outcome.await.map_err(io::Error::other)?;
        output.write_all(render(&outcome).as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
        handled += 1;
    }

    output.shutdown().await?;
    Ok(handled)
}

/// One response line.
pub fn render(outcome: &ExchangeOutcome) -> String {
    json!({ "status": outcome.status_code(), "body": outcome.body() }).to_string()
}
