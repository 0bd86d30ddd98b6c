// Stdio transport: one session bound to the process's stdin/stdout

use crate::session::Session;
use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, LinesCodec};

/// Serve exactly one session over standard input/output, strictly
/// sequentially: read a line, handle it, write the response, repeat.
/// Returns when stdin reaches EOF. Anything the process wants to log
/// must go to stderr; stdout carries only protocol messages.
pub async fn serve_stdio(mut session: Session) -> Result<()> {
    let mut inbound = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    let mut stdout = tokio::io::stdout();

    tracing::info!(session = %session.id(), "stdio session open");

    while let Some(line) = inbound.next().await {
        let line = line.context("failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        if let Some(response) = session.handle_raw(&line).await {
            let mut encoded =
                serde_json::to_vec(&response).context("failed to encode response")?;
            encoded.push(b'\n');
            stdout
                .write_all(&encoded)
                .await
                .context("failed to write to stdout")?;
            stdout.flush().await.context("failed to flush stdout")?;
        }
    }

    session.close();
    tracing::info!("stdin closed, stdio session over");
    Ok(())
}
