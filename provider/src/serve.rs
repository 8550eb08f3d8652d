use anyhow::Context;
use stratus_aws_core::protocol::{FailureKind, Request, Response};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::registry::Provider;

/// Reads one RON request per line and writes one RON response per line,
/// in order, until the input closes.
pub async fn serve<R, W>(provider: &Provider, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match Request::from_ron(&line) {
            Ok(request) => provider.handle(request).await,
            Err(e) => {
                tracing::warn!("Rejecting malformed request: {:#}", e);
                Response::Failed {
                    kind: FailureKind::Invalid,
                    message: format!("Failed to decode request: {e:#}"),
                }
            }
        };

        if let Response::Failed { kind, message } = &response {
            tracing::error!(?kind, "{}", message);
        }

        let mut body = response.to_ron().context("Failed to encode response")?;
        body.push('\n');
        writer.write_all(body.as_bytes()).await.context("Failed to write response")?;
        writer.flush().await.context("Failed to write response")?;
    }
    Ok(())
}
