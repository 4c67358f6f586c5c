use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::info;

use crate::frontend::context::FrontendContext;
use crate::request::{RequestedFile, Requester, ZipRequest};
use crate::shared::config::CONFIG;

#[derive(Debug, Deserialize)]
struct SubmitBody {
    files: Vec<RequestedFile>,
    requester: Requester,
}

/// Line protocol: `PING`, `STATUS`, and `SUBMIT {json}`. One reply line
/// per request line; replies to SUBMIT and STATUS are JSON.
pub async fn run_tcp_server(ctx: Arc<FrontendContext>) -> anyhow::Result<()> {
    let addr = &CONFIG.server.tcp_addr;

    let listener = TcpListener::bind(addr).await?;
    info!("TCP listener active on {}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let ctx = Arc::clone(&ctx);

        tokio::spawn(async move {
            let mut reader = BufReader::new(stream);
            let mut line = String::new();

            loop {
                line.clear();
                let n = reader.read_line(&mut line).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }

                let reply = handle_line(&ctx, &line);
                if reader.get_mut().write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
        });
    }
}

pub(crate) fn handle_line(ctx: &FrontendContext, line: &str) -> String {
    let trimmed = line.trim();

    if trimmed.eq_ignore_ascii_case("ping") {
        return "PONG\n".to_string();
    }

    if trimmed.eq_ignore_ascii_case("status") {
        return match serde_json::to_string(&ctx.dispatcher.status()) {
            Ok(status) => format!("{status}\n"),
            Err(e) => format!("ERROR: {e}\n"),
        };
    }

    if let (Some(head), Some(body)) = (trimmed.get(..7), trimmed.get(7..)) {
        if head.eq_ignore_ascii_case("submit ") {
            return handle_submit(ctx, body);
        }
    }

    "ERROR: unknown command\n".to_string()
}

fn handle_submit(ctx: &FrontendContext, body: &str) -> String {
    let body: SubmitBody = match serde_json::from_str(body) {
        Ok(body) => body,
        Err(e) => return format!("ERROR: invalid SUBMIT body: {e}\n"),
    };

    let request = ZipRequest::new(body.files, body.requester);
    match ctx.dispatcher.submit(request) {
        Ok(receipt) => {
            let reply = json!({
                "status": "accepted",
                "fingerprint": receipt.fingerprint,
                "merged": receipt.merged,
            });
            format!("{reply}\n")
        }
        Err(e) => {
            let reply = json!({
                "status": "rejected",
                "reason": e.to_string(),
            });
            format!("{reply}\n")
        }
    }
}
