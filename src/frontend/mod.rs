pub mod context;
pub mod tcp;

use context::FrontendContext;

pub async fn start() -> anyhow::Result<()> {
    let ctx = FrontendContext::from_config()?;
    tcp::listener::run_tcp_server(ctx).await
}
