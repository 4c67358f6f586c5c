use bundel::frontend;
use bundel::logging;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;
    info!("Starting bundel");

    frontend::start().await
}
