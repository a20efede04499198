use anyhow::Result;
use lynxhealth::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
