use anyhow::Result;
use counsel::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
