use anyhow::Result;
use pdfchat::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
