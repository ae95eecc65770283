use anyhow::Result;
use clap::Parser;
use word_cloud::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    word_cloud::run(cli).await
}
