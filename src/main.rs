use anyhow::Result;
use clap::Parser;
use flowmap::cli::Cli;
use flowmap::output;
use log::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting flowmap - live build flow status graph");
    cli.execute().await?;

    Ok(())
}
