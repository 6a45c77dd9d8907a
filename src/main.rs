use clap::Parser;
use resrouter::cli::{run, Cli};
use resrouter::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging_with_config(&cli.log_config())?;
    let output = run(&cli).await?;
    println!("{output}");
    Ok(())
}
