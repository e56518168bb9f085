use std::path::PathBuf;

use clap::Parser;

use convai::{Overrides, Settings};

/// Check that an API key can be found, without calling the API.
#[derive(Parser)]
#[command(author, version)]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let settings = Settings::from_process(&Overrides::default(), cli.config.as_deref())?;
    println!("api key: {} (from {})", settings.api_key, settings.key_source);
    Ok(())
}
