use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use convai::{logging, Overrides, RequestEnvelope, Settings};

#[derive(Parser)]
#[command(author, version, about = "Fetch a Convai character and print the raw response")]
struct Cli {
    /// Character id (default: $CONVAI_CHARACTER_ID, then config.toml, then the built-in id)
    character_id: Option<String>,

    /// POST here instead of https://api.convai.com/character/get
    #[arg(long)]
    endpoint: Option<String>,

    /// Read settings from this TOML file instead of ~/.config/convai/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the request (key masked) and exit without sending it
    #[arg(long)]
    dry_run: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides {
        character_id: cli.character_id,
        endpoint: cli.endpoint,
    };
    let settings = Settings::from_process(&overrides, cli.config.as_deref())?;
    let envelope = RequestEnvelope::new(&settings)?;

    if cli.dry_run {
        println!("{envelope}");
        return Ok(());
    }

    let body = convai::fetch_character(&convai::agent(), &envelope)
        .with_context(|| format!("fetching character {}", envelope.char_id()))?;
    println!("{body}");
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = logging::init_logging(cli.verbose) {
        eprintln!("character-get: {err:#}");
    }

    if let Err(err) = run(cli) {
        eprintln!("character-get error: {:#}", err);
        std::process::exit(1);
    }
}
