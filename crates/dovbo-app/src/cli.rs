use std::path::PathBuf;

use clap::Parser;

/// dovbobot: a Telegram chat bot backed by an OpenAI assistant.
#[derive(Parser, Debug)]
#[command(name = "dovbobot", version, about)]
pub struct Args {
    /// Configuration profile (selects etc/<profile>.toml).
    #[arg(short, long, default_value = "default")]
    pub profile: String,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error). RUST_LOG wins over both.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the resolved configuration with secrets masked, then exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
