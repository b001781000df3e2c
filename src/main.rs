use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sel_core::MimeType;
use selkit::bootstrap::{init_tracing_subscriber, resolve_config};
use selkit::{run_probe, ProbeOptions};

#[derive(Parser)]
#[command(name = "selkit")]
#[command(about = "Compositor selection broker tools", long_about = None)]
struct Cli {
    /// Configuration file (defaults to <config dir>/selkit/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the clipboard from a client that then disconnects, paste it from
    /// another one and print what arrived
    Probe {
        #[arg(short, long)]
        text: String,

        #[arg(short, long, default_value = "text/plain")]
        mime: String,

        /// Cap on bytes pasted
        #[arg(long)]
        max_bytes: Option<u64>,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref())?;
    init_tracing_subscriber(&config.logging)?;

    match cli.command {
        Commands::Probe {
            text,
            mime,
            max_bytes,
        } => {
            let mime_type = MimeType::from(mime.as_str());
            let report = run_probe(
                config,
                ProbeOptions {
                    text,
                    mime_type,
                    max_bytes,
                },
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
