use anyhow::Result;
use clap::Parser;

use watchsync::{config, pipeline, server};

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    let mut cfg = config::Config::load(args.config.as_deref())?;
    config::init_tracing(&cfg.logging, args.log_level.as_deref())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "watchsync starting");

    match args.command {
        cli::Command::Serve(cmd) => {
            if let Some(port) = cmd.port {
                cfg.server.port = port;
            }
            if let Some(host) = cmd.host {
                cfg.server.host = host;
            }
            let timeline = pipeline::load_timeline(&cmd.subtitles_path, &cfg)?;
            server::run_serve(timeline, &cfg).await
        }
        cli::Command::Dump(cmd) => pipeline::run_dump(&cmd.subtitles_path, &cfg),
        cli::Command::PrintDefaultConfig => {
            let s = cfg.to_toml_pretty()?;
            print!("{s}");
            Ok(())
        }
    }
}
