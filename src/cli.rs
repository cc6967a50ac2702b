use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "watchsync")]
#[command(about = "Serve SRT captions in sync with a shared playback clock.")]
pub struct Args {
    /// Path to config TOML (defaults to ./config.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the watch/control pages and the shared clock
    Serve(ServeCmd),
    /// Parse a captions file and print every entry
    Dump(DumpCmd),
    /// Print the effective default config as TOML and exit
    PrintDefaultConfig,
}

#[derive(Debug, Parser)]
pub struct ServeCmd {
    /// Path to the captions (.srt) file
    #[arg(short, long)]
    pub subtitles_path: PathBuf,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Debug, Parser)]
pub struct DumpCmd {
    /// Path to the captions (.srt) file
    #[arg(short, long)]
    pub subtitles_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_accepts_short_flags() {
        let argv = ["watchsync", "serve", "-s", "movie.srt", "-p", "8080"];
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.subtitles_path, PathBuf::from("movie.srt"));
                assert_eq!(cmd.port, Some(8080));
                assert_eq!(cmd.host, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn subtitles_path_is_required() {
        assert!(Args::try_parse_from(["watchsync", "serve"]).is_err());
        assert!(Args::try_parse_from(["watchsync", "dump"]).is_err());
    }
}
