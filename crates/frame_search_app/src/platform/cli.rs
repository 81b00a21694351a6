use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::logging::LogDestination;

/// Upload short videos to a frame search service and query their frames.
#[derive(Debug, Parser)]
#[command(name = "frame-search", version, about)]
pub struct Cli {
    /// Config file (RON). Defaults to ./frame_search.ron when present.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the service; overrides the config file.
    #[arg(long, global = true, value_name = "URL")]
    pub service_url: Option<String>,

    /// Where log output goes; overrides the config file.
    #[arg(long, global = true, value_enum, value_name = "DEST")]
    pub log: Option<LogDestination>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive session (the default).
    Shell,
    /// Validate and upload one video, then exit.
    Upload {
        video: PathBuf,
        #[arg(short, long)]
        title: String,
    },
    /// Run one search and print the ranked frames.
    Search {
        query: String,
        /// Also download the result images into this directory.
        #[arg(long, value_name = "DIR")]
        save_dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "frame-search",
            "upload",
            "clip.mp4",
            "--title",
            "Cats",
            "--service-url",
            "http://media.local:9000",
            "--log",
            "off",
        ])
        .unwrap();
        assert_eq!(cli.service_url.as_deref(), Some("http://media.local:9000"));
        assert_eq!(cli.log, Some(LogDestination::Off));
        match cli.command {
            Some(Commands::Upload { video, title }) => {
                assert_eq!(video, PathBuf::from("clip.mp4"));
                assert_eq!(title, "Cats");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_means_shell() {
        let cli = Cli::try_parse_from(["frame-search"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn upload_requires_title() {
        assert!(Cli::try_parse_from(["frame-search", "upload", "clip.mp4"]).is_err());
    }
}
