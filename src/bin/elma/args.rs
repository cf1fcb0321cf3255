use clap::{Parser, Subcommand};

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct ElmaArgs {
    /// Configuration file. Defaults to `elma.toml` in the current directory, if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: ElmaCommand,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
pub enum ElmaCommand {
    /// Summarize a level (`.lev`) or replay (`.rec`) file.
    Info {
        /// The file to inspect.
        path: PathBuf,
        /// Print JSON, regardless of the configured format.
        #[arg(long)]
        json: bool,
    },
    /// Print the time of a replay and whether it looks finished.
    ///
    /// A replay does not record whether the flower was reached. A ride counts as finished when
    /// its last event is a touch and no more than a frame of time follows it.
    Time {
        /// The replay file.
        path: PathBuf,
    },
    /// Print the best-time tables of a level.
    #[command(alias = "best")]
    Top10 {
        /// The level file.
        path: PathBuf,
        /// Print JSON, regardless of the configured format.
        #[arg(long)]
        json: bool,
    },
    /// Link a replay to a level, so the game plays it back on that level.
    ///
    /// Copies the level's link number, and its file name when that fits the replay's field.
    Link {
        /// The replay to modify.
        replay: PathBuf,
        /// The level to link against.
        level: PathBuf,
        /// Write the linked replay here instead of overwriting the input.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}
