mod args;
mod config;
mod report;
mod util;

use self::args::{ElmaArgs, ElmaCommand};
use self::config::{Config, Format};
use self::report::Summary;
use self::util::{anchor_error, as_io_error, LocatedError};

use std::path::{Path, PathBuf};

use clap::Parser;
use elma::lev::Level;
use elma::rec::Replay;
use tracing_subscriber::EnvFilter;

/// What a file on the command line holds, judged by its extension.
#[derive(Debug, PartialEq)]
enum FileKind {
    Level,
    Replay,
}

fn main() -> Result<(), LocatedError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = ElmaArgs::parse();
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        ElmaCommand::Info { path, json } => {
            let summary = match file_kind(&path)? {
                FileKind::Level => {
                    let level = Level::load(&path).map_err(anchor_error())?;
                    Summary::level(&path, &level)
                }
                FileKind::Replay => {
                    let replay = Replay::load(&path).map_err(anchor_error())?;
                    Summary::replay(&path, &replay)
                }
            };

            if json || config.output.format == Format::Json {
                println!("{}", summary.to_json()?);
            } else {
                print!("{}", summary.to_text(config.output.template.as_deref())?);
            }
            Ok(())
        }
        ElmaCommand::Time { path } => {
            let replay = Replay::load(&path).map_err(anchor_error())?;
            let (time, finished) = replay.get_time_hs();
            let finished = if finished { "finished" } else { "unfinished" };
            println!("{}\t{}", report::clock(time as i64), finished);
            Ok(())
        }
        ElmaCommand::Top10 { path, json } => {
            let level = Level::load(&path).map_err(anchor_error())?;
            if json || config.output.format == Format::Json {
                println!("{}", report::top10_json(&level)?);
            } else {
                print!("{}", report::top10_text(&level));
            }
            Ok(())
        }
        ElmaCommand::Link {
            replay: replay_path,
            level: level_path,
            output,
        } => {
            let output = link_files(&replay_path, &level_path, output)?;
            eprintln!("Linked:\t{} to {}", replay_path.display(), level_path.display());
            eprint!("Created:\t");
            println!("{}", output.display());
            Ok(())
        }
    }
}

fn file_kind(path: &Path) -> Result<FileKind, LocatedError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("lev") => Ok(FileKind::Level),
        Some("rec") => Ok(FileKind::Replay),
        _ => {
            let msg = format!("{}: expected a `.lev` or `.rec` file", path.display());
            Err(anchor_error()(as_io_error(msg)))
        }
    }
}

/// Point a replay at a level: take over its link and, if it fits, its file name.
fn link(replay: &mut Replay, level: &Level, level_path: &Path) {
    replay.link = level.link;
    match level_path.file_name().and_then(|name| name.to_str()) {
        Some(name) if name.is_ascii() && name.len() <= 12 => {
            replay.level = name.to_string();
        }
        _ => tracing::warn!(
            "level file name of {} does not fit a replay, keeping {:?}",
            level_path.display(),
            replay.level
        ),
    }
}

/// Link the replay file to the level file, writing to `output` or back over the replay.
fn link_files(
    replay_path: &Path,
    level_path: &Path,
    output: Option<PathBuf>,
) -> Result<PathBuf, LocatedError> {
    let mut replay = Replay::load(replay_path).map_err(anchor_error())?;
    let level = Level::load(level_path).map_err(anchor_error())?;
    link(&mut replay, &level, level_path);

    let output = output.unwrap_or_else(|| replay_path.to_path_buf());
    replay.save(&output).map_err(anchor_error())?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elma::lev::Top10Save;

    #[test]
    fn extension_decides_kind() {
        assert_eq!(file_kind(Path::new("a/b.lev")).unwrap(), FileKind::Level);
        assert_eq!(file_kind(Path::new("QWQUU001.LEV")).unwrap(), FileKind::Level);
        assert_eq!(file_kind(Path::new("ride.Rec")).unwrap(), FileKind::Replay);
        assert!(file_kind(Path::new("ride.txt")).is_err());
        assert!(file_kind(Path::new("lev")).is_err());
    }

    #[test]
    fn link_takes_short_ascii_name() {
        let mut replay = Replay::new();
        replay.level = String::from("old.lev");
        let mut level = Level::new();
        level.link = 1234;

        link(&mut replay, &level, Path::new("levels/QWQUU001.lev"));
        assert_eq!(replay.link, 1234);
        assert_eq!(replay.level, "QWQUU001.lev");
    }

    #[test]
    fn link_keeps_name_that_does_not_fit() {
        let mut level = Level::new();
        level.link = 99;

        let mut replay = Replay::new();
        replay.level = String::from("old.lev");
        link(&mut replay, &level, Path::new("thirteen_char.lev"));
        assert_eq!(replay.link, 99);
        assert_eq!(replay.level, "old.lev");

        let mut replay = Replay::new();
        replay.level = String::from("old.lev");
        link(&mut replay, &level, Path::new("\u{e9}lma.lev"));
        assert_eq!(replay.link, 99);
        assert_eq!(replay.level, "old.lev");
    }

    #[test]
    fn link_writes_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let replay_path = dir.path().join("ride.rec");
        let level_path = dir.path().join("warmup.lev");
        let output_path = dir.path().join("linked.rec");

        let mut replay = Replay::new();
        replay.link = 1;
        replay.level = String::from("other.lev");
        replay.save(&replay_path).unwrap();
        let mut level = Level::new();
        level.link = 2;
        level.save(&level_path, Top10Save::No).unwrap();

        let written = link_files(&replay_path, &level_path, Some(output_path.clone())).unwrap();
        assert_eq!(written, output_path);

        let linked = Replay::load(&output_path).unwrap();
        assert_eq!(linked.link, 2);
        assert_eq!(linked.level, "warmup.lev");
        let untouched = Replay::load(&replay_path).unwrap();
        assert_eq!(untouched.link, 1);
        assert_eq!(untouched.level, "other.lev");

        let written = link_files(&replay_path, &level_path, None).unwrap();
        assert_eq!(written, replay_path);
        assert_eq!(Replay::load(&replay_path).unwrap().link, 2);
    }
}
