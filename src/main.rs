mod app;
mod arena;
mod command;
mod config;
mod consts;
mod game;
mod scores;
mod util;
use crate::app::App;
use crate::arena::Mode;
use crate::config::Config;
use anyhow::Context;
use lexopt::{Arg, Parser, ValueExt};
use log::info;
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::process::ExitCode;

/// Parsed command-line arguments
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Arguments {
    config: Option<PathBuf>,
    log_file: Option<PathBuf>,
    versus: Option<Mode>,
    obstacles: Option<bool>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Command {
    Run(Arguments),
    Help,
    Version,
}

impl Command {
    fn from_parser(mut parser: Parser) -> Result<Command, lexopt::Error> {
        let mut args = Arguments::default();
        while let Some(arg) = parser.next()? {
            match arg {
                Arg::Short('c') | Arg::Long("config") => {
                    args.config = Some(PathBuf::from(parser.value()?));
                }
                Arg::Long("log-file") => args.log_file = Some(PathBuf::from(parser.value()?)),
                Arg::Long("versus") => args.versus = Some(parser.value()?.parse()?),
                Arg::Long("obstacles") => args.obstacles = Some(true),
                Arg::Long("no-obstacles") => args.obstacles = Some(false),
                Arg::Short('h') | Arg::Long("help") => return Ok(Command::Help),
                Arg::Short('V') | Arg::Long("version") => return Ok(Command::Version),
                _ => return Err(arg.unexpected()),
            }
        }
        Ok(Command::Run(args))
    }
}

fn main() -> ExitCode {
    let args = match Command::from_parser(Parser::from_env()) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("neonsnake: {e}");
            return ExitCode::from(2);
        }
    };
    let config = match startup(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("neonsnake: {e:?}");
            return ExitCode::FAILURE;
        }
    };
    let terminal = ratatui::init();
    let r = App::new(&config, args.versus).run(terminal);
    ratatui::restore();
    io_exit(r)
}

/// Set up logging and load the configuration
fn startup(args: &Arguments) -> anyhow::Result<Config> {
    if let Some(ref path) = args.log_file {
        let file = fs_err::File::create(path).context("failed to open log file")?;
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(Box::new(file.into_parts().0)))
            .init();
    }
    let mut config = match args.config {
        Some(ref path) => Config::load(path, false),
        None => Config::load(&Config::default_path()?, true),
    }
    .context("failed to load configuration")?;
    if let Some(obstacles) = args.obstacles {
        config.game.obstacles = obstacles;
    }
    info!("Starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    Ok(config)
}

fn print_help() {
    println!("Usage: neonsnake [<options>]");
    println!();
    println!("Play Snake in the terminal");
    println!();
    println!("Options:");
    println!("  -c, --config <file>      Read configuration from <file>");
    println!("      --log-file <file>    Write a log to <file>");
    println!("      --versus duel|points Play a two-player arena match");
    println!("      --obstacles          Start with obstacles on");
    println!("      --no-obstacles       Start with obstacles off");
    println!("  -h, --help               Display this help message and exit");
    println!("  -V, --version            Show the program version and exit");
}

fn io_exit(r: io::Result<()>) -> ExitCode {
    match r {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.kind() == ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Command, lexopt::Error> {
        Command::from_parser(Parser::from_iter(
            std::iter::once("neonsnake").chain(args.iter().copied()),
        ))
    }

    #[test]
    fn defaults() {
        assert_eq!(parse(&[]).unwrap(), Command::Run(Arguments::default()));
    }

    #[test]
    fn everything() {
        assert_eq!(
            parse(&[
                "--config",
                "snake.toml",
                "--log-file=snake.log",
                "--versus",
                "points",
                "--no-obstacles",
            ])
            .unwrap(),
            Command::Run(Arguments {
                config: Some(PathBuf::from("snake.toml")),
                log_file: Some(PathBuf::from("snake.log")),
                versus: Some(Mode::Points),
                obstacles: Some(false),
            })
        );
    }

    #[test]
    fn help_wins() {
        assert_eq!(parse(&["--versus", "duel", "-h"]).unwrap(), Command::Help);
    }

    #[test]
    fn bad_mode() {
        assert!(parse(&["--versus", "solo"]).is_err());
    }
}
