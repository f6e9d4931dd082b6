use clap::Parser;
use log::LevelFilter;

use csprobe::cli::Cli;
use csprobe::commands::execute;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = execute(&cli.command) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

/// Warn by default; each `-v` raises the level. `RUST_LOG` still wins.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
