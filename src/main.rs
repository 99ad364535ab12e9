use anyhow::Result;
use clap::Parser;
use dbotu::{Args, LogLevel};
use std::fs::File;

// --------------------------------------------------
fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

// --------------------------------------------------
fn run(args: Args) -> Result<()> {
    let mut logger = env_logger::Builder::new();
    logger.filter_level(match args.log {
        Some(LogLevel::Trace) => log::LevelFilter::Trace,
        Some(LogLevel::Debug) => log::LevelFilter::Debug,
        Some(LogLevel::Info) => log::LevelFilter::Info,
        _ => log::LevelFilter::Off,
    });
    if let Some(logfile) = &args.logfile {
        logger.target(env_logger::Target::Pipe(Box::new(File::create(
            logfile,
        )?)));
    }
    logger.init();

    dbotu::run(args)
}
