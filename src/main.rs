use log::{error, warn};
use snafu::ErrorCompat;

use clap::Parser;

mod args;
mod cfr;

fn main() {
    let args = args::Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let res = cfr::settings_from_args(&args).and_then(|settings| cfr::run_analysis(&settings));

    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(s) = source {
            eprintln!("  caused by: {}", s);
            source = std::error::Error::source(s);
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            error!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
