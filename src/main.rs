use clap::Parser;
use log::LevelFilter;
use sub_reader::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::new();
    logger.filter_level(if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    // RUST_LOG still wins when it is set
    logger.parse_default_env().init();

    cli.run()
}
