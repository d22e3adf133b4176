use clap::Parser;
use switchyard::cli::{run_cli, Cli};
use switchyard::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let _logging = init_logging()?;
    run_cli(Cli::parse())
}
