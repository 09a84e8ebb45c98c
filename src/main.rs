use std::process::ExitCode;

use dbt::{cli, logging, runner};

fn main() -> anyhow::Result<ExitCode> {
    let app = cli::parse();
    logging::init(app.verbose);
    runner::run(app)
}
