use clap::Parser;
use perfchart::cli::{Cli, run};
use perfchart::telemetry::init_tracing;

fn main() -> std::process::ExitCode {
    init_tracing();
    run(Cli::parse())
}
