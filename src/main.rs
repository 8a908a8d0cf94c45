use clap::Parser;
use algotrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
