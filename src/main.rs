use clap::Parser;
use cryptobacktest::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
