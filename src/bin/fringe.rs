use std::process::ExitCode;

use parpath::Algorithm;

fn main() -> ExitCode {
    parpath::cli::run(Algorithm::Fringe)
}
