use clap::Parser;
use corsgate::cli::{run_cli, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = corsgate::logging::init_logging() {
        eprintln!("Warning: {e:#}");
    }

    let mut stdout = std::io::stdout().lock();
    match run_cli(cli, &mut stdout) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}
