use agentbench::cli::{Cli, run};
use agentbench::telemetry::init_logging;
use clap::Parser;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    run(cli)
}
