use clap::Parser;

use bindrig::cli::Cli;
use bindrig::domain::constants::{EXIT_CONFIG, EXIT_INTERNAL, EXIT_PLAN, EXIT_TASK_FAILURES};
use bindrig::services::config::ConfigError;
use bindrig::services::plan::PlanError;

fn main() {
    let cli = Cli::parse();
    match bindrig::run(&cli) {
        Ok(report) => {
            if !report.ok() {
                std::process::exit(EXIT_TASK_FAILURES);
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = if err.downcast_ref::<ConfigError>().is_some() {
                EXIT_CONFIG
            } else if err.downcast_ref::<PlanError>().is_some() {
                EXIT_PLAN
            } else {
                EXIT_INTERNAL
            };
            std::process::exit(code);
        }
    }
}
