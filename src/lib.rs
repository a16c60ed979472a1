pub mod backend;
pub mod cli;
pub mod domain;
pub mod services;

use crate::backend::CommandBackend;
use crate::cli::Cli;
use crate::domain::constants::{BACKEND_ENV_VAR, DEFAULT_BACKEND_COMMAND};
use crate::domain::models::{Mode, ResolvedPolicy, RunReport};
use crate::services::invoke::ExecOptions;

/// Run one full pass: load configs, resolve policies, build the plan,
/// invoke the backend per task, persist artifacts, print the report.
/// Configuration and planning errors abort before any backend call;
/// per-task failures are aggregated into the returned report instead.
pub fn run(cli: &Cli) -> anyhow::Result<RunReport> {
    let settings = services::settings::load_settings()?;

    let mode = if cli.dump_ir {
        Mode::DumpIntermediate
    } else {
        Mode::GenerateBindings
    };

    let defaults = match &cli.defaults {
        Some(path) => services::policy::load_defaults(path)?,
        None => ResolvedPolicy::base(),
    };

    let configs = services::config::load(&cli.config_path)?;

    let mut modules = Vec::new();
    for loaded in &configs {
        if !cli.json {
            println!("generating from {}", loaded.path.display());
        }
        modules.extend(services::policy::resolve_document(
            &loaded.path,
            &loaded.document,
            &defaults,
        )?);
    }

    let plan = services::plan::build_plan(&modules, mode, cli.out_root.as_deref())?;

    let backend_command = cli
        .backend
        .clone()
        .or_else(|| std::env::var(BACKEND_ENV_VAR).ok())
        .or_else(|| settings.run.backend.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND_COMMAND.to_string());
    let backend = CommandBackend::new(backend_command);

    let options = ExecOptions {
        jobs: cli.jobs.or(settings.run.jobs).unwrap_or(1).max(1),
        fail_fast: cli.fail_fast || settings.run.fail_fast.unwrap_or(false),
    };

    let executed = services::invoke::execute(&plan.tasks, &backend, &options)?;
    let report = services::output::persist(executed, mode);
    services::output::print_report(cli.json, &report)?;
    Ok(report)
}
