//! Output Writer: persist generated artifacts and assemble the run report.

use std::path::Path;

use crate::domain::models::{
    ExecutedTask, JsonOut, Mode, RunReport, TaskOutcome, TaskReport, TaskState,
};

/// Write every successful artifact to its declared output path, creating
/// parent directories as needed (already-existing directories are fine).
/// A task that failed generation is recorded, never retried or raised; a
/// successful task whose artifact cannot be physically written becomes a
/// write failure, distinct from a generation failure.
pub fn persist(executed: Vec<ExecutedTask>, mode: Mode) -> RunReport {
    let mut tasks = Vec::with_capacity(executed.len());
    let (mut written, mut generation_failed, mut write_failed, mut aborted) = (0, 0, 0, 0);

    for task in executed {
        let (state, diagnostic) = match task.outcome {
            TaskOutcome::Generated { artifact } => match write_artifact(&task.output, &artifact) {
                Ok(()) => {
                    written += 1;
                    (TaskState::Written, None)
                }
                Err(err) => {
                    write_failed += 1;
                    (TaskState::WriteFailed, Some(err.to_string()))
                }
            },
            TaskOutcome::Failed { diagnostic } => {
                generation_failed += 1;
                (TaskState::GenerationFailed, Some(diagnostic))
            }
            TaskOutcome::Aborted => {
                aborted += 1;
                (TaskState::Aborted, None)
            }
        };

        tasks.push(TaskReport {
            module: task.module,
            header: task.header.to_string_lossy().to_string(),
            output: task.output.to_string_lossy().to_string(),
            state,
            diagnostic,
        });
    }

    RunReport {
        mode,
        total: tasks.len(),
        written,
        generation_failed,
        write_failed,
        aborted,
        tasks,
    }
}

fn write_artifact(path: &Path, artifact: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, artifact)
}

/// Print the end-of-run report: one line per task plus totals, or the JSON
/// envelope when machine-readable output was requested.
pub fn print_report(json: bool, report: &RunReport) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: report.ok(),
                data: report,
            })?
        );
        return Ok(());
    }

    for task in &report.tasks {
        match &task.diagnostic {
            Some(diagnostic) => println!(
                "{}\t{}\t{}\t{}",
                task.state.as_str(),
                task.module,
                task.header,
                diagnostic
            ),
            None => println!("{}\t{}\t{}", task.state.as_str(), task.module, task.header),
        }
    }
    println!(
        "total {} written {} generation_failed {} write_failed {} aborted {}",
        report.total, report.written, report.generation_failed, report.write_failed, report.aborted
    );
    Ok(())
}
