//! Backend Invoker: execute the plan against the backend seam.
//!
//! Execution is strictly sequential unless `jobs > 1`. Parallelism is
//! bounded by a dedicated thread pool of exactly `jobs` workers and must
//! only be enabled for backends that are safe under concurrent invocation.
//! Tasks share nothing mutable; each reads its own header and policy.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::backend::{BindingBackend, PolicyView};
use crate::domain::models::{ExecutedTask, GenerationTask, Mode, TaskOutcome};

#[derive(Debug, Clone, Copy)]
pub struct ExecOptions {
    pub jobs: usize,
    pub fail_fast: bool,
}

/// Run every task, collecting one outcome per task in plan order. A failure
/// never disturbs sibling tasks unless `fail_fast` is set, in which case the
/// abort flag stops further dispatch while in-flight tasks finish cleanly;
/// undispatched tasks come back as `Aborted`.
pub fn execute(
    tasks: &[GenerationTask],
    backend: &dyn BindingBackend,
    options: &ExecOptions,
) -> anyhow::Result<Vec<ExecutedTask>> {
    let abort = AtomicBool::new(false);

    if options.jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.jobs)
            .build()?;
        Ok(pool.install(|| {
            tasks
                .par_iter()
                .map(|task| run_task(task, backend, options, &abort))
                .collect()
        }))
    } else {
        Ok(tasks
            .iter()
            .map(|task| run_task(task, backend, options, &abort))
            .collect())
    }
}

fn run_task(
    task: &GenerationTask,
    backend: &dyn BindingBackend,
    options: &ExecOptions,
    abort: &AtomicBool,
) -> ExecutedTask {
    let executed = |outcome| ExecutedTask {
        module: task.module.clone(),
        header: task.header.clone(),
        output: task.output.clone(),
        outcome,
    };

    if abort.load(Ordering::SeqCst) {
        return executed(TaskOutcome::Aborted);
    }

    let view = PolicyView::new(task.policy);
    let result = match task.mode {
        Mode::DumpIntermediate => backend.parse_header(&task.header, &view),
        Mode::GenerateBindings => backend.generate_bindings(&task.header, &view),
    };

    match result {
        Ok(artifact) => executed(TaskOutcome::Generated { artifact }),
        Err(err) => {
            if options.fail_fast {
                abort.store(true, Ordering::SeqCst);
            }
            executed(TaskOutcome::Failed {
                diagnostic: err.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::domain::models::ResolvedPolicy;
    use std::path::{Path, PathBuf};

    struct ScriptedBackend {
        fail_on: &'static str,
    }

    impl BindingBackend for ScriptedBackend {
        fn parse_header(&self, header: &Path, view: &PolicyView) -> Result<String, BackendError> {
            self.generate_bindings(header, view)
        }

        fn generate_bindings(&self, header: &Path, _: &PolicyView) -> Result<String, BackendError> {
            if header.to_string_lossy().contains(self.fail_on) {
                Err(BackendError::Diagnostic(format!(
                    "cannot parse {}",
                    header.display()
                )))
            } else {
                Ok(format!("// bindings for {}\n", header.display()))
            }
        }
    }

    fn tasks<'a>(policy: &'a ResolvedPolicy, headers: &[&str]) -> Vec<GenerationTask<'a>> {
        headers
            .iter()
            .map(|h| GenerationTask {
                module: "m".to_string(),
                header: PathBuf::from(h),
                output: PathBuf::from(format!("out/{h}")),
                mode: Mode::GenerateBindings,
                policy,
            })
            .collect()
    }

    #[test]
    fn failure_does_not_disturb_siblings_by_default() {
        let policy = ResolvedPolicy::base();
        let tasks = tasks(&policy, &["a.h", "broken.h", "c.h"]);
        let backend = ScriptedBackend { fail_on: "broken" };
        let executed = execute(
            &tasks,
            &backend,
            &ExecOptions {
                jobs: 1,
                fail_fast: false,
            },
        )
        .unwrap();

        assert!(matches!(executed[0].outcome, TaskOutcome::Generated { .. }));
        assert!(matches!(executed[1].outcome, TaskOutcome::Failed { .. }));
        assert!(matches!(executed[2].outcome, TaskOutcome::Generated { .. }));
    }

    #[test]
    fn fail_fast_aborts_undispatched_tasks() {
        let policy = ResolvedPolicy::base();
        let tasks = tasks(&policy, &["broken.h", "b.h", "c.h"]);
        let backend = ScriptedBackend { fail_on: "broken" };
        let executed = execute(
            &tasks,
            &backend,
            &ExecOptions {
                jobs: 1,
                fail_fast: true,
            },
        )
        .unwrap();

        assert!(matches!(executed[0].outcome, TaskOutcome::Failed { .. }));
        assert!(matches!(executed[1].outcome, TaskOutcome::Aborted));
        assert!(matches!(executed[2].outcome, TaskOutcome::Aborted));
    }

    #[test]
    fn parallel_execution_preserves_task_order() {
        let policy = ResolvedPolicy::base();
        let tasks = tasks(&policy, &["a.h", "b.h", "c.h", "d.h"]);
        let backend = ScriptedBackend { fail_on: "none" };
        let executed = execute(
            &tasks,
            &backend,
            &ExecOptions {
                jobs: 3,
                fail_fast: false,
            },
        )
        .unwrap();

        let headers: Vec<_> = executed.iter().map(|t| t.header.clone()).collect();
        assert_eq!(
            headers,
            vec![
                PathBuf::from("a.h"),
                PathBuf::from("b.h"),
                PathBuf::from("c.h"),
                PathBuf::from("d.h")
            ]
        );
    }
}
