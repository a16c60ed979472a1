//! Plan Builder: expand resolved modules into per-header generation tasks
//! with derived output paths. Pure path composition; the filesystem is not
//! touched here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::models::{GenerationTask, Mode, ResolvedModule};

#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    #[error(
        "output path collision on {}: produced by both {} and {}",
        output.display(),
        first.display(),
        second.display()
    )]
    OutputCollision {
        output: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("module `{module}`: header {} has no file stem", header.display())]
    BadHeader { module: String, header: PathBuf },
}

#[derive(Debug)]
pub struct Plan<'a> {
    pub tasks: Vec<GenerationTask<'a>>,
}

/// Build the ordered task list for one run. Output path rule:
/// `<module output dir>/<header stem>.<mode suffix>`, optionally re-rooted
/// under `out_root` when the derived path is relative. Assigning the same
/// output path twice anywhere in the run is fatal.
pub fn build_plan<'a>(
    modules: &'a [ResolvedModule],
    mode: Mode,
    out_root: Option<&Path>,
) -> Result<Plan<'a>, PlanError> {
    let mut tasks = Vec::new();
    let mut claimed: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for module in modules {
        for header in &module.headers {
            let stem = header
                .file_stem()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| PlanError::BadHeader {
                    module: module.id.clone(),
                    header: header.clone(),
                })?;
            let file_name = format!("{}.{}", stem.to_string_lossy(), mode.suffix());
            let mut output = module.output_dir.join(file_name);
            if let Some(root) = out_root {
                if output.is_relative() {
                    output = root.join(output);
                }
            }

            if let Some(first) = claimed.insert(output.clone(), header.clone()) {
                return Err(PlanError::OutputCollision {
                    output,
                    first,
                    second: header.clone(),
                });
            }

            tasks.push(GenerationTask {
                module: module.id.clone(),
                header: header.clone(),
                output,
                mode,
                policy: &module.policy,
            });
        }
    }

    tasks.sort_by(|a, b| (&a.module, &a.header).cmp(&(&b.module, &b.header)));
    Ok(Plan { tasks })
}
