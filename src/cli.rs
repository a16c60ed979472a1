use clap::Parser;
use std::path::PathBuf;

const EXIT_CODE_HELP: &str = "\
Exit codes:
  0  all tasks written
  1  unexpected internal error
  2  configuration error (malformed or schema-invalid declarative input)
  3  planning error (output path collision)
  4  one or more generation or write failures";

#[derive(Parser, Debug)]
#[command(
    name = "bindrig",
    version,
    about = "Generate language bindings for C/C++ headers from declarative module descriptions",
    after_help = EXIT_CODE_HELP
)]
pub struct Cli {
    /// Path to a generate.yaml file, or a directory searched recursively
    /// for generate.yaml files
    pub config_path: PathBuf,

    /// Dump the parser's intermediate representation for each header
    /// instead of generating binding sources
    #[arg(long)]
    pub dump_ir: bool,

    /// Stop dispatching new tasks after the first generation failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Concurrent backend invocations. Keep at 1 unless the backend is
    /// known to be safe under concurrent use
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Backend command (overrides the BINDRIG_BACKEND environment variable
    /// and the user settings file)
    #[arg(long)]
    pub backend: Option<String>,

    /// YAML file of policy overrides layered under every module
    #[arg(long)]
    pub defaults: Option<PathBuf>,

    /// Directory prepended to relative derived output paths
    #[arg(long)]
    pub out_root: Option<PathBuf>,

    /// Output machine-readable JSON
    #[arg(long)]
    pub json: bool,
}
