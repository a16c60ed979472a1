//! Stable constants shared across the crate.

/// Fixed filename recognized during recursive config discovery.
pub const CONFIG_FILE_NAME: &str = "generate.yaml";

/// Backend command used when neither `--backend`, the environment, nor the
/// user settings file names one.
pub const DEFAULT_BACKEND_COMMAND: &str = "bindrig-backend";

/// Environment variable overriding the backend command.
pub const BACKEND_ENV_VAR: &str = "BINDRIG_BACKEND";

/// Root directory for derived output paths when a module declares none.
pub const DEFAULT_OUTPUT_ROOT: &str = "generated";

/// Reserved module name holding file-level shared overrides.
pub const SHARED_OVERRIDES_NAME: &str = "all";

// Exit codes. These are part of the CLI contract; scripts depend on them.
pub const EXIT_INTERNAL: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_PLAN: i32 = 3;
pub const EXIT_TASK_FAILURES: i32 = 4;
