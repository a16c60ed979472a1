use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

/// One parsed `generate.yaml` document. The top-level `modules:` mapping may
/// contain the reserved name `all`, whose block carries shared overrides for
/// every other module in the same file and is never a binding unit itself.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    pub modules: BTreeMap<String, ModuleBlock>,
}

/// A module description: headers to bind, policy overrides, and optionally
/// nested module blocks. All policy fields are optional; unspecified keys
/// inherit from the enclosing level.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ModuleBlock {
    #[serde(default)]
    pub headers: Vec<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Pointer type spelling -> ownership classification name.
    #[serde(default)]
    pub pointer_types: BTreeMap<String, String>,
    /// Fallback classification for pointer spellings not in the table.
    #[serde(default)]
    pub default_pointer_type: Option<String>,
    /// Parameter names treated as nullable with a null default.
    #[serde(default)]
    pub nullable_params: Vec<String>,
    /// Whether `const char*` parameters default to nullable.
    #[serde(default)]
    pub nullable_const_char: Option<bool>,
    #[serde(default)]
    pub enums: EnumBlock,
    #[serde(default)]
    pub functions: FunctionBlock,
    #[serde(default)]
    pub structs: StructBlock,
    /// Macro names exported to the binding namespace.
    #[serde(default)]
    pub defines: Vec<String>,
    /// Source token rewrites applied by the backend before parsing.
    #[serde(default)]
    pub rewrites: BTreeMap<String, String>,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleBlock>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct EnumBlock {
    /// Keep the library prefix on exported enum values.
    #[serde(default)]
    pub keep_value_prefix: Option<bool>,
    /// Per-enum value prefix, e.g. `SUNDataIOMode: SUNDATAIOMODE_`.
    #[serde(default)]
    pub value_prefixes: BTreeMap<String, String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FunctionBlock {
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Function name -> adapter name (resolved to `Adapter` later).
    #[serde(default)]
    pub adapters: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct StructBlock {
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Suppress direct member bindings for all structs.
    #[serde(default)]
    pub exclude_members: Option<bool>,
}

/// Ownership/representation treatment for a pointer-typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointerClass {
    Owned,
    Borrowed,
    Shared,
    NullableRaw,
}

impl PointerClass {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "owned" => Some(Self::Owned),
            "borrowed" => Some(Self::Borrowed),
            "shared" => Some(Self::Shared),
            "nullable-raw" => Some(Self::NullableRaw),
            _ => None,
        }
    }
}

/// Named signature transformation applied to a bound function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Adapter {
    ArrayPointerToSequence,
    OutputParamToReturn,
    SharedPointerReturn,
    NullableDefaultPointer,
}

impl Adapter {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "array-pointer-to-sequence" => Some(Self::ArrayPointerToSequence),
            "output-param-to-return" => Some(Self::OutputParamToReturn),
            "shared-pointer-return" => Some(Self::SharedPointerReturn),
            "nullable-default-pointer" => Some(Self::NullableDefaultPointer),
            _ => None,
        }
    }
}

/// The fully merged policy handed to the backend for one module.
/// Immutable once built; plan building and invocation read it only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPolicy {
    pub pointer_types: BTreeMap<String, PointerClass>,
    pub default_pointer_class: PointerClass,
    pub nullable_params: BTreeSet<String>,
    pub nullable_const_char: bool,
    pub enum_keep_value_prefix: bool,
    pub enum_value_prefixes: BTreeMap<String, String>,
    pub enum_include: BTreeSet<String>,
    pub enum_exclude: BTreeSet<String>,
    pub fn_exclude: BTreeSet<String>,
    pub fn_adapters: BTreeMap<String, Adapter>,
    pub struct_exclude: BTreeSet<String>,
    pub struct_exclude_members: bool,
    pub defines: BTreeSet<String>,
    pub rewrites: BTreeMap<String, String>,
}

impl ResolvedPolicy {
    /// Process-wide base policy. Passed explicitly into resolution rather
    /// than read from ambient state.
    pub fn base() -> Self {
        Self {
            pointer_types: BTreeMap::new(),
            default_pointer_class: PointerClass::NullableRaw,
            nullable_params: BTreeSet::new(),
            nullable_const_char: true,
            enum_keep_value_prefix: true,
            enum_value_prefixes: BTreeMap::new(),
            enum_include: BTreeSet::new(),
            enum_exclude: BTreeSet::new(),
            fn_exclude: BTreeSet::new(),
            fn_adapters: BTreeMap::new(),
            struct_exclude: BTreeSet::new(),
            struct_exclude_members: true,
            defines: BTreeSet::new(),
            rewrites: BTreeMap::new(),
        }
    }
}

/// One binding unit after policy resolution: a module with headers and its
/// merged policy.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    /// Dotted module path, e.g. `cvode.ls`.
    pub id: String,
    /// Config file this module came from, for diagnostics.
    pub config_path: PathBuf,
    pub headers: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub policy: ResolvedPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    DumpIntermediate,
    GenerateBindings,
}

impl Mode {
    /// Output filename suffix. The two modes can never share a path.
    pub fn suffix(&self) -> &'static str {
        match self {
            Mode::DumpIntermediate => "srcml.xml",
            Mode::GenerateBindings => "binding.cpp",
        }
    }
}

/// One unit of backend work: a header bound to its module's resolved policy
/// and a derived output path. Consumed exactly once.
#[derive(Debug)]
pub struct GenerationTask<'a> {
    pub module: String,
    pub header: PathBuf,
    pub output: PathBuf,
    pub mode: Mode,
    pub policy: &'a ResolvedPolicy,
}

/// Backend outcome for one task, before the writer runs.
#[derive(Debug)]
pub enum TaskOutcome {
    Generated { artifact: String },
    Failed { diagnostic: String },
    Aborted,
}

#[derive(Debug)]
pub struct ExecutedTask {
    pub module: String,
    pub header: PathBuf,
    pub output: PathBuf,
    pub outcome: TaskOutcome,
}

/// Terminal state of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Written,
    GenerationFailed,
    WriteFailed,
    Aborted,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Written => "written",
            TaskState::GenerationFailed => "generation_failed",
            TaskState::WriteFailed => "write_failed",
            TaskState::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskReport {
    pub module: String,
    pub header: String,
    pub output: String,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub mode: Mode,
    pub total: usize,
    pub written: usize,
    pub generation_failed: usize,
    pub write_failed: usize,
    pub aborted: usize,
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub fn ok(&self) -> bool {
        self.generation_failed == 0 && self.write_failed == 0 && self.aborted == 0
    }
}

/// User settings file (`~/.config/bindrig/config.toml`). Every field is
/// optional; CLI flags win over settings.
#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub run: RunSettings,
}

#[derive(Debug, Deserialize, Default)]
pub struct RunSettings {
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub jobs: Option<usize>,
    #[serde(default)]
    pub fail_fast: Option<bool>,
}
