//! Seam to the external header parser / binding generator.
//!
//! The orchestration engine and the backend communicate only through
//! `BindingBackend`: parse a header into its intermediate representation, or
//! generate binding source for it, both under a `PolicyView`, the resolved
//! policy translated into the backend's configuration surface. Everything
//! behind that boundary (C/C++ parsing, templating) is opaque here.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::domain::models::{Adapter, PointerClass, ResolvedPolicy};

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("failed to run backend `{command}`: {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },
    #[error("{0}")]
    Diagnostic(String),
}

/// Resolved policy flattened for the backend. Exclusions are carried both as
/// name lists and as pipe-joined regex alternations, which is the shape the
/// generator's matching options expect.
#[derive(Debug, Serialize)]
pub struct PolicyView<'a> {
    pub pointer_types: &'a BTreeMap<String, PointerClass>,
    pub default_pointer_class: PointerClass,
    pub nullable_params: &'a BTreeSet<String>,
    pub nullable_const_char: bool,
    pub enum_keep_value_prefix: bool,
    pub enum_value_prefixes: &'a BTreeMap<String, String>,
    pub enum_include: &'a BTreeSet<String>,
    pub enum_exclude: &'a BTreeSet<String>,
    pub enum_exclude_regex: String,
    pub fn_exclude: &'a BTreeSet<String>,
    pub fn_exclude_regex: String,
    pub fn_adapters: &'a BTreeMap<String, Adapter>,
    pub struct_exclude: &'a BTreeSet<String>,
    pub struct_exclude_regex: String,
    pub struct_exclude_members: bool,
    pub defines: &'a BTreeSet<String>,
    pub rewrites: &'a BTreeMap<String, String>,
}

impl<'a> PolicyView<'a> {
    pub fn new(policy: &'a ResolvedPolicy) -> Self {
        Self {
            pointer_types: &policy.pointer_types,
            default_pointer_class: policy.default_pointer_class,
            nullable_params: &policy.nullable_params,
            nullable_const_char: policy.nullable_const_char,
            enum_keep_value_prefix: policy.enum_keep_value_prefix,
            enum_value_prefixes: &policy.enum_value_prefixes,
            enum_include: &policy.enum_include,
            enum_exclude: &policy.enum_exclude,
            enum_exclude_regex: join_by_pipe(&policy.enum_exclude),
            fn_exclude: &policy.fn_exclude,
            fn_exclude_regex: join_by_pipe(&policy.fn_exclude),
            fn_adapters: &policy.fn_adapters,
            struct_exclude: &policy.struct_exclude,
            struct_exclude_regex: join_by_pipe(&policy.struct_exclude),
            struct_exclude_members: policy.struct_exclude_members,
            defines: &policy.defines,
            rewrites: &policy.rewrites,
        }
    }
}

fn join_by_pipe(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join("|")
}

pub trait BindingBackend: Sync {
    /// Parse a header and return its intermediate structural representation.
    fn parse_header(&self, header: &Path, view: &PolicyView) -> Result<String, BackendError>;
    /// Generate binding source text for a header.
    fn generate_bindings(&self, header: &Path, view: &PolicyView) -> Result<String, BackendError>;
}

/// Subprocess-backed implementation. Invokes `<command> parse <header>` or
/// `<command> generate <header>`, feeding the policy view as JSON on stdin
/// and reading the artifact from stdout.
pub struct CommandBackend {
    command: String,
}

impl CommandBackend {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn invoke(&self, verb: &str, header: &Path, view: &PolicyView) -> Result<String, BackendError> {
        let mut child = Command::new(&self.command)
            .arg(verb)
            .arg(header)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BackendError::Launch {
                command: self.command.clone(),
                source,
            })?;

        let payload = serde_json::to_vec(view)
            .map_err(|e| BackendError::Diagnostic(format!("policy serialization: {e}")))?;
        if let Some(mut stdin) = child.stdin.take() {
            // A backend that exits before draining stdin closes the pipe;
            // its stderr is the interesting diagnostic then, not the EPIPE.
            let _ = stdin.write_all(&payload);
        }

        let out = child
            .wait_with_output()
            .map_err(|source| BackendError::Launch {
                command: self.command.clone(),
                source,
            })?;

        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                Err(BackendError::Diagnostic(format!(
                    "backend exited with {}",
                    out.status
                )))
            } else {
                Err(BackendError::Diagnostic(stderr.to_string()))
            }
        }
    }
}

impl BindingBackend for CommandBackend {
    fn parse_header(&self, header: &Path, view: &PolicyView) -> Result<String, BackendError> {
        self.invoke("parse", header, view)
    }

    fn generate_bindings(&self, header: &Path, view: &PolicyView) -> Result<String, BackendError> {
        self.invoke("generate", header, view)
    }
}
