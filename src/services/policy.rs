//! Policy Resolver: layer declarative overrides onto an injected default
//! policy, one resolved policy per binding unit.
//!
//! Merge rules:
//! - map-valued dimensions (pointer table, adapters, per-enum prefixes,
//!   rewrites): a module-level entry replaces the inherited entry for that
//!   key, unspecified keys inherit unchanged;
//! - set-valued dimensions (nullable params, defines) and every exclusion
//!   list: union across levels; an exclusion can never be retracted by a
//!   narrower override;
//! - scalars: the innermost level that sets one wins.

use std::path::{Path, PathBuf};

use crate::domain::constants::{DEFAULT_OUTPUT_ROOT, SHARED_OVERRIDES_NAME};
use crate::domain::models::{
    Adapter, ConfigDocument, ModuleBlock, PointerClass, ResolvedModule, ResolvedPolicy,
};
use crate::services::config::ConfigError;

/// Resolve every binding unit in one document against the injected
/// defaults. The reserved `all` block is layered between the defaults and
/// each module's own overrides.
pub fn resolve_document(
    path: &Path,
    document: &ConfigDocument,
    defaults: &ResolvedPolicy,
) -> Result<Vec<ResolvedModule>, ConfigError> {
    let mut file_base = defaults.clone();
    if let Some(shared) = document.modules.get(SHARED_OVERRIDES_NAME) {
        file_base = apply_overrides(path, SHARED_OVERRIDES_NAME, file_base, shared)?;
    }

    let mut out = Vec::new();
    for (name, block) in &document.modules {
        if name == SHARED_OVERRIDES_NAME {
            continue;
        }
        resolve_module(path, name, name, block, &file_base, None, &mut out)?;
    }
    Ok(out)
}

fn resolve_module(
    path: &Path,
    id: &str,
    leaf_name: &str,
    block: &ModuleBlock,
    inherited: &ResolvedPolicy,
    parent_output: Option<&Path>,
    out: &mut Vec<ResolvedModule>,
) -> Result<(), ConfigError> {
    let policy = apply_overrides(path, id, inherited.clone(), block)?;

    let output_dir = match &block.output {
        Some(declared) => declared.clone(),
        None => match parent_output {
            Some(parent) => parent.join(leaf_name),
            None => PathBuf::from(DEFAULT_OUTPUT_ROOT).join(leaf_name),
        },
    };

    if !block.headers.is_empty() {
        out.push(ResolvedModule {
            id: id.to_string(),
            config_path: path.to_path_buf(),
            headers: block.headers.clone(),
            output_dir: output_dir.clone(),
            policy: policy.clone(),
        });
    }

    for (child_name, child) in &block.modules {
        resolve_module(
            path,
            &format!("{id}.{child_name}"),
            child_name,
            child,
            &policy,
            Some(&output_dir),
            out,
        )?;
    }
    Ok(())
}

/// Apply one override block on top of `base`.
pub fn apply_overrides(
    path: &Path,
    module: &str,
    mut base: ResolvedPolicy,
    block: &ModuleBlock,
) -> Result<ResolvedPolicy, ConfigError> {
    for (spelling, class) in &block.pointer_types {
        let class = parse_pointer_class(path, module, spelling, class)?;
        base.pointer_types.insert(spelling.clone(), class);
    }
    if let Some(class) = &block.default_pointer_type {
        base.default_pointer_class = parse_pointer_class(path, module, "default_pointer_type", class)?;
    }

    base.nullable_params
        .extend(block.nullable_params.iter().cloned());
    if let Some(v) = block.nullable_const_char {
        base.nullable_const_char = v;
    }

    if let Some(v) = block.enums.keep_value_prefix {
        base.enum_keep_value_prefix = v;
    }
    for (name, prefix) in &block.enums.value_prefixes {
        base.enum_value_prefixes
            .insert(name.clone(), prefix.clone());
    }
    base.enum_include.extend(block.enums.include.iter().cloned());
    base.enum_exclude.extend(block.enums.exclude.iter().cloned());

    base.fn_exclude
        .extend(block.functions.exclude.iter().cloned());
    for (name, adapter) in &block.functions.adapters {
        let adapter = parse_adapter(path, module, name, adapter)?;
        base.fn_adapters.insert(name.clone(), adapter);
    }

    base.struct_exclude
        .extend(block.structs.exclude.iter().cloned());
    if let Some(v) = block.structs.exclude_members {
        base.struct_exclude_members = v;
    }

    base.defines.extend(block.defines.iter().cloned());
    for (token, replacement) in &block.rewrites {
        base.rewrites.insert(token.clone(), replacement.clone());
    }

    // Exclusion wins over adapter assignment at every level.
    let shadowed: Vec<String> = base
        .fn_adapters
        .keys()
        .filter(|name| base.fn_exclude.contains(name.as_str()))
        .cloned()
        .collect();
    for name in shadowed {
        base.fn_adapters.remove(&name);
    }

    Ok(base)
}

/// Load a defaults overlay file: a bare override block applied to the
/// built-in base policy before any module is resolved.
pub fn load_defaults(path: &Path) -> Result<ResolvedPolicy, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let block: ModuleBlock = serde_yml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if !block.headers.is_empty() || !block.modules.is_empty() || block.output.is_some() {
        return Err(ConfigError::Module {
            path: path.to_path_buf(),
            module: "defaults".to_string(),
            message: "defaults file may contain only policy overrides".to_string(),
        });
    }
    apply_overrides(path, "defaults", ResolvedPolicy::base(), &block)
}

fn parse_pointer_class(
    path: &Path,
    module: &str,
    key: &str,
    value: &str,
) -> Result<PointerClass, ConfigError> {
    PointerClass::parse(value).ok_or_else(|| ConfigError::Module {
        path: path.to_path_buf(),
        module: module.to_string(),
        message: format!(
            "unknown pointer classification `{value}` for `{key}` \
             (expected owned, borrowed, shared, or nullable-raw)"
        ),
    })
}

fn parse_adapter(path: &Path, module: &str, key: &str, value: &str) -> Result<Adapter, ConfigError> {
    Adapter::parse(value).ok_or_else(|| ConfigError::Module {
        path: path.to_path_buf(),
        module: module.to_string(),
        message: format!("unknown adapter `{value}` for function `{key}`"),
    })
}
