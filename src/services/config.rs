//! Config Loader: find and parse declarative `generate.yaml` files.

use std::path::{Path, PathBuf};

use crate::domain::constants::{CONFIG_FILE_NAME, SHARED_OVERRIDES_NAME};
use crate::domain::models::{ConfigDocument, ModuleBlock};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yml::Error,
    },
    #[error("{}: module `{module}`: {message}", path.display())]
    Module {
        path: PathBuf,
        module: String,
        message: String,
    },
    #[error("no generate.yaml files found under {}", path.display())]
    NothingFound { path: PathBuf },
    #[error("{}: modules section is missing or empty", path.display())]
    NoModules { path: PathBuf },
}

/// One loaded declarative file. Immutable after loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub document: ConfigDocument,
}

/// Load a single config file, or recursively discover every
/// `generate.yaml` below a directory. Discovery order is lexicographic by
/// full path so repeated runs over an unchanged tree produce the same plan.
/// Any malformed file fails the whole load.
pub fn load(path: &Path) -> Result<Vec<LoadedConfig>, ConfigError> {
    if path.is_dir() {
        let mut found = Vec::new();
        discover(path, &mut found)?;
        if found.is_empty() {
            return Err(ConfigError::NothingFound {
                path: path.to_path_buf(),
            });
        }
        found.sort();
        found.iter().map(|p| load_file(p)).collect()
    } else {
        Ok(vec![load_file(path)?])
    }
}

fn discover(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            discover(&path, found)?;
        } else if entry.file_name() == CONFIG_FILE_NAME {
            found.push(path);
        }
    }
    Ok(())
}

fn load_file(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut document: ConfigDocument =
        serde_yml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    validate(path, &document)?;

    // Headers are declared relative to the file that names them.
    if let Some(dir) = path.parent() {
        for block in document.modules.values_mut() {
            rebase_headers(dir, block);
        }
    }

    Ok(LoadedConfig {
        path: path.to_path_buf(),
        document,
    })
}

fn rebase_headers(dir: &Path, block: &mut ModuleBlock) {
    for header in &mut block.headers {
        if header.is_relative() {
            *header = dir.join(&*header);
        }
    }
    for child in block.modules.values_mut() {
        rebase_headers(dir, child);
    }
}

fn validate(path: &Path, document: &ConfigDocument) -> Result<(), ConfigError> {
    if document.modules.is_empty() {
        return Err(ConfigError::NoModules {
            path: path.to_path_buf(),
        });
    }

    if let Some(shared) = document.modules.get(SHARED_OVERRIDES_NAME) {
        if !shared.headers.is_empty() || !shared.modules.is_empty() || shared.output.is_some() {
            return Err(ConfigError::Module {
                path: path.to_path_buf(),
                module: SHARED_OVERRIDES_NAME.to_string(),
                message: "reserved block may contain only policy overrides".to_string(),
            });
        }
        if document.modules.len() == 1 {
            return Err(ConfigError::Module {
                path: path.to_path_buf(),
                module: SHARED_OVERRIDES_NAME.to_string(),
                message: "file declares shared overrides but no modules".to_string(),
            });
        }
    }

    for (name, block) in &document.modules {
        if name == SHARED_OVERRIDES_NAME {
            continue;
        }
        validate_module(path, name, block)?;
    }
    Ok(())
}

fn validate_module(path: &Path, id: &str, block: &ModuleBlock) -> Result<(), ConfigError> {
    let leaf = id.rsplit('.').next().unwrap_or(id);
    if leaf.is_empty() || leaf.contains('/') {
        return Err(ConfigError::Module {
            path: path.to_path_buf(),
            module: id.to_string(),
            message: "module name must be a plain identifier".to_string(),
        });
    }
    if block.headers.is_empty() && block.modules.is_empty() {
        return Err(ConfigError::Module {
            path: path.to_path_buf(),
            module: id.to_string(),
            message: "module declares no headers".to_string(),
        });
    }
    for (name, child) in &block.modules {
        if name == SHARED_OVERRIDES_NAME {
            return Err(ConfigError::Module {
                path: path.to_path_buf(),
                module: format!("{id}.{name}"),
                message: "`all` is reserved for the top level of a file".to_string(),
            });
        }
        if name.contains('.') {
            return Err(ConfigError::Module {
                path: path.to_path_buf(),
                module: format!("{id}.{name}"),
                message: "module name must not contain `.`".to_string(),
            });
        }
        validate_module(path, &format!("{id}.{name}"), child)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, rel: &str, body: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    const MINIMAL: &str = "modules:\n  cvode:\n    headers: [cvode.h]\n";

    #[test]
    fn discovery_finds_nested_files_in_stable_order() {
        let tmp = TempDir::new().unwrap();
        write_config(tmp.path(), "b/deep/er/generate.yaml", MINIMAL);
        write_config(tmp.path(), "a/generate.yaml", MINIMAL);
        write_config(tmp.path(), "generate.yaml", MINIMAL);
        write_config(tmp.path(), "a/not-a-config.yaml", "modules: {}");

        let first = load(tmp.path()).unwrap();
        let second = load(tmp.path()).unwrap();
        let paths: Vec<_> = first.iter().map(|c| c.path.clone()).collect();
        assert_eq!(paths.len(), 3);
        assert_eq!(
            paths,
            second.iter().map(|c| c.path.clone()).collect::<Vec<_>>()
        );
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn empty_tree_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("only/dirs")).unwrap();
        let err = load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("no generate.yaml files found"));
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "generate.yaml", "modules: [not, a, mapping]");
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("generate.yaml"));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            "generate.yaml",
            "modules:\n  cvode:\n    headers: [cvode.h]\n    pointer_typs: {}\n",
        );
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("pointer_typs"));
    }

    #[test]
    fn headerless_leaf_module_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "generate.yaml", "modules:\n  cvode: {}\n");
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("declares no headers"));
        assert!(err.to_string().contains("cvode"));
    }

    #[test]
    fn shared_block_must_not_declare_headers() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            "generate.yaml",
            "modules:\n  all:\n    headers: [x.h]\n  cvode:\n    headers: [cvode.h]\n",
        );
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("only policy overrides"));
    }

    #[test]
    fn nested_all_is_reserved() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            "generate.yaml",
            "modules:\n  cvode:\n    headers: [cvode.h]\n    modules:\n      all:\n        headers: [y.h]\n",
        );
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn relative_headers_resolve_against_the_config_dir() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "sub/generate.yaml", MINIMAL);
        let loaded = load(&path).unwrap();
        let headers = &loaded[0].document.modules["cvode"].headers;
        assert_eq!(headers[0], tmp.path().join("sub/cvode.h"));
    }
}
