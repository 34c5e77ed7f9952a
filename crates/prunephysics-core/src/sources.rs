//! Whitelist rule files on disk.
//!
//! Every file below the root whose extension is a whitelist extension
//! (case-insensitive) contributes one source. Files are read in path order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use prunephysics_logic::whitelist::{is_whitelist_extension, WhitelistProvider, WhitelistSource};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot list {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read rule file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Recursive directory scan for rule files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of all rule files, sorted.
    pub fn rule_files(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut found = Vec::new();
        collect_rule_files(&self.root, &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Read every rule file. Unreadable files are skipped with a warning;
    /// only a missing or unlistable root is an error.
    pub fn scan(&self) -> Result<Vec<WhitelistSource>, SourceError> {
        let mut sources = Vec::new();
        for path in self.rule_files()? {
            match read_source(&path) {
                Ok(source) => {
                    log::debug!("whitelist file {} ({} lines)", path.display(), source.lines.len());
                    sources.push(source);
                }
                Err(err) => log::warn!("{}", err),
            }
        }
        Ok(sources)
    }
}

impl WhitelistProvider for DirectorySource {
    fn sources(&self) -> Vec<WhitelistSource> {
        match self.scan() {
            Ok(sources) => sources,
            Err(err) => {
                log::warn!("{}", err);
                Vec::new()
            }
        }
    }
}

/// Rule text bundled with the binary, followed by files from a directory.
#[derive(Debug, Clone)]
pub struct LayeredSource {
    pub builtin: Vec<WhitelistSource>,
    pub directory: Option<DirectorySource>,
}

impl WhitelistProvider for LayeredSource {
    fn sources(&self) -> Vec<WhitelistSource> {
        let mut sources = self.builtin.clone();
        if let Some(directory) = &self.directory {
            sources.extend(directory.sources());
        }
        sources
    }
}

fn has_rule_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_whitelist_extension)
}

fn collect_rule_files(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), SourceError> {
    let entries = fs::read_dir(dir).map_err(|source| SourceError::ListDir {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(source) => {
                return Err(SourceError::ListDir {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };
        if path.is_dir() {
            collect_rule_files(&path, found)?;
        } else if has_rule_extension(&path) {
            found.push(path);
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<WhitelistSource, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(WhitelistSource::from_text(path.display().to_string(), &text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prunephysics_logic::whitelist::Whitelist;
    use tempfile::tempdir;

    #[test]
    fn test_scan_finds_both_extensions_recursively() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ppwl"), "ModuleLight\n").unwrap();
        fs::create_dir(dir.path().join("mods")).unwrap();
        fs::write(
            dir.path().join("mods").join("b.PrunePhysicsWhiteList"),
            "# vendor parts\nModuleDataTransmitter\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ModuleEngines\n").unwrap();

        let source = DirectorySource::new(dir.path());
        let files = source.rule_files().unwrap();
        assert_eq!(files.len(), 2);

        let whitelist = Whitelist::compile(&source.sources());
        assert_eq!(whitelist.len(), 2);
        assert!(whitelist.is_allowed("Stock.ModuleLight"));
        assert!(whitelist.is_allowed("Stock.ModuleDataTransmitter"));
        assert!(!whitelist.is_allowed("Stock.ModuleEngines"));
    }

    #[test]
    fn test_missing_root_is_an_error_but_provider_is_empty() {
        let dir = tempdir().unwrap();
        let source = DirectorySource::new(dir.path().join("absent"));
        assert!(matches!(source.scan(), Err(SourceError::ListDir { .. })));
        assert!(source.sources().is_empty());
    }

    #[test]
    fn test_origin_is_the_file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.ppwl");
        fs::write(&path, "Module((\n").unwrap();

        let whitelist = Whitelist::compile(&DirectorySource::new(dir.path()).sources());
        assert_eq!(whitelist.rejected().len(), 1);
        assert_eq!(whitelist.rejected()[0].origin, path.display().to_string());
        assert_eq!(whitelist.rejected()[0].line, 1);
    }

    #[test]
    fn test_layered_source_puts_builtin_first() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("extra.ppwl"), "ModuleEngines").unwrap();
        let layered = LayeredSource {
            builtin: vec![WhitelistSource::from_text("builtin", "ModuleLight")],
            directory: Some(DirectorySource::new(dir.path())),
        };
        let sources = layered.sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].origin, "builtin");
    }
}
