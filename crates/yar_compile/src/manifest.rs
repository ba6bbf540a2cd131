//! `yar.toml` project manifest.
//!
//! The manifest is owned by the CLI layer; the core reads just enough of it
//! to resolve the entry source file and to detect a project root during bare
//! import resolution (a directory containing `yar.toml` is a project root).
//!
//! ```toml
//! [package]
//! name = "calc"
//! version = "0.1.0"
//! entry = "src/main.yar"
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The manifest file name that marks a project root.
pub const MANIFEST_FILE: &str = "yar.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub package: PackageSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    pub name: String,
    pub version: String,
    /// Path of the main source file, relative to the manifest directory.
    pub entry: String,
}

impl Manifest {
    /// Reads and parses a manifest file.
    pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// The entry file resolved against the manifest's directory.
    pub fn entry_path(&self, manifest_dir: &Path) -> PathBuf {
        manifest_dir.join(&self.package.entry)
    }
}

/// Walks upward from `start` looking for a directory containing `yar.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join(MANIFEST_FILE).is_file() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

#[derive(Debug)]
pub enum ManifestError {
    Io { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Io { path, message } => {
                write!(f, "cannot read {}: {}", path.display(), message)
            }
            ManifestError::Parse { path, message } => {
                write!(f, "invalid manifest {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ManifestError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_parses_package_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        std::fs::write(
            &path,
            "[package]\nname = \"calc\"\nversion = \"0.1.0\"\nentry = \"main.yar\"\n",
        )
        .unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.package.name, "calc");
        assert_eq!(manifest.entry_path(dir.path()), dir.path().join("main.yar"));
    }

    #[test]
    fn project_root_is_found_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[package]\nname=\"x\"\nversion=\"0\"\nentry=\"m.yar\"\n").unwrap();
        let nested = dir.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();
        let root = find_project_root(&nested).unwrap();
        assert_eq!(root.canonicalize().unwrap(), dir.path().canonicalize().unwrap());
    }

    #[test]
    fn missing_manifest_reports_io_error() {
        let err = Manifest::load(Path::new("/nonexistent/yar.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
