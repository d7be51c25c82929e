//! Package manifest reading and writing.
//!
//! The authoritative version lives in `package.json`. Lock manifests
//! (`npm-shrinkwrap.json`, `package-lock.json`) mirror the version field and
//! are rewritten alongside it when present. Files keep their key order and
//! indentation so that a release commit only touches the version lines.

use crate::error::{Error, Result};
use crate::version::parse_version;
use semver::Version;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the package manifest.
pub const PACKAGE_MANIFEST: &str = "package.json";

/// Lock manifests that mirror the package version, in probe order.
pub const LOCK_MANIFESTS: [&str; 2] = ["npm-shrinkwrap.json", "package-lock.json"];

/// Indentation style of a JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indent {
    /// One tab per level.
    Tab,
    /// N spaces per level.
    Spaces(usize),
}

impl Default for Indent {
    fn default() -> Self {
        Self::Spaces(2)
    }
}

impl Indent {
    /// Detect the indentation of `content` from its first indented line.
    ///
    /// Falls back to two spaces for single-line or unindented documents.
    #[must_use]
    pub fn detect(content: &str) -> Self {
        for line in content.lines() {
            if line.starts_with('\t') {
                return Self::Tab;
            }
            let spaces = line.bytes().take_while(|b| *b == b' ').count();
            if spaces > 0 && spaces < line.len() {
                return Self::Spaces(spaces);
            }
        }
        Self::default()
    }

    fn as_bytes(&self) -> Vec<u8> {
        match self {
            Self::Tab => b"\t".to_vec(),
            Self::Spaces(n) => vec![b' '; *n],
        }
    }
}

/// A parsed JSON manifest together with its on-disk formatting.
#[derive(Debug, Clone)]
pub struct JsonManifest {
    path: PathBuf,
    document: Map<String, Value>,
    indent: Indent,
}

impl JsonManifest {
    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns a `MissingManifest` usage error if the file cannot be read or
    /// is not a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::missing_manifest(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(path, &content)
    }

    /// Parse manifest `content` that was read from `path`.
    ///
    /// # Errors
    ///
    /// Returns a `MissingManifest` usage error if `content` is not a JSON object.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| {
            Error::missing_manifest(format!("Failed to parse {}: {e}", path.display()))
        })?;
        let Value::Object(document) = value else {
            return Err(Error::missing_manifest(format!(
                "{} is not a JSON object",
                path.display()
            )));
        };
        Ok(Self {
            path: path.to_path_buf(),
            document,
            indent: Indent::detect(content),
        })
    }

    /// Path the manifest was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detected indentation.
    #[must_use]
    pub const fn indent(&self) -> &Indent {
        &self.indent
    }

    /// Raw `version` field, if present and a string.
    #[must_use]
    pub fn version_str(&self) -> Option<&str> {
        self.document.get("version").and_then(Value::as_str)
    }

    /// Parsed `version` field.
    ///
    /// # Errors
    ///
    /// Returns a `MissingManifest` usage error if the field is absent or not
    /// valid semver.
    pub fn version(&self) -> Result<Version> {
        let raw = self.version_str().ok_or_else(|| {
            Error::missing_manifest(format!("{} has no \"version\" field", self.path.display()))
        })?;
        parse_version(raw)
    }

    /// Set the top-level `version` field, preserving its position.
    pub fn set_version(&mut self, version: &Version) {
        self.document
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Mirror `version` into a lock manifest.
    ///
    /// Updates the top-level field and, for lockfile v2+, the root package
    /// entry under `packages[""]`.
    pub fn mirror_version(&mut self, version: &Version) {
        self.set_version(version);
        if let Some(Value::Object(root)) = self
            .document
            .get_mut("packages")
            .and_then(|packages| packages.get_mut(""))
        {
            if root.contains_key("version") {
                root.insert("version".to_string(), Value::String(version.to_string()));
            }
        }
    }

    /// Render the manifest with its original indentation and a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render(&self) -> serde_json::Result<String> {
        let indent = self.indent.as_bytes();
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&indent));
        self.document.serialize(&mut serializer)?;
        let mut rendered = String::from_utf8_lossy(&buf).into_owned();
        rendered.push('\n');
        Ok(rendered)
    }

    /// Write the manifest back to its path.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be rendered or written.
    pub fn persist(&self) -> std::io::Result<()> {
        let rendered = self.render()?;
        fs::write(&self.path, rendered)
    }
}

/// Manifest locations for one release attempt, computed once up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePaths {
    /// Directory the release was invoked from.
    pub work_dir: PathBuf,
    /// Repository root directory.
    pub root: PathBuf,
    /// Root relative to the invocation directory, as passed to `npm publish`.
    pub publish_dir: String,
    /// `package.json` at the repository root.
    pub manifest: PathBuf,
    /// Lock manifests that exist at the repository root.
    pub lock_manifests: Vec<PathBuf>,
}

impl ReleasePaths {
    /// Resolve manifest paths for a repository whose root is `root_offset`
    /// (as printed by `git rev-parse --show-cdup`) relative to `work_dir`.
    ///
    /// Lock manifests are probed once here; later writes use this list.
    #[must_use]
    pub fn resolve(work_dir: &Path, root_offset: &str) -> Self {
        let offset = root_offset.trim();
        let root = if offset.is_empty() {
            work_dir.to_path_buf()
        } else {
            work_dir.join(offset)
        };
        let lock_manifests = LOCK_MANIFESTS
            .iter()
            .map(|name| root.join(name))
            .filter(|path| path.is_file())
            .collect();
        Self {
            work_dir: work_dir.to_path_buf(),
            manifest: root.join(PACKAGE_MANIFEST),
            publish_dir: if offset.is_empty() {
                ".".to_string()
            } else {
                offset.to_string()
            },
            root,
            lock_manifests,
        }
    }

    /// `path` relative to the invocation directory, as git commands expect it.
    #[must_use]
    pub fn git_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.work_dir)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }
}
