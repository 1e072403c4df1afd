//! Knowledge-base catalog: one directory per named knowledge base

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use docubuddy_core::IndexManifest;

use crate::error::{Error, Result};

/// Summary of one stored knowledge base
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBaseInfo {
    pub name: String,
    pub path: PathBuf,
    /// Total size of every file under the directory
    pub size_bytes: u64,
    /// Most recent modification of any file in the directory
    pub modified: Option<DateTime<Utc>>,
    /// Passage count from the manifest, when it is readable
    pub passages: Option<usize>,
}

/// Directory of named knowledge bases
#[derive(Debug, Clone)]
pub struct KnowledgeBaseCatalog {
    root: PathBuf,
}

impl KnowledgeBaseCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `name`; rejects names that are empty or would escape the root
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Whether a knowledge base directory exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path_for(name)?.is_dir())
    }

    /// Every knowledge base, sorted by name. A missing root lists nothing.
    pub fn list(&self) -> Result<Vec<KnowledgeBaseInfo>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut infos = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if validate_name(&name).is_err() {
                continue;
            }
            infos.push(describe(name, entry.path()));
        }

        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    /// Remove a knowledge base directory
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if !path.is_dir() {
            return Err(Error::KnowledgeBaseNotFound(name.to_string()));
        }
        fs::remove_dir_all(&path)?;
        tracing::info!(name, path = %path.display(), "Deleted knowledge base");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control)
    {
        return Err(Error::InvalidInput(format!(
            "invalid knowledge base name: {:?}",
            name
        )));
    }
    Ok(())
}

fn describe(name: String, path: PathBuf) -> KnowledgeBaseInfo {
    let mut size_bytes = 0u64;
    let mut modified: Option<DateTime<Utc>> = None;

    for entry in WalkDir::new(&path).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            size_bytes += meta.len();
            if let Ok(time) = meta.modified() {
                let time = DateTime::<Utc>::from(time);
                modified = Some(modified.map_or(time, |m| m.max(time)));
            }
        }
    }

    let passages = IndexManifest::read(&path).ok().map(|m| m.passages);

    KnowledgeBaseInfo {
        name,
        path,
        size_bytes,
        modified,
        passages,
    }
}

/// Human-readable size: bytes below 1 KB, then KB and MB with one decimal
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
