//! @ai:module:intent Apply forward merges and strips across a clean tree and its annotated mirror
//! @ai:module:layer application
//! @ai:module:public_api forward_tree, strip_tree, TreeSummary, FileOutcome, FileStatus
//! @ai:module:depends_on forward, strip, config, error

use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::forward::{merge_files, write_report};
use crate::merge::MergeStats;
use crate::strip::strip_file;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// @ai:intent What happened to one file during a tree run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Merged { stats: MergeStats, clean: bool },
    Copied,
    Unannotated,
    Stripped { removed: usize },
    Failed { message: String },
}

/// @ai:intent Outcome for one file, keyed by its path relative to the tree root
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// @ai:intent Per-file outcomes of a tree run
#[derive(Debug, Clone, Default, Serialize)]
pub struct TreeSummary {
    pub files: Vec<FileOutcome>,
}

impl TreeSummary {
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. }))
    }

    /// @ai:intent Files whose merge left conflict blocks or surfaced annotations
    pub fn needs_review(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Merged { clean: false, .. }))
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.status)).count()
    }

    fn push(&mut self, path: &Path, status: FileStatus) {
        self.files.push(FileOutcome {
            path: path.to_path_buf(),
            status,
        });
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn is_excluded_dir(entry: &DirEntry, config: &MergeConfig, mirror: Option<&PathBuf>) -> bool {
    if !entry.file_type().is_dir() || entry.depth() == 0 {
        return false;
    }
    let by_name = entry
        .file_name()
        .to_str()
        .map(|name| config.excludes_dir(name))
        .unwrap_or(false);

    by_name || (mirror.is_some() && entry.path().canonicalize().ok().as_ref() == mirror)
}

/// Files under `root` relative to it, skipping hidden entries, excluded directories
/// and the `mirror` subtree.
fn relative_files(root: &Path, mirror: &Path, config: &MergeConfig) -> Vec<PathBuf> {
    let mirror = mirror.canonicalize().ok();

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e) && !is_excluded_dir(e, config, mirror.as_ref()))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && config.includes_file(e.path()))
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// @ai:intent Forward-merge every clean file onto its annotated counterpart
/// @ai:post files without a counterpart are copied when `write` is set, else reported Unannotated
/// @ai:post a failure on one file is recorded and the walk continues
/// @ai:effects fs:read, fs:write
pub fn forward_tree(
    clean_root: &Path,
    annotated_root: &Path,
    config: &MergeConfig,
    write: bool,
) -> Result<TreeSummary> {
    // fail fast on a bad pattern or marker instead of once per file
    config.validate()?;

    let mut summary = TreeSummary::default();

    for rel in relative_files(clean_root, annotated_root, config) {
        let clean = clean_root.join(&rel);
        let annotated = annotated_root.join(&rel);

        let status = if annotated.is_file() {
            merge_one(&annotated, &clean, config, write)
        } else if write {
            copy_one(&clean, &annotated)
        } else {
            tracing::info!("No annotated copy of {}", rel.display());
            Ok(FileStatus::Unannotated)
        };

        let status = status.unwrap_or_else(|e| {
            tracing::warn!("{}: {}", rel.display(), e);
            FileStatus::Failed {
                message: e.to_string(),
            }
        });
        summary.push(&rel, status);
    }

    Ok(summary)
}

fn merge_one(annotated: &Path, clean: &Path, config: &MergeConfig, write: bool) -> Result<FileStatus> {
    let report = merge_files(annotated, clean, config)?;
    if write {
        write_report(&report, annotated)?;
    }

    Ok(FileStatus::Merged {
        clean: report.is_clean(),
        stats: report.stats,
    })
}

fn copy_one(from: &Path, to: &Path) -> Result<FileStatus> {
    ensure_parent(to)?;
    std::fs::copy(from, to).map_err(|e| Error::FileWrite {
        path: to.to_path_buf(),
        source: e,
    })?;
    Ok(FileStatus::Copied)
}

/// @ai:intent Strip every annotated file into the clean tree
/// @ai:effects fs:read, fs:write
pub fn strip_tree(annotated_root: &Path, clean_root: &Path, config: &MergeConfig) -> Result<TreeSummary> {
    let marker = config.marker()?;
    let mut summary = TreeSummary::default();

    for rel in relative_files(annotated_root, clean_root, config) {
        let target = clean_root.join(&rel);

        let status = ensure_parent(&target)
            .and_then(|_| strip_file(&annotated_root.join(&rel), &target, &marker))
            .map(|removed| FileStatus::Stripped { removed })
            .unwrap_or_else(|e| {
                tracing::warn!("{}: {}", rel.display(), e);
                FileStatus::Failed {
                    message: e.to_string(),
                }
            });
        summary.push(&rel, status);
    }

    Ok(summary)
}
