//! @ai:module:intent Format merge reports, parsed units and tree summaries (text, JSON)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_report, format_summary, format_units, format_tree_summary
//! @ai:module:depends_on merge, annotation, tree
//! @ai:module:stateless true

use crate::annotation::AnnotatedSequence;
use crate::error::Result;
use crate::merge::MergeReport;
use crate::tree::{FileStatus, TreeSummary};
use colored::Colorize;
use serde::Serialize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

fn to_json<T: Serialize>(value: &T, format: OutputFormat) -> Result<Option<String>> {
    Ok(match format {
        OutputFormat::Json => Some(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Some(serde_json::to_string_pretty(value)?),
        OutputFormat::Text => None,
    })
}

/// @ai:intent Format a merge report: the merged file as text, or the block structure as JSON
/// @ai:effects pure
pub fn format_report(report: &MergeReport, format: OutputFormat) -> Result<String> {
    Ok(to_json(report, format)?.unwrap_or_else(|| {
        let mut output = report.lines().join("\n");
        if !report.blocks.is_empty() {
            output.push('\n');
        }
        output
    }))
}

/// @ai:intent One-paragraph human summary of a merge, meant for stderr
/// @ai:effects pure
pub fn format_summary(report: &MergeReport, label: &str) -> String {
    let stats = &report.stats;
    let status = if report.is_clean() {
        "OK".green().bold()
    } else {
        "REVIEW".yellow().bold()
    };

    let mut output = format!("{} {}\n", status, label.bold());
    output.push_str(&format!(
        "  {} unchanged, {} inserted, {} deleted, {} replaced blocks\n",
        stats.equal,
        colored_count(stats.insert),
        colored_count(stats.delete),
        colored_count(stats.replace)
    ));
    output.push_str(&format!(
        "  {} annotations carried, {} new annotations surfaced\n",
        stats.carried_annotations,
        colored_count(stats.new_annotations)
    ));
    output
}

fn colored_count(n: usize) -> String {
    if n > 0 {
        n.to_string().yellow().to_string()
    } else {
        n.to_string()
    }
}

/// @ai:intent Show how a file groups into annotated units
/// @ai:effects pure
pub fn format_units(seq: &AnnotatedSequence, format: OutputFormat) -> Result<String> {
    Ok(to_json(seq, format)?.unwrap_or_else(|| {
        let mut output = String::new();

        for (idx, unit) in seq.units().iter().enumerate() {
            for annotation in &unit.annotations {
                output.push_str(&format!("{:>5}   {}\n", "", annotation.cyan()));
            }
            output.push_str(&format!("{:>5} | {}\n", idx.to_string().dimmed(), unit.content));
        }

        output.push_str(&format!(
            "\n{} units, {} annotation lines\n",
            seq.len(),
            seq.annotation_count()
        ));
        output
    }))
}

/// @ai:intent Format per-file outcomes of a tree run
/// @ai:effects pure
pub fn format_tree_summary(summary: &TreeSummary, format: OutputFormat) -> Result<String> {
    Ok(to_json(summary, format)?.unwrap_or_else(|| {
        let mut output = String::new();

        for file in &summary.files {
            let line = match &file.status {
                FileStatus::Merged { clean: true, .. } => format!("{:>8} ", "ok".green()),
                FileStatus::Merged { stats, .. } => format!(
                    "{:>8} ({} blocks, {} new annotations) ",
                    "review".yellow().bold(),
                    stats.conflicts(),
                    stats.new_annotations
                ),
                FileStatus::Copied => format!("{:>8} ", "copied".blue()),
                FileStatus::Unannotated => format!("{:>8} ", "new".dimmed()),
                FileStatus::Stripped { removed } => {
                    format!("{:>8} ({} lines removed) ", "stripped".blue(), removed)
                }
                FileStatus::Failed { message } => {
                    format!("{:>8} {} ", "error".red().bold(), message)
                }
            };
            output.push_str(&format!("{}{}\n", line, file.path.display()));
        }

        output.push_str(&format!(
            "\n{} files, {} need review, {} failed\n",
            summary.files.len(),
            summary.needs_review(),
            summary.failed()
        ));
        output
    }))
}
