//! @ai:module:intent Run the forward merge pipeline: parse, project, align, synthesize
//! @ai:module:layer application
//! @ai:module:public_api forward_merge, merge_files, write_report
//! @ai:module:depends_on annotation, align, merge, config, textfile
//! @ai:module:stateless true

use crate::align::{align, OpTag};
use crate::annotation::parse_lines;
use crate::config::MergeConfig;
use crate::error::{Error, Result};
use crate::marker::AnnotationPredicate;
use crate::merge::{synthesize, MergeReport};
use crate::textfile::{read_lines, write_lines};
use std::path::Path;

/// @ai:intent Carry annotations from `old` onto `new`, marking every divergence
/// @ai:pre lines have their newline terminators stripped
/// @ai:post identical inputs always yield identical reports
/// @ai:post Err(UnresolvedMarker) if `old` still holds a sentinel from an earlier merge
/// @ai:idempotent true
/// @ai:effects pure
pub fn forward_merge<I, J, S, T, P>(
    old_lines: I,
    new_lines: J,
    predicate: &P,
    config: &MergeConfig,
) -> Result<MergeReport>
where
    I: IntoIterator<Item = S>,
    J: IntoIterator<Item = T>,
    S: Into<String>,
    T: Into<String>,
    P: AnnotationPredicate + ?Sized,
{
    config.markers.validate(predicate)?;

    let old = parse_lines(old_lines, predicate);
    if let Some((line, text)) = config.markers.first_unresolved(&old) {
        tracing::warn!("Old side line {} is an unresolved merge marker", line);
        return Err(Error::UnresolvedMarker {
            line,
            text: text.to_string(),
        });
    }
    let new = parse_lines(new_lines, predicate);
    tracing::debug!(
        "Parsed {} old units ({} annotations), {} new units ({} annotations)",
        old.len(),
        old.annotation_count(),
        new.len(),
        new.annotation_count()
    );

    let whitespace = config.whitespace;
    let old_keys: Vec<&str> = old.contents().into_iter().map(|l| whitespace.key(l)).collect();
    let new_keys: Vec<&str> = new.contents().into_iter().map(|l| whitespace.key(l)).collect();

    let opcodes = align(&old_keys, &new_keys);
    for tag in [OpTag::Equal, OpTag::Insert, OpTag::Delete, OpTag::Replace] {
        tracing::debug!(
            "{} {} opcodes",
            opcodes.iter().filter(|op| op.tag == tag).count(),
            tag.name()
        );
    }

    synthesize(
        &old,
        &new,
        &opcodes,
        &config.markers,
        config.new_annotations,
    )
}

/// @ai:intent Forward-merge an annotated file with a newer clean file
/// @ai:effects fs:read
pub fn merge_files(old_path: &Path, new_path: &Path, config: &MergeConfig) -> Result<MergeReport> {
    let marker = config.validate()?;
    tracing::debug!("Annotation pattern: {}", marker.as_str());
    let old_lines = read_lines(old_path)?;
    let new_lines = read_lines(new_path)?;

    let report = forward_merge(old_lines, new_lines, &marker, config)?;
    tracing::info!(
        "Merged {} onto {}: {} conflict blocks, {} new annotations",
        old_path.display(),
        new_path.display(),
        report.stats.conflicts(),
        report.stats.new_annotations
    );

    Ok(report)
}

/// @ai:intent Write the merged lines over `path`
/// @ai:effects fs:write
pub fn write_report(report: &MergeReport, path: &Path) -> Result<()> {
    write_lines(path, &report.lines())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WhitespaceMode;
    use crate::marker::MarkerPattern;
    use crate::strip::strip_lines;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_extreme_comments_follow_code() {
        let old = vec![
            "#E Entry point.",
            "def main():",
            "    #N Do not call twice.",
            "    run()",
        ];
        let new = vec!["import sys", "def main():", "    run()"];

        let report =
            forward_merge(old, new, &MarkerPattern::default(), &MergeConfig::default()).unwrap();

        assert_eq!(
            report.lines(),
            vec![
                "<<<<<<< extremedoc: inserted",
                "import sys",
                ">>>>>>> extremedoc",
                "#E Entry point.",
                "def main():",
                "    #N Do not call twice.",
                "    run()",
            ]
        );
    }

    #[test]
    fn test_trailing_whitespace_is_significant_by_default() {
        let report = forward_merge(
            ["x = 1  "],
            ["x = 1"],
            &MarkerPattern::default(),
            &MergeConfig::default(),
        )
        .unwrap();

        assert_eq!(report.stats.replace, 1);
    }

    #[test]
    fn test_ignore_trailing_whitespace_emits_new_content() {
        let config = MergeConfig {
            whitespace: WhitespaceMode::IgnoreTrailing,
            ..Default::default()
        };
        let report = forward_merge(
            ["#E note", "x = 1  "],
            ["x = 1"],
            &MarkerPattern::default(),
            &config,
        )
        .unwrap();

        assert!(report.is_clean());
        assert_eq!(report.lines(), vec!["#E note", "x = 1"]);
    }

    #[test]
    fn test_clean_merge_strips_back_to_new() {
        let marker = MarkerPattern::default();
        let old = vec!["#E a", "x = 1", "y = 2", "#N b", "z = 3"];
        let new = vec!["x = 1", "y = 2", "z = 3"];

        let report = forward_merge(old, new.clone(), &marker, &MergeConfig::default()).unwrap();

        assert!(report.is_clean());
        assert_eq!(strip_lines(report.lines(), &marker), new);
    }

    #[test]
    fn test_run_twice_identical() {
        let marker = MarkerPattern::default();
        let old = vec!["#E a", "a", "b", "c", "#E d", "d"];
        let new = vec!["a", "c", "b", "d", "e"];
        let config = MergeConfig::default();

        let first = forward_merge(old.clone(), new.clone(), &marker, &config).unwrap();
        let second = forward_merge(old, new, &marker, &config).unwrap();

        assert_eq!(first.lines(), second.lines());
    }

    #[test]
    fn test_merge_files_and_write_back() {
        let dir = TempDir::new().unwrap();
        let old_path = dir.path().join("annotated.py");
        let new_path = dir.path().join("clean.py");
        std::fs::write(&old_path, "#E counts things\ncount = 0\n").unwrap();
        std::fs::write(&new_path, "count = 0\ncount += 1\n").unwrap();

        let config = MergeConfig::default();
        let report = merge_files(&old_path, &new_path, &config).unwrap();
        write_report(&report, &old_path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&old_path).unwrap(),
            "#E counts things\ncount = 0\n<<<<<<< extremedoc: inserted\ncount += 1\n>>>>>>> extremedoc\n"
        );
    }

    #[test]
    fn test_unresolved_marker_in_old_is_rejected() {
        let old = vec![
            "x = 1",
            "#E why y",
            "<<<<<<< extremedoc: inserted",
            "y = 2",
            ">>>>>>> extremedoc",
        ];
        let new = vec!["x = 1", "y = 2"];

        let err = forward_merge(old, new, &MarkerPattern::default(), &MergeConfig::default())
            .unwrap_err();

        assert!(matches!(err, Error::UnresolvedMarker { line: 3, .. }));
    }

    #[test]
    fn test_divider_line_in_old_is_plain_content() {
        let report = forward_merge(
            ["Title", "======="],
            ["Title", "=======", "text"],
            &MarkerPattern::default(),
            &MergeConfig::default(),
        )
        .unwrap();

        assert_eq!(report.stats.equal, 1);
        assert_eq!(report.stats.insert, 1);
    }

    #[test]
    fn test_invalid_markers_abort_merge() {
        let mut config = MergeConfig::default();
        config.markers.block_end = "#E end".to_string();

        let err = forward_merge(["x"], ["x"], &MarkerPattern::default(), &config).unwrap_err();
        assert!(matches!(err, Error::InvalidMarker { name: "block_end", .. }));
    }

    #[test]
    fn test_invalid_pattern_aborts_before_reading() {
        let config = MergeConfig {
            annotation_pattern: "(".to_string(),
            ..Default::default()
        };

        let result = merge_files(Path::new("missing-old"), Path::new("missing-new"), &config);
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
    }
}
