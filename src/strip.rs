//! @ai:module:intent Remove annotation lines to produce the clean copy of a file
//! @ai:module:layer application
//! @ai:module:public_api strip_lines, strip_file
//! @ai:module:depends_on marker, textfile, error

use crate::error::Result;
use crate::marker::AnnotationPredicate;
use crate::textfile::{read_lines, write_lines};
use std::path::Path;

/// @ai:intent Keep every line the predicate does not recognize as an annotation
/// @ai:post relative order of kept lines is unchanged
/// @ai:effects pure
pub fn strip_lines<I, S, P>(lines: I, predicate: &P) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    P: AnnotationPredicate + ?Sized,
{
    lines
        .into_iter()
        .map(Into::into)
        .filter(|line| !predicate.is_annotation(line))
        .collect()
}

/// @ai:intent Strip `input` and write the clean result to `output`
/// @ai:post returns the number of annotation lines removed
/// @ai:effects fs:read, fs:write
pub fn strip_file<P>(input: &Path, output: &Path, predicate: &P) -> Result<usize>
where
    P: AnnotationPredicate + ?Sized,
{
    let lines = read_lines(input)?;
    let total = lines.len();
    let kept = strip_lines(lines, predicate);

    write_lines(output, &kept)?;
    tracing::info!(
        "Stripped {} annotation lines from {} into {}",
        total - kept.len(),
        input.display(),
        output.display()
    );

    Ok(total - kept.len())
}
