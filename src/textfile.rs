//! @ai:module:intent Read UTF-8 text files as lines and replace files atomically
//! @ai:module:layer infrastructure
//! @ai:module:public_api read_lines, write_lines
//! @ai:module:depends_on error

use crate::error::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// @ai:intent Read a file and split it into lines without their terminators
/// @ai:post Err(Decode) naming the first line that is not valid UTF-8
/// @ai:effects fs:read
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let text = String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        Error::Decode {
            path: path.to_path_buf(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
        }
    })?;

    Ok(split_lines(&text))
}

/// @ai:effects pure
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// @ai:intent Write lines to `path`, replacing it only once the content is complete
/// @ai:post on error the previous file at `path` is untouched
/// @ai:post an existing file keeps its permissions; a new one gets the umask default
/// @ai:effects fs:write
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let write_err = |source: std::io::Error| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    let existing = std::fs::metadata(path).ok().map(|m| m.permissions());

    let mut tmp = temp_file_in(dir, existing.is_none()).map_err(write_err)?;
    for line in lines {
        writeln!(tmp, "{}", line.as_ref()).map_err(write_err)?;
    }
    tmp.flush().map_err(write_err)?;
    if let Some(permissions) = existing {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    tracing::debug!("Wrote {} lines to {}", lines.len(), path.display());
    Ok(())
}

/// Temp files default to 0600; a fresh target should look like any newly created file.
fn temp_file_in(dir: &Path, fresh: bool) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if fresh {
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
    }
    #[cfg(not(unix))]
    let _ = fresh;

    builder.tempfile_in(dir)
}
