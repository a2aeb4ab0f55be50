//! Filesystem and identifier utilities.
//!
//! Job identifiers are opaque strings from the remote service. They are
//! percent-encoded into request URLs and reduced to a safe segment for export
//! file names. Export artifacts are written atomically (temp file + rename)
//! so an interrupted write never leaves a truncated report behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::{CoreError, CoreResult};

/// Maximum length for identifier-derived file name segments.
const MAX_FILE_COMPONENT_LEN: usize = 64;

// =============================================================================
// Identifier Validation
// =============================================================================

/// Checks that a job identifier can address a job at all.
///
/// Any other character is allowed; URL building encodes it. Rejects:
/// - Empty or whitespace-only strings
/// - The dot segments `.` and `..`, which a URL path cannot carry
/// - Control characters
pub fn validate_job_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("jobId is empty or contains only whitespace".to_string());
    }
    if id == "." || id == ".." {
        return Err(format!("Invalid jobId '{}': dot segment", id));
    }
    if id.chars().any(|c| c.is_control()) {
        return Err("Invalid jobId: contains control characters".to_string());
    }
    Ok(())
}

/// Reduce an arbitrary string to a file-name-safe segment.
pub fn sanitize_file_component(value: &str, fallback: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILE_COMPONENT_LEN)
        .collect();

    if sanitized.is_empty() {
        fallback.to_string()
    } else {
        sanitized
    }
}

// =============================================================================
// Atomic Writes
// =============================================================================

/// Writes bytes to `path` via a temp file and rename, creating parent dirs.
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = sibling_path(path, "tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    atomic_replace(path, &tmp_path)
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| suffix.to_string());
    path.with_file_name(format!("{file_name}.{suffix}"))
}

fn atomic_replace(dest: &Path, src_tmp: &Path) -> CoreResult<()> {
    if !dest.exists() {
        std::fs::rename(src_tmp, dest)?;
        return Ok(());
    }

    // Windows: rename-over-existing may fail; swap through a backup.
    let bak = sibling_path(dest, "bak");
    if bak.exists() {
        let _ = std::fs::remove_file(&bak);
    }

    std::fs::rename(dest, &bak)?;
    match std::fs::rename(src_tmp, dest) {
        Ok(()) => {
            let _ = std::fs::remove_file(&bak);
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::rename(&bak, dest);
            let _ = std::fs::remove_file(src_tmp);
            Err(CoreError::IoError(e))
        }
    }
}
