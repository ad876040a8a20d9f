//! Whole-file reads, length-checked saves and in-place injection of an edited
//! buffer into a larger host file.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use log::{info, warn};

use crate::error::{EditError, Result};

/// Parses an injection offset typed as `0x`-prefixed hex or plain decimal.
pub fn parse_offset(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    let invalid = |reason: &str| EditError::InvalidOffset {
        text: text.to_string(),
        reason: reason.to_string(),
    };

    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.starts_with(['+', '-']) {
            return Err(invalid("sign not allowed after hex prefix"));
        }
        return u64::from_str_radix(hex, 16).map_err(|err| invalid(&err.to_string()));
    }

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let value = digits
        .parse::<u64>()
        .map_err(|err| invalid(&err.to_string()))?;
    // "-0" is still zero.
    if negative && value != 0 {
        return Err(invalid("offset cannot be negative"));
    }
    Ok(value)
}

pub fn load(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).map_err(|source| EditError::LoadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    info!("loaded {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Writes `data` as a new standalone file, refusing to change the asset's
/// length from what was originally loaded.
pub fn save_copy(path: &Path, data: &[u8], original_len: usize) -> Result<usize> {
    if data.len() != original_len {
        return Err(EditError::LengthMismatch {
            expected: original_len,
            actual: data.len(),
        });
    }
    fs::write(path, data).map_err(|source| EditError::SaveFailed {
        path: path.to_path_buf(),
        source,
    })?;
    info!("saved {} bytes to {}", data.len(), path.display());
    Ok(data.len())
}

/// Overwrites `target` starting at `offset` with `data`.
///
/// Bytes before `offset` are never touched. The offset must fall inside the
/// file or exactly at its end; a write running past the end extends the file
/// from `offset` rather than leaving a gap.
pub fn inject(target: &Path, offset: u64, data: &[u8]) -> Result<usize> {
    if data.is_empty() {
        return Err(EditError::NoData);
    }
    let failed = |source| EditError::InjectFailed {
        path: target.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(target)
        .map_err(failed)?;
    let file_size = file.seek(SeekFrom::End(0)).map_err(failed)?;
    if offset > file_size {
        return Err(EditError::OffsetExceedsFile { offset, file_size });
    }

    let end = offset + data.len() as u64;
    if end > file_size {
        warn!(
            "injection into {} runs {} bytes past the end of the file",
            target.display(),
            end - file_size
        );
    }

    file.seek(SeekFrom::Start(offset)).map_err(failed)?;
    file.write_all(data).map_err(failed)?;
    file.flush().map_err(failed)?;

    info!(
        "injected {} bytes into {} at offset {offset:#010x}",
        data.len(),
        target.display()
    );
    Ok(data.len())
}

/// [`parse_offset`] followed by [`inject`].
pub fn inject_at(target: &Path, offset_text: &str, data: &[u8]) -> Result<usize> {
    let offset = parse_offset(offset_text)?;
    inject(target, offset, data)
}
