use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::SnapfixError;
use crate::hash::hash_bytes;

const TEMP_NAME_ATTEMPTS: usize = 64;

static TEMP_NAME_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// New contents for one test file, plus the hash of the text they were
/// computed from.
#[derive(Debug, Clone, Copy)]
pub struct PendingWrite<'a> {
    pub path: &'a Path,
    pub contents: &'a str,
    pub expected_hash: Option<&'a str>,
}

#[derive(Debug)]
struct WriteLock {
    _file: File,
}

struct OriginalFile<'a> {
    path: &'a Path,
    bytes: Vec<u8>,
    permissions: Permissions,
}

/// Writes every file or none of them.
///
/// All targets are locked and checked against their expected hashes before
/// the first one is replaced. If a replacement fails, files already replaced
/// are restored from their original bytes.
pub fn write_fixed_files(writes: &[PendingWrite<'_>]) -> Result<(), SnapfixError> {
    write_fixed_files_with(writes, |path, contents| replace_atomically(path, contents))
}

fn write_fixed_files_with<R>(
    writes: &[PendingWrite<'_>],
    mut replace: R,
) -> Result<(), SnapfixError>
where
    R: FnMut(&Path, &[u8]) -> Result<(), SnapfixError>,
{
    let mut locks = Vec::with_capacity(writes.len());
    let mut originals = Vec::with_capacity(writes.len());
    for write in writes {
        locks.push(lock_exclusive(write.path)?);
        originals.push(read_original(write)?);
    }

    for (committed, write) in writes.iter().enumerate() {
        if let Err(error) = replace(write.path, write.contents.as_bytes()) {
            return Err(restore_committed(&originals[..committed], error));
        }
        debug!(file = %write.path.display(), bytes = write.contents.len(), "wrote fixed file");
    }

    drop(locks);
    Ok(())
}

fn lock_exclusive(path: &Path) -> Result<WriteLock, SnapfixError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|error| SnapfixError::io(path, error))?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(WriteLock { _file: file }),
        Err(error) if error.kind() == ErrorKind::WouldBlock => Err(SnapfixError::ResourceBusy {
            path: path.display().to_string(),
        }),
        Err(error) => Err(SnapfixError::io(path, error)),
    }
}

fn read_original<'a>(write: &PendingWrite<'a>) -> Result<OriginalFile<'a>, SnapfixError> {
    let path = write.path;
    let bytes = fs::read(path).map_err(|error| SnapfixError::io(path, error))?;
    if let Some(expected_hash) = write.expected_hash
        && hash_bytes(&bytes) != expected_hash
    {
        return Err(SnapfixError::PathChanged {
            path: path.display().to_string(),
        });
    }
    let permissions = fs::metadata(path)
        .map_err(|error| SnapfixError::io(path, error))?
        .permissions();

    Ok(OriginalFile {
        path,
        bytes,
        permissions,
    })
}

fn restore_committed(originals: &[OriginalFile<'_>], cause: SnapfixError) -> SnapfixError {
    let failures: Vec<String> = originals
        .iter()
        .rev()
        .filter_map(|original| {
            replace_atomically(original.path, &original.bytes)
                .and_then(|()| {
                    fs::set_permissions(original.path, original.permissions.clone())
                        .map_err(|error| SnapfixError::io(original.path, error))
                })
                .err()
        })
        .map(|error| error.to_string())
        .collect();

    if failures.is_empty() {
        if !originals.is_empty() {
            warn!(restored = originals.len(), %cause, "write failed; restored earlier files");
        }
        return cause;
    }

    SnapfixError::RollbackFailed {
        message: format!("{cause}; restore failed: {}", failures.join("; ")),
    }
}

/// Swaps `path` for `contents` via a synced sibling temp file and a rename,
/// keeping the target's permissions.
fn replace_atomically(path: &Path, contents: &[u8]) -> Result<(), SnapfixError> {
    let permissions = fs::metadata(path)
        .map_err(|error| SnapfixError::io(path, error))?
        .permissions();
    let (temp_path, mut temp_file) = open_temp_sibling(path)?;

    let staged = temp_file
        .write_all(contents)
        .and_then(|()| temp_file.sync_all())
        .and_then(|()| fs::set_permissions(&temp_path, permissions))
        .map_err(|error| SnapfixError::io(&temp_path, error));
    drop(temp_file);

    let result = staged
        .and_then(|()| fs::rename(&temp_path, path).map_err(|error| SnapfixError::io(path, error)))
        .and_then(|()| sync_directory_of(path));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn open_temp_sibling(path: &Path) -> Result<(PathBuf, File), SnapfixError> {
    open_temp_sibling_with(path, || TEMP_NAME_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn open_temp_sibling_with<S>(
    path: &Path,
    mut next_sequence: S,
) -> Result<(PathBuf, File), SnapfixError>
where
    S: FnMut() -> u64,
{
    let directory = directory_of(path);
    let stem = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("snapfix");

    for _ in 0..TEMP_NAME_ATTEMPTS {
        let sequence = next_sequence();
        let candidate = directory.join(format!(".{stem}.snapfix-{}-{sequence}", process::id()));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {}
            Err(error) => return Err(SnapfixError::io(&candidate, error)),
        }
    }

    Err(SnapfixError::io(
        path,
        std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free temporary file name after {TEMP_NAME_ATTEMPTS} attempts"),
        ),
    ))
}

fn directory_of(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

#[cfg(unix)]
fn sync_directory_of(path: &Path) -> Result<(), SnapfixError> {
    let directory = directory_of(path);
    File::open(directory)
        .and_then(|handle| handle.sync_all())
        .map_err(|error| SnapfixError::io(directory, error))
}

#[cfg(not(unix))]
fn sync_directory_of(_path: &Path) -> Result<(), SnapfixError> {
    Ok(())
}
