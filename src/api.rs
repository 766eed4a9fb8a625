//! Process-wide single-mount surface with small-integer result codes.
//!
//! The engine itself hands out a mounted context (`FileSystem`); this module
//! restores the classic flat surface on top of it: one global mount slot,
//! operations that refuse while nothing is mounted, and the stable numeric
//! code per failure kind of each operation.

use std::sync::{Mutex, MutexGuard};

use lazy_static::lazy_static;

use crate::error::{FsError, Result};
use crate::fs::FileSystem;

lazy_static! {
    /// The one mounted filesystem, if any. `format` and `mount` refuse
    /// while the slot is occupied; every file operation fails while it is
    /// empty.
    static ref MOUNTED: Mutex<Option<FileSystem>> = Mutex::new(None);
}

fn slot() -> MutexGuard<'static, Option<FileSystem>> {
    MOUNTED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_mounted<T>(op: impl FnOnce(&mut FileSystem) -> Result<T>) -> Result<T> {
    match slot().as_mut() {
        Some(fs) => op(fs),
        None => Err(FsError::NotMounted),
    }
}

/// Create a canonical empty image at `path`. Returns 0, or -1 on failure or
/// while a filesystem is mounted.
pub fn format(path: &str) -> i32 {
    if slot().is_some() {
        return -1;
    }
    match FileSystem::format(path) {
        Ok(()) => 0,
        Err(_) => -1,
    }
}

/// Mount the image at `path`. Returns 0, or -1 on failure or while a
/// filesystem is already mounted.
pub fn mount(path: &str) -> i32 {
    let mut guard = slot();
    if guard.is_some() {
        return -1;
    }
    match FileSystem::mount(path) {
        Ok(fs) => {
            *guard = Some(fs);
            0
        }
        Err(_) => -1,
    }
}

/// Unmount and release the backing file. A no-op when nothing is mounted.
pub fn unmount() {
    if let Some(fs) = slot().take() {
        fs.unmount();
    }
}

/// Returns 0, -1 if the name exists, -2 with no free inode, -3 otherwise.
pub fn create(name: &str) -> i32 {
    match with_mounted(|fs| fs.create(name)) {
        Ok(()) => 0,
        Err(FsError::AlreadyExists) => -1,
        Err(FsError::OutOfInodes) => -2,
        Err(_) => -3,
    }
}

/// Returns 0, -1 if the file is missing, -2 otherwise.
pub fn delete(name: &str) -> i32 {
    match with_mounted(|fs| fs.delete(name)) {
        Ok(()) => 0,
        Err(FsError::NotFound) => -1,
        Err(_) => -2,
    }
}

/// Fill `names` with up to `max` file names. Returns the count, or -1.
pub fn list(names: &mut Vec<String>, max: usize) -> i32 {
    match with_mounted(|fs| fs.list(max)) {
        Ok(found) => {
            let count = found.len();
            *names = found;
            count as i32
        }
        Err(_) => -1,
    }
}

/// Overwrite `name` with `data`. Returns 0, -1 if the file is missing, -2
/// when out of space, -3 otherwise.
pub fn write(name: &str, data: &[u8]) -> i32 {
    match with_mounted(|fs| fs.write(name, data)) {
        Ok(()) => 0,
        Err(FsError::NotFound) => -1,
        Err(FsError::OutOfSpace) => -2,
        Err(_) => -3,
    }
}

/// Read up to `buf.len()` bytes from `name`. Returns the byte count, -1 if
/// the file is missing, -3 otherwise.
pub fn read(name: &str, buf: &mut [u8]) -> i32 {
    match with_mounted(|fs| fs.read(name, buf)) {
        Ok(count) => count as i32,
        Err(FsError::NotFound) => -1,
        Err(_) => -3,
    }
}

/// The superblock's current free-block count, or -1 when nothing is
/// mounted.
pub fn free_block_count() -> i32 {
    match with_mounted(|fs| fs.free_blocks()) {
        Ok(count) => count as i32,
        Err(_) => -1,
    }
}
